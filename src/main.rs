use std::net::SocketAddr;
use std::sync::Arc;
use dermaface::utils::config::Config;
use dermaface::utils::logging;
use dermaface::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cfg = Config::from_env();
    info!(
        "data={:?} acne_model={:?} auto_download={}",
        cfg.data, cfg.acne_model, cfg.model_auto_download
    );

    let state = Arc::new(AppState::bootstrap(cfg.clone())?);
    info!(
        "Knowledge base: {} classes, registered users: {}",
        state.knowledge.len(),
        state.faces.list().map(|u| u.len()).unwrap_or(0)
    );
    // the server accepts requests right away; model-backed routes answer 503 until loaded
    state.load_models();

    let app = dermaface::api::routes::router(state.clone());
    let addr = SocketAddr::from(([0,0,0,0], cfg.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening" = %addr);
    axum::serve(listener, app).await?;
    Ok(())
}
