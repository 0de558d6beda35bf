use axum::{Router, extract::DefaultBodyLimit, routing::{get, post, delete}};
use std::sync::Arc;
use tower_http::cors::{CorsLayer, AllowOrigin};
use axum::http::{header, Method};
use crate::AppState;
use crate::api::{handlers, handlers_acne, handlers_auth};

/// Largest accepted multipart body.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any()) // browser and mobile clients call from anywhere
        .allow_methods(vec![Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/signup", post(handlers_auth::signup))
        .route("/login", post(handlers_auth::login))
        .route("/detect", post(handlers_acne::detect))
        .route("/history/:username", get(handlers_acne::history))
        .route("/users/:username", delete(handlers_auth::delete_user))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}
