#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use axum::serve;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, RgbImage};
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Duration;
use dermaface::advice::KnowledgeBase;
use dermaface::api::routes;
use dermaface::auth;
use dermaface::db;
use dermaface::store::faces::FaceStore;
use dermaface::utils::config::Config;
use dermaface::AppState;

/// Config rooted in a temp dir, with downloads off and no acne model.
pub fn test_config(data: &Path) -> Config {
    Config {
        data: data.to_path_buf(),
        port: 0,
        detect_confidence: 0.25,
        detect_iou: 0.45,
        min_brightness: 40.0,
        min_sharpness: 50.0,
        max_box_width_ratio: 0.15,
        verify_threshold: 0.68,
        model_auto_download: false,
        acne_model: data.join("models").join("missing.onnx"),
        jwt_secret: "test-secret".to_string(),
        token_ttl_secs: 3600,
    }
}

/// AppState without any model loaded.
pub fn create_test_app_state(data: &Path) -> Arc<AppState> {
    let cfg = test_config(data);
    let pool = db::create_pool(cfg.db_path(), 4).unwrap();
    let faces = FaceStore::open(cfg.faces_dir()).unwrap();
    Arc::new(AppState::new(cfg, pool, faces, KnowledgeBase::default()))
}

pub async fn wait_for_port(port: u16) {
    for _ in 0..30 {
        if TcpStream::connect(("127.0.0.1", port)).await.is_ok() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("Server never started");
}

pub struct TestServer {
    pub tmp: TempDir,
    pub state: Arc<AppState>,
    pub base: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.tmp.path().to_path_buf()
    }

    /// What a verified login would hand back for `username`.
    pub fn token_for(&self, username: &str) -> String {
        let cfg = &self.state.config;
        auth::issue_token(username, &cfg.jwt_secret, cfg.token_ttl_secs).unwrap()
    }

    pub fn bearer(&self, username: &str) -> String {
        format!("Bearer {}", self.token_for(username))
    }
}

/// Serves the router on an ephemeral port.
pub async fn spawn_server() -> TestServer {
    let tmp = TempDir::new().unwrap();
    let state = create_test_app_state(tmp.path());
    let app = routes::router(state.clone());
    let addr = SocketAddr::from(([127, 0, 0, 1], 0));
    let listener = TcpListener::bind(&addr).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        serve(listener, app.into_make_service()).await.unwrap();
    });
    wait_for_port(port).await;
    TestServer { tmp, state, base: format!("http://127.0.0.1:{}", port), client: reqwest::Client::new() }
}

fn encode(img: &DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Bright checkerboard: passes both the brightness and the sharpness gate.
pub fn textured_jpeg() -> Vec<u8> {
    let img = GrayImage::from_fn(128, 128, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 { Luma([230]) } else { Luma([70]) }
    });
    encode(&DynamicImage::ImageLuma8(img), ImageOutputFormat::Jpeg(95))
}

pub fn dark_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, image::Rgb([8, 6, 5]));
    encode(&DynamicImage::ImageRgb8(img), ImageOutputFormat::Png)
}

/// Bright but uniform, so it fails only on sharpness.
pub fn flat_png() -> Vec<u8> {
    let img = RgbImage::from_pixel(64, 64, image::Rgb([180, 160, 150]));
    encode(&DynamicImage::ImageRgb8(img), ImageOutputFormat::Png)
}

pub fn image_part(bytes: Vec<u8>, name: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(bytes).file_name(name.to_string())
}

pub fn form_with(username: Option<&str>, file: Option<(Vec<u8>, &str)>) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    if let Some(u) = username {
        form = form.text("username", u.to_string());
    }
    if let Some((bytes, name)) = file {
        form = form.part("file", image_part(bytes, name));
    }
    form
}
