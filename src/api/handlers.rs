use std::sync::Arc;
use axum::{extract::State, http::StatusCode, Json, response::IntoResponse};

use crate::AppState;

pub async fn home() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "Face Authentication & Acne Detection Service",
        "status": "Online"
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (face_detector, face_recognizer) = {
        let guard = state.face_processor.read();
        (guard.scrfd_loaded(), guard.arcface_loaded())
    };
    let acne_detector = state.acne_detector.read().loaded();
    let faces = state.faces.clone();
    let registered_users = tokio::task::spawn_blocking(move || faces.list().map(|u| u.len()).ok())
        .await
        .ok()
        .flatten();

    let body = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "models": {
            "face_detector": face_detector,
            "face_recognizer": face_recognizer,
            "acne_detector": acne_detector,
        },
        "knowledge_base_classes": state.knowledge.len(),
        "registered_users": registered_users,
    });
    (StatusCode::OK, Json(body))
}
