use std::sync::Arc;
use axum::{extract::{Multipart, Path, State}, http::{header, HeaderMap, HeaderValue}, Json};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::session::AuthUser;
use crate::api::upload::{self, UploadForm};
use crate::auth;
use crate::db;
use crate::pipeline::face;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub status: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub username: String,
    pub score: f32,
    pub face_detected: bool,
    /// Present only on a verified login; also set as the `token` cookie.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LoginResponse {
    fn undetected(username: String) -> Self {
        Self { status: "failed", message: "Wajah tidak terdeteksi", username, score: 1.0, face_detected: false, token: None }
    }
}

pub async fn signup(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult<Json<SignupResponse>> {
    let form = UploadForm::read(multipart).await?;
    let username = form.require_username()?.to_string();
    let bytes = form.require_file()?.clone();

    let store = state.faces.clone();
    let user = username.clone();
    tokio::task::spawn_blocking(move || store.register(&user, &bytes)).await??;

    Ok(Json(SignupResponse {
        status: "success",
        message: format!("User {} berhasil didaftarkan.", username),
    }))
}

/// Compares the upload with the user's reference photo. A face that cannot
/// be embedded is a failed login, not a server error. A verified login gets
/// a signed token in the body and as a cookie.
pub async fn login(State(state): State<Arc<AppState>>, multipart: Multipart) -> ApiResult<(HeaderMap, Json<LoginResponse>)> {
    let form = UploadForm::read(multipart).await?;
    let username = form.require_username()?.to_string();
    if !state.faces.exists(&username) {
        return Err(ApiError::NotFound("User tidak ditemukan".to_string()));
    }
    let bytes = form.require_file()?.clone();
    {
        let guard = state.face_processor.read();
        if !guard.scrfd_loaded() || !guard.arcface_loaded() {
            return Err(ApiError::Unavailable("Model wajah belum siap.".to_string()));
        }
    }

    let threshold = state.config.verify_threshold;
    let processor = state.face_processor.clone();
    let store = state.faces.clone();
    let user = username.clone();
    let mut response = tokio::task::spawn_blocking(move || -> ApiResult<LoginResponse> {
        let uploaded = upload::decode_image(&bytes)?;
        let reference = store
            .load(&user)?
            .ok_or_else(|| ApiError::NotFound("User tidak ditemukan".to_string()))?;
        let processor = processor.read();
        let embeddings = processor
            .embed_largest_face(&uploaded)
            .and_then(|p| processor.embed_largest_face(&reference).map(|r| (p, r)));
        let ((upload_emb, upload_found), (ref_emb, _)) = match embeddings {
            Ok(e) => e,
            Err(e) => {
                warn!("Face embedding failed for {}: {:#}", user, e);
                return Ok(LoginResponse::undetected(user));
            }
        };
        let v = face::verify(&upload_emb, &ref_emb, threshold);
        info!("Login attempt for {}: distance={:.4} verified={}", user, v.distance, v.verified);
        Ok(LoginResponse {
            status: if v.verified { "success" } else { "failed" },
            message: if v.verified { "Login Berhasil" } else { "Wajah tidak cocok" },
            username: user,
            score: v.distance,
            face_detected: upload_found,
            token: None,
        })
    })
    .await??;

    let mut headers = HeaderMap::new();
    if response.status == "success" {
        let ttl = state.config.token_ttl_secs;
        let token = auth::issue_token(&response.username, &state.config.jwt_secret, ttl)?;
        let cookie = HeaderValue::from_str(&auth::session_cookie(&token, ttl))
            .map_err(|e| ApiError::Internal(e.into()))?;
        headers.insert(header::SET_COOKIE, cookie);
        response.token = Some(token);
    }
    Ok((headers, Json(response)))
}

/// Removes the user's history and then their reference photo. History goes
/// first so a database failure leaves the account intact and retryable.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(username): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    user.require(&username)?;
    if !state.faces.exists(&username) {
        return Err(ApiError::NotFound("User tidak ditemukan".to_string()));
    }

    let store = state.faces.clone();
    let pool = state.pool.clone();
    let name = username.clone();
    let (removed, history_rows) = tokio::task::spawn_blocking(move || -> anyhow::Result<(bool, usize)> {
        let conn = pool.get()?;
        let rows = db::writer::delete_analyses_for_user(&conn, &name)?;
        let removed = store.remove(&name)?;
        Ok((removed, rows))
    })
    .await??;

    if !removed {
        return Err(ApiError::NotFound("User tidak ditemukan".to_string()));
    }
    info!("Deleted user {} ({} history rows)", username, history_rows);
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": format!("User {} dihapus.", username),
        "history_removed": history_rows,
    })))
}
