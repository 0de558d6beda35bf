use std::sync::Arc;
use axum::{extract::FromRequestParts, http::{request::Parts, HeaderMap}};
use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::auth;
use crate::AppState;

/// Username taken from a valid login token. Rejects with 401.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser(pub String);

impl AuthUser {
    /// Tokens only grant access to their own user's data.
    pub fn require(&self, username: &str) -> ApiResult<()> {
        if self.0 == username {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Akses ditolak.".to_string()))
        }
    }
}

pub fn authenticate(headers: &HeaderMap, secret: &str) -> ApiResult<AuthUser> {
    let token = auth::token_from_headers(headers)
        .ok_or_else(|| ApiError::Unauthorized("Silakan login terlebih dahulu.".to_string()))?;
    match auth::verify_token(token, secret) {
        Ok(claims) => Ok(AuthUser(claims.sub)),
        Err(e) => {
            warn!("Rejected login token: {:#}", e);
            Err(ApiError::Unauthorized("Token tidak valid.".to_string()))
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        authenticate(&parts.headers, &state.config.jwt_secret)
    }
}
