//! Signed login tokens.
//!
//! A successful face login yields an HS256 token whose subject is the
//! username. Clients send it back as `Authorization: Bearer <token>` or in
//! the `token` cookie set by the login response.

use anyhow::{Context, Result};
use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(username: &str, secret: &str, ttl_secs: i64) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims { sub: username.to_string(), iat: now, exp: now + ttl_secs };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .context("Failed to sign login token")
}

/// Checks signature and expiry.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &Validation::default())
        .context("Invalid login token")?;
    Ok(data.claims)
}

/// Bearer header first, then the `token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if bearer.is_some() {
        return bearer;
    }
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("token="))
        .find(|t| !t.is_empty())
}

/// `Set-Cookie` value for the login response.
pub fn session_cookie(token: &str, ttl_secs: i64) -> String {
    format!("{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax", TOKEN_COOKIE, token, ttl_secs.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn token_round_trip_carries_username() {
        let token = issue_token("budi", "secret", 3600).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, "budi");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_and_expired_tokens_fail() {
        let token = issue_token("budi", "secret", 3600).unwrap();
        assert!(verify_token(&token, "other").is_err());
        // well past the default 60 s leeway
        let expired = issue_token("budi", "secret", -3600).unwrap();
        assert!(verify_token(&expired, "secret").is_err());
        assert!(verify_token("not.a.token", "secret").is_err());
    }

    #[test]
    fn token_is_read_from_bearer_or_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc.def"));
        assert_eq!(token_from_headers(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(token_from_headers(&headers), Some("xyz"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(token_from_headers(&headers), Some("abc.def"));
    }

    #[test]
    fn cookie_is_http_only() {
        let c = session_cookie("abc", 60);
        assert!(c.starts_with("token=abc;"));
        assert!(c.contains("HttpOnly"));
        assert!(c.contains("Max-Age=60"));
    }
}
