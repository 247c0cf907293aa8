//! API key authentication middleware.
//!
//! Compares the `x-api-key` header against the configured key. Only routes
//! that mutate hook configuration are wrapped; webhook capture stays open.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::ApiError, AppState};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extracts the API key from the `x-api-key` header.
fn extract_api_key(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()).filter(|key| !key.is_empty())
}

/// Compares keys without short-circuiting on the first differing byte.
fn keys_match(provided: &str, expected: &str) -> bool {
    let (a, b) = (provided.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Axum middleware that rejects requests without the configured API key.
///
/// # Errors
///
/// Returns `ApiError::Unauthorized` when the header is missing or wrong.
pub async fn auth_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let api_key = extract_api_key(req.headers()).ok_or(ApiError::Unauthorized("Missing API key"))?;

    if !keys_match(api_key, &state.config.api_key) {
        warn!(path = %req.uri().path(), "rejected request with invalid API key");
        return Err(ApiError::Unauthorized("Invalid API key"));
    }

    Ok(next.run(req).await)
}
