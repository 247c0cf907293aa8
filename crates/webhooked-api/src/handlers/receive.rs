//! Webhook capture handler.
//!
//! Accepts any supported method on `/api/hooks/{hook_id}/webhooks/receive`,
//! normalizes the request into headers, query and JSON payload, extracts the
//! hook's correlation value and stores the result.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use webhooked_core::{correlation, HookId, NewWebhook, WebhookSavedResponse};

use crate::{
    error::{ApiError, ErrorResponse},
    AppState,
};

#[utoipa::path(
    method(get, post, put, patch, delete, head),
    path = "/api/hooks/{hook_id}/webhooks/receive",
    tag = "webhooks",
    params(("hook_id" = String, Path, description = "Hook id")),
    responses(
        (status = 201, description = "Webhook stored; HEAD responses carry no body", body = WebhookSavedResponse),
        (status = 400, description = "JSON content type with a body that is not an object", body = ErrorResponse),
        (status = 404, description = "No hook with this id", body = ErrorResponse)
    )
)]
/// Captures one inbound request for a hook.
///
/// # Errors
///
/// Returns 404 when the hook does not exist and 400 when a JSON content type
/// carries something other than a JSON object.
#[instrument(
    name = "receive_webhook",
    skip(state, headers, uri, body),
    fields(content_length = body.len())
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(hook_id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let hook_id = HookId::from(hook_id);

    let Some(hook) = state.storage.hooks.find_by_id(&hook_id).await? else {
        warn!("Webhook received for unknown hook");
        return Err(ApiError::receive_hook_missing(&hook_id));
    };

    let payload = Value::Object(normalize_body(&headers, &body)?);
    let query = capture_query(&uri);
    let captured_headers = capture_headers(&headers);

    let correlation_value = hook
        .correlation()
        .and_then(|(location, field)| correlation::extract(location, field, &headers, &payload));
    debug!(correlation_value = ?correlation_value, "Correlation resolved");

    let payload = match payload {
        Value::Object(object) => object,
        _ => Map::new(),
    };

    let saved = state
        .storage
        .webhooks
        .create(NewWebhook {
            hook_id: hook.id.clone(),
            method: method.to_string(),
            query,
            payload,
            headers: captured_headers,
            correlation_value,
        })
        .await?;

    info!("Received {} webhook for {}", method, hook.id);

    if method == Method::HEAD {
        return Ok(StatusCode::CREATED.into_response());
    }

    let body = serde_json::to_value(&saved).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// Turns the raw body into the stored JSON payload.
///
/// Bodies are only parsed when the content type says JSON; anything else is
/// stored as `{}`.
///
/// # Errors
///
/// Returns `ApiError::InvalidBody` when a JSON body is not a JSON object.
pub fn normalize_body(headers: &HeaderMap, body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    if !is_json {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(other) => {
            debug!(kind = ?other, "JSON body is not an object");
            Err(ApiError::InvalidBody)
        },
        Err(e) => {
            debug!(error = %e, "JSON body failed to parse");
            Err(ApiError::InvalidBody)
        },
    }
}

/// Collects headers under lower-cased names, joining repeats with `", "`.
///
/// Values that are not visible ASCII are dropped.
pub fn capture_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut captured: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        captured
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }

    captured
}

/// Collects query parameters; a repeated key becomes an array of strings.
pub fn capture_query(uri: &Uri) -> Map<String, Value> {
    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => {
            warn!(error = %e, "Unparseable query string, storing none");
            Vec::new()
        },
    };

    let mut query = Map::new();
    for (key, value) in pairs {
        match query.get_mut(&key) {
            None => {
                query.insert(key, Value::String(value));
            },
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            },
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;
    use serde_json::json;

    use super::*;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("Application/JSON; charset=utf-8"));
        headers
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(normalize_body(&json_headers(), b"").unwrap(), Map::new());
        assert_eq!(normalize_body(&HeaderMap::new(), b"  \n").unwrap(), Map::new());
    }

    #[test]
    fn json_object_body_is_kept() {
        let payload = normalize_body(&json_headers(), br#"{"order":{"id":7}}"#).unwrap();

        assert_eq!(Value::Object(payload), json!({"order": {"id": 7}}));
    }

    #[test]
    fn non_object_json_is_rejected() {
        for body in [&b"[1,2]"[..], b"42", b"null", b"\"text\"", b"{broken"] {
            assert!(matches!(normalize_body(&json_headers(), body), Err(ApiError::InvalidBody)));
        }
    }

    #[test]
    fn non_json_content_type_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        assert_eq!(normalize_body(&headers, b"hello").unwrap(), Map::new());
        assert_eq!(normalize_body(&HeaderMap::new(), br#"{"a":1}"#).unwrap(), Map::new());
    }

    #[test]
    fn headers_are_lowercased_and_joined() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Order-Id", HeaderValue::from_static("42"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));
        headers.insert("x-binary", HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap());

        let captured = capture_headers(&headers);

        assert_eq!(captured.get("x-order-id").map(String::as_str), Some("42"));
        assert_eq!(captured.get("x-tag").map(String::as_str), Some("a, b"));
        assert!(!captured.contains_key("x-binary"));
    }

    #[test]
    fn repeated_query_keys_become_arrays() {
        let uri: Uri = "/receive?tag=a&tag=b&tag=c&single=1&empty=".parse().unwrap();

        let query = capture_query(&uri);

        assert_eq!(Value::Object(query), json!({
            "tag": ["a", "b", "c"],
            "single": "1",
            "empty": "",
        }));
    }

    #[test]
    fn missing_query_is_empty() {
        let uri: Uri = "/receive".parse().unwrap();

        assert!(capture_query(&uri).is_empty());
    }
}
