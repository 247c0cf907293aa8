//! Correlation value extraction.
//!
//! A hook may name a header or a JSONPath expression whose value ties
//! related webhooks together. Extraction never fails loudly: anything that
//! cannot be resolved yields `None`.

use http::HeaderMap;
use serde_json::Value;
use serde_json_path::JsonPath;
use tracing::{debug, warn};

use crate::models::CorrelationLocation;

/// Extracts the correlation value for a request.
///
/// `headers` are the raw inbound headers and `payload` the normalized JSON
/// body.
pub fn extract(
    location: CorrelationLocation,
    field: &str,
    headers: &HeaderMap,
    payload: &Value,
) -> Option<String> {
    match location {
        CorrelationLocation::Header => from_header(field, headers),
        CorrelationLocation::Payload => from_payload(field, payload),
    }
}

/// Reads a header value, matching the name case-insensitively.
///
/// A header sent more than once is returned as a JSON array of its values.
pub fn from_header(name: &str, headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name.to_ascii_lowercase().as_str())
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect();

    match values.as_slice() {
        [] => None,
        [single] if single.is_empty() => None,
        [single] => Some((*single).to_string()),
        many => serde_json::to_string(many).ok(),
    }
}

/// Evaluates a JSONPath expression against the payload.
///
/// The leading `$` may be omitted: `order.id` is read as `$.order.id`.
pub fn from_payload(path: &str, payload: &Value) -> Option<String> {
    let expression = normalize_path(path);

    let json_path = match JsonPath::parse(&expression) {
        Ok(json_path) => json_path,
        Err(e) => {
            warn!(path = %path, error = %e, "invalid correlation path");
            return None;
        },
    };

    let nodes = json_path.query(payload);
    let node = nodes.first()?;
    let value = match node {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    debug!(path = %path, "correlation value resolved from payload");
    Some(value)
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.starts_with('$') {
        trimmed.to_string()
    } else if trimmed.starts_with('[') || trimmed.starts_with("..") {
        format!("${trimmed}")
    } else {
        format!("$.{trimmed}")
    }
}
