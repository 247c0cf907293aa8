//! Response contract assertions.
//!
//! Each function panics with a descriptive message when a JSON response
//! does not have the documented shape. Used by tests only; production
//! responses are built from typed structs.

use chrono::DateTime;
use serde_json::Value;

fn field<'a>(value: &'a Value, key: &str, context: &str) -> &'a Value {
    value
        .get(key)
        .unwrap_or_else(|| panic!("{context}: missing field `{key}` in {value}"))
}

fn assert_string(value: &Value, key: &str, context: &str) {
    assert!(field(value, key, context).is_string(), "{context}: `{key}` must be a string in {value}");
}

fn assert_nullable_string(value: &Value, key: &str, context: &str) {
    let v = field(value, key, context);
    assert!(v.is_string() || v.is_null(), "{context}: `{key}` must be a string or null in {value}");
}

fn assert_timestamp(value: &Value, key: &str, context: &str) {
    let raw = field(value, key, context)
        .as_str()
        .unwrap_or_else(|| panic!("{context}: `{key}` must be a string in {value}"));
    assert!(
        DateTime::parse_from_rfc3339(raw).is_ok(),
        "{context}: `{key}` must be an RFC 3339 timestamp, got {raw}"
    );
}

fn assert_keys(value: &Value, expected: &[&str], context: &str) {
    let object = value.as_object().unwrap_or_else(|| panic!("{context}: expected object, got {value}"));
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected = expected.to_vec();
    expected.sort_unstable();
    assert_eq!(keys, expected, "{context}: unexpected keys in {value}");
}

/// Asserts a serialized hook, including the derived `hook_url`.
pub fn assert_hook(value: &Value) {
    let ctx = "hook";
    assert_keys(
        value,
        &[
            "id",
            "name",
            "description",
            "correlation_identifier_location",
            "correlation_identifier_field",
            "created_at",
            "hook_url",
        ],
        ctx,
    );
    assert_string(value, "id", ctx);
    assert_string(value, "name", ctx);
    assert_string(value, "description", ctx);
    assert_nullable_string(value, "correlation_identifier_field", ctx);
    assert_timestamp(value, "created_at", ctx);

    let location = field(value, "correlation_identifier_location", ctx);
    assert!(
        location.is_null() || *location == "header" || *location == "payload",
        "{ctx}: invalid correlation_identifier_location {location}"
    );

    let id = value["id"].as_str().unwrap_or_default();
    assert_eq!(
        value["hook_url"],
        format!("/api/hooks/{id}/webhooks/receive"),
        "{ctx}: hook_url must be derived from id"
    );
}

/// Asserts the acknowledgement returned by the receive endpoint.
pub fn assert_saved_webhook(value: &Value) {
    let ctx = "saved webhook";
    assert_keys(value, &["id", "hook_id", "correlation_value", "created_at"], ctx);
    assert_string(value, "id", ctx);
    assert_string(value, "hook_id", ctx);
    assert_nullable_string(value, "correlation_value", ctx);
    assert_timestamp(value, "created_at", ctx);
}

/// Asserts a full stored webhook.
pub fn assert_webhook(value: &Value) {
    let ctx = "webhook";
    assert_keys(
        value,
        &["id", "hook_id", "method", "query", "payload", "headers", "correlation_value", "created_at"],
        ctx,
    );
    assert_string(value, "id", ctx);
    assert_string(value, "hook_id", ctx);
    assert_string(value, "method", ctx);
    assert!(value["query"].is_object(), "{ctx}: query must be an object");
    assert!(value["payload"].is_object(), "{ctx}: payload must be an object");
    let headers = value["headers"]
        .as_object()
        .unwrap_or_else(|| panic!("{ctx}: headers must be an object"));
    assert!(headers.values().all(Value::is_string), "{ctx}: header values must be strings");
    assert_nullable_string(value, "correlation_value", ctx);
    assert_timestamp(value, "created_at", ctx);
}

/// Asserts the paginated webhook envelope and every webhook in it.
pub fn assert_paginated_webhooks(value: &Value) {
    let ctx = "paginated webhooks";
    assert_keys(value, &["data", "limit", "offset", "total"], ctx);
    for key in ["limit", "offset", "total"] {
        assert!(field(value, key, ctx).is_u64(), "{ctx}: `{key}` must be a non-negative integer");
    }

    let data = value["data"].as_array().unwrap_or_else(|| panic!("{ctx}: data must be an array"));
    let limit = value["limit"].as_u64().unwrap_or_default();
    assert!(data.len() as u64 <= limit, "{ctx}: {} rows exceed limit {limit}", data.len());
    data.iter().for_each(assert_webhook);
}

/// Asserts an error body, optionally with schema violation details.
pub fn assert_error(value: &Value) {
    let ctx = "error";
    assert_string(value, "error", ctx);
    assert_string(value, "message", ctx);

    if let Some(details) = value.get("details") {
        let issues = details["issues"]
            .as_array()
            .unwrap_or_else(|| panic!("{ctx}: details.issues must be an array"));
        for issue in issues {
            assert_string(issue, "path", ctx);
            assert_string(issue, "message", ctx);
        }
        assert_string(details, "method", ctx);
        assert_string(details, "url", ctx);
    }
}
