//! Property-based tests for correlation extraction and filter clamping.
//!
//! Extraction must never panic, whatever header names, payloads or path
//! expressions a client configures.

#![allow(clippy::unwrap_used)]

use http::{HeaderMap, HeaderName, HeaderValue};
use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use serde_json::{json, Value};
use webhooked_core::{correlation, HookFilter, WebhookFilter};

/// Deterministic property test configuration for CI stability.
fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 50,
        timeout: 5000,
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

/// Arbitrary JSON values a few levels deep.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 _-]{0,20}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Any path text is either resolved or yields `None`.
    #[test]
    fn payload_extraction_never_panics(path in ".{0,40}", payload in json_strategy()) {
        let _ = correlation::from_payload(&path, &payload);
    }

    /// Any header name is either resolved or yields `None`.
    #[test]
    fn header_extraction_never_panics(name in ".{0,40}") {
        let _ = correlation::from_header(&name, &HeaderMap::new());
    }

    /// Header lookup ignores the case of the configured name.
    #[test]
    fn header_lookup_is_case_insensitive(
        name in "[a-z][a-z0-9-]{0,20}",
        value in "[a-zA-Z0-9]{1,20}",
        upper in any::<bool>(),
    ) {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(&value).unwrap(),
        );
        let lookup = if upper { name.to_uppercase() } else { name.clone() };

        prop_assert_eq!(correlation::from_header(&lookup, &headers), Some(value));
    }

    /// A top-level string field is returned verbatim.
    #[test]
    fn top_level_string_round_trips(key in "[a-z]{1,10}", value in "[a-zA-Z0-9 _-]{0,30}") {
        let payload = json!({ key.clone(): value.clone() });

        prop_assert_eq!(correlation::from_payload(&key, &payload), Some(value));
    }

    /// Filters always end up with a limit inside the accepted range.
    #[test]
    fn filter_limits_stay_in_range(limit in any::<u32>(), offset in any::<u64>()) {
        let hooks = HookFilter::new(limit, offset);
        let webhooks = WebhookFilter::new(limit, offset);

        prop_assert!((1..=HookFilter::MAX_LIMIT).contains(&hooks.limit));
        prop_assert!((1..=WebhookFilter::MAX_LIMIT).contains(&webhooks.limit));
        prop_assert_eq!(hooks.offset, offset);
    }
}
