#![no_main]

//! Fuzz target for correlation extraction.
//!
//! Feeds arbitrary JSONPath expressions, header names and payload bytes
//! through the extractor. Extraction must never panic: unparseable paths,
//! invalid header names and non-object payloads all resolve to `None`.

use http::{HeaderMap, HeaderName, HeaderValue};
use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use webhooked_core::{correlation, CorrelationLocation};

fuzz_target!(|data: &[u8]| {
    // First line is the field, the rest is the payload.
    let (field, payload) = match data.iter().position(|b| *b == b'\n') {
        Some(split) => (&data[..split], &data[split + 1..]),
        None => (data, &[][..]),
    };
    let Ok(field) = std::str::from_utf8(field) else { return };

    let payload: Value = serde_json::from_slice(payload).unwrap_or(Value::Null);

    let mut headers = HeaderMap::new();
    if let (Ok(name), Ok(value)) =
        (HeaderName::from_bytes(field.as_bytes()), HeaderValue::from_bytes(data))
    {
        headers.append(name, value);
    }

    let _ = correlation::extract(CorrelationLocation::Payload, field, &headers, &payload);
    let _ = correlation::extract(CorrelationLocation::Header, field, &headers, &payload);
});
