//! Hardening headers added to every response.
//!
//! Handlers never set these, so each layer only fills a header that is
//! still missing.

use axum::{
    http::{HeaderName, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

/// Policy for the API and the Swagger UI, which loads its assets from
/// cdnjs and uses inline scripts and styles.
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self';\
    base-uri 'self';\
    font-src 'self' https: data:;\
    form-action 'self';\
    frame-ancestors 'self';\
    img-src 'self' data:;\
    object-src 'none';\
    script-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com;\
    script-src-attr 'unsafe-inline';\
    style-src 'self' 'unsafe-inline' https://cdnjs.cloudflare.com;\
    upgrade-insecure-requests";

/// Header names and values set on every response.
pub const SECURITY_HEADERS: [(&str, &str); 12] = [
    ("content-security-policy", CONTENT_SECURITY_POLICY),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=31536000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Wraps `router` so every response carries [`SECURITY_HEADERS`].
pub fn with_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SECURITY_HEADERS.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
