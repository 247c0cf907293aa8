//! HTTP middleware for request processing.
//!
//! Provides the shared-key check guarding hook creation and the hardening
//! headers set on every response.
pub mod auth;
pub mod security_headers;
