//! HTTP request handlers.
//!
//! Handlers are grouped by resource:
//! - `hooks` - hook creation, lookup and listing
//! - `receive` - webhook capture on the per-hook receive endpoint
//! - `webhooks` - paginated listing of captured webhooks
//! - `health` - liveness and readiness probes
//!
//! Every handler returns `ApiError` on failure so error bodies share one
//! shape.

pub mod health;
pub mod hooks;
pub mod receive;
pub mod webhooks;
