//! HTTP API for capturing and querying webhooks.
//!
//! Exposes hook management, the per-hook receive endpoint, webhook listing
//! and health probes on one axum router, documented by an OpenAPI schema.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use webhooked_core::{Clock, Storage};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod server;
pub mod validation;

pub use config::{Config, Environment};
pub use error::{ApiError, ValidationIssue};
pub use server::{create_router, start_server};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Hook and webhook repositories.
    pub storage: Storage,
    /// Immutable service configuration.
    pub config: Arc<Config>,
    /// Time source for response timestamps.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Bundles the state shared by handlers.
    pub fn new(storage: Storage, config: Config, clock: Arc<dyn Clock>) -> Self {
        Self { storage, config: Arc::new(config), clock }
    }
}
