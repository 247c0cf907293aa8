//! Core domain models and storage for webhook capture.
//!
//! Provides strongly-typed identifiers, the hook and webhook entities, the
//! correlation extractor used during ingestion, and the repository layer
//! (PostgreSQL and in-memory) that every other crate builds on.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod correlation;
pub mod error;
pub mod models;
pub mod storage;
pub mod time;

pub use error::{CoreError, Result};
pub use models::{
    CorrelationLocation, Hook, HookFilter, HookId, NewHook, NewWebhook, PaginatedWebhooks,
    Webhook, WebhookFilter, WebhookId, WebhookSavedResponse,
};
pub use storage::{HookRepository, Storage, WebhookRepository};
pub use time::{Clock, RealClock, TestClock};
