//! Health check handlers for service monitoring.
//!
//! Liveness only proves the process answers HTTP. Readiness also pings the
//! database so orchestrators stop routing traffic when it is unreachable.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;
use webhooked_core::{Clock, Storage};

use crate::AppState;

/// Liveness response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessResponse {
    /// Always `ok`.
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
}

/// Readiness response structure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessResponse {
    /// Overall readiness
    pub status: ReadinessStatus,
    /// When the check ran
    pub timestamp: DateTime<Utc>,
    /// Database probe result
    pub database: ComponentHealth,
    /// Service version
    pub version: String,
}

/// Overall readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    /// Ready to serve traffic
    Ok,
    /// A dependency is down
    Unavailable,
}

/// Health status for individual components.
#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Optional error message if unhealthy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response time in milliseconds
    pub response_time_ms: u64,
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Component is healthy
    Up,
    /// Component is experiencing issues
    Down,
}

/// Runs readiness probes with an injected clock.
pub struct HealthService {
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Creates a new health service with the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Checks every dependency the service needs to handle requests.
    pub async fn readiness(&self, storage: &Storage) -> ReadinessResponse {
        let timestamp = self.clock.now_utc();
        let start = self.clock.now();

        let result = storage.health_check().await;
        let response_time_ms =
            u64::try_from(self.clock.now().duration_since(start).as_millis()).unwrap_or(u64::MAX);

        let database = match result {
            Ok(()) => {
                debug!("Database health check passed");
                ComponentHealth { status: ComponentStatus::Up, message: None, response_time_ms }
            },
            Err(e) => {
                error!("Database health check failed: {}", e);
                ComponentHealth {
                    status: ComponentStatus::Down,
                    message: Some(format!("Database connection failed: {e}")),
                    response_time_ms,
                }
            },
        };

        let status = match database.status {
            ComponentStatus::Up => ReadinessStatus::Ok,
            ComponentStatus::Down => ReadinessStatus::Unavailable,
        };

        ReadinessResponse {
            status,
            timestamp,
            database,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/healthcheck/liveness",
    tag = "healthcheck",
    responses(
        (status = 200, description = "Process is serving HTTP", body = LivenessResponse)
    )
)]
/// Liveness probe: `{"status":"ok"}` while the process serves HTTP.
#[instrument(name = "liveness_check")]
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse { status: "ok" })
}

#[utoipa::path(
    get,
    path = "/api/healthcheck/readiness",
    tag = "healthcheck",
    responses(
        (status = 200, description = "Database reachable", body = ReadinessResponse),
        (status = 503, description = "Database unreachable", body = ReadinessResponse)
    )
)]
/// Readiness probe: 200 when the database answers, 503 otherwise.
#[instrument(name = "readiness_check", skip(state))]
pub async fn readiness(State(state): State<AppState>) -> Response {
    let response = HealthService::new(state.clock.clone()).readiness(&state.storage).await;

    let status_code = match response.status {
        ReadinessStatus::Ok => StatusCode::OK,
        ReadinessStatus::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response)).into_response()
}
