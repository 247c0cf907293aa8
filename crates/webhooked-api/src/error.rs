//! HTTP error type shared by every handler.
//!
//! All failures render as `{"error": ..., "message": ...}`; schema
//! violations add a `details` object listing each offending field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use webhooked_core::{CoreError, HookId};

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    /// Dotted path of the offending field.
    pub path: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationIssue {
    /// Creates an issue for `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { path: path.into(), message: message.into() }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Short error label.
    #[schema(example = "INVALID_REQUEST_BODY")]
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// Field-level issues, for schema violations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ValidationDetails>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { error: error.into(), message: message.into(), details: None }
    }
}

/// Where and why a request failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationDetails {
    /// Every violation found.
    pub issues: Vec<ValidationIssue>,
    /// Request method.
    pub method: String,
    /// Request URL (path and query).
    pub url: String,
}

/// Errors returned by API handlers and extractors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body or query does not match the expected schema.
    #[error("request doesn't match the expected schema")]
    SchemaValidation {
        /// Every violation found.
        issues: Vec<ValidationIssue>,
        /// Request method.
        method: String,
        /// Request URL (path and query).
        url: String,
    },

    /// Missing or wrong API key.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Referenced entity does not exist.
    #[error("{message}")]
    NotFound {
        /// Short error label.
        error: &'static str,
        /// Human-readable detail.
        message: String,
    },

    /// JSON content type with a body that is not a JSON object.
    #[error("request body must be valid JSON")]
    InvalidBody,

    /// A response could not be serialized.
    #[error("response serialization failed: {0}")]
    Serialization(String),

    /// Storage failure.
    #[error(transparent)]
    Internal(#[from] CoreError),
}

impl ApiError {
    /// 404 for `GET /api/hooks/{id}`.
    pub fn hook_not_found() -> Self {
        Self::NotFound { error: "Not Found", message: "Hook not found".to_string() }
    }

    /// 404 for the receive endpoint.
    pub fn receive_hook_missing(hook_id: &HookId) -> Self {
        Self::NotFound {
            error: "DATA_NOT_FOUND",
            message: format!("Hook with id {hook_id} does not exist"),
        }
    }

    /// 404 for webhook listing under a missing hook.
    pub fn parent_hook_missing(hook_id: &HookId) -> Self {
        Self::NotFound {
            error: "Hook not found",
            message: format!("Hook with ID {hook_id} does not exist"),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SchemaValidation { .. } | Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Serialization(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            Self::SchemaValidation { issues, method, url } => {
                warn!(%method, %url, issue_count = issues.len(), "request failed validation");
                ErrorResponse {
                    details: Some(ValidationDetails { issues, method, url }),
                    ..ErrorResponse::new(
                        "INVALID_REQUEST_BODY",
                        "Request doesn't match the expected schema",
                    )
                }
            },
            Self::Unauthorized(message) => ErrorResponse::new("Unauthorized", message),
            Self::NotFound { error, message } => ErrorResponse::new(error, message),
            Self::InvalidBody => {
                ErrorResponse::new("INVALID_BODY", "Request body must be valid JSON")
            },
            Self::Serialization(detail) => {
                error!(%detail, "response failed to serialize");
                ErrorResponse::new("Internal Server Error", "Response doesn't match the schema")
            },
            Self::Internal(err) => {
                error!(error = %err, "unhandled storage error");
                ErrorResponse::new(
                    "Internal Server Error",
                    format!("An unexpected error occurred: {err}"),
                )
            },
        };

        (status, Json(body)).into_response()
    }
}
