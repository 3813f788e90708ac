//! Error types for the HTTP service.
//!
//! The webhook contract deliberately exposes only two failure responses:
//! `403 No access` for callers that cannot prove their identity and
//! `500 Invalid request` for everything else. Event Grid retries 500s,
//! which is the desired behavior for transient enqueue failures, and the
//! terse bodies keep internals away from unauthenticated callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Rejection of a single webhook request.
///
/// Carries no detail on purpose; the cause is logged server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IngestRejection {
    /// Caller failed bearer token verification
    #[error("caller is not authorized")]
    Forbidden,

    /// Request is not a deliverable event (wrong content type, undecodable
    /// envelope, unsupported event type, or a failed enqueue)
    #[error("request cannot be accepted")]
    Invalid,
}

impl IntoResponse for IngestRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => (StatusCode::FORBIDDEN, "No access").into_response(),
            Self::Invalid => (StatusCode::INTERNAL_SERVER_ERROR, "Invalid request").into_response(),
        }
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Queue is unavailable: {message}")]
    QueueUnavailable { message: String },
}

impl ServiceError {
    /// Process exit code the service binary reports for this failure class
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
            Self::QueueUnavailable { .. } => 4,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
