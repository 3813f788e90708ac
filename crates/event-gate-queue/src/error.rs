//! Error types for queue operations.

use thiserror::Error;

/// Errors produced by queue providers and the client facade
#[derive(Debug, Error)]
pub enum QueueError {
    /// The target queue does not exist on the provider
    #[error("queue '{queue_name}' does not exist")]
    QueueNotFound { queue_name: String },

    /// Could not reach the queue service
    #[error("queue connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The provider rejected our credentials
    #[error("queue authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// Message body exceeds the provider's size limit
    #[error("message size {size} exceeds maximum of {max_size} bytes")]
    MessageTooLarge { size: usize, max_size: usize },

    /// Provider-specific failure that does not fit another variant
    #[error("provider '{provider}' returned {code}: {message}")]
    Provider {
        provider: String,
        code: String,
        message: String,
    },

    /// Client-side configuration problem (bad connection string, etc.)
    #[error("queue configuration is invalid: {message}")]
    Configuration { message: String },

    /// A domain value failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl QueueError {
    /// Whether retrying the same operation could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            QueueError::ConnectionFailed { .. } => true,
            QueueError::Provider { code, .. } => {
                code == "429"
                    || code.starts_with('5')
                    || matches!(
                        code.as_str(),
                        "ServerBusy" | "InternalError" | "OperationTimedOut"
                    )
            }
            _ => false,
        }
    }
}

/// Validation errors for queue domain values
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required value was empty or absent
    #[error("{field} is required")]
    Required { field: String },

    /// A value did not match the expected format
    #[error("{field} has invalid format: {message}")]
    InvalidFormat { field: String, message: String },

    /// A value fell outside the allowed range
    #[error("{field} is out of range: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
