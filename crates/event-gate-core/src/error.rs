//! Error types for authentication, event decoding, and processing.

use event_gate_queue::QueueError;
use thiserror::Error;

/// Authentication failures.
///
/// Every variant maps to a 403 response; the distinctions exist for logs and
/// tests, not for callers of the HTTP surface.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The Authorization header was absent or carried no token
    #[error("authorization header carries no bearer token")]
    MissingToken,

    /// The token could not be parsed at all
    #[error("token is malformed: {message}")]
    MalformedToken { message: String },

    /// No published signing key matches the token's key id
    #[error("no signing key matches kid '{kid}'")]
    UnknownKey { kid: String },

    /// The JWKS endpoint could not be fetched or parsed
    #[error("failed to fetch signing keys: {message}")]
    KeyFetch { message: String },

    /// Signature, audience, issuer, or lifetime validation failed
    #[error("token validation failed: {message}")]
    InvalidToken { message: String },

    /// The token is valid but was issued to a different subject
    #[error("token subject '{subject}' is not the expected sender")]
    SubjectMismatch { subject: String },

    /// The token is valid but lacks the required role claim
    #[error("token does not carry required role '{role}'")]
    MissingRole { role: String },

    /// The verifier itself was misconfigured
    #[error("verifier configuration is invalid: {message}")]
    Configuration { message: String },
}

/// Failures turning a CloudEvents envelope into a known event
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventDecodeError {
    /// The envelope declares a CloudEvents version we do not speak
    #[error("unsupported CloudEvents version '{version}', expected '1.0'")]
    UnsupportedSpecVersion { version: String },

    /// The `type` tag matches none of the known event notations
    #[error("unrecognized event type '{event_type}'")]
    UnknownEventType { event_type: String },

    /// The `data` payload does not match the shape the `type` tag promises
    #[error("payload does not match event type '{event_type}': {message}")]
    PayloadMismatch { event_type: String, message: String },
}

/// Failures while dispatching an accepted envelope
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// The envelope failed validation or tag-dispatched decoding
    #[error(transparent)]
    Decode(#[from] EventDecodeError),

    /// The event payload could not be re-serialized for the queue
    #[error("failed to serialize event payload: {message}")]
    PayloadSerialization { message: String },

    /// The queue provider rejected the send
    #[error("failed to enqueue event: {0}")]
    Enqueue(#[from] QueueError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
