//! # Event Gate Core
//!
//! Domain model and core services for the Event Grid webhook ingest service:
//!
//! - [`events`] - CloudEvents envelope and the reissue event payloads it
//!   carries, with tag-dispatched decoding that fails closed
//! - [`auth`] - bearer token extraction and verification against the
//!   Microsoft identity platform (JWKS fetch, RS256 signature, audience,
//!   issuer, subject, and role checks)
//! - [`processing`] - dispatching an accepted envelope onto the durable queue
//! - [`error`] - error types shared by the modules above

// Module declarations
pub mod auth;
pub mod error;
pub mod events;
pub mod processing;

// Re-export commonly used types at crate root for convenience
pub use auth::{
    bearer_token, EntraIdTokenVerifier, JwksSettings, JwksStore, TokenVerifier, VerifiedCaller,
    VerifierSettings, EVENT_GRID_SUBSCRIBER_ROLE,
};
pub use error::{AuthError, EventDecodeError, ProcessingError};
pub use events::{
    CloudEvent, CompletedEvent, CompletionStatus, EventKind, InitEvent, ReissueEvent,
    CLOUD_EVENTS_CONTENT_TYPE, CLOUD_EVENTS_SPEC_VERSION, REISSUE_COMPLETED_EVENT_TYPE,
    REISSUE_INIT_EVENT_TYPE,
};
pub use processing::{EventProcessor, ProcessedEvent, QueueEventProcessor};
