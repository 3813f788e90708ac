//! Caller authentication for webhook requests.
//!
//! Event Grid secure-webhook delivery attaches a bearer token issued by the
//! Microsoft identity platform to every request, including the subscription
//! validation handshake. This module provides:
//!
//! - [`bearer_token`] - extraction from the Authorization header
//! - [`TokenVerifier`] - the verification seam the HTTP layer depends on
//! - [`EntraIdTokenVerifier`] - production verifier (JWKS + RS256)
//! - [`JwksStore`] - fetching and caching of the published signing keys

pub mod jwks;
pub mod verifier;

pub use jwks::{JsonWebKey, JwksSettings, JwksStore};
pub use verifier::{EntraIdTokenVerifier, VerifierSettings};

use crate::error::AuthError;
use async_trait::async_trait;

/// Role claim Event Grid's delivery identity carries for secure webhooks
pub const EVENT_GRID_SUBSCRIBER_ROLE: &str = "AzureEventGridSecureWebhookSubscriber";

/// Identity extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedCaller {
    /// The token subject: the sender application's object id
    pub subject: String,
    /// Calling application id from the `azp`/`oid` claims, when present
    pub application_id: Option<String>,
}

/// Verifies bearer tokens presented by webhook callers
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify a raw bearer token, returning the caller identity on success
    async fn verify(&self, token: &str) -> Result<VerifiedCaller, AuthError>;
}

/// Extract the bearer token from an Authorization header value.
///
/// The value is split on whitespace and the second field taken; the scheme
/// word itself is not inspected. A missing header and a header with no second
/// field are both [`AuthError::MissingToken`].
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|value| value.split_whitespace().nth(1))
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
