//! Bearer token verification against the Microsoft identity platform.
//!
//! [`EntraIdTokenVerifier`] accepts the RS256 tokens Event Grid attaches to
//! secure-webhook deliveries. A token passes when all of the following hold:
//!
//! 1. its header names a `kid` published in the tenant's JWKS document,
//! 2. the signature verifies against that key,
//! 3. `aud` matches the receiver application, `iss` matches the tenant,
//!    and the token has not expired,
//! 4. `sub` matches the expected sender application,
//! 5. the `roles` claim contains the Event Grid subscriber role.

use super::jwks::{JwksSettings, JwksStore};
use super::{TokenVerifier, VerifiedCaller, EVENT_GRID_SUBSCRIBER_ROLE};
use crate::error::AuthError;
use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::debug;

/// Settings for an [`EntraIdTokenVerifier`]
#[derive(Debug, Clone)]
pub struct VerifierSettings {
    /// JWKS endpoint publishing the tenant's signing keys
    pub jwks_uri: String,
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim: the receiver application id URI
    pub audience: String,
    /// Expected `sub` claim: the sender application's object id
    pub subject: String,
    /// Cache behavior for the signing key store
    pub jwks: JwksSettings,
}

#[derive(Debug, Deserialize)]
struct EntraClaims {
    sub: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
    azp: Option<String>,
    oid: Option<String>,
}

/// Token verifier backed by the tenant's published signing keys
#[derive(Debug)]
pub struct EntraIdTokenVerifier {
    keys: JwksStore,
    issuer: String,
    audience: String,
    subject: String,
}

impl EntraIdTokenVerifier {
    /// Create a verifier from settings.
    ///
    /// Fails when any of the expected claim values is empty; a verifier that
    /// accepts arbitrary issuers or subjects must not come into existence.
    pub fn new(settings: VerifierSettings) -> Result<Self, AuthError> {
        for (value, name) in [
            (&settings.jwks_uri, "jwks_uri"),
            (&settings.issuer, "issuer"),
            (&settings.audience, "audience"),
            (&settings.subject, "subject"),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::Configuration {
                    message: format!("token verifier requires a non-empty {name}"),
                });
            }
        }

        let keys = JwksStore::new(settings.jwks_uri, settings.jwks)?;

        Ok(Self {
            keys,
            issuer: settings.issuer,
            audience: settings.audience,
            subject: settings.subject,
        })
    }
}

#[async_trait]
impl TokenVerifier for EntraIdTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedCaller, AuthError> {
        let header = decode_header(token).map_err(|err| AuthError::MalformedToken {
            message: format!("undecodable token header: {err}"),
        })?;
        let kid = header.kid.ok_or_else(|| AuthError::MalformedToken {
            message: "token header carries no kid".to_string(),
        })?;

        let key = self.keys.signing_key(&kid).await?;
        let decoding_key =
            DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|err| AuthError::KeyFetch {
                message: format!("unusable RSA key '{kid}': {err}"),
            })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);

        let token_data = decode::<EntraClaims>(token, &decoding_key, &validation).map_err(|err| {
            AuthError::InvalidToken {
                message: err.to_string(),
            }
        })?;
        let claims = token_data.claims;

        let subject = claims.sub.ok_or_else(|| AuthError::InvalidToken {
            message: "token carries no sub claim".to_string(),
        })?;
        if subject != self.subject {
            return Err(AuthError::SubjectMismatch { subject });
        }

        if !claims
            .roles
            .iter()
            .any(|role| role == EVENT_GRID_SUBSCRIBER_ROLE)
        {
            return Err(AuthError::MissingRole {
                role: EVENT_GRID_SUBSCRIBER_ROLE.to_string(),
            });
        }

        debug!(subject = %subject, "Caller token verified");

        Ok(VerifiedCaller {
            subject,
            application_id: claims.azp.or(claims.oid),
        })
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
