//! Fetching and caching of JSON Web Key Sets.
//!
//! The Microsoft identity platform publishes its token signing keys at a
//! well-known JWKS endpoint and rotates them regularly. [`JwksStore`] keeps
//! the published keys in memory and refreshes them when the cache TTL lapses
//! or a token arrives bearing a `kid` the cache has not seen. A refresh
//! cooldown keeps requests with bogus key ids from hammering the endpoint.

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A single RSA signing key from a JWKS document
#[derive(Debug, Clone, Deserialize)]
pub struct JsonWebKey {
    /// Key type; the store retains `RSA` keys only
    pub kty: String,
    /// Key identifier, matched against the `kid` of incoming token headers
    pub kid: String,
    /// RSA modulus, base64url encoded
    pub n: String,
    /// RSA public exponent, base64url encoded
    pub e: String,
    /// Intended key use; signing keys carry `sig` or omit the field
    #[serde(rename = "use")]
    pub use_: Option<String>,
}

// Keys are held as raw JSON until individually parsed; a non-RSA key whose
// shape does not match [`JsonWebKey`] must not poison the whole document.
#[derive(Debug, Deserialize)]
struct JsonWebKeySet {
    keys: Vec<serde_json::Value>,
}

/// Cache behavior for a [`JwksStore`]
#[derive(Debug, Clone)]
pub struct JwksSettings {
    /// How long a fetched document is served without refreshing
    pub cache_ttl: Duration,
    /// Minimum pause between refresh attempts
    pub refresh_cooldown: Duration,
    /// Timeout for a single fetch of the JWKS endpoint
    pub request_timeout: Duration,
}

impl Default for JwksSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            refresh_cooldown: Duration::from_secs(300),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    keys: HashMap<String, JsonWebKey>,
    fetched_at: Option<DateTime<Utc>>,
    last_attempt: Option<DateTime<Utc>>,
}

/// Caching client for a JWKS endpoint
#[derive(Debug)]
pub struct JwksStore {
    jwks_uri: String,
    http: reqwest::Client,
    cache_ttl: chrono::Duration,
    refresh_cooldown: chrono::Duration,
    state: RwLock<CacheState>,
}

impl JwksStore {
    /// Create a store for the given JWKS endpoint
    pub fn new(jwks_uri: impl Into<String>, settings: JwksSettings) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| AuthError::Configuration {
                message: format!("failed to build JWKS HTTP client: {err}"),
            })?;

        let cache_ttl = chrono::Duration::from_std(settings.cache_ttl).map_err(|err| {
            AuthError::Configuration {
                message: format!("JWKS cache TTL out of range: {err}"),
            }
        })?;
        let refresh_cooldown =
            chrono::Duration::from_std(settings.refresh_cooldown).map_err(|err| {
                AuthError::Configuration {
                    message: format!("JWKS refresh cooldown out of range: {err}"),
                }
            })?;

        Ok(Self {
            jwks_uri: jwks_uri.into(),
            http,
            cache_ttl,
            refresh_cooldown,
            state: RwLock::new(CacheState::default()),
        })
    }

    /// Look up the signing key for a token's `kid`.
    ///
    /// Served from cache while the cached document is fresh. A stale cache or
    /// an unseen `kid` triggers a refresh, unless one was attempted within the
    /// cooldown window; in that case the currently held keys answer the lookup.
    pub async fn signing_key(&self, kid: &str) -> Result<JsonWebKey, AuthError> {
        {
            let state = self.state.read().await;
            if self.is_fresh(&state, Utc::now()) {
                if let Some(key) = state.keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        self.refresh_and_lookup(kid).await
    }

    async fn refresh_and_lookup(&self, kid: &str) -> Result<JsonWebKey, AuthError> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        // Another task may have refreshed while this one waited for the lock.
        if self.is_fresh(&state, now) {
            if let Some(key) = state.keys.get(kid) {
                return Ok(key.clone());
            }
        }

        if let Some(last_attempt) = state.last_attempt {
            if now.signed_duration_since(last_attempt) < self.refresh_cooldown {
                debug!(kid = %kid, "JWKS refresh suppressed by cooldown");
                return state
                    .keys
                    .get(kid)
                    .cloned()
                    .ok_or_else(|| AuthError::UnknownKey {
                        kid: kid.to_string(),
                    });
            }
        }

        state.last_attempt = Some(now);
        let fetched = self.fetch().await?;
        info!(
            count = fetched.len(),
            uri = %self.jwks_uri,
            "Fetched JWKS document"
        );

        state.keys = fetched
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<JsonWebKey>(raw).ok())
            .filter(|key| key.kty == "RSA" && key.use_.as_deref().map_or(true, |u| u == "sig"))
            .map(|key| (key.kid.clone(), key))
            .collect();
        state.fetched_at = Some(now);

        match state.keys.get(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                warn!(kid = %kid, "Signing key not present in JWKS document");
                Err(AuthError::UnknownKey {
                    kid: kid.to_string(),
                })
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<serde_json::Value>, AuthError> {
        let response = self
            .http
            .get(&self.jwks_uri)
            .send()
            .await
            .map_err(|err| AuthError::KeyFetch {
                message: format!("request to '{}' failed: {err}", self.jwks_uri),
            })?;

        let document: JsonWebKeySet = response
            .error_for_status()
            .map_err(|err| AuthError::KeyFetch {
                message: format!("JWKS endpoint rejected the request: {err}"),
            })?
            .json()
            .await
            .map_err(|err| AuthError::KeyFetch {
                message: format!("JWKS document could not be decoded: {err}"),
            })?;

        Ok(document.keys)
    }

    fn is_fresh(&self, state: &CacheState, now: DateTime<Utc>) -> bool {
        state
            .fetched_at
            .map_or(false, |fetched_at| {
                now.signed_duration_since(fetched_at) < self.cache_ttl
            })
    }
}

#[cfg(test)]
#[path = "jwks_tests.rs"]
mod tests;
