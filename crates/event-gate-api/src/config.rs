//! Service configuration.
//!
//! Every field carries a serde default so the service starts from partial
//! configuration files; [`ServiceConfig::validate`] then rejects combinations
//! that cannot work, most importantly the empty identity settings, which have
//! no sensible default.

use crate::errors::ConfigError;
use event_gate_core::auth::{JwksSettings, VerifierSettings};
use event_gate_queue::QueueName;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook endpoint settings
    pub ingest: IngestConfig,

    /// Caller identity settings
    pub auth: AuthSettings,

    /// Queue provider settings
    pub queue: QueueSettings,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ingest: IngestConfig::default(),
            auth: AuthSettings::default(),
            queue: QueueSettings::default(),
        }
    }
}

impl ServiceConfig {
    /// Check that the configuration can actually run a service
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                message: format!("server.host '{}' is not an IP address", self.server.host),
            });
        }
        if !self.ingest.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "ingest.endpoint_path '{}' must start with '/'",
                    self.ingest.endpoint_path
                ),
            });
        }

        for (value, key) in [
            (&self.auth.tenant_id, "auth.tenant_id"),
            (&self.auth.receiver_id, "auth.receiver_id"),
            (&self.auth.sender_id, "auth.sender_id"),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing {
                    key: key.to_string(),
                });
            }
        }
        if !self.auth.authority.starts_with("http") {
            return Err(ConfigError::Invalid {
                message: format!("auth.authority '{}' is not a URL", self.auth.authority),
            });
        }
        if self.auth.jwks_cache_ttl_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "auth.jwks_cache_ttl_seconds must be non-zero".to_string(),
            });
        }

        QueueName::new(&self.queue.queue_name).map_err(|err| ConfigError::Invalid {
            message: format!("queue.queue_name: {err}"),
        })?;
        if self.queue.provider == QueueProviderKind::AzureStorage
            && self.queue.connection_string.trim().is_empty()
        {
            return Err(ConfigError::Missing {
                key: "queue.connection_string".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Maximum request body size in bytes
    pub max_body_size_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_size_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Webhook endpoint configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Path the webhook endpoint is served on
    pub endpoint_path: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/api/events".to_string(),
        }
    }
}

/// Caller identity configuration.
///
/// The three id fields have no defaults worth having; [`ServiceConfig::validate`]
/// rejects a configuration that leaves them empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Entra ID tenant the sender and receiver applications live in
    pub tenant_id: String,

    /// Application id of this service; expected `aud` claim
    pub receiver_id: String,

    /// Object id of the Event Grid delivery identity; expected `sub` claim
    pub sender_id: String,

    /// Identity platform base URL; overridable for tests
    pub authority: String,

    /// How long fetched signing keys are served without refreshing
    pub jwks_cache_ttl_seconds: u64,

    /// Minimum pause between signing key refresh attempts
    pub jwks_refresh_cooldown_seconds: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            receiver_id: String::new(),
            sender_id: String::new(),
            authority: "https://login.microsoftonline.com".to_string(),
            jwks_cache_ttl_seconds: 3600,
            jwks_refresh_cooldown_seconds: 300,
        }
    }
}

impl AuthSettings {
    fn authority_base(&self) -> &str {
        self.authority.trim_end_matches('/')
    }

    /// JWKS endpoint for the configured tenant
    pub fn jwks_uri(&self) -> String {
        format!(
            "{}/{}/discovery/v2.0/keys",
            self.authority_base(),
            self.tenant_id
        )
    }

    /// Expected token issuer for the configured tenant
    pub fn issuer(&self) -> String {
        format!("{}/{}/v2.0", self.authority_base(), self.tenant_id)
    }

    /// Settings for the token verifier derived from this section
    pub fn verifier_settings(&self) -> VerifierSettings {
        VerifierSettings {
            jwks_uri: self.jwks_uri(),
            issuer: self.issuer(),
            audience: self.receiver_id.clone(),
            subject: self.sender_id.clone(),
            jwks: JwksSettings {
                cache_ttl: Duration::from_secs(self.jwks_cache_ttl_seconds),
                refresh_cooldown: Duration::from_secs(self.jwks_refresh_cooldown_seconds),
                ..JwksSettings::default()
            },
        }
    }
}

/// Queue provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueueProviderKind {
    /// In-memory queues for tests and local development
    Memory,
    /// Azure Storage queues
    AzureStorage,
}

/// Queue provider configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Which provider to create
    pub provider: QueueProviderKind,

    /// Queue receiving accepted event payloads
    pub queue_name: String,

    /// Storage account connection string, required for the Azure provider
    pub connection_string: String,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            provider: QueueProviderKind::AzureStorage,
            queue_name: "received-events".to_string(),
            connection_string: String::new(),
        }
    }
}

// Connection strings embed the account key, keep them out of logs
impl fmt::Debug for QueueSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueSettings")
            .field("provider", &self.provider)
            .field("queue_name", &self.queue_name)
            .field("connection_string", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
