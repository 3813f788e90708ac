//! Provider types and configuration.

use serde::{Deserialize, Serialize};

/// Queue provider implementations supported by the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    /// In-memory queues for tests and local development
    InMemory,
    /// Azure Storage queues
    AzureStorageQueue,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::InMemory => write!(f, "in-memory"),
            ProviderType::AzureStorageQueue => write!(f, "azure-storage-queue"),
        }
    }
}

/// Provider selection plus the settings that provider needs
#[derive(Debug, Clone)]
pub enum ProviderConfig {
    /// In-memory queues, no settings required
    InMemory,
    /// Azure Storage queues
    AzureStorage(AzureStorageConfig),
}

impl ProviderConfig {
    /// The provider type this configuration selects
    pub fn provider_type(&self) -> ProviderType {
        match self {
            ProviderConfig::InMemory => ProviderType::InMemory,
            ProviderConfig::AzureStorage(_) => ProviderType::AzureStorageQueue,
        }
    }
}

/// Connection settings for Azure Storage queues
#[derive(Clone)]
pub struct AzureStorageConfig {
    /// Full storage account connection string
    pub connection_string: String,
}

impl AzureStorageConfig {
    /// Create a new configuration from a connection string
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

// Connection strings embed the account key, keep them out of logs
impl std::fmt::Debug for AzureStorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureStorageConfig")
            .field("connection_string", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
