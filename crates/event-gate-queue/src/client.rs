//! Queue client trait and provider factory.

use crate::error::QueueError;
use crate::message::{Message, MessageId, QueueName};
use crate::provider::{ProviderConfig, ProviderType};
use crate::providers::{AzureStorageQueueClient, InMemoryQueueClient};
use async_trait::async_trait;
use std::sync::Arc;

/// Send-side queue operations.
///
/// This service only ever enqueues; receiving and completing messages is the
/// consumer's concern, so that surface does not exist here.
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Create the queue if it does not already exist.
    ///
    /// Idempotent: an existing queue is not an error.
    async fn ensure_queue(&self, queue: &QueueName) -> Result<(), QueueError>;

    /// Send a single message, returning the provider-assigned message id
    async fn send_message(&self, queue: &QueueName, message: Message)
        -> Result<MessageId, QueueError>;

    /// Verify the provider is reachable with the configured credentials
    async fn health_check(&self) -> Result<(), QueueError>;

    /// Which provider implementation this client talks to
    fn provider_type(&self) -> ProviderType;
}

/// Factory for creating queue clients from provider configuration
pub struct QueueClientFactory;

impl QueueClientFactory {
    /// Create a queue client for the configured provider.
    ///
    /// Construction is offline: credentials are parsed but no network calls
    /// are made until the client is used.
    pub fn create_client(config: &ProviderConfig) -> Result<Arc<dyn QueueClient>, QueueError> {
        match config {
            ProviderConfig::InMemory => Ok(Arc::new(InMemoryQueueClient::new())),
            ProviderConfig::AzureStorage(azure) => {
                let client =
                    AzureStorageQueueClient::from_connection_string(&azure.connection_string)?;
                Ok(Arc::new(client))
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
