//! In-memory queue provider for tests and local development.

use crate::client::QueueClient;
use crate::error::QueueError;
use crate::message::{Message, MessageId, QueueName, MAX_MESSAGE_BODY_BYTES};
use crate::provider::ProviderType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A message held by an in-memory queue
#[derive(Debug, Clone)]
pub struct StoredMessage {
    /// Identifier assigned at enqueue time
    pub message_id: MessageId,
    /// The message as sent
    pub message: Message,
    /// When the message was enqueued
    pub enqueued_at: DateTime<Utc>,
}

/// In-memory queue client.
///
/// Queues are created lazily on first send, mirroring how local development
/// against the storage emulator behaves. Cloning shares the underlying
/// storage, so a test can hold a handle while the service owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueueClient {
    queues: Arc<RwLock<HashMap<QueueName, VecDeque<StoredMessage>>>>,
}

impl InMemoryQueueClient {
    /// Create a new client with empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages currently held by the given queue
    pub async fn message_count(&self, queue: &QueueName) -> usize {
        let queues = self.queues.read().await;
        queues.get(queue).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of messages held across all queues
    pub async fn total_message_count(&self) -> usize {
        let queues = self.queues.read().await;
        queues.values().map(VecDeque::len).sum()
    }

    /// Snapshot of the messages in the given queue, oldest first
    pub async fn messages(&self, queue: &QueueName) -> Vec<StoredMessage> {
        let queues = self.queues.read().await;
        queues
            .get(queue)
            .map(|messages| messages.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop all queues and messages
    pub async fn clear(&self) {
        let mut queues = self.queues.write().await;
        queues.clear();
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn ensure_queue(&self, queue: &QueueName) -> Result<(), QueueError> {
        let mut queues = self.queues.write().await;
        queues.entry(queue.clone()).or_default();
        Ok(())
    }

    async fn send_message(
        &self,
        queue: &QueueName,
        message: Message,
    ) -> Result<MessageId, QueueError> {
        if message.len() > MAX_MESSAGE_BODY_BYTES {
            return Err(QueueError::MessageTooLarge {
                size: message.len(),
                max_size: MAX_MESSAGE_BODY_BYTES,
            });
        }

        let message_id = MessageId::new();
        let stored = StoredMessage {
            message_id: message_id.clone(),
            message,
            enqueued_at: Utc::now(),
        };

        let mut queues = self.queues.write().await;
        queues.entry(queue.clone()).or_default().push_back(stored);

        Ok(message_id)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Ok(())
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::InMemory
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
