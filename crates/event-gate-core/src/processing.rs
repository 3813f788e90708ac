//! Turning accepted envelopes into queue messages.
//!
//! The processor is the last gate a webhook delivery passes: the envelope's
//! `data` is decoded to prove it is a reissue event this service handles,
//! then the payload is enqueued as received for the downstream consumer.

use crate::error::ProcessingError;
use crate::events::{CloudEvent, EventKind, ReissueEvent};
use async_trait::async_trait;
use event_gate_queue::{Message, MessageId, QueueClient, QueueName};
use std::sync::Arc;
use tracing::info;

/// Outcome of processing a single accepted event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    /// Which event the envelope carried
    pub kind: EventKind,
    /// Identifier of the enqueued message
    pub message_id: MessageId,
}

/// Processes decoded CloudEvents envelopes
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Validate the envelope's payload and hand it to the queue.
    ///
    /// An error means nothing was enqueued.
    async fn process(&self, event: &CloudEvent) -> Result<ProcessedEvent, ProcessingError>;
}

/// Processor that forwards event payloads to a queue
pub struct QueueEventProcessor {
    queue_client: Arc<dyn QueueClient>,
    queue_name: QueueName,
}

impl QueueEventProcessor {
    /// Create a processor targeting the given queue
    pub fn new(queue_client: Arc<dyn QueueClient>, queue_name: QueueName) -> Self {
        Self {
            queue_client,
            queue_name,
        }
    }
}

#[async_trait]
impl EventProcessor for QueueEventProcessor {
    async fn process(&self, event: &CloudEvent) -> Result<ProcessedEvent, ProcessingError> {
        // Decode before enqueueing; an envelope that does not carry a known
        // reissue payload must never reach the queue.
        let decoded = event.decode_data()?;

        let body = serde_json::to_vec(&event.data).map_err(|err| {
            ProcessingError::PayloadSerialization {
                message: err.to_string(),
            }
        })?;
        let message_id = self
            .queue_client
            .send_message(&self.queue_name, Message::new(body))
            .await?;

        match &decoded {
            ReissueEvent::Init(_) => {
                info!(
                    event_id = %event.id,
                    event_kind = %decoded.kind(),
                    session_id = %decoded.session_id(),
                    order_id = %decoded.order_id(),
                    message_id = %message_id,
                    "Reissue event enqueued"
                );
            }
            ReissueEvent::Completed(completed) => {
                info!(
                    event_id = %event.id,
                    event_kind = %decoded.kind(),
                    session_id = %decoded.session_id(),
                    order_id = %decoded.order_id(),
                    status = %completed.status,
                    message_id = %message_id,
                    "Reissue event enqueued"
                );
            }
        }

        Ok(ProcessedEvent {
            kind: decoded.kind(),
            message_id,
        })
    }
}

#[cfg(test)]
#[path = "processing_tests.rs"]
mod tests;
