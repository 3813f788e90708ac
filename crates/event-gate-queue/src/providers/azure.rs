//! # Azure Storage Queue Provider
//!
//! Queue client backed by Azure Storage queues. Authentication uses a storage
//! account connection string; credentials are parsed at construction time and
//! the first network call happens on use.
//!
//! Message bodies are base64-encoded before sending. The downstream consumer
//! is an Azure Functions queue trigger, and the Functions runtime decodes
//! queue messages as base64 by default.

use crate::client::QueueClient;
use crate::error::QueueError;
use crate::message::{Message, MessageId, QueueName, MAX_MESSAGE_BODY_BYTES};
use crate::provider::ProviderType;
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_storage::ConnectionString;
use azure_storage_queues::QueueServiceClient;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::StreamExt;
use tracing::debug;

/// Queue client backed by Azure Storage queues
pub struct AzureStorageQueueClient {
    service: QueueServiceClient,
    account: String,
}

impl AzureStorageQueueClient {
    /// Build a client from a storage account connection string.
    ///
    /// Fails if the connection string cannot be parsed, names no account, or
    /// carries no usable credentials. No network calls are made.
    pub fn from_connection_string(connection_string: &str) -> Result<Self, QueueError> {
        let parsed = ConnectionString::new(connection_string).map_err(|err| {
            QueueError::Configuration {
                message: format!("invalid storage connection string: {err}"),
            }
        })?;

        let account = parsed
            .account_name
            .map(str::to_string)
            .ok_or_else(|| QueueError::Configuration {
                message: "storage connection string does not name an account".to_string(),
            })?;

        let credentials =
            parsed
                .storage_credentials()
                .map_err(|err| QueueError::Configuration {
                    message: format!("storage connection string has no usable credentials: {err}"),
                })?;

        let service = QueueServiceClient::new(account.clone(), credentials);

        Ok(Self { service, account })
    }

    /// The storage account this client talks to
    pub fn account(&self) -> &str {
        &self.account
    }
}

impl std::fmt::Debug for AzureStorageQueueClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureStorageQueueClient")
            .field("account", &self.account)
            .finish()
    }
}

#[async_trait]
impl QueueClient for AzureStorageQueueClient {
    async fn ensure_queue(&self, queue: &QueueName) -> Result<(), QueueError> {
        match self.service.queue_client(queue.as_str()).create().await {
            Ok(_) => {
                debug!(queue = %queue, account = %self.account, "Queue created");
                Ok(())
            }
            Err(err) if is_already_exists(&err) => Ok(()),
            Err(err) => Err(map_azure_error("create_queue", queue, &err)),
        }
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

        let encoded = STANDARD.encode(message.body.as_ref());
        let response = self
            .service
            .queue_client(queue.as_str())
            .put_message(encoded)
            .await
            .map_err(|err| map_azure_error("put_message", queue, &err))?;

        Ok(MessageId::from(response.queue_message.message_id))
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        // Listing the first page of queues exercises endpoint, credentials,
        // and clock skew without touching any queue contents.
        let mut pages = self.service.list_queues().into_stream();
        match pages.next().await {
            Some(Ok(_)) | None => Ok(()),
            Some(Err(err)) => Err(QueueError::ConnectionFailed {
                message: format!("storage account '{}' is not reachable: {err}", self.account),
            }),
        }
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::AzureStorageQueue
    }
}

/// Queue creation races and repeated startups both surface as 409s
fn is_already_exists(err: &azure_core::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::HttpResponse { status, .. } if *status == StatusCode::Conflict
    )
}

fn map_azure_error(operation: &str, queue: &QueueName, err: &azure_core::Error) -> QueueError {
    match err.kind() {
        ErrorKind::Credential => QueueError::AuthenticationFailed {
            message: format!("{operation} on '{queue}': {err}"),
        },
        ErrorKind::Io => QueueError::ConnectionFailed {
            message: format!("{operation} on '{queue}': {err}"),
        },
        ErrorKind::HttpResponse { status, error_code } => match *status {
            StatusCode::NotFound => QueueError::QueueNotFound {
                queue_name: queue.to_string(),
            },
            StatusCode::Unauthorized | StatusCode::Forbidden => QueueError::AuthenticationFailed {
                message: format!("{operation} on '{queue}': {err}"),
            },
            _ => QueueError::Provider {
                provider: ProviderType::AzureStorageQueue.to_string(),
                code: error_code
                    .clone()
                    .unwrap_or_else(|| u16::from(*status).to_string()),
                message: format!("{operation} on '{queue}': {err}"),
            },
        },
        _ => QueueError::Provider {
            provider: ProviderType::AzureStorageQueue.to_string(),
            code: "unknown".to_string(),
            message: format!("{operation} on '{queue}': {err}"),
        },
    }
}

#[cfg(test)]
#[path = "azure_tests.rs"]
mod tests;
