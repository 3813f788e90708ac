//! # Event Gate Queue
//!
//! Provider-agnostic queue client for forwarding accepted webhook events to a
//! durable queue. Supports Azure Storage queues for production deployments and
//! an in-memory implementation for tests and local development.
//!
//! This library provides:
//! - Provider-agnostic send operations behind the [`QueueClient`] trait
//! - Validated queue names and opaque message identifiers
//! - Message bodies that serialize as base64, matching the encoding Azure
//!   Functions queue triggers expect on the consuming side
//!
//! ## Module Organization
//!
//! - [`error`] - Error types for all queue operations
//! - [`message`] - Message structures and identifiers
//! - [`provider`] - Provider types and configuration
//! - [`client`] - Client trait and factory
//! - [`providers`] - In-memory and Azure Storage implementations

// Module declarations
pub mod client;
pub mod error;
pub mod message;
pub mod provider;
pub mod providers;

// Re-export commonly used types at crate root for convenience
pub use client::{QueueClient, QueueClientFactory};
pub use error::{QueueError, ValidationError};
pub use message::{Message, MessageId, QueueName, MAX_MESSAGE_BODY_BYTES};
pub use provider::{AzureStorageConfig, ProviderConfig, ProviderType};
pub use providers::{AzureStorageQueueClient, InMemoryQueueClient, StoredMessage};
