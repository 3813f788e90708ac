//! Queue provider implementations.

pub mod azure;
pub mod memory;

pub use azure::AzureStorageQueueClient;
pub use memory::{InMemoryQueueClient, StoredMessage};
