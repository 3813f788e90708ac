//! Tests for the queue client factory.

use super::*;
use crate::provider::AzureStorageConfig;

const FAKE_CONNECTION_STRING: &str =
    "DefaultEndpointsProtocol=https;AccountName=testaccount;AccountKey=dGVzdC1hY2NvdW50LWtleQ==;EndpointSuffix=core.windows.net";

#[test]
fn test_factory_creates_in_memory_client() {
    let client = QueueClientFactory::create_client(&ProviderConfig::InMemory).unwrap();
    assert_eq!(client.provider_type(), ProviderType::InMemory);
}

#[test]
fn test_factory_creates_azure_client_without_network() {
    let config = ProviderConfig::AzureStorage(AzureStorageConfig::new(FAKE_CONNECTION_STRING));
    let client = QueueClientFactory::create_client(&config).unwrap();
    assert_eq!(client.provider_type(), ProviderType::AzureStorageQueue);
}

#[test]
fn test_factory_rejects_malformed_connection_string() {
    let config = ProviderConfig::AzureStorage(AzureStorageConfig::new("not a connection string"));
    let result = QueueClientFactory::create_client(&config);
    assert!(matches!(result, Err(QueueError::Configuration { .. })));
}
