//! Common test utilities for event-gate-api integration tests
//!
//! This module provides:
//! - A mock token verifier with scriptable outcomes
//! - A queue client that fails on demand
//! - Helper functions for building test state and CloudEvents envelopes

use event_gate_api::{AppState, QueueProviderKind, ServiceConfig, ServiceMetrics};
use event_gate_core::auth::{TokenVerifier, VerifiedCaller};
use event_gate_core::{
    AuthError, QueueEventProcessor, REISSUE_COMPLETED_EVENT_TYPE, REISSUE_INIT_EVENT_TYPE,
};
use event_gate_queue::{
    InMemoryQueueClient, Message, MessageId, ProviderType, QueueClient, QueueError, QueueName,
};
use std::sync::{Arc, Mutex};

/// Subject the mock verifier reports for accepted tokens
#[allow(dead_code)]
pub const TEST_SENDER_ID: &str = "ddddaaaa-1111-2222-3333-444455556666";

// ============================================================================
// Mock Token Verifier
// ============================================================================

/// Mock token verifier recording every token presented to it
#[derive(Clone)]
#[allow(dead_code)]
pub struct MockTokenVerifier {
    tokens_seen: Arc<Mutex<Vec<String>>>,
    deny: Arc<Mutex<bool>>,
}

impl MockTokenVerifier {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            tokens_seen: Arc::new(Mutex::new(Vec::new())),
            deny: Arc::new(Mutex::new(false)),
        }
    }

    /// Make every subsequent verification fail
    #[allow(dead_code)]
    pub fn deny_all(&self) {
        *self.deny.lock().unwrap() = true;
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.tokens_seen.lock().unwrap().len()
    }

    #[allow(dead_code)]
    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TokenVerifier for MockTokenVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedCaller, AuthError> {
        self.tokens_seen.lock().unwrap().push(token.to_string());

        if *self.deny.lock().unwrap() {
            Err(AuthError::InvalidToken {
                message: "scripted denial".to_string(),
            })
        } else {
            Ok(VerifiedCaller {
                subject: TEST_SENDER_ID.to_string(),
                application_id: Some("test-client".to_string()),
            })
        }
    }
}

// ============================================================================
// Failing Queue Client
// ============================================================================

/// Queue client whose sends and health checks always fail
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct FailingQueueClient;

#[async_trait::async_trait]
impl QueueClient for FailingQueueClient {
    async fn ensure_queue(&self, _queue: &QueueName) -> Result<(), QueueError> {
        Ok(())
    }

    async fn send_message(
        &self,
        _queue: &QueueName,
        _message: Message,
    ) -> Result<MessageId, QueueError> {
        Err(QueueError::ConnectionFailed {
            message: "storage account unreachable".to_string(),
        })
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        Err(QueueError::ConnectionFailed {
            message: "storage account unreachable".to_string(),
        })
    }

    fn provider_type(&self) -> ProviderType {
        ProviderType::InMemory
    }
}

// ============================================================================
// Test Fixture Builders
// ============================================================================

/// Everything a test needs to drive the router and inspect the outcome
#[allow(dead_code)]
pub struct TestHarness {
    pub state: AppState,
    pub verifier: Arc<MockTokenVerifier>,
    pub queue_client: InMemoryQueueClient,
    pub queue_name: QueueName,
}

/// Create a service configuration suitable for tests
#[allow(dead_code)]
pub fn test_service_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.auth.tenant_id = "11111111-2222-3333-4444-555566667777".to_string();
    config.auth.receiver_id = "api://receiver-app-id".to_string();
    config.auth.sender_id = TEST_SENDER_ID.to_string();
    config.queue.provider = QueueProviderKind::Memory;
    config
}

/// Create a test harness backed by an in-memory queue
#[allow(dead_code)]
pub fn create_test_harness() -> TestHarness {
    let queue_client = InMemoryQueueClient::new();
    let queue_name = QueueName::new("received-events").unwrap();
    let verifier = Arc::new(MockTokenVerifier::new());
    let processor = Arc::new(QueueEventProcessor::new(
        Arc::new(queue_client.clone()),
        queue_name.clone(),
    ));
    let metrics = Arc::new(ServiceMetrics::new().unwrap());

    let state = AppState::new(
        test_service_config(),
        verifier.clone(),
        processor,
        Arc::new(queue_client.clone()),
        metrics,
    );

    TestHarness {
        state,
        verifier,
        queue_client,
        queue_name,
    }
}

/// Create application state whose queue rejects every send and health check
#[allow(dead_code)]
pub fn create_failing_state() -> (AppState, Arc<MockTokenVerifier>) {
    let queue_client = Arc::new(FailingQueueClient);
    let queue_name = QueueName::new("received-events").unwrap();
    let verifier = Arc::new(MockTokenVerifier::new());
    let processor = Arc::new(QueueEventProcessor::new(queue_client.clone(), queue_name));
    let metrics = Arc::new(ServiceMetrics::new().unwrap());

    let state = AppState::new(
        test_service_config(),
        verifier.clone(),
        processor,
        queue_client,
        metrics,
    );

    (state, verifier)
}

// ============================================================================
// Envelope Builders
// ============================================================================

/// A well-formed reissue init envelope
#[allow(dead_code)]
pub fn init_envelope() -> serde_json::Value {
    serde_json::json!({
        "id": "a7f3b2c1-0000-4000-8000-000000000001",
        "source": "/bankid/reissue",
        "type": REISSUE_INIT_EVENT_TYPE,
        "specversion": "1.0",
        "datacontenttype": "application/json",
        "data": {
            "sessionId": "session-123",
            "authentication": "BIM",
            "orderID": "order-456",
            "action": "REISSUE",
            "status": "BEGIN"
        }
    })
}

/// A well-formed reissue completed envelope
#[allow(dead_code)]
pub fn completed_envelope() -> serde_json::Value {
    serde_json::json!({
        "id": "a7f3b2c1-0000-4000-8000-000000000002",
        "source": "/bankid/reissue",
        "type": REISSUE_COMPLETED_EVENT_TYPE,
        "specversion": "1.0",
        "datacontenttype": "application/json",
        "data": {
            "sessionId": "session-123",
            "authentication": "BIM",
            "orderID": "order-456",
            "action": "REISSUE",
            "status": "SUCCESS",
            "time": "2025-05-17T09:30:00Z",
            "additionalInfo": "card reissued"
        }
    })
}
