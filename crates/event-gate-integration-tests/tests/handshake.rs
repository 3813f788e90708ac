//! Integration tests for the Event Grid subscription validation handshake
//! (OPTIONS)

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{create_test_harness, init_envelope};
use event_gate_api::{
    create_router, EVENT_GRID_ORIGIN, WEBHOOK_ALLOWED_ORIGIN_HEADER, WEBHOOK_ALLOWED_RATE_HEADER,
    WEBHOOK_REQUEST_ORIGIN_HEADER,
};
use tower::ServiceExt;

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Verify that an authenticated handshake from the Event Grid origin is
/// answered with the approval headers
#[tokio::test]
async fn test_handshake_returns_approval_headers() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .header(WEBHOOK_REQUEST_ORIGIN_HEADER, EVENT_GRID_ORIGIN)
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert: approval headers, and nothing on the queue
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get(WEBHOOK_ALLOWED_ORIGIN_HEADER).unwrap(),
        EVENT_GRID_ORIGIN
    );
    assert_eq!(headers.get(WEBHOOK_ALLOWED_RATE_HEADER).unwrap(), "100");
    assert_eq!(headers.get(header::ALLOW).unwrap(), "POST, OPTIONS");
    assert_eq!(harness.queue_client.total_message_count().await, 0);
}

/// Verify that a handshake without the origin header is rejected
#[tokio::test]
async fn test_handshake_missing_origin_is_rejected() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(response).await, "Invalid request");
}

/// Verify that a handshake from an unexpected origin is rejected
#[tokio::test]
async fn test_handshake_wrong_origin_is_rejected() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .header(WEBHOOK_REQUEST_ORIGIN_HEADER, "spoofed.example.com")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert: rejected, and no approval headers leak
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers().get(WEBHOOK_ALLOWED_ORIGIN_HEADER).is_none());
    assert_eq!(body_text(response).await, "Invalid request");
}

/// Verify that the handshake requires authentication like any delivery
#[tokio::test]
async fn test_handshake_without_token_is_forbidden() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(WEBHOOK_REQUEST_ORIGIN_HEADER, EVENT_GRID_ORIGIN)
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert: refused before the verifier was consulted
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "No access");
    assert_eq!(harness.verifier.call_count(), 0);
}

/// Verify that a handshake with a rejected token is refused
#[tokio::test]
async fn test_handshake_with_denied_token_is_forbidden() {
    // Arrange
    let harness = create_test_harness();
    harness.verifier.deny_all();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer stolen-token")
        .header(WEBHOOK_REQUEST_ORIGIN_HEADER, EVENT_GRID_ORIGIN)
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "No access");
    assert_eq!(harness.verifier.call_count(), 1);
}

/// Verify that a POST delivery still works after a completed handshake
#[tokio::test]
async fn test_delivery_after_handshake() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let handshake = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .header(WEBHOOK_REQUEST_ORIGIN_HEADER, EVENT_GRID_ORIGIN)
        .body(Body::empty())
        .unwrap();

    let delivery = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .header(header::CONTENT_TYPE, "application/cloudevents+json")
        .body(Body::from(init_envelope().to_string()))
        .unwrap();

    // Act
    let handshake_response = app.clone().oneshot(handshake).await.unwrap();
    let delivery_response = app.oneshot(delivery).await.unwrap();

    // Assert
    assert_eq!(handshake_response.status(), StatusCode::OK);
    assert_eq!(delivery_response.status(), StatusCode::OK);
    assert_eq!(harness.queue_client.total_message_count().await, 1);
}
