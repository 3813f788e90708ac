//! Integration tests for operational endpoints (health, readiness, metrics)
//! and cross-cutting middleware

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{create_failing_state, create_test_harness, init_envelope};
use event_gate_api::{create_router, CORRELATION_ID_HEADER};
use tower::ServiceExt;

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Verify that the health endpoint reports healthy without authentication
#[tokio::test]
async fn test_health_endpoint_reports_healthy() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].as_str().is_some());
}

/// Verify that readiness reports ready while the queue is reachable
#[tokio::test]
async fn test_readiness_reports_ready() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body["ready"], true);
}

/// Verify that readiness degrades when the queue is unreachable
#[tokio::test]
async fn test_readiness_degrades_when_queue_is_down() {
    // Arrange
    let (state, _verifier) = create_failing_state();
    let app = create_router(state);

    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// Verify that accepted events show up in the metrics exposition
#[tokio::test]
async fn test_metrics_expose_accepted_events() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let delivery = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .header(header::CONTENT_TYPE, "application/cloudevents+json")
        .body(Body::from(init_envelope().to_string()))
        .unwrap();

    // Act
    let delivery_response = app.clone().oneshot(delivery).await.unwrap();
    let metrics_response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(delivery_response.status(), StatusCode::OK);
    assert_eq!(metrics_response.status(), StatusCode::OK);
    let exposition = body_text(metrics_response).await;
    assert!(exposition.contains("webhook_events_accepted_total{kind=\"reissue_init\"} 1"));
    assert!(exposition.contains("http_requests_total"));
}

/// Verify that rejections are counted by reason
#[tokio::test]
async fn test_metrics_expose_rejections_by_reason() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let unauthorized = Request::builder()
        .method("POST")
        .uri("/api/events")
        .header(header::CONTENT_TYPE, "application/cloudevents+json")
        .body(Body::from(init_envelope().to_string()))
        .unwrap();

    // Act
    let rejection_response = app.clone().oneshot(unauthorized).await.unwrap();
    let metrics_response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Assert
    assert_eq!(rejection_response.status(), StatusCode::FORBIDDEN);
    let exposition = body_text(metrics_response).await;
    assert!(exposition.contains("webhook_events_rejected_total{reason=\"auth\"} 1"));
}

/// Verify that a caller-supplied correlation ID is echoed back
#[tokio::test]
async fn test_correlation_id_is_echoed() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .uri("/health")
        .header(CORRELATION_ID_HEADER, "delivery-correlation-42")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(
        response.headers().get(CORRELATION_ID_HEADER).unwrap(),
        "delivery-correlation-42"
    );
}

/// Verify that a correlation ID is minted when the caller supplies none
#[tokio::test]
async fn test_correlation_id_is_minted_when_absent() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    let minted = response
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap();
    assert!(uuid::Uuid::parse_str(minted).is_ok());
}

/// Verify that unknown routes return 404 rather than an ingest rejection
#[tokio::test]
async fn test_unknown_route_returns_not_found() {
    // Arrange
    let harness = create_test_harness();
    let app = create_router(harness.state.clone());

    let request = Request::builder()
        .uri("/api/other")
        .body(Body::empty())
        .unwrap();

    // Act
    let response = app.oneshot(request).await.unwrap();

    // Assert
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
