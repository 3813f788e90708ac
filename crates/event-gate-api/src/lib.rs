//! # Event-Gate HTTP Service
//!
//! HTTP server receiving Azure Event Grid webhook deliveries and forwarding
//! accepted event payloads to a storage queue.
//!
//! This service provides:
//! - CloudEvents webhook endpoint with Entra ID bearer token verification
//! - Event Grid subscription validation handshake (OPTIONS preflight)
//! - Health, readiness, and Prometheus metrics endpoints

// Public modules
pub mod config;
pub mod errors;
pub mod metrics;

pub use config::{
    AuthSettings, IngestConfig, QueueProviderKind, QueueSettings, ServerConfig, ServiceConfig,
};
pub use errors::{ConfigError, IngestRejection, ServiceError};
pub use metrics::ServiceMetrics;

use axum::{
    extract::{DefaultBodyLimit, MatchedPath, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use event_gate_core::auth::{bearer_token, TokenVerifier, VerifiedCaller};
use event_gate_core::error::{EventDecodeError, ProcessingError};
use event_gate_core::events::{CloudEvent, CLOUD_EVENTS_CONTENT_TYPE};
use event_gate_core::processing::EventProcessor;
use event_gate_queue::QueueClient;
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

// ============================================================================
// Protocol Constants
// ============================================================================

/// Origin Event Grid presents during the subscription validation handshake
pub const EVENT_GRID_ORIGIN: &str = "eventgrid.azure.net";

/// Header carrying the handshake origin
pub const WEBHOOK_REQUEST_ORIGIN_HEADER: &str = "webhook-request-origin";

/// Header echoing the approved origin back to Event Grid
pub const WEBHOOK_ALLOWED_ORIGIN_HEADER: &str = "webhook-allowed-origin";

/// Header advertising the delivery rate this endpoint accepts
pub const WEBHOOK_ALLOWED_RATE_HEADER: &str = "webhook-allowed-rate";

/// Events per second advertised to Event Grid
pub const WEBHOOK_ALLOWED_RATE: &str = "100";

/// Header used to correlate request logs across services
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Verifier for webhook caller bearer tokens
    pub token_verifier: Arc<dyn TokenVerifier>,

    /// Processor turning accepted envelopes into queue messages
    pub processor: Arc<dyn EventProcessor>,

    /// Queue client, used by the readiness check
    pub queue_client: Arc<dyn QueueClient>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        token_verifier: Arc<dyn TokenVerifier>,
        processor: Arc<dyn EventProcessor>,
        queue_client: Arc<dyn QueueClient>,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            token_verifier,
            processor,
            queue_client,
            metrics,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let endpoint_path = state.config.ingest.endpoint_path.clone();
    let max_body_size = state.config.server.max_body_size_bytes;

    Router::new()
        .route(
            &endpoint_path,
            post(receive_event).options(validate_subscription),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_endpoint))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    token_verifier: Arc<dyn TokenVerifier>,
    processor: Arc<dyn EventProcessor>,
    queue_client: Arc<dyn QueueClient>,
) -> Result<(), ServiceError> {
    let metrics = Arc::new(ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {e}"),
        })
    })?);

    let host: IpAddr = config.server.host.parse().map_err(|_| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("server.host '{}' is not an IP address", config.server.host),
        })
    })?;
    let addr = SocketAddr::from((host, config.server.port));

    let state = AppState::new(config, token_verifier, processor, queue_client, metrics);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    // Graceful shutdown: stop accepting connections on SIGINT/SIGTERM and let
    // in-flight requests complete.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

// ============================================================================
// Webhook Handlers
// ============================================================================

/// Handle an Event Grid webhook delivery.
///
/// The request passes a series of gates, each of which rejects on failure:
/// 1. Bearer token extraction and verification (`403 No access`)
/// 2. CloudEvents content type (`500 Invalid request`)
/// 3. Non-empty body that decodes as a CloudEvents envelope (`500`)
/// 4. Payload decoding and enqueue through the processor (`500`)
///
/// A `500` tells Event Grid to retry the delivery, which is what a transient
/// enqueue failure wants; rejected envelopes are logged so retries of a
/// genuinely undeliverable event remain visible.
#[instrument(skip(state, headers, body))]
pub async fn receive_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, IngestRejection> {
    authorize(&state, &headers).await?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains(CLOUD_EVENTS_CONTENT_TYPE) {
        reject(&state, "malformed");
        info!(
            content_type = %content_type,
            "Rejected delivery with unsupported content type"
        );
        return Err(IngestRejection::Invalid);
    }

    if body.is_empty() {
        reject(&state, "malformed");
        info!("Rejected delivery with empty body");
        return Err(IngestRejection::Invalid);
    }

    let event: CloudEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            reject(&state, "malformed");
            info!(error = %err, "Rejected undecodable envelope");
            return Err(IngestRejection::Invalid);
        }
    };

    match state.processor.process(&event).await {
        Ok(processed) => {
            state
                .metrics
                .events_accepted_total
                .with_label_values(&[processed.kind.as_str()])
                .inc();
            Ok(StatusCode::OK)
        }
        Err(ProcessingError::Enqueue(err)) => {
            reject(&state, "enqueue");
            error!(event_id = %event.id, error = %err, "Failed to enqueue event");
            Err(IngestRejection::Invalid)
        }
        Err(ProcessingError::Decode(EventDecodeError::UnknownEventType { event_type })) => {
            reject(&state, "unknown_type");
            info!(
                event_id = %event.id,
                event_type = %event_type,
                "Discarding event of unsupported type"
            );
            Err(IngestRejection::Invalid)
        }
        Err(err) => {
            reject(&state, "malformed");
            info!(event_id = %event.id, error = %err, "Rejected envelope with invalid payload");
            Err(IngestRejection::Invalid)
        }
    }
}

/// Answer the Event Grid subscription validation handshake.
///
/// Event Grid probes the endpoint with an OPTIONS request before it starts
/// delivering events. The caller must authenticate like any other delivery,
/// and must present the Event Grid origin; the response approves the origin
/// and advertises the accepted delivery rate.
#[instrument(skip(state, headers))]
pub async fn validate_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, IngestRejection> {
    let caller = authorize(&state, &headers).await?;

    let origin = headers
        .get(WEBHOOK_REQUEST_ORIGIN_HEADER)
        .and_then(|value| value.to_str().ok());
    if origin != Some(EVENT_GRID_ORIGIN) {
        reject(&state, "origin");
        info!(
            origin = origin.unwrap_or("<missing>"),
            "Rejected subscription validation from unexpected origin"
        );
        return Err(IngestRejection::Invalid);
    }

    state.metrics.handshakes_total.inc();
    info!(caller = %caller.subject, "Answered subscription validation handshake");

    let mut response = StatusCode::OK.into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        HeaderName::from_static(WEBHOOK_ALLOWED_ORIGIN_HEADER),
        HeaderValue::from_static(EVENT_GRID_ORIGIN),
    );
    response_headers.insert(
        HeaderName::from_static(WEBHOOK_ALLOWED_RATE_HEADER),
        HeaderValue::from_static(WEBHOOK_ALLOWED_RATE),
    );
    response_headers.insert(header::ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    Ok(response)
}

/// Verify the caller's bearer token, mapping every failure to `403`
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<VerifiedCaller, IngestRejection> {
    let header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let verified = match bearer_token(header) {
        Ok(token) => state.token_verifier.verify(token).await,
        Err(err) => Err(err),
    };

    verified.map_err(|err| {
        reject(state, "auth");
        warn!(error = %err, "Rejected webhook caller");
        IngestRejection::Forbidden
    })
}

fn reject(state: &AppState, reason: &str) {
    state
        .metrics
        .events_rejected_total
        .with_label_values(&[reason])
        .inc();
}

// ============================================================================
// Operational Handlers
// ============================================================================

/// Basic liveness check
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check probing the queue dependency
#[instrument(skip(state))]
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, StatusCode> {
    match state.queue_client.health_check().await {
        Ok(()) => Ok(Json(ReadinessResponse {
            ready: true,
            timestamp: Utc::now(),
        })),
        Err(err) => {
            warn!(error = %err, "Readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let body = state.metrics.encode().map_err(|err| {
        error!(error = %err, "Failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware with correlation ID tracking
///
/// This middleware:
/// - Extracts or generates correlation IDs for request tracking
/// - Logs request start and completion with structured fields
/// - Propagates correlation ID through response headers
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    // Extract or generate correlation ID
    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Record correlation ID in span
    tracing::Span::current().record("correlation_id", correlation_id.as_str());

    // Add correlation ID to request extensions for downstream handlers
    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    // Add correlation ID to response headers
    if let Ok(header_value) = correlation_id.parse() {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    // 5xx is this service's ordinary rejection response, so completions log at
    // warn rather than error; genuine faults are logged where they occur.
    if status.is_server_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

/// Metrics collection middleware.
///
/// Requests are labeled with the matched route template rather than the raw
/// URI so unmatched probe traffic cannot blow up the label cardinality.
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    state
        .metrics
        .requests_total
        .with_label_values(&[method.as_str(), &path, response.status().as_str()])
        .inc();

    response
}

// ============================================================================
// Response Types
// ============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
