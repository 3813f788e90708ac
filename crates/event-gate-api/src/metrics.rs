//! Prometheus metrics for the ingest service.
//!
//! Metrics live in a registry owned by [`ServiceMetrics`] rather than the
//! process-global default registry, so multiple instances can coexist in one
//! process (each test builds its own) and `/metrics` exposes exactly the
//! counters this service registered.

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters describing webhook ingest behavior
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    /// HTTP requests by method, matched route, and response status
    pub requests_total: IntCounterVec,

    /// Events accepted and enqueued, by event kind
    pub events_accepted_total: IntCounterVec,

    /// Requests turned away, by rejection reason
    pub events_rejected_total: IntCounterVec,

    /// Subscription validation handshakes answered
    pub handshakes_total: IntCounter,
}

impl ServiceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let events_accepted_total = IntCounterVec::new(
            Opts::new(
                "webhook_events_accepted_total",
                "Events accepted and enqueued, by kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(events_accepted_total.clone()))?;

        let events_rejected_total = IntCounterVec::new(
            Opts::new(
                "webhook_events_rejected_total",
                "Requests rejected, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(events_rejected_total.clone()))?;

        let handshakes_total = IntCounter::new(
            "webhook_handshakes_total",
            "Subscription validation handshakes answered",
        )?;
        registry.register(Box::new(handshakes_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            events_accepted_total,
            events_rejected_total,
            handshakes_total,
        })
    }

    /// Render the registry in the Prometheus text exposition format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
