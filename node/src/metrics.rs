//! # Prometheus Metrics
//!
//! Counters for chain writes and replacements plus a chain-length gauge.
//! Scraped at `/metrics` on the metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use parking_lot::Mutex;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Blocks accepted by `POST /`.
    pub blocks_appended_total: IntCounter,
    /// Candidates rejected by the successor checks.
    pub appends_rejected_total: IntCounter,
    /// Write requests rejected before block construction.
    pub invalid_payloads_total: IntCounter,
    /// Replacement candidates adopted.
    pub chain_replacements_total: IntCounter,
    /// Replacement candidates refused (too short, invalid, foreign genesis).
    pub replacements_rejected_total: IntCounter,
    /// Current number of blocks, genesis included. Update it through
    /// [`NodeMetrics::record_chain_length`].
    pub chain_length: IntGauge,
    /// Serializes compare-and-set on `chain_length`.
    chain_length_lock: Mutex<()>,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("linkchain".into()), None)
            .expect("failed to create prometheus registry");

        let blocks_appended_total =
            register_counter(&registry, "blocks_appended_total", "Total number of blocks appended");
        let appends_rejected_total = register_counter(
            &registry,
            "appends_rejected_total",
            "Total number of candidate blocks rejected by validation",
        );
        let invalid_payloads_total = register_counter(
            &registry,
            "invalid_payloads_total",
            "Total number of write requests with an undecodable payload",
        );
        let chain_replacements_total = register_counter(
            &registry,
            "chain_replacements_total",
            "Total number of times the chain was replaced by a longer candidate",
        );
        let replacements_rejected_total = register_counter(
            &registry,
            "replacements_rejected_total",
            "Total number of replacement candidates refused",
        );

        let chain_length = IntGauge::new("chain_length", "Number of blocks in the chain")
            .expect("metric creation");
        registry
            .register(Box::new(chain_length.clone()))
            .expect("metric registration");
        chain_length.set(1);

        Self {
            registry,
            blocks_appended_total,
            appends_rejected_total,
            invalid_payloads_total,
            chain_replacements_total,
            replacements_rejected_total,
            chain_length,
            chain_length_lock: Mutex::new(()),
        }
    }

    /// Raise the chain-length gauge to `length`.
    ///
    /// The chain never shrinks, so a smaller value means the caller lost a
    /// race with a later write and is ignored.
    pub fn record_chain_length(&self, length: usize) {
        let length = i64::try_from(length).unwrap_or(i64::MAX);
        let _guard = self.chain_length_lock.lock();
        if length > self.chain_length.get() {
            self.chain_length.set(length);
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).expect("metric creation");
    registry
        .register(Box::new(counter.clone()))
        .expect("metric registration");
    counter
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
