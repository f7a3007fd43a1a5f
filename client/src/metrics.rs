//! Prometheus metrics for verification traffic.
//!
//! [`ClientMetrics`] owns a dedicated [`Registry`]; an embedding service
//! can merge it into its own `/metrics` endpoint or call [`ClientMetrics::encode`].

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Encoder, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::error::ErrorKind;

pub struct ClientMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// HTTP attempts put on the wire, retries included.
    pub http_requests: IntCounter,
    /// Transport retries after a 5xx or network failure.
    pub http_retries: IntCounter,
    /// Status polls issued by the completion poller.
    pub polls: IntCounter,
    /// Sessions successfully created.
    pub sessions_started: IntCounter,
    /// Final outcome of each verification call, labelled by outcome.
    pub outcomes: IntCounterVec,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of a whole verification call, in milliseconds.
    pub verification_duration_ms: Histogram,
}

impl ClientMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests = register_int_counter_with_registry!(
            Opts::new("voxverify_http_requests_total", "HTTP attempts sent"),
            registry
        )
        .expect("failed to register http_requests counter");

        let http_retries = register_int_counter_with_registry!(
            Opts::new(
                "voxverify_http_retries_total",
                "Transport retries after 5xx or network failures"
            ),
            registry
        )
        .expect("failed to register http_retries counter");

        let polls = register_int_counter_with_registry!(
            Opts::new("voxverify_polls_total", "Session status polls issued"),
            registry
        )
        .expect("failed to register polls counter");

        let sessions_started = register_int_counter_with_registry!(
            Opts::new(
                "voxverify_sessions_started_total",
                "Verification sessions created"
            ),
            registry
        )
        .expect("failed to register sessions_started counter");

        let outcomes = register_int_counter_vec_with_registry!(
            Opts::new(
                "voxverify_outcomes_total",
                "Verification calls by final outcome"
            ),
            &["outcome"],
            registry
        )
        .expect("failed to register outcomes counter");

        // 50 ms → ~105 s
        let verification_duration_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "voxverify_verification_duration_ms",
                "Verification call duration in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(50.0, 2.0, 12).unwrap()),
            registry
        )
        .expect("failed to register verification_duration_ms histogram");

        Self {
            registry,
            http_requests,
            http_retries,
            polls,
            sessions_started,
            outcomes,
            verification_duration_ms,
        }
    }

    pub fn record_success(&self, verified: bool) {
        let label = if verified { "verified" } else { "rejected" };
        self.outcomes.with_label_values(&[label]).inc();
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.outcomes.with_label_values(&[kind.as_str()]).inc();
    }

    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.outcomes.with_label_values(&[outcome]).get()
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            tracing::warn!("failed to encode metrics: {e}");
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}
