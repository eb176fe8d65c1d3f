//! Metrics collection for observability

use prometheus::{
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry, register_histogram_with_registry, Counter, CounterVec,
    Histogram, HistogramVec, Opts, Registry,
};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Trimming
    pub context_trims: CounterVec,
    pub fallback_summaries: Counter,
    pub prompt_tokens_estimated: Histogram,

    // Helper services
    pub gateway_requests: CounterVec,
    pub gateway_request_duration: HistogramVec,
    pub key_point_extractions: CounterVec,

    // Summary cache
    pub summary_cache_hits: Counter,
    pub summary_cache_misses: Counter,

    // Multi-model workflow
    pub workflow_stages: CounterVec,
    pub workflow_stage_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let context_trims = register_counter_vec_with_registry!(
            Opts::new("context_trims_total", "Context trimming decisions by outcome"),
            &["outcome"],
            registry
        )?;

        let fallback_summaries = register_counter_with_registry!(
            Opts::new(
                "context_fallback_summaries_total",
                "Templated summaries used after summarizer failure"
            ),
            registry
        )?;

        let prompt_tokens_estimated = register_histogram_with_registry!(
            "prompt_tokens_estimated",
            "Estimated tokens of the context handed to the model",
            vec![250.0, 500.0, 1000.0, 2000.0, 4000.0, 6000.0, 8000.0, 16000.0],
            registry
        )?;

        let gateway_requests = register_counter_vec_with_registry!(
            Opts::new("gateway_requests_total", "Helper service requests by status"),
            &["service", "status"],
            registry
        )?;

        let gateway_request_duration = register_histogram_vec_with_registry!(
            "gateway_request_duration_seconds",
            "Helper service request duration in seconds, retries included",
            &["service"],
            registry
        )?;

        let key_point_extractions = register_counter_vec_with_registry!(
            Opts::new("key_point_extractions_total", "Key point extractions by status"),
            &["status"],
            registry
        )?;

        let summary_cache_hits = register_counter_with_registry!(
            Opts::new("summary_cache_hits_total", "Summary cache hits"),
            registry
        )?;

        let summary_cache_misses = register_counter_with_registry!(
            Opts::new("summary_cache_misses_total", "Summary cache misses"),
            registry
        )?;

        let workflow_stages = register_counter_vec_with_registry!(
            Opts::new("workflow_stages_total", "Workflow stage executions by status"),
            &["stage", "status"],
            registry
        )?;

        let workflow_stage_duration = register_histogram_vec_with_registry!(
            "workflow_stage_duration_seconds",
            "Workflow stage duration in seconds",
            &["stage"],
            registry
        )?;

        Ok(Self {
            registry,
            context_trims,
            fallback_summaries,
            prompt_tokens_estimated,
            gateway_requests,
            gateway_request_duration,
            key_point_extractions,
            summary_cache_hits,
            summary_cache_misses,
            workflow_stages,
            workflow_stage_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a trimming decision
    pub fn record_trim(&self, outcome: &str, estimated_tokens: usize) {
        self.context_trims.with_label_values(&[outcome]).inc();
        self.prompt_tokens_estimated.observe(estimated_tokens as f64);
    }

    /// Record a fallback summary
    pub fn record_fallback_summary(&self) {
        self.fallback_summaries.inc();
    }

    /// Record a key point extraction
    pub fn record_key_points(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.key_point_extractions.with_label_values(&[status]).inc();
    }

    /// Record a summary cache lookup
    pub fn record_summary_cache(&self, hit: bool) {
        if hit {
            self.summary_cache_hits.inc();
        } else {
            self.summary_cache_misses.inc();
        }
    }

    /// Record a workflow stage
    pub fn record_stage(&self, stage: &str, status: &str, seconds: f64) {
        self.workflow_stages.with_label_values(&[stage, status]).inc();
        self.workflow_stage_duration
            .with_label_values(&[stage])
            .observe(seconds);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        if encoder.encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }

        String::from_utf8(buffer).unwrap_or_default()
    }
}
