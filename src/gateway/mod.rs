//! HTTP gateway to best-effort helper services (summarizer, key-point
//! extractor)
//!
//! Each gateway POSTs a JSON body to one endpoint with a request timeout,
//! bounded retries with exponential backoff, and a circuit breaker that
//! fails fast while the service is down. Callers are expected to degrade
//! gracefully on any `GatewayError`.

pub mod circuit_breaker;
pub mod client;

pub use circuit_breaker::{BreakerState, BreakerStats, CircuitBreaker, CircuitBreakerConfig};
pub use client::{GatewayClient, GatewayConfig};

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway {0} is disabled")]
    Disabled(String),

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("Circuit breaker is open: {0}")]
    CircuitOpen(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Upstream error: status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// Shared serde defaults for the per-service config sections
pub(crate) fn default_enabled() -> bool { true }
pub(crate) fn default_language() -> String { "ar".to_string() }
pub(crate) fn default_timeout_ms() -> u64 { 15_000 }
pub(crate) fn default_retry_attempts() -> usize { 1 }
pub(crate) fn default_retry_backoff_ms() -> u64 { 250 }
pub(crate) fn default_breaker_failures() -> usize { 5 }
pub(crate) fn default_breaker_reset_secs() -> u64 { 30 }

/// Parse a boolean env flag the way the service configs accept them
pub(crate) fn env_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
