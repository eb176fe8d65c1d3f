//! Summarization of turns dropped from the visible window
//!
//! The HTTP summarizer posts `{text, language}` and expects `{summary}`.
//! It only reports failure; the deterministic fallback text lives in
//! [`fallback_summary`] and is applied by the trimmer.

use super::models::ChatTurn;
use crate::cache::TtlCache;
use crate::gateway::{self, CircuitBreakerConfig, GatewayClient, GatewayConfig, GatewayError};
use crate::metrics::METRICS;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Summarizer trait for different summarization strategies
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize older turns into a short paragraph
    async fn summarize(&self, turns: &[ChatTurn]) -> Result<String, SummarizerError>;

    /// Language the summaries are written in
    fn language(&self) -> &str {
        "ar"
    }
}

/// Summarizer errors
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Empty summary returned")]
    EmptySummary,
}

/// Configuration for the HTTP summarizer
#[derive(Debug, Clone, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "gateway::default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token (read from env SUMMARIZER_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "gateway::default_language")]
    pub language: String,

    #[serde(default = "gateway::default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "gateway::default_retry_attempts")]
    pub retry_attempts: usize,

    #[serde(default = "gateway::default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "gateway::default_breaker_failures")]
    pub circuit_breaker_failures: usize,

    #[serde(default = "gateway::default_breaker_reset_secs")]
    pub circuit_breaker_reset_secs: u64,

    /// Memoize summaries in the shared cache
    #[serde(default = "gateway::default_enabled")]
    pub cache_summaries: bool,
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/ai/summarize".to_string()
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: gateway::default_enabled(),
            endpoint: default_endpoint(),
            api_key: None,
            language: gateway::default_language(),
            timeout_ms: gateway::default_timeout_ms(),
            retry_attempts: gateway::default_retry_attempts(),
            retry_backoff_ms: gateway::default_retry_backoff_ms(),
            circuit_breaker_failures: gateway::default_breaker_failures(),
            circuit_breaker_reset_secs: gateway::default_breaker_reset_secs(),
            cache_summaries: gateway::default_enabled(),
        }
    }
}

impl SummarizerConfig {
    /// Override with environment variables if present
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("SUMMARIZER_ENABLED") {
            self.enabled = gateway::env_flag(&val);
        }

        if let Ok(val) = std::env::var("SUMMARIZER_URL") {
            self.endpoint = val;
        }

        if let Ok(val) = std::env::var("SUMMARIZER_API_KEY") {
            self.api_key = Some(SecretString::new(val));
        }

        if let Ok(val) = std::env::var("SUMMARIZER_LANGUAGE") {
            self.language = val;
        }

        if let Ok(val) = std::env::var("SUMMARIZER_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.timeout_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("SUMMARIZER_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                self.retry_attempts = retries;
            }
        }

        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            name: "summarizer".to_string(),
            enabled: self.enabled,
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout(),
            retry_attempts: self.retry_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
            breaker: CircuitBreakerConfig {
                failure_threshold: self.circuit_breaker_failures,
                reset_timeout: Duration::from_secs(self.circuit_breaker_reset_secs),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

/// Render turns as `role: content` lines
pub fn render_transcript(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .map(ChatTurn::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deterministic summary used when the summarization service is unavailable.
///
/// Mentions the number of turns and the dates of the first and last one.
pub fn fallback_summary(turns: &[ChatTurn], language: &str) -> String {
    let count = turns.len();
    let date_of = |turn: Option<&ChatTurn>| {
        turn.map(|t| t.timestamp.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let first = date_of(turns.first());
    let last = date_of(turns.last());

    if language == "ar" {
        format!(
            "ملخص المحادثة: تم مناقشة {} رسائل بين {} و {}",
            count, first, last
        )
    } else {
        format!(
            "Conversation summary: {} messages discussed between {} and {}",
            count, first, last
        )
    }
}

/// Summarizer backed by the summarization HTTP endpoint
pub struct HttpSummarizer {
    client: GatewayClient,
    language: String,
}

impl HttpSummarizer {
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = GatewayClient::new(config.gateway_config())?;
        Ok(Self {
            client,
            language: config.language,
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, turns: &[ChatTurn]) -> Result<String, SummarizerError> {
        let text = render_transcript(turns);
        debug!("Summarizing {} turns ({} chars)", turns.len(), text.chars().count());

        let request = SummarizeRequest {
            text: &text,
            language: &self.language,
        };
        let response: SummarizeResponse = self.client.post_json(&request).await?;

        let summary = response.summary.trim();
        if summary.is_empty() {
            warn!("Summarizer returned an empty summary");
            return Err(SummarizerError::EmptySummary);
        }

        Ok(summary.to_string())
    }

    fn language(&self) -> &str {
        &self.language
    }
}

/// Memoizes another summarizer's successful results
pub struct CachingSummarizer {
    inner: Arc<dyn Summarizer>,
    cache: Arc<TtlCache<String>>,
}

impl CachingSummarizer {
    pub fn new(inner: Arc<dyn Summarizer>, cache: Arc<TtlCache<String>>) -> Self {
        Self { inner, cache }
    }

    fn cache_key(&self, turns: &[ChatTurn]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.language().as_bytes());
        hasher.update([0u8]);
        hasher.update(render_transcript(turns).as_bytes());
        format!("summary:{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl Summarizer for CachingSummarizer {
    async fn summarize(&self, turns: &[ChatTurn]) -> Result<String, SummarizerError> {
        let key = self.cache_key(turns);

        if let Some(summary) = self.cache.get(&key) {
            METRICS.record_summary_cache(true);
            debug!("Summary cache hit for {} turns", turns.len());
            return Ok(summary);
        }
        METRICS.record_summary_cache(false);

        let summary = self.inner.summarize(turns).await?;
        self.cache.insert(key, summary.clone());
        Ok(summary)
    }

    fn language(&self) -> &str {
        self.inner.language()
    }
}
