//! Key point extraction from assistant turns

use super::models::{ChatTurn, Role};
use crate::gateway::{self, CircuitBreakerConfig, GatewayClient, GatewayConfig, GatewayError};
use crate::metrics::METRICS;
use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Extracts salient facts from a conversation.
///
/// Best-effort: implementations return an empty list on failure.
#[async_trait]
pub trait KeyPointExtractor: Send + Sync {
    async fn extract(&self, turns: &[ChatTurn]) -> Vec<String>;
}

/// Configuration for the HTTP key-point extractor
#[derive(Debug, Clone, Deserialize)]
pub struct KeyPointsConfig {
    /// Off unless configured
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_endpoint")]
    pub endpoint: String,

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
}

fn default_endpoint() -> String {
    "http://localhost:3000/api/ai/extract-points".to_string()
}

impl Default for KeyPointsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            api_key: None,
            language: gateway::default_language(),
            timeout_ms: gateway::default_timeout_ms(),
            retry_attempts: gateway::default_retry_attempts(),
            retry_backoff_ms: gateway::default_retry_backoff_ms(),
            circuit_breaker_failures: gateway::default_breaker_failures(),
            circuit_breaker_reset_secs: gateway::default_breaker_reset_secs(),
        }
    }
}

impl KeyPointsConfig {
    /// Override with environment variables if present
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("KEY_POINTS_ENABLED") {
            self.enabled = gateway::env_flag(&val);
        }

        if let Ok(val) = std::env::var("KEY_POINTS_URL") {
            self.endpoint = val;
        }

        if let Ok(val) = std::env::var("KEY_POINTS_API_KEY") {
            self.api_key = Some(SecretString::new(val));
        }

        if let Ok(val) = std::env::var("KEY_POINTS_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.timeout_ms = ms;
            }
        }

        self
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            name: "key_points".to_string(),
            enabled: self.enabled,
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
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
struct ExtractRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResponse {
    key_points: Vec<String>,
}

/// Newline-joined content of the assistant turns
fn assistant_text(turns: &[ChatTurn]) -> String {
    turns
        .iter()
        .filter(|t| t.role == Role::Assistant)
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Key-point extractor backed by the extract-points HTTP endpoint
pub struct HttpKeyPointExtractor {
    client: GatewayClient,
    language: String,
}

impl HttpKeyPointExtractor {
    pub fn new(config: KeyPointsConfig) -> Result<Self, GatewayError> {
        let client = GatewayClient::new(config.gateway_config())?;
        Ok(Self {
            client,
            language: config.language,
        })
    }
}

#[async_trait]
impl KeyPointExtractor for HttpKeyPointExtractor {
    async fn extract(&self, turns: &[ChatTurn]) -> Vec<String> {
        let text = assistant_text(turns);
        if text.is_empty() {
            return Vec::new();
        }

        let request = ExtractRequest {
            text: &text,
            language: &self.language,
        };

        match self.client.post_json::<_, ExtractResponse>(&request).await {
            Ok(resp) => {
                METRICS.record_key_points(true);
                let points: Vec<String> = resp
                    .key_points
                    .into_iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                debug!("Extracted {} key points", points.len());
                points
            }
            Err(e) => {
                METRICS.record_key_points(false);
                warn!("Key point extraction failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns() -> Vec<ChatTurn> {
        vec![
            ChatTurn::user("ما هي عاصمة مصر؟"),
            ChatTurn::assistant("القاهرة"),
            ChatTurn::user("وما عدد سكانها؟"),
            ChatTurn::assistant("حوالي عشرين مليونا"),
        ]
    }

    fn test_config(endpoint: String) -> KeyPointsConfig {
        KeyPointsConfig {
            enabled: true,
            endpoint,
            retry_attempts: 0,
            ..KeyPointsConfig::default()
        }
    }

    #[test]
    fn test_assistant_text_filters_user_turns() {
        assert_eq!(assistant_text(&turns()), "القاهرة\nحوالي عشرين مليونا");
    }

    #[test]
    fn test_disabled_by_default() {
        assert!(!KeyPointsConfig::default().enabled);
    }

    #[tokio::test]
    async fn test_extracts_key_points() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/ai/extract-points")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "text": "القاهرة\nحوالي عشرين مليونا"
            })))
            .with_status(200)
            .with_body(r#"{"keyPoints":["العاصمة القاهرة", " ", "السكان عشرون مليونا"]}"#)
            .create_async()
            .await;

        let extractor = HttpKeyPointExtractor::new(test_config(format!(
            "{}/api/ai/extract-points",
            server.url()
        )))
        .unwrap();

        let points = extractor.extract(&turns()).await;
        assert_eq!(points, vec!["العاصمة القاهرة", "السكان عشرون مليونا"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_yields_empty_list() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/ai/extract-points")
            .with_status(502)
            .create_async()
            .await;

        let extractor = HttpKeyPointExtractor::new(test_config(format!(
            "{}/api/ai/extract-points",
            server.url()
        )))
        .unwrap();

        assert!(extractor.extract(&turns()).await.is_empty());
    }

    #[tokio::test]
    async fn test_no_assistant_turns_skips_call() {
        let extractor =
            HttpKeyPointExtractor::new(test_config("http://127.0.0.1:9/unused".to_string()))
                .unwrap();
        let points = extractor.extract(&[ChatTurn::user("hi")]).await;
        assert!(points.is_empty());
    }
}
