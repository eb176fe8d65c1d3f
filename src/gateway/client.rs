//! JSON-over-HTTP client with retry and circuit breaker

use super::circuit_breaker::{BreakerStats, CircuitBreaker, CircuitBreakerConfig};
use super::GatewayError;
use crate::metrics::METRICS;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Runtime settings for one gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Service name used in logs and metric labels
    pub name: String,
    pub enabled: bool,
    pub endpoint: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
    /// Retries after the first attempt
    pub retry_attempts: usize,
    pub retry_backoff: Duration,
    pub breaker: CircuitBreakerConfig,
}

impl GatewayConfig {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: super::default_enabled(),
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_millis(super::default_timeout_ms()),
            retry_attempts: super::default_retry_attempts(),
            retry_backoff: Duration::from_millis(super::default_retry_backoff_ms()),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Gateway client
pub struct GatewayClient {
    http: Client,
    config: GatewayConfig,
    breaker: CircuitBreaker,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;

        let breaker = CircuitBreaker::new(config.breaker.clone());

        Ok(Self {
            http,
            config,
            breaker,
        })
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// POST `body` and decode the JSON response, retrying on failure
    pub async fn post_json<Req, Resp>(&self, body: &Req) -> Result<Resp, GatewayError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let name = self.config.name.as_str();

        if !self.config.enabled {
            METRICS.gateway_requests.with_label_values(&[name, "disabled"]).inc();
            return Err(GatewayError::Disabled(name.to_string()));
        }

        if !self.breaker.allow_request() {
            METRICS.gateway_requests.with_label_values(&[name, "circuit_open"]).inc();
            warn!("Circuit breaker is open for {}", name);
            return Err(GatewayError::CircuitOpen(name.to_string()));
        }

        let start = Instant::now();
        let mut attempt = 0;
        let result = loop {
            attempt += 1;

            match self.send_with_deadline(body).await {
                Ok(resp) => {
                    self.breaker.record_success();
                    METRICS.gateway_requests.with_label_values(&[name, "success"]).inc();
                    break Ok(resp);
                }
                Err(e) => {
                    self.breaker.record_failure();
                    METRICS.gateway_requests.with_label_values(&[name, "error"]).inc();

                    if attempt > self.config.retry_attempts || !self.breaker.allow_request() {
                        error!("{} failed after {} attempts: {}", name, attempt, e);
                        break Err(e);
                    }

                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "{} attempt {} failed: {}, retrying in {:?}",
                        name, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        };

        METRICS
            .gateway_request_duration
            .with_label_values(&[name])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// One attempt, bounded by `timeout` from request start to decoded body
    async fn send_with_deadline<Req, Resp>(&self, body: &Req) -> Result<Resp, GatewayError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        match tokio::time::timeout(self.config.timeout, self.send_once(body)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(format!(
                "{} did not respond within {:?}",
                self.config.name, self.config.timeout
            ))),
        }
    }

    async fn send_once<Req, Resp>(&self, body: &Req) -> Result<Resp, GatewayError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        debug!("Calling {} at {}", self.config.name, self.config.endpoint);

        let mut req = self.http.post(&self.config.endpoint).json(body);

        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key.expose_secret());
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(e.to_string())
            } else {
                GatewayError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Resp>().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout(e.to_string())
            } else {
                GatewayError::InvalidResponse(e.to_string())
            }
        })
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    fn calculate_backoff(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.config.retry_backoff.saturating_mul(2_u32.pow(exponent))
    }

    pub fn breaker_stats(&self) -> BreakerStats {
        self.breaker.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::BreakerState;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Echo {
        value: String,
    }

    fn test_config(endpoint: String) -> GatewayConfig {
        let mut config = GatewayConfig::new("test", endpoint);
        config.timeout = Duration::from_secs(2);
        config.retry_backoff = Duration::from_millis(1);
        config
    }

    #[test]
    fn test_calculate_backoff() {
        let mut config = GatewayConfig::new("test", "http://localhost");
        config.retry_backoff = Duration::from_millis(200);
        let client = GatewayClient::new(config).unwrap();

        assert_eq!(client.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
        assert_eq!(client.calculate_backoff(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_post_json_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/echo")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value":"ok"}"#)
            .create_async()
            .await;

        let mut config = test_config(format!("{}/echo", server.url()));
        config.api_key = Some(SecretString::new("secret".to_string()));
        let client = GatewayClient::new(config).unwrap();

        let resp: Echo = client.post_json(&serde_json::json!({"x": 1})).await.unwrap();
        assert_eq!(resp.value, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_retries_once_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/echo")
            .with_status(500)
            .with_body("boom")
            .expect(2)
            .create_async()
            .await;

        let client = GatewayClient::new(test_config(format!("{}/echo", server.url()))).unwrap();
        let result: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;

        match result {
            Err(GatewayError::Upstream { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/echo")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let mut config = test_config(format!("{}/echo", server.url()));
        config.retry_attempts = 0;
        let client = GatewayClient::new(config).unwrap();
        let result: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;
        assert!(matches!(result, Err(GatewayError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_open_circuit_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/echo")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let mut config = test_config(format!("{}/echo", server.url()));
        config.retry_attempts = 0;
        config.breaker = CircuitBreakerConfig {
            failure_threshold: 1,
            reset_timeout: Duration::from_secs(60),
        };
        let client = GatewayClient::new(config).unwrap();

        let first: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;
        assert!(first.is_err());
        assert_eq!(client.breaker_stats().state, BreakerState::Open);

        let second: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;
        assert!(matches!(second, Err(GatewayError::CircuitOpen(_))));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_stalled_upstream_times_out() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/echo")
            .with_status(200)
            .with_chunked_body(|w| {
                std::thread::sleep(Duration::from_millis(500));
                w.write_all(br#"{"value":"late"}"#)
            })
            .create_async()
            .await;

        let mut config = test_config(format!("{}/echo", server.url()));
        config.timeout = Duration::from_millis(100);
        config.retry_attempts = 0;
        let client = GatewayClient::new(config).unwrap();

        let started = Instant::now();
        let result: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;
        assert!(matches!(result, Err(GatewayError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_millis(450));
        assert_eq!(client.breaker_stats().consecutive_failures, 1);
    }

    #[tokio::test]
    async fn test_disabled_gateway() {
        let mut config = GatewayConfig::new("test", "http://localhost:9");
        config.enabled = false;
        let client = GatewayClient::new(config).unwrap();
        let result: Result<Echo, _> = client.post_json(&serde_json::json!({})).await;
        assert!(matches!(result, Err(GatewayError::Disabled(_))));
    }
}
