//! Service configuration
//!
//! Layered: built-in defaults, then an optional file, then `CONTEXT__*`
//! environment variables (`CONTEXT__TOKEN_BUDGET__MAX_CONTEXT_TOKENS=12000`).
//! The gateway sections additionally honor their flat `SUMMARIZER_*` and
//! `KEY_POINTS_*` variables.

use crate::cache::CacheConfig;
use crate::context::{
    EstimatorKind, KeyPointsConfig, PromptConfig, SummarizerConfig, TokenBudget, TrimmingConfig,
};
use crate::error::{ContextError, Result};
use crate::workflow::WorkflowConfig;
use serde::Deserialize;
use std::net::SocketAddr;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub token_budget: TokenBudget,

    #[serde(default)]
    pub trimming: TrimmingConfig,

    #[serde(default)]
    pub estimator: EstimatorKind,

    #[serde(default)]
    pub prompt: PromptConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub key_points: KeyPointsConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request body limit in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ContextError::Configuration(format!("Invalid listen address: {}", e)))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Logging settings; `RUST_LOG` wins over `level` when set
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Json
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("CONTEXT")
                .separator("__")
                .try_parsing(true),
        );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.summarizer = cfg.summarizer.from_env();
        cfg.key_points = cfg.key_points.from_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject inconsistent settings
    pub fn validate(&self) -> Result<()> {
        self.token_budget.validate()?;
        self.trimming.validate()?;

        if self.summarizer.enabled && self.summarizer.endpoint.is_empty() {
            return Err(ContextError::Configuration(
                "summarizer endpoint must be set when enabled".to_string(),
            ));
        }
        if self.key_points.enabled && self.key_points.endpoint.is_empty() {
            return Err(ContextError::Configuration(
                "key_points endpoint must be set when enabled".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(ContextError::Configuration(
                "cache max_entries must be positive".to_string(),
            ));
        }

        let durations = [
            ("cache.ttl_secs", self.cache.ttl_secs),
            ("cache.sweep_interval_secs", self.cache.sweep_interval_secs),
            ("summarizer.timeout_ms", self.summarizer.timeout_ms),
            ("key_points.timeout_ms", self.key_points.timeout_ms),
            ("workflow.stage_timeout_secs", self.workflow.stage_timeout_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, value)| *value == 0) {
            return Err(ContextError::Configuration(format!(
                "{} must be positive",
                name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::token_budget::BudgetError;
    use crate::context::LabelLanguage;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        tokio_test::assert_ok!(cfg.validate());
        assert_eq!(cfg.token_budget.max_context_tokens, 8000);
        assert_eq!(cfg.trimming.recent_window, 5);
        assert_eq!(cfg.estimator, EstimatorKind::Heuristic);
        assert_eq!(cfg.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("cwm-config-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("context.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
estimator = "tiktoken"

[token_budget]
max_context_tokens = 12000
summary_threshold = 9000
emergency_trim_tokens = 6000

[prompt]
labels = "english"
max_turns = 4

[server]
port = 9090
"#
        )
        .unwrap();

        let cfg = Config::load(path.to_str()).unwrap();
        assert_eq!(cfg.token_budget.max_context_tokens, 12000);
        assert_eq!(cfg.estimator, EstimatorKind::Tiktoken);
        assert_eq!(cfg.prompt.labels, LabelLanguage::English);
        assert_eq!(cfg.prompt.max_turns, Some(4));
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_rejects_unordered_budget() {
        let cfg = Config {
            token_budget: TokenBudget {
                max_context_tokens: 1000,
                summary_threshold: 1200,
                emergency_trim_tokens: 500,
            },
            ..Config::default()
        };

        match cfg.validate() {
            Err(ContextError::Budget(BudgetError::TriggerNotBelowMax { trigger, max })) => {
                assert_eq!(trigger, 1200);
                assert_eq!(max, 1000);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_windows() {
        let cfg = Config {
            trimming: TrimmingConfig {
                recent_window: 2,
                emergency_window: 3,
            },
            ..Config::default()
        };
        assert!(matches!(cfg.validate(), Err(ContextError::Configuration(_))));
    }

    #[test]
    fn test_rejects_zero_durations() {
        let cases: Vec<(&str, Box<dyn Fn(&mut Config)>)> = vec![
            ("cache.ttl_secs", Box::new(|c| c.cache.ttl_secs = 0)),
            ("cache.sweep_interval_secs", Box::new(|c| c.cache.sweep_interval_secs = 0)),
            ("summarizer.timeout_ms", Box::new(|c| c.summarizer.timeout_ms = 0)),
            ("key_points.timeout_ms", Box::new(|c| c.key_points.timeout_ms = 0)),
            ("workflow.stage_timeout_secs", Box::new(|c| c.workflow.stage_timeout_secs = 0)),
        ];

        for (name, zero_out) in cases {
            let mut cfg = Config::default();
            zero_out(&mut cfg);
            match cfg.validate() {
                Err(ContextError::Configuration(msg)) => assert!(msg.contains(name), "{}", msg),
                other => panic!("{} = 0 accepted: {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8081);

        let bad = ServerConfig {
            host: "not a host".to_string(),
            ..ServerConfig::default()
        };
        tokio_test::assert_err!(bad.socket_addr());
    }
}
