//! Environment layering for `Config::load`
//!
//! Kept in its own test binary: it mutates process environment variables.

use context_window_manager::config::Config;
use context_window_manager::context::EstimatorKind;
use context_window_manager::ContextError;
use secrecy::ExposeSecret;

fn set(vars: &[(&str, &str)]) {
    for (key, value) in vars {
        std::env::set_var(key, value);
    }
}

fn clear(vars: &[(&str, &str)]) {
    for (key, _) in vars {
        std::env::remove_var(key);
    }
}

#[test]
fn test_environment_layers_over_defaults() {
    let vars = [
        ("CONTEXT__TOKEN_BUDGET__MAX_CONTEXT_TOKENS", "12000"),
        ("CONTEXT__TOKEN_BUDGET__SUMMARY_THRESHOLD", "9000"),
        ("CONTEXT__ESTIMATOR", "tiktoken"),
        ("CONTEXT__SERVER__PORT", "9191"),
        ("CONTEXT__SUMMARIZER__ENDPOINT", "http://nested.local/summarize"),
        ("SUMMARIZER_URL", "http://flat.local/summarize"),
        ("SUMMARIZER_API_KEY", "sum-key"),
        ("SUMMARIZER_TIMEOUT_MS", "2500"),
        ("KEY_POINTS_ENABLED", "true"),
        ("KEY_POINTS_URL", "http://flat.local/points"),
        ("KEY_POINTS_API_KEY", "kp-key"),
    ];
    set(&vars);
    let loaded = Config::load(None);
    clear(&vars);

    let cfg = loaded.unwrap();
    assert_eq!(cfg.token_budget.max_context_tokens, 12000);
    assert_eq!(cfg.token_budget.summary_threshold, 9000);
    assert_eq!(cfg.token_budget.emergency_trim_tokens, 4000);
    assert_eq!(cfg.estimator, EstimatorKind::Tiktoken);
    assert_eq!(cfg.server.port, 9191);

    // flat variables win over the nested section
    assert_eq!(cfg.summarizer.endpoint, "http://flat.local/summarize");
    assert_eq!(
        cfg.summarizer.api_key.as_ref().map(|k| k.expose_secret().as_str()),
        Some("sum-key")
    );
    assert_eq!(cfg.summarizer.timeout_ms, 2500);

    assert!(cfg.key_points.enabled);
    assert_eq!(cfg.key_points.endpoint, "http://flat.local/points");
    assert_eq!(
        cfg.key_points.api_key.as_ref().map(|k| k.expose_secret().as_str()),
        Some("kp-key")
    );

    // an environment override that breaks validation is rejected
    let bad = [("CONTEXT__CACHE__SWEEP_INTERVAL_SECS", "0")];
    set(&bad);
    let loaded = Config::load(None);
    clear(&bad);
    assert!(matches!(loaded, Err(ContextError::Configuration(_))));
}
