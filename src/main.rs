use anyhow::Context;
use context_window_manager::{
    api::{build_router, AppState},
    cache::TtlCache,
    config::{Config, LogFormat},
    context::{
        build_estimator, CachingSummarizer, ContextWindowManager, HttpKeyPointExtractor,
        HttpSummarizer, Summarizer,
    },
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONTEXT_CONFIG").ok();
    let config = Config::load(config_path.as_deref()).context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Pretty => tracing_subscriber::fmt().pretty().with_env_filter(filter).init(),
    }

    info!(
        "Starting context window manager (max {} tokens)",
        config.token_budget.max_context_tokens
    );

    let estimator = build_estimator(config.estimator)?;

    let cache = Arc::new(TtlCache::<String>::from_config(&config.cache));
    let sweeper = cache.spawn_sweeper(config.cache.sweep_interval());

    let http_summarizer: Arc<dyn Summarizer> =
        Arc::new(HttpSummarizer::new(config.summarizer.clone())?);
    let summarizer: Arc<dyn Summarizer> = if config.summarizer.cache_summaries {
        Arc::new(CachingSummarizer::new(http_summarizer, cache.clone()))
    } else {
        http_summarizer
    };
    if !config.summarizer.enabled {
        warn!("Summarizer disabled; trimmed turns get templated summaries");
    }

    let mut manager = ContextWindowManager::new(
        config.token_budget,
        config.trimming,
        &config.prompt,
        estimator,
        summarizer,
    )?;
    if config.key_points.enabled {
        let extractor = HttpKeyPointExtractor::new(config.key_points.clone())?;
        manager = manager.with_key_points(Arc::new(extractor));
    }

    let state = AppState {
        manager: Arc::new(manager),
    };
    let app = build_router(state, config.server.max_body_bytes);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.stop().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
