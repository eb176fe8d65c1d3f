//! Context API handlers

use super::models::*;
use crate::context::ContextWindowManager;
use crate::metrics::METRICS;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

/// Application state shared by the handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ContextWindowManager>,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

/// Trim the supplied history and assemble the prompt
///
/// POST /api/v1/context/prepare
pub async fn prepare_context(
    State(state): State<AppState>,
    Json(request): Json<PrepareRequest>,
) -> ApiResult<PrepareResponse> {
    let request_id = uuid::Uuid::new_v4().to_string();
    info!(
        "Prepare request {}: {} messages",
        request_id,
        request.messages.len()
    );

    if request.new_message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new("VALIDATION_ERROR", "newMessage cannot be empty")),
        ));
    }

    let (context, new_message) = request.into_parts();
    let prepared = state.manager.prepare(context, &new_message).await;

    Ok(Json(PrepareResponse {
        request_id,
        prompt: prepared.prompt,
        context: prepared.context,
        estimated_tokens: prepared.estimated_tokens,
        outcome: prepared.outcome,
    }))
}

/// Estimate tokens for a piece of text
///
/// POST /api/v1/tokens/estimate
pub async fn estimate_tokens(
    State(state): State<AppState>,
    Json(request): Json<EstimateRequest>,
) -> Json<EstimateResponse> {
    let tokens = state.manager.estimate_tokens(&request.text);
    let budget = state.manager.budget();

    Json(EstimateResponse {
        tokens,
        max_context_tokens: budget.max_context_tokens,
        remaining: budget.remaining(tokens),
    })
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}
