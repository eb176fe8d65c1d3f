//! Request and response bodies

use crate::context::{ChatTurn, ConversationContext, TrimOutcome};
use serde::{Deserialize, Serialize};

/// POST /api/v1/context/prepare
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareRequest {
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Option<Vec<String>>,
    pub new_message: String,
}

impl PrepareRequest {
    pub fn into_parts(self) -> (ConversationContext, String) {
        let context = ConversationContext {
            messages: self.messages,
            summary: self.summary,
            key_points: self.key_points,
        };
        (context, self.new_message)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareResponse {
    pub request_id: String,
    pub prompt: String,
    pub context: ConversationContext,
    pub estimated_tokens: usize,
    pub outcome: TrimOutcome,
}

/// POST /api/v1/tokens/estimate
#[derive(Debug, Clone, Deserialize)]
pub struct EstimateRequest {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    pub tokens: usize,
    pub max_context_tokens: usize,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
