//! Model invocation types

use crate::context::models::TokenUsage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hosted models the workflows route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelKind {
    Gpt4,
    Gpt4Turbo,
    ClaudeOpus,
    ClaudeSonnet,
    DeepseekCoder,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Gpt4 => "gpt4",
            ModelKind::Gpt4Turbo => "gpt4_turbo",
            ModelKind::ClaudeOpus => "claude_opus",
            ModelKind::ClaudeSonnet => "claude_sonnet",
            ModelKind::DeepseekCoder => "deepseek_coder",
        }
    }

    pub fn temperature(&self) -> f32 {
        match self {
            ModelKind::Gpt4 | ModelKind::Gpt4Turbo => 0.7,
            ModelKind::ClaudeOpus => 0.5,
            ModelKind::ClaudeSonnet => 0.6,
            ModelKind::DeepseekCoder => 0.3,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            ModelKind::Gpt4 | ModelKind::ClaudeSonnet => 2000,
            ModelKind::ClaudeOpus => 2500,
            ModelKind::Gpt4Turbo | ModelKind::DeepseekCoder => 3000,
        }
    }
}

/// One call to a hosted model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationRequest {
    pub system: String,
    /// Assembled conversation prompt, passed through verbatim
    pub context: String,
    /// Stage-specific instruction
    pub instruction: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Reply from a hosted model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    #[serde(default)]
    pub usage: TokenUsage,
}

/// Invocation errors
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Stage timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Calls a hosted model. Vendor SDKs live behind this seam.
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    async fn invoke(
        &self,
        model: ModelKind,
        request: &InvocationRequest,
    ) -> Result<ModelResponse, InvokeError>;
}

/// Per-user response preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub response_style: Option<String>,
    #[serde(default)]
    pub code_comments: bool,
    #[serde(default)]
    pub arabic_labels: bool,
}
