//! Context window manager
//!
//! Per inbound message: refresh key points when the history has grown past
//! the summarization trigger, trim to the budget, assemble the prompt.
//! Holds no per-conversation state.

use super::key_points::KeyPointExtractor;
use super::models::ConversationContext;
use super::prompt::{PromptAssembler, PromptConfig};
use super::summarizer::Summarizer;
use super::token_budget::TokenBudget;
use super::token_estimator::TokenEstimator;
use super::trimmer::{ContextTrimmer, TrimOutcome, TrimmingConfig};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Prompt ready for the model layer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedPrompt {
    pub prompt: String,
    /// The context the prompt was built from
    pub context: ConversationContext,
    /// Estimated tokens of the context plus the new message
    pub estimated_tokens: usize,
    pub outcome: TrimOutcome,
}

/// Context window manager
pub struct ContextWindowManager {
    trimmer: ContextTrimmer,
    assembler: PromptAssembler,
    key_points: Option<Arc<dyn KeyPointExtractor>>,
}

impl ContextWindowManager {
    pub fn new(
        budget: TokenBudget,
        trimming: TrimmingConfig,
        prompt: &PromptConfig,
        estimator: Arc<dyn TokenEstimator>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        let trimmer = ContextTrimmer::new(budget, trimming, estimator, summarizer)?;
        Ok(Self {
            trimmer,
            assembler: PromptAssembler::new(prompt),
            key_points: None,
        })
    }

    /// Enable key point refresh through `extractor`
    pub fn with_key_points(mut self, extractor: Arc<dyn KeyPointExtractor>) -> Self {
        self.key_points = Some(extractor);
        self
    }

    pub fn budget(&self) -> &TokenBudget {
        self.trimmer.budget()
    }

    pub fn estimate_tokens(&self, text: &str) -> usize {
        self.trimmer.estimator().estimate(text)
    }

    /// Build the prompt for `new_message` on top of `context`
    pub async fn prepare(
        &self,
        context: ConversationContext,
        new_message: &str,
    ) -> PreparedPrompt {
        let context = self.refresh_key_points(context).await;
        let (context, outcome) = self.trimmer.trim_with_outcome(context, new_message).await;
        let prompt = self.assembler.assemble(&context, new_message);

        debug!(
            "Prepared prompt: {} turns, ~{} tokens, {}",
            context.len(),
            outcome.tokens_after,
            outcome.action.as_str()
        );

        PreparedPrompt {
            prompt,
            context,
            estimated_tokens: outcome.tokens_after,
            outcome,
        }
    }

    /// Assemble without trimming
    pub fn assemble(&self, context: &ConversationContext, new_message: &str) -> String {
        self.assembler.assemble(context, new_message)
    }

    async fn refresh_key_points(&self, mut context: ConversationContext) -> ConversationContext {
        let Some(extractor) = &self.key_points else {
            return context;
        };
        if context.key_points().is_some() {
            return context;
        }

        let tokens = self.trimmer.estimator().estimate_context(&context);
        if !self.budget().exceeds_summary_threshold(tokens) {
            return context;
        }

        let points = extractor.extract(&context.messages).await;
        if !points.is_empty() {
            info!("Attached {} key points at {} tokens", points.len(), tokens);
            context.key_points = Some(points);
        }
        context
    }
}
