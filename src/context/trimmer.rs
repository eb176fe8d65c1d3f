//! Context trimming against the token budget
//!
//! Trimming is a read-time transformation, recomputed every turn from the
//! full stored history:
//! 1. context + incoming message fits the hard maximum: return it untouched
//! 2. otherwise keep the last `recent_window` turns and summarize the rest
//!    (only if no summary exists yet)
//! 3. if the trimmed context is still above the emergency floor, keep only
//!    the last `emergency_window` turns
//!
//! Summarizer failures never escape: a templated summary takes its place.

use super::models::{ChatTurn, ConversationContext};
use super::summarizer::{fallback_summary, Summarizer};
use super::token_budget::TokenBudget;
use super::token_estimator::TokenEstimator;
use crate::error::{ContextError, Result};
use crate::metrics::METRICS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Window sizes used when trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimmingConfig {
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    #[serde(default = "default_emergency_window")]
    pub emergency_window: usize,
}

fn default_recent_window() -> usize { 5 }
fn default_emergency_window() -> usize { 3 }

impl Default for TrimmingConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            emergency_window: default_emergency_window(),
        }
    }
}

impl TrimmingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.emergency_window == 0 || self.emergency_window > self.recent_window {
            return Err(ContextError::Configuration(format!(
                "emergency window {} must be between 1 and recent window {}",
                self.emergency_window, self.recent_window
            )));
        }
        Ok(())
    }
}

/// What the trimmer did to a context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimAction {
    Unchanged,
    Trimmed,
    EmergencyTrimmed,
}

impl TrimAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrimAction::Unchanged => "unchanged",
            TrimAction::Trimmed => "trimmed",
            TrimAction::EmergencyTrimmed => "emergency_trimmed",
        }
    }
}

/// Trimming report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrimOutcome {
    pub action: TrimAction,
    /// Context + incoming message before trimming
    pub tokens_before: usize,
    /// Context + incoming message after trimming
    pub tokens_after: usize,
    /// The summarizer was asked for a summary
    pub summarized: bool,
    /// The templated summary replaced a failed summarization
    pub used_fallback: bool,
}

/// Shrinks conversation contexts to the token budget
pub struct ContextTrimmer {
    budget: TokenBudget,
    config: TrimmingConfig,
    estimator: Arc<dyn TokenEstimator>,
    summarizer: Arc<dyn Summarizer>,
}

impl ContextTrimmer {
    pub fn new(
        budget: TokenBudget,
        config: TrimmingConfig,
        estimator: Arc<dyn TokenEstimator>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Result<Self> {
        budget.validate()?;
        config.validate()?;
        Ok(Self {
            budget,
            config,
            estimator,
            summarizer,
        })
    }

    pub fn budget(&self) -> &TokenBudget {
        &self.budget
    }

    pub fn estimator(&self) -> &Arc<dyn TokenEstimator> {
        &self.estimator
    }

    /// Trim `context` so that it fits the budget together with `new_message`
    pub async fn trim(&self, context: ConversationContext, new_message: &str) -> ConversationContext {
        self.trim_with_outcome(context, new_message).await.0
    }

    /// Same as [`trim`](Self::trim), also reporting what was done
    pub async fn trim_with_outcome(
        &self,
        context: ConversationContext,
        new_message: &str,
    ) -> (ConversationContext, TrimOutcome) {
        let message_tokens = self.estimator.estimate(new_message);
        let tokens_before = self.estimator.estimate_context(&context) + message_tokens;

        debug!(
            "Context estimate: {} messages, {} tokens incl. new message (max {})",
            context.len(),
            tokens_before,
            self.budget.max_context_tokens
        );

        if !self.budget.exceeds_max(tokens_before) {
            let outcome = TrimOutcome {
                action: TrimAction::Unchanged,
                tokens_before,
                tokens_after: tokens_before,
                summarized: false,
                used_fallback: false,
            };
            METRICS.record_trim(outcome.action.as_str(), outcome.tokens_after);
            return (context, outcome);
        }

        let ConversationContext {
            mut messages,
            summary,
            key_points,
        } = context;

        let split = messages.len().saturating_sub(self.config.recent_window);
        let recent = messages.split_off(split);
        let older = messages;

        // a blank summary covers nothing
        let summary = summary.filter(|s| !s.trim().is_empty());

        let mut summarized = false;
        let mut used_fallback = false;
        let summary = match summary {
            None if !older.is_empty() => {
                summarized = true;
                let (text, fallback) = self.summarize_older(&older).await;
                used_fallback = fallback;
                Some(text)
            }
            existing => existing,
        };

        let mut trimmed = ConversationContext {
            messages: recent,
            summary,
            key_points,
        };

        let mut action = TrimAction::Trimmed;
        if self
            .budget
            .exceeds_emergency_floor(self.estimator.estimate_context(&trimmed))
        {
            let keep_from = trimmed
                .messages
                .len()
                .saturating_sub(self.config.emergency_window);
            trimmed.messages = trimmed.messages.split_off(keep_from);
            action = TrimAction::EmergencyTrimmed;
        }

        let tokens_after = self.estimator.estimate_context(&trimmed) + message_tokens;
        info!(
            "Trimmed context ({}): {} dropped turns, {} -> {} tokens",
            action.as_str(),
            older.len(),
            tokens_before,
            tokens_after
        );

        let outcome = TrimOutcome {
            action,
            tokens_before,
            tokens_after,
            summarized,
            used_fallback,
        };
        METRICS.record_trim(action.as_str(), tokens_after);

        (trimmed, outcome)
    }

    /// Summarize the dropped turns, substituting the templated text on failure
    async fn summarize_older(&self, older: &[ChatTurn]) -> (String, bool) {
        match self.summarizer.summarize(older).await {
            Ok(summary) => (summary, false),
            Err(e) => {
                warn!(
                    "Summarization of {} turns failed, using fallback: {}",
                    older.len(),
                    e
                );
                METRICS.record_fallback_summary();
                (fallback_summary(older, self.summarizer.language()), true)
            }
        }
    }
}
