//! Token estimation
//!
//! The default estimator is a character-ratio heuristic tuned for mixed
//! Arabic/English chat: text containing any Arabic-block character counts
//! 4 characters per token, anything else 3. It is not a tokenizer and makes
//! no exactness claim. A cl100k_base BPE estimator is available for callers
//! that need figures closer to a real model.

use super::models::ConversationContext;
use crate::error::{ContextError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Token estimator trait for different tokenization strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in the given text
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }

    /// Estimate a whole context: every message rounded up on its own, plus
    /// the summary. Key points are not counted.
    fn estimate_context(&self, context: &ConversationContext) -> usize {
        let messages: usize = context
            .messages
            .iter()
            .map(|m| self.estimate(&m.content))
            .sum();
        let summary = context
            .summary
            .as_deref()
            .map(|s| self.estimate(s))
            .unwrap_or(0);
        messages + summary
    }
}

/// Estimator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimatorKind {
    Heuristic,
    Tiktoken,
}

impl Default for EstimatorKind {
    fn default() -> Self {
        EstimatorKind::Heuristic
    }
}

/// Build the estimator named by configuration
pub fn build_estimator(kind: EstimatorKind) -> Result<Arc<dyn TokenEstimator>> {
    match kind {
        EstimatorKind::Heuristic => Ok(Arc::new(HeuristicEstimator::default())),
        EstimatorKind::Tiktoken => Ok(Arc::new(TiktokenEstimator::new()?)),
    }
}

/// Returns true if `text` contains a character from the Arabic block (U+0600..=U+06FF)
pub fn contains_arabic(text: &str) -> bool {
    text.chars().any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
}

/// Character-ratio estimator
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEstimator {
    arabic_chars_per_token: usize,
    default_chars_per_token: usize,
}

impl HeuristicEstimator {
    pub fn new(arabic_chars_per_token: usize, default_chars_per_token: usize) -> Self {
        Self {
            arabic_chars_per_token: arabic_chars_per_token.max(1),
            default_chars_per_token: default_chars_per_token.max(1),
        }
    }
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self::new(4, 3)
    }
}

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        let ratio = if contains_arabic(text) {
            self.arabic_chars_per_token
        } else {
            self.default_chars_per_token
        };
        text.chars().count().div_ceil(ratio)
    }
}

/// Tiktoken-based token estimator using cl100k_base (GPT-4, GPT-3.5-turbo)
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    pub fn new() -> Result<Self> {
        let bpe = cl100k_base().map_err(|e| ContextError::Estimator(e.to_string()))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}
