//! Token budget thresholds
//!
//! Three ordered limits drive trimming:
//! - `max_context_tokens`: hard ceiling for context + incoming message
//! - `summary_threshold`: point at which the history is worth condensing
//! - `emergency_trim_tokens`: floor a trimmed context must not exceed
//!
//! All comparisons are strict, so a total exactly on a limit fits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token budget configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBudget {
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
    #[serde(default = "default_summary_threshold")]
    pub summary_threshold: usize,
    #[serde(default = "default_emergency_trim_tokens")]
    pub emergency_trim_tokens: usize,
}

fn default_max_context_tokens() -> usize { 8000 }
fn default_summary_threshold() -> usize { 6000 }
fn default_emergency_trim_tokens() -> usize { 4000 }

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            summary_threshold: default_summary_threshold(),
            emergency_trim_tokens: default_emergency_trim_tokens(),
        }
    }
}

/// Token budget errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BudgetError {
    #[error("Configuration invalid: emergency floor {floor} must be below summary threshold {trigger}")]
    FloorNotBelowTrigger { floor: usize, trigger: usize },

    #[error("Configuration invalid: summary threshold {trigger} must be below max context {max}")]
    TriggerNotBelowMax { trigger: usize, max: usize },
}

impl TokenBudget {
    /// Build a budget, enforcing floor < trigger < max
    pub fn new(
        max_context_tokens: usize,
        summary_threshold: usize,
        emergency_trim_tokens: usize,
    ) -> Result<Self, BudgetError> {
        let budget = Self {
            max_context_tokens,
            summary_threshold,
            emergency_trim_tokens,
        };
        budget.validate()?;
        Ok(budget)
    }

    /// Validate that the thresholds are ordered
    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.emergency_trim_tokens >= self.summary_threshold {
            return Err(BudgetError::FloorNotBelowTrigger {
                floor: self.emergency_trim_tokens,
                trigger: self.summary_threshold,
            });
        }
        if self.summary_threshold >= self.max_context_tokens {
            return Err(BudgetError::TriggerNotBelowMax {
                trigger: self.summary_threshold,
                max: self.max_context_tokens,
            });
        }
        Ok(())
    }

    /// Whether `tokens` exceeds the hard maximum
    pub fn exceeds_max(&self, tokens: usize) -> bool {
        tokens > self.max_context_tokens
    }

    /// Whether `tokens` has crossed the summarization trigger
    pub fn exceeds_summary_threshold(&self, tokens: usize) -> bool {
        tokens > self.summary_threshold
    }

    /// Whether a trimmed context of `tokens` still needs the emergency cut
    pub fn exceeds_emergency_floor(&self, tokens: usize) -> bool {
        tokens > self.emergency_trim_tokens
    }

    /// Tokens left under the hard maximum
    pub fn remaining(&self, tokens: usize) -> usize {
        self.max_context_tokens.saturating_sub(tokens)
    }
}
