//! Conversation context management with token budget enforcement
//!
//! Estimation, trimming (with summarization of dropped turns), key point
//! extraction and prompt assembly for a single inbound chat message.

pub mod key_points;
pub mod manager;
pub mod models;
pub mod prompt;
pub mod summarizer;
pub mod token_budget;
pub mod token_estimator;
pub mod trimmer;

pub use key_points::{HttpKeyPointExtractor, KeyPointExtractor, KeyPointsConfig};
pub use manager::{ContextWindowManager, PreparedPrompt};
pub use models::{ChatTurn, ConversationContext, Role, TokenUsage};
pub use prompt::{LabelLanguage, PromptAssembler, PromptConfig, PromptLabels};
pub use summarizer::{
    fallback_summary, CachingSummarizer, HttpSummarizer, Summarizer, SummarizerConfig,
    SummarizerError,
};
pub use token_budget::{BudgetError, TokenBudget};
pub use token_estimator::{
    build_estimator, EstimatorKind, HeuristicEstimator, TiktokenEstimator, TokenEstimator,
};
pub use trimmer::{ContextTrimmer, TrimAction, TrimOutcome, TrimmingConfig};
