//! Token-budgeted conversation context management
//!
//! Keeps a conversation's history within a model's context window: estimates
//! tokens, condenses older turns into a summary through a helper service,
//! and assembles the final prompt. A multi-model workflow layer consumes the
//! assembled prompt.

pub mod api;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod workflow;

pub use cache::{CacheConfig, SweeperHandle, TtlCache};
pub use config::Config;
pub use context::{
    ChatTurn, ContextTrimmer, ContextWindowManager, ConversationContext, PreparedPrompt, Role,
    TokenBudget, TokenEstimator,
};
pub use error::{ContextError, Result};
pub use workflow::{WorkflowOrchestrator, WorkflowResult};
