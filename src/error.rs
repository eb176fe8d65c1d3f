//! Error types for the context window manager

use thiserror::Error;

use crate::context::token_budget::BudgetError;
use crate::gateway::GatewayError;

/// Crate-level error
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Budget error: {0}")]
    Budget(#[from] BudgetError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Token estimator error: {0}")]
    Estimator(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for ContextError {
    fn from(e: config::ConfigError) -> Self {
        ContextError::Configuration(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
