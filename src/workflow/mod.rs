//! Multi-model workflows
//!
//! A user message is classified by keyword and routed to a pipeline of one
//! or more model stages. The assembled context prompt is passed to every
//! stage unchanged.

pub mod models;
pub mod pipeline;
pub mod prompts;

pub use models::{
    InvocationRequest, InvokeError, ModelInvoker, ModelKind, ModelResponse, UserPreferences,
};
pub use pipeline::{
    classify_request, Pipeline, RequestType, Stage, WorkflowConfig, WorkflowOrchestrator,
    WorkflowResult, WorkflowStatus,
};
pub use prompts::{combine_results, system_prompt, StageKind, APOLOGY_MESSAGE};
