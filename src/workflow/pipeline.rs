//! Staged model pipelines

use super::models::{InvocationRequest, InvokeError, ModelInvoker, ModelKind, UserPreferences};
use super::prompts::{combine_results, system_prompt, StageKind, APOLOGY_MESSAGE};
use crate::context::models::TokenUsage;
use crate::metrics::METRICS;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Per-stage timeout in seconds
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: u64,
}

fn default_stage_timeout_secs() -> u64 { 30 }

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            stage_timeout_secs: default_stage_timeout_secs(),
        }
    }
}

impl WorkflowConfig {
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs)
    }
}

/// Request category deciding which pipeline runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    CodeGeneration,
    Analysis,
    Creative,
    General,
}

const CODE_KEYWORDS: &[&str] = &[
    "كود", "برمجة", "تطبيق", "موقع", "api", "function", "class", "script",
];
const ANALYSIS_KEYWORDS: &[&str] = &["تحليل", "دراسة", "مقارنة", "تقييم", "بحث", "إحصائيات"];
const CREATIVE_KEYWORDS: &[&str] = &["اكتب", "أنشئ", "صمم", "قصة", "مقال", "شعر", "إبداعي"];

/// Classify a message by keyword; code beats analysis beats creative
pub fn classify_request(message: &str) -> RequestType {
    let lower = message.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if mentions(CODE_KEYWORDS) {
        RequestType::CodeGeneration
    } else if mentions(ANALYSIS_KEYWORDS) {
        RequestType::Analysis
    } else if mentions(CREATIVE_KEYWORDS) {
        RequestType::Creative
    } else {
        RequestType::General
    }
}

/// One model call within a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub kind: StageKind,
    pub model: ModelKind,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Complete,
    /// Some stages succeeded before one failed
    Partial,
    Failed,
}

/// Pipeline result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowResult {
    pub content: String,
    pub model: ModelKind,
    pub usage: TokenUsage,
    pub status: WorkflowStatus,
    pub response_time_ms: u64,
}

/// Sequence of stages, each fed the previous stage's output
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
    stage_timeout: Duration,
}

impl Pipeline {
    pub fn new(stages: Vec<Stage>, stage_timeout: Duration) -> Self {
        Self {
            stages,
            stage_timeout,
        }
    }

    /// Pipeline for a request category
    pub fn for_request(request_type: RequestType, stage_timeout: Duration) -> Self {
        let stages = match request_type {
            RequestType::CodeGeneration => vec![
                Stage { kind: StageKind::Planning, model: ModelKind::Gpt4 },
                Stage { kind: StageKind::Analysis, model: ModelKind::ClaudeSonnet },
                Stage { kind: StageKind::Execution, model: ModelKind::DeepseekCoder },
            ],
            RequestType::Analysis => vec![Stage {
                kind: StageKind::Analysis,
                model: ModelKind::ClaudeOpus,
            }],
            RequestType::Creative => vec![Stage {
                kind: StageKind::Creative,
                model: ModelKind::Gpt4,
            }],
            RequestType::General => vec![Stage {
                kind: StageKind::General,
                model: ModelKind::ClaudeSonnet,
            }],
        };
        Self::new(stages, stage_timeout)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub async fn run(
        &self,
        invoker: &dyn ModelInvoker,
        user_message: &str,
        context_prompt: &str,
        preferences: &UserPreferences,
    ) -> WorkflowResult {
        let start = Instant::now();
        let system = system_prompt(preferences);
        let mut usage = TokenUsage::default();
        let mut completed: Vec<(StageKind, String)> = Vec::new();
        let mut last_model = None;
        let mut previous = String::new();

        for stage in &self.stages {
            let request = InvocationRequest {
                system: system.clone(),
                context: context_prompt.to_string(),
                instruction: stage.kind.instruction(user_message, &previous),
                temperature: stage.model.temperature(),
                max_tokens: stage.model.max_tokens(),
            };

            let stage_start = Instant::now();
            let outcome = match tokio::time::timeout(
                self.stage_timeout,
                invoker.invoke(stage.model, &request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(InvokeError::Timeout(self.stage_timeout)),
            };
            let elapsed = stage_start.elapsed().as_secs_f64();

            match outcome {
                Ok(response) => {
                    METRICS.record_stage(stage.kind.key(), "success", elapsed);
                    debug!(
                        "Stage {} on {} finished in {:.2}s",
                        stage.kind.key(),
                        stage.model.as_str(),
                        elapsed
                    );
                    usage.add(&response.usage);
                    last_model = Some(stage.model);
                    previous = response.content.clone();
                    completed.push((stage.kind, response.content));
                }
                Err(e) => {
                    METRICS.record_stage(stage.kind.key(), "error", elapsed);
                    warn!(
                        "Stage {} on {} failed: {}",
                        stage.kind.key(),
                        stage.model.as_str(),
                        e
                    );
                    break;
                }
            }
        }

        let response_time_ms = start.elapsed().as_millis() as u64;

        let Some(model) = last_model else {
            error!("Workflow produced no output");
            return WorkflowResult {
                content: APOLOGY_MESSAGE.to_string(),
                model: ModelKind::ClaudeSonnet,
                usage,
                status: WorkflowStatus::Failed,
                response_time_ms,
            };
        };

        let status = if completed.len() == self.stages.len() {
            WorkflowStatus::Complete
        } else {
            WorkflowStatus::Partial
        };

        let content = if self.stages.len() == 1 {
            completed.remove(0).1
        } else {
            combine_results(&completed)
        };

        WorkflowResult {
            content,
            model,
            usage,
            status,
            response_time_ms,
        }
    }
}

/// Routes a user request through the matching pipeline
pub struct WorkflowOrchestrator {
    invoker: Arc<dyn ModelInvoker>,
    config: WorkflowConfig,
}

impl WorkflowOrchestrator {
    pub fn new(invoker: Arc<dyn ModelInvoker>, config: WorkflowConfig) -> Self {
        Self { invoker, config }
    }

    /// Process `user_message`; `context_prompt` is the assembled conversation prompt
    pub async fn process(
        &self,
        user_message: &str,
        context_prompt: &str,
        preferences: &UserPreferences,
    ) -> WorkflowResult {
        let request_type = classify_request(user_message);
        let pipeline = Pipeline::for_request(request_type, self.config.stage_timeout());
        info!(
            "Running {:?} workflow with {} stages",
            request_type,
            pipeline.stages().len()
        );

        pipeline
            .run(self.invoker.as_ref(), user_message, context_prompt, preferences)
            .await
    }
}
