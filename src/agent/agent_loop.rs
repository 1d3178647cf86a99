//! Agent loop for tool-based code review.
//!
//! Each review owns a fresh [`Conversation`]. The loop calls the model,
//! runs every requested tool in order, feeds the results back, and stops
//! when the model answers without requesting tools or the round budget
//! runs out.

use crate::agent::client::ChatModel;
use crate::agent::conversation::Conversation;
use crate::agent::error::ReviewError;
use crate::agent::tools::{get_tool_definitions, ToolExecutor};
use crate::models::{ToolCall, ToolDefinition};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model calls for one review.
    pub max_rounds: usize,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: 100,
            system_prompt: REVIEW_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Result of a converged review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewOutcome {
    /// Final assistant text.
    pub review: String,
    /// Model calls made, including the final one.
    pub rounds: usize,
    /// Tool calls executed across all rounds.
    pub tool_calls: usize,
    pub finish_reason: Option<String>,
}

/// Progress notifications emitted while a review runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewProgress {
    /// Waiting on the model for this round.
    ModelCall { round: usize },
    /// Running a tool requested in this round.
    ToolCall { round: usize, name: String },
}

pub type ProgressObserver = Arc<dyn Fn(ReviewProgress) + Send + Sync>;

/// The code review agent.
///
/// Holds no per-review state, so one agent can serve concurrent reviews.
pub struct ReviewAgent {
    model: Arc<dyn ChatModel>,
    executor: ToolExecutor,
    tools: Vec<ToolDefinition>,
    config: AgentConfig,
    observer: Option<ProgressObserver>,
}

impl ReviewAgent {
    pub fn new(model: Arc<dyn ChatModel>, executor: ToolExecutor, config: AgentConfig) -> Self {
        info!(
            "Initializing review agent with model {} (max {} rounds)",
            model.model_name(),
            config.max_rounds
        );

        Self {
            model,
            executor,
            tools: get_tool_definitions(),
            config,
            observer: None,
        }
    }

    /// Receive [`ReviewProgress`] events while reviews run.
    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Run one review for `request`.
    ///
    /// Cancelling `cancel` aborts an in-flight model call. A tool that has
    /// already started runs to completion; cancellation is observed before
    /// the next model call.
    pub async fn review(
        &self,
        request: &str,
        cancel: &CancellationToken,
    ) -> Result<ReviewOutcome, ReviewError> {
        let mut conversation = Conversation::new(&self.config.system_prompt, request);
        let mut tool_calls_run = 0;
        let mut previous_round: Vec<ToolCall> = Vec::new();

        for round in 1..=self.config.max_rounds {
            if cancel.is_cancelled() {
                return Err(ReviewError::Cancelled);
            }
            debug_assert!(conversation.is_ready_for_model());
            self.notify(ReviewProgress::ModelCall { round });

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ReviewError::Cancelled),
                result = self.model.complete(conversation.messages(), &self.tools) => result?,
            };

            let choice = response
                .into_first_choice()
                .ok_or(ReviewError::EmptyResponse)?;
            let finish_reason = choice.finish_reason;
            let content = choice.message.content.clone();

            let calls = conversation.push_assistant(choice.message);
            info!(
                "[round {}] finish_reason={}, tool_calls={}",
                round,
                finish_reason.as_deref().unwrap_or("none"),
                calls.len()
            );

            if calls.is_empty() {
                info!(
                    "Review complete after {} rounds and {} tool calls",
                    round, tool_calls_run
                );
                return Ok(ReviewOutcome {
                    review: content.unwrap_or_default(),
                    rounds: round,
                    tool_calls: tool_calls_run,
                    finish_reason,
                });
            }

            if same_requests(&calls, &previous_round) {
                warn!(
                    "[round {}] model repeated the previous round's tool calls",
                    round
                );
            }

            for call in &calls {
                self.notify(ReviewProgress::ToolCall {
                    round,
                    name: call.function.name.clone(),
                });

                let result = self.executor.execute_call(call).await;
                if result.success {
                    debug!("Tool {} succeeded", call.function.name);
                } else {
                    warn!("Tool {} failed: {}", call.function.name, result.content);
                }

                tool_calls_run += 1;
                conversation.push_tool_result(&call.id, result.content);
            }

            debug!("Conversation now holds {} messages", conversation.len());
            previous_round = calls;
        }

        warn!(
            "Review did not converge within {} rounds",
            self.config.max_rounds
        );
        Err(ReviewError::NotConverged(self.config.max_rounds))
    }

    fn notify(&self, event: ReviewProgress) {
        if let Some(observer) = &self.observer {
            observer(event);
        }
    }
}

/// Whether two rounds requested the same tools with the same arguments.
fn same_requests(current: &[ToolCall], previous: &[ToolCall]) -> bool {
    current.len() == previous.len()
        && current
            .iter()
            .zip(previous)
            .all(|(a, b)| a.function == b.function)
}

/// System prompt for review requests.
pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are an expert code reviewer.
Find problems in the code and suggest concrete improvements.

## Review Focus

1. Code quality: readability, maintainability, complexity
2. Potential bugs: null dereferences, boundary conditions, concurrency issues
3. Performance: algorithmic efficiency, resource leaks
4. Security: SQL injection, XSS, leaked secrets
5. Best practices: naming, error handling, code structure

## Available Tools

- `read_file` - Read a single file
- `read_multiple_files` - Read several files at once
- `list_files` - List files in a directory (optionally recursive)
- `search_in_files` - Search files for a keyword
- `analyze_directory` - Summarize directory structure and code files
- `get_git_diff` - Get the current code changes
- `run_linter` - Run a linter on a file
- `get_working_directory` - Show the current working directory

## Your Process

1. Use analyze_directory or list_files to understand the layout
2. Use read_file or read_multiple_files to read the relevant code
3. Use search_in_files to find specific patterns (TODO, FIXME, security smells)
4. Analyze the code carefully and identify problems
5. Give specific suggestions with example code

## Notes

- For directory reviews, analyze the structure first, then read key files in batches
- Read at most 10 files per call to stay within token limits
- Once you have the code, write the review yourself
"#;
