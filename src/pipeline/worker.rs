//! Pipeline worker: one agent chain, executed end to end
//!
//! A worker is ephemeral. It is spawned for a single top-level `process`
//! call and drives the whole chain as an iterative loop: validate input,
//! run the task handler, validate output, optionally let the LLM router
//! override the outcome, then follow the outcome's routing rule. The loop
//! ends at a terminal outcome or the first fatal error.

use crate::agent::definition::{AgentDefinition, RoutingRule};
use crate::agent::registry::AgentRegistry;
use crate::config::{BackoffStrategy, FrameworkConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::context;
use crate::routing::llm_router::LlmRouter;
use crate::schema::DataMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Terminal result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Name of the terminal outcome
    pub outcome: String,
    /// The last agent's output data, including `_pipeline_id`
    pub data: DataMap,
}

/// Delay in milliseconds before retry attempt `attempt` (1-based).
///
/// Linear grows as `attempt * base`, exponential as `2^(attempt-1) * base`.
pub fn calculate_retry_delay(strategy: BackoffStrategy, attempt: u32, base_ms: u64) -> u64 {
    match strategy {
        BackoffStrategy::Linear => (attempt as u64).saturating_mul(base_ms),
        BackoffStrategy::Exponential => 2u64
            .saturating_pow(attempt.saturating_sub(1))
            .saturating_mul(base_ms),
    }
}

/// Executes one pipeline run inside its own task
pub(crate) struct PipelineWorker {
    registry: AgentRegistry,
    config: Arc<FrameworkConfig>,
    router: Option<LlmRouter>,
}

impl PipelineWorker {
    pub(crate) fn new(
        registry: AgentRegistry,
        config: Arc<FrameworkConfig>,
        router: Option<LlmRouter>,
    ) -> Self {
        Self {
            registry,
            config,
            router,
        }
    }

    /// Drive the pipeline from `start` until a terminal outcome or a fatal
    /// error.
    pub(crate) async fn run(
        &self,
        start: Arc<AgentDefinition>,
        mut data: DataMap,
    ) -> PipelineResult<PipelineOutput> {
        // Callers may pre-populate _pipeline_id to continue an existing
        // pipeline; otherwise allocate a fresh one.
        let pipeline_id = match context::pipeline_id_of(&data) {
            Some(id) => id,
            None => context::next_pipeline_id(),
        };

        let mut current = start;

        loop {
            let retry_attempt = context::retry_attempt_of(&data);

            debug!(
                agent = %current.name(),
                pipeline_id,
                retry_attempt,
                "starting agent"
            );

            // Defaults are merged before validation so a defaulted field
            // satisfies its own declared type check.
            current.input_schema().merge_defaults(&mut data);
            if let Err(reason) = current.input_schema().validate(&data) {
                error!(agent = %current.name(), pipeline_id, %reason, "input validation failed");
                return Err(PipelineError::validation(format!(
                    "input of agent '{}': {reason}",
                    current.name()
                )));
            }

            let task_output = current.handle_task(data).await.map_err(|e| {
                error!(agent = %current.name(), pipeline_id, error = %e, "task failed");
                PipelineError::task(e.to_string())
            })?;
            let mut outcome = task_output.outcome;
            let mut output = task_output.data;

            if let Err(reason) = current.output_schema().validate(&output) {
                error!(agent = %current.name(), pipeline_id, %reason, "output validation failed");
                return Err(PipelineError::validation(format!(
                    "output of agent '{}': {reason}",
                    current.name()
                )));
            }

            // Context propagation: the pipeline ID always, the retry
            // counter only while this agent is retrying.
            context::set_pipeline_id(&mut output, pipeline_id);
            if retry_attempt > 0 {
                context::set_retry_attempt(&mut output, retry_attempt);
            }

            // LLM override. Router failures are logged and absorbed; the
            // handler's outcome stands.
            if let (Some(router), Some(llm_config)) = (&self.router, current.llm_routing()) {
                match router.route(&current, llm_config, &output).await {
                    Ok(routed) => {
                        info!(
                            agent = %current.name(),
                            pipeline_id,
                            handler_outcome = %outcome,
                            llm_outcome = %routed.outcome,
                            "LLM router override applied"
                        );
                        outcome = routed.outcome;
                        output = routed.data;
                    }
                    Err(e) => {
                        warn!(
                            agent = %current.name(),
                            pipeline_id,
                            error = %e,
                            "LLM routing failed, keeping handler outcome"
                        );
                    }
                }
            }

            let resolved = current.find_outcome(&outcome).ok_or_else(|| {
                error!(agent = %current.name(), pipeline_id, %outcome, "undeclared outcome");
                PipelineError::unknown_outcome(current.name(), outcome.clone())
            })?;

            match resolved.routing().clone() {
                RoutingRule::Terminal => {
                    info!(
                        agent = %current.name(),
                        pipeline_id,
                        %outcome,
                        "pipeline completed"
                    );
                    return Ok(PipelineOutput {
                        outcome,
                        data: output,
                    });
                }
                RoutingRule::Forward { to } => {
                    let next = self.registry.get(&to).ok_or_else(|| {
                        error!(agent = %current.name(), pipeline_id, target = %to, "forward target not registered");
                        PipelineError::routing(format!("forward target '{to}' is not registered"))
                    })?;

                    info!(
                        agent = %current.name(),
                        pipeline_id,
                        %outcome,
                        next = %to,
                        "forwarding"
                    );

                    // The retry counter belongs to the agent being left.
                    context::clear_retry_attempt(&mut output);
                    current = next;
                    data = output;
                }
                RoutingRule::Retry { max_attempts } => {
                    let max = max_attempts.unwrap_or(self.config.default_retry_attempts);
                    let attempt = retry_attempt + 1;

                    if attempt > max {
                        error!(
                            agent = %current.name(),
                            pipeline_id,
                            max_attempts = max,
                            "retries exhausted"
                        );
                        return Err(PipelineError::retry_exhausted(max));
                    }

                    let delay_ms = calculate_retry_delay(
                        self.config.retry_backoff,
                        attempt,
                        self.config.retry_base_delay_ms,
                    );

                    warn!(
                        agent = %current.name(),
                        pipeline_id,
                        attempt,
                        max_attempts = max,
                        delay_ms,
                        "retry attempt"
                    );

                    context::set_retry_attempt(&mut output, attempt);
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    data = output;
                }
            }
        }
    }
}
