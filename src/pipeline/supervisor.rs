//! Supervisor: one isolated worker per pipeline run
//!
//! Every top-level `process` call spawns a fresh worker task. Workers share
//! no mutable state, so a panic in one pipeline cannot disturb another; the
//! caller observes the crash as a `Crashed` error. Crashed workers are
//! observed, not restarted.

use crate::agent::registry::AgentRegistry;
use crate::config::FrameworkConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::llm::client::CompletionClient;
use crate::pipeline::worker::{PipelineOutput, PipelineWorker};
use crate::routing::llm_router::LlmRouter;
use crate::schema::DataMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Spawns and observes pipeline workers
#[derive(Clone)]
pub struct Supervisor {
    registry: AgentRegistry,
    config: Arc<FrameworkConfig>,
    llm_client: Option<Arc<dyn CompletionClient>>,
}

impl Supervisor {
    /// Create a supervisor without LLM routing support.
    ///
    /// Agents declaring an `llm_routing` config still run; their routing
    /// falls back to the handler-chosen outcome because no client is
    /// available to consult.
    pub fn new(registry: AgentRegistry, config: FrameworkConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
            llm_client: None,
        }
    }

    /// Attach a completion client for agents that declare LLM routing
    pub fn with_llm_client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    /// The registry this supervisor resolves agents against
    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// Spawn a fresh worker for one pipeline run.
    ///
    /// Fails fast if `agent` is not registered. The returned handle yields
    /// the worker's terminal result, or `Crashed` if the worker died.
    pub fn start_pipeline(&self, agent: &str, input: DataMap) -> PipelineResult<PipelineHandle> {
        let start = self
            .registry
            .get(agent)
            .ok_or_else(|| PipelineError::routing(format!("agent '{agent}' is not registered")))?;

        let worker = PipelineWorker::new(
            self.registry.clone(),
            Arc::clone(&self.config),
            self.llm_client.as_ref().map(|c| LlmRouter::new(Arc::clone(c))),
        );

        debug!(agent = %start.name(), "spawning pipeline worker");

        let handle = tokio::spawn(async move { worker.run(start, input).await });

        Ok(PipelineHandle { handle })
    }

    /// Run one pipeline to completion: spawn a worker and wait for it.
    pub async fn process(&self, agent: &str, input: DataMap) -> PipelineResult<PipelineOutput> {
        self.start_pipeline(agent, input)?.wait().await
    }
}

/// Handle to a running pipeline worker
pub struct PipelineHandle {
    handle: JoinHandle<PipelineResult<PipelineOutput>>,
}

impl PipelineHandle {
    /// Wait for the worker's terminal result.
    ///
    /// A worker that panicked or was cancelled surfaces as `Crashed`.
    pub async fn wait(self) -> PipelineResult<PipelineOutput> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => {
                let message = if join_error.is_panic() {
                    match join_error.into_panic().downcast::<String>() {
                        Ok(panic_message) => format!("worker panicked: {panic_message}"),
                        Err(payload) => match payload.downcast::<&'static str>() {
                            Ok(panic_message) => format!("worker panicked: {panic_message}"),
                            Err(_) => "worker panicked".to_string(),
                        },
                    }
                } else {
                    "worker task was cancelled".to_string()
                };
                error!(%message, "pipeline worker died");
                Err(PipelineError::crashed(message))
            }
        }
    }
}
