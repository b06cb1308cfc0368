//! Concurrency tests: many pipelines, isolated workers
//!
//! Pipelines run in independent workers with no shared mutable state; IDs
//! are allocated from an atomic counter and must be distinct and
//! monotonically increasing per start order.

mod test_helpers;

use agentflow::testing::object;
use agentflow::{
    AgentDefinition, AgentRegistry, Outcome, PipelineError, Supervisor, TaskOutput,
};
use serde_json::json;
use std::collections::HashSet;

fn register_personal_greeter(registry: &AgentRegistry) {
    registry.register(
        AgentDefinition::builder("personal-greeter")
            .outcome(Outcome::terminal("greeted"))
            .handler_fn(|input| {
                let name = input["name"].as_str().unwrap_or("stranger").to_string();
                let mut data = input;
                data.insert("message".to_string(), json!(format!("Hello {name}")));
                Ok(TaskOutput::new("greeted", data))
            })
            .build()
            .unwrap(),
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_five_parallel_pipelines_get_distinct_ids_and_messages() {
    let registry = AgentRegistry::new();
    register_personal_greeter(&registry);
    let supervisor = Supervisor::new(registry, test_helpers::test_config());

    let names = ["Ada", "Grace", "Edsger", "Barbara", "Tony"];
    let futures: Vec<_> = names
        .iter()
        .map(|name| supervisor.process("personal-greeter", object(json!({ "name": name }))))
        .collect();

    let results = futures::future::join_all(futures).await;

    let mut ids = HashSet::new();
    let mut messages = HashSet::new();
    for result in results {
        let output = result.unwrap();
        assert_eq!(output.outcome, "greeted");
        ids.insert(output.data["_pipeline_id"].as_u64().unwrap());
        messages.insert(output.data["message"].as_str().unwrap().to_string());
    }

    assert_eq!(ids.len(), 5, "pipeline IDs must be pairwise distinct");
    assert_eq!(messages.len(), 5, "no cross-contamination between pipelines");
}

#[tokio::test]
async fn test_sequential_pipelines_have_increasing_ids() {
    let registry = AgentRegistry::new();
    register_personal_greeter(&registry);
    let supervisor = Supervisor::new(registry, test_helpers::test_config());

    let mut previous = 0u64;
    for name in ["one", "two", "three"] {
        let output = supervisor
            .process("personal-greeter", object(json!({ "name": name })))
            .await
            .unwrap();
        let id = output.data["_pipeline_id"].as_u64().unwrap();
        assert!(id > previous, "IDs must be monotonically increasing");
        previous = id;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crashing_pipeline_leaves_concurrent_pipelines_untouched() {
    let registry = AgentRegistry::new();
    register_personal_greeter(&registry);
    registry.register(
        AgentDefinition::builder("bomb")
            .outcome(Outcome::terminal("done"))
            .handler_fn(|_| panic!("worker down"))
            .build()
            .unwrap(),
    );
    let supervisor = Supervisor::new(registry, test_helpers::test_config());

    let crash = supervisor.process("bomb", object(json!({})));
    let fine = supervisor.process("personal-greeter", object(json!({"name": "Ada"})));

    let (crash_result, fine_result) = tokio::join!(crash, fine);

    assert!(matches!(crash_result, Err(PipelineError::Crashed { .. })));
    let output = fine_result.unwrap();
    assert_eq!(output.data["message"], json!("Hello Ada"));
}
