//! Test helpers and fixture pipelines for integration tests

use agentflow::testing::object;
use agentflow::{
    AgentDefinition, AgentRegistry, Field, FieldType, FrameworkConfig, Outcome, Schema, TaskOutput,
};
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Framework config with a fast retry base so timing tests stay readable
#[allow(dead_code)]
pub fn test_config() -> FrameworkConfig {
    FrameworkConfig::default()
}

/// Register the greeter pipeline: greeter routes supported languages to a
/// formatter and unsupported ones to a notifier, both terminal.
#[allow(dead_code)]
pub fn register_greeter_pipeline(registry: &AgentRegistry) {
    registry.register(
        AgentDefinition::builder("greeter")
            .input_schema(
                Schema::new(vec![
                    Field::required("name", FieldType::String),
                    Field::optional("language", FieldType::String)
                        .with_default(json!("en"))
                        .with_description("ISO 639-1 language code"),
                ])
                .unwrap(),
            )
            .outcome(Outcome::forward("supported_language", "formatter"))
            .outcome(Outcome::forward("unsupported_language", "unsupported-notifier"))
            .handler_fn(|input| {
                let name = input["name"].as_str().unwrap_or_default().to_string();
                let language = input["language"].as_str().unwrap_or("en").to_string();

                let greeting_word = match language.as_str() {
                    "en" => Some("Hello"),
                    "es" => Some("¡Hola"),
                    "fr" => Some("Bonjour"),
                    _ => None,
                };

                match greeting_word {
                    Some(word) => Ok(TaskOutput::new(
                        "supported_language",
                        object(json!({
                            "greeting": format!("{word} {name}"),
                            "language": language,
                            "timestamp": chrono::Utc::now().to_rfc3339(),
                        })),
                    )),
                    None => Ok(TaskOutput::new(
                        "unsupported_language",
                        object(json!({"unsupported_language": language})),
                    )),
                }
            })
            .build()
            .unwrap(),
    );

    registry.register(
        AgentDefinition::builder("formatter")
            .input_schema(
                Schema::new(vec![Field::required("greeting", FieldType::String)]).unwrap(),
            )
            .output_schema(
                Schema::new(vec![
                    Field::required("formatted_message", FieldType::String),
                    Field::required("metadata", FieldType::Map),
                ])
                .unwrap(),
            )
            .outcome(Outcome::terminal("complete"))
            .handler_fn(|input| {
                let greeting = input["greeting"].as_str().unwrap_or_default();
                Ok(TaskOutput::new(
                    "complete",
                    object(json!({
                        "formatted_message": greeting.to_uppercase(),
                        "metadata": {
                            "processed_at": chrono::Utc::now().to_rfc3339(),
                            "formatter": "uppercase",
                        },
                    })),
                ))
            })
            .build()
            .unwrap(),
    );

    registry.register(
        AgentDefinition::builder("unsupported-notifier")
            .outcome(Outcome::terminal("unsupported_language"))
            .handler_fn(|input| Ok(TaskOutput::new("unsupported_language", input)))
            .build()
            .unwrap(),
    );
}

/// Agent that emits `retry` until the handler has run `succeed_on_call`
/// times, then emits `success`. Returns the shared invocation counter.
#[allow(dead_code)]
pub fn register_flaky_agent(
    registry: &AgentRegistry,
    max_attempts: Option<u32>,
    succeed_on_call: u32,
) -> Arc<AtomicU32> {
    let calls = Arc::new(AtomicU32::new(0));
    let handler_calls = Arc::clone(&calls);

    registry.register(
        AgentDefinition::builder("flaky")
            .outcome(Outcome::retry("retry", max_attempts))
            .outcome(Outcome::terminal("success"))
            .handler_fn(move |input| {
                let call = handler_calls.fetch_add(1, Ordering::SeqCst) + 1;
                if call >= succeed_on_call {
                    let mut data = input;
                    data.insert("completed_on_call".to_string(), json!(call));
                    Ok(TaskOutput::new("success", data))
                } else {
                    Ok(TaskOutput::new("retry", input))
                }
            })
            .build()
            .unwrap(),
    );

    calls
}
