//! Thread-safe registry of agent definitions
//!
//! Routing targets are names looked up here at routing time, which is what
//! makes self-referencing outcomes and cyclic pipelines work without
//! construction-order gymnastics.

use crate::agent::definition::AgentDefinition;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Registry mapping agent names to their definitions
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    agents: Arc<RwLock<HashMap<String, Arc<AgentDefinition>>>>,
}

impl AgentRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent under its own name.
    ///
    /// Re-registering a name replaces the previous definition.
    pub fn register(&self, agent: AgentDefinition) -> Arc<AgentDefinition> {
        let agent = Arc::new(agent);
        let mut agents = self.agents.write().expect("agent registry lock poisoned");
        debug!(agent = %agent.name(), "registering agent");
        agents.insert(agent.name().to_string(), Arc::clone(&agent));
        agent
    }

    /// Look up an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<AgentDefinition>> {
        let agents = self.agents.read().expect("agent registry lock poisoned");
        agents.get(name).cloned()
    }

    /// Names of all registered agents (unordered)
    pub fn names(&self) -> Vec<String> {
        let agents = self.agents.read().expect("agent registry lock poisoned");
        agents.keys().cloned().collect()
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.read().expect("agent registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::definition::{handler_fn, Outcome, TaskOutput};

    fn test_agent(name: &str) -> AgentDefinition {
        AgentDefinition::builder(name)
            .outcome(Outcome::terminal("done"))
            .handler(handler_fn(|input| Ok(TaskOutput::new("done", input))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_register_and_get() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty());

        registry.register(test_agent("greeter"));
        registry.register(test_agent("formatter"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("greeter").unwrap().name(), "greeter");
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let registry = AgentRegistry::new();
        registry.register(test_agent("greeter"));
        registry.register(test_agent("greeter"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clone_shares_state() {
        let registry = AgentRegistry::new();
        let view = registry.clone();

        registry.register(test_agent("greeter"));
        assert!(view.get("greeter").is_some());
    }

    #[test]
    fn test_names() {
        let registry = AgentRegistry::new();
        registry.register(test_agent("a"));
        registry.register(test_agent("b"));

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }
}
