use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mnemos_types::{AgentResult, ConversationId, CorrelationId, EmotionalState, Message};
use serde_json::Value;

use crate::error::{EngineError, EngineResult};
use crate::llm::LlmProvider;
use crate::persistence::MemoryEngine;

/// Read-only view of the current turn handed to every agent invocation.
pub struct AgentContext<'a> {
    pub conversation_id: ConversationId,
    pub correlation_id: CorrelationId,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub recent_messages: &'a [Message],
}

impl<'a> AgentContext<'a> {
    pub fn last_user_message(&self) -> Option<&str> {
        self.recent_messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, mnemos_types::MessageRole::User))
            .map(|m| m.content.as_str())
    }
}

/// Uniform contract every concrete agent implements (SPEC_FULL.md §4.2).
/// `run_impl` is where concrete behavior lives; `run` wraps it so that any
/// error is caught and materialized as a `status=failure` `AgentResult`
/// with the default negative `EmotionDelta`, mirroring the original
/// `Agent.run()`/`_run_impl()` split.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult>;

    async fn run(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> AgentResult {
        match self
            .run_impl(input_payload, context, memory, llm, emotional_state)
            .await
        {
            Ok(result) => result,
            Err(err) => AgentResult::failure(err.to_string()),
        }
    }
}

/// Maps unique agent names to instances. Registration fails on duplicate
/// name; lookup fails if the name is unknown.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) -> EngineResult<()> {
        let name = agent.name().to_string();
        if self.agents.contains_key(&name) {
            return Err(EngineError::Other(format!(
                "agent '{name}' is already registered"
            )));
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    pub fn get(&self, name: &str) -> EngineResult<Arc<dyn Agent>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::AgentFailure {
                agent: name.to_string(),
                message: "no agent registered with this name".to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn list_agents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyAgent;

    #[async_trait]
    impl Agent for DummyAgent {
        fn name(&self) -> &str {
            "dummy_agent"
        }

        async fn run_impl(
            &self,
            _input_payload: Value,
            _context: &AgentContext<'_>,
            _memory: &MemoryEngine,
            _llm: &dyn LlmProvider,
            _emotional_state: &EmotionalState,
        ) -> EngineResult<AgentResult> {
            Err(EngineError::Other("boom".to_string()))
        }
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(DummyAgent)).unwrap();
        let err = registry.register(Arc::new(DummyAgent)).unwrap_err();
        assert!(err.to_string().contains("already registered"));
    }

    #[test]
    fn get_fails_for_unknown_agent() {
        let registry = AgentRegistry::new();
        assert!(registry.get("nope").is_err());
    }
}
