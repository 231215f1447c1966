//! Requests that the agent roster be reloaded from durable `AgentDefinition`s.
//! Grounded on `original_source/agents/agent_reload_agent.py`.
//!
//! The Python original first attempts a runtime reload against a global
//! `ACTIVE_REGISTRY` and only falls back to a "pending next restart" memory
//! note when no such registry is hooked up. `AgentRegistry` here has no
//! in-process hot-swap mechanism (agents are registered once at process
//! start via `register_all`), so this port always takes the next-restart
//! path and is honest about it in the reply rather than pretending to
//! reload anything live.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct AgentReloadAgent;

#[async_trait]
impl Agent for AgentReloadAgent {
    fn name(&self) -> &str {
        "agent_reload_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let mode = input_payload.get("mode").and_then(Value::as_str).unwrap_or("runtime").to_string();
        let dry_run = input_payload.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
        let packages: Vec<String> = input_payload
            .get("packages")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect())
            .unwrap_or_else(|| vec!["agents".to_string(), "r_agents".to_string()]);

        let mut messages = Vec::new();
        messages.push(
            "This process has no in-process hot-swap registry; agents are registered once at \
             startup. I cannot reload them live."
                .to_string(),
        );

        if dry_run {
            messages.push(format!(
                "dry_run=true: I would schedule a reload for packages {packages:?} on the next restart, \
                 but I'm not writing anything to memory."
            ));
        } else {
            let note = json!({
                "mode": mode,
                "packages": packages,
                "runtime_reloaded": false,
                "dry_run": dry_run,
            });
            match memory
                .store_item(
                    MemoryScope::Global,
                    MemoryType::Procedural,
                    MemoryKeys::PENDING_AGENT_RELOAD,
                    "Agent reload requested; will apply at next startup.",
                    note,
                )
                .await
            {
                Ok(_) => messages.push(
                    "I've recorded an agent-reload request in memory (pending_agent_reload) for \
                     the next startup."
                        .to_string(),
                ),
                Err(err) => messages.push(format!("I couldn't write the reload request to memory: {err}")),
            }
        }

        let mut lines = vec!["AgentReloadAgent".to_string(), String::new()];
        lines.extend(messages);

        Ok(AgentResult::success(
            json!({
                "user_visible_message": lines.join("\n"),
                "stop_for_user_input": false,
                "runtime_reloaded": false,
                "packages": packages,
                "mode": mode,
                "dry_run": dry_run,
            }),
            EmotionDelta { curiosity: 0.01, ..Default::default() },
        ))
    }
}
