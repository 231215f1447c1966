//! Applies governance transitions to `AgentDefinition`s by combining the
//! latest `critic_agent` suggestion, any outstanding security alert, and live
//! run metrics. Grounded on `original_source/agents/curator_agent.py` and
//! SPEC_FULL.md §4.6. All transition logic lives in
//! `mnemos_engine::governance::apply_curator_transition`; this agent is just
//! the data-gathering wrapper around it.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::governance::{apply_curator_transition, GovernanceSuggestion};
use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct CuratorAgent;

/// Suggestions and alerts are all stored under the same well-known key, one
/// item per review; the most recently stored item for a given agent name
/// wins, matching the "latest observation" semantics the Python curator used.
fn latest_suggestion_for(items: &[mnemos_types::MemoryItem], agent_name: &str) -> Option<GovernanceSuggestion> {
    items
        .iter()
        .rev()
        .filter_map(|item| serde_json::from_str::<GovernanceSuggestion>(&item.content).ok())
        .find(|s| s.agent_name == agent_name)
}

fn has_security_alert(items: &[mnemos_types::MemoryItem], agent_name: &str) -> bool {
    items.iter().any(|item| {
        serde_json::from_str::<Value>(&item.content)
            .ok()
            .and_then(|v| v.get("agent").and_then(Value::as_str).map(|s| s == agent_name))
            .unwrap_or(false)
    })
}

#[async_trait]
impl Agent for CuratorAgent {
    fn name(&self) -> &str {
        "curator_agent"
    }

    async fn run_impl(
        &self,
        _input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let mut defs = memory.list_agent_definitions().await?;
        let metrics = memory.get_agent_metrics_from_diagnostics().await?;

        let suggestions = memory
            .find_items_by_key(MemoryKeys::CRITIC_SUGGESTION, Some(MemoryScope::Global), Some(MemoryType::Procedural), 500)
            .await?;
        let alerts = memory
            .find_items_by_key(MemoryKeys::SECURITY_ALERT, Some(MemoryScope::Global), Some(MemoryType::Procedural), 500)
            .await?;

        let mut transitions = Vec::new();
        for def in &mut defs {
            let suggestion = latest_suggestion_for(&suggestions, &def.name);
            let security_hit = has_security_alert(&alerts, &def.name);

            let (success_rate, failure_rate) = match metrics.get(&def.name) {
                Some(m) if m.total_runs > 0 => (Some(1.0 - m.failure_rate), Some(m.failure_rate)),
                _ => (None, None),
            };

            if let Some(note) = apply_curator_transition(def, security_hit, suggestion.as_ref(), success_rate, failure_rate) {
                memory.save_agent_definition(def).await?;
                transitions.push(json!({ "agent": def.name, "note": note, "new_state": def.lifecycle_state }));
            }
        }

        let message = if transitions.is_empty() {
            "No governance transitions were needed this round.".to_string()
        } else {
            let names: Vec<String> = transitions
                .iter()
                .filter_map(|t| t.get("agent").and_then(Value::as_str).map(|s| s.to_string()))
                .collect();
            format!("Applied governance transitions to: {}.", names.join(", "))
        };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": message,
                "stop_for_user_input": false,
                "transitions": transitions,
            }),
            EmotionDelta { confidence: 0.03, learning_drive: 0.02, ..Default::default() },
        ))
    }
}
