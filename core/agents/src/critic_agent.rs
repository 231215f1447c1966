//! Synthesizes per-agent quality assessments and conservative governance
//! suggestions (`promote | demote | keep`) from live diagnostics. Grounded
//! on `original_source/agents/critic_agent.py` (the rich LLM-backed
//! governance-advisor version — see DESIGN.md for the duplicate-class
//! resolution against `architect_agent.py`'s simpler bundled `CriticAgent`).
//! Persists one suggestion per reviewed agent under
//! `MemoryKeys::CRITIC_SUGGESTION`, consumed by `curator_agent`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::governance::{GovernanceAction, GovernanceSuggestion};
use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{
    AgentResult, EmotionDelta, EmotionalState, LifecycleState, MemoryKeys, MemoryScope, MemoryType,
};

pub struct CriticAgent;

/// Conservative rule: strong negative signal -> demote, strong positive on a
/// non-active definition -> promote, everything else -> keep. Matches
/// SPEC_FULL.md §4.6: "deprecated is proposed only with strong negative
/// signals; agents absent from recent plans and runs default to keep."
fn suggest(
    agent_name: &str,
    lifecycle_state: LifecycleState,
    total_runs: u64,
    failure_rate: f64,
) -> GovernanceSuggestion {
    if total_runs >= 5 && failure_rate >= 0.6 && lifecycle_state != LifecycleState::Deprecated {
        return GovernanceSuggestion {
            agent_name: agent_name.to_string(),
            action: GovernanceAction::Demote,
            target_state: Some(LifecycleState::Deprecated),
            confidence: 0.8,
            reason: format!("failure_rate {failure_rate:.2} over {total_runs} runs"),
        };
    }

    if total_runs >= 5
        && failure_rate <= 0.1
        && matches!(lifecycle_state, LifecycleState::Draft | LifecycleState::Test)
    {
        return GovernanceSuggestion {
            agent_name: agent_name.to_string(),
            action: GovernanceAction::Promote,
            target_state: Some(lifecycle_state.promoted()),
            confidence: 0.7,
            reason: format!("failure_rate {failure_rate:.2} over {total_runs} runs"),
        };
    }

    GovernanceSuggestion {
        agent_name: agent_name.to_string(),
        action: GovernanceAction::Keep,
        target_state: None,
        confidence: 0.5,
        reason: "no strong enough signal either way".to_string(),
    }
}

#[async_trait]
impl Agent for CriticAgent {
    fn name(&self) -> &str {
        "critic_agent"
    }

    async fn run_impl(
        &self,
        _input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let defs = memory.list_agent_definitions().await?;
        let metrics = memory.get_agent_metrics_from_diagnostics().await?;

        let mut suggestions = Vec::new();
        for def in &defs {
            let (total_runs, failure_rate) = metrics
                .get(&def.name)
                .map(|m| (m.total_runs, m.failure_rate))
                .unwrap_or((0, 0.0));

            let suggestion = suggest(&def.name, def.lifecycle_state, total_runs, failure_rate);

            memory
                .store_item(
                    MemoryScope::Global,
                    MemoryType::Procedural,
                    MemoryKeys::CRITIC_SUGGESTION,
                    serde_json::to_string(&suggestion).unwrap_or_default(),
                    json!({ "agent": def.name }),
                )
                .await?;

            suggestions.push(json!({
                "agent": suggestion.agent_name,
                "action": suggestion.action,
                "confidence": suggestion.confidence,
                "reason": suggestion.reason,
            }));
        }

        let message = if suggestions.is_empty() {
            "No agent definitions to critique yet.".to_string()
        } else {
            format!("Reviewed {} agent definition(s) and recorded governance suggestions.", suggestions.len())
        };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": message,
                "stop_for_user_input": false,
                "suggestions": suggestions,
            }),
            EmotionDelta { confidence: 0.03, curiosity: 0.02, ..Default::default() },
        ))
    }
}
