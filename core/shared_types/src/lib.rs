pub mod agent_definition;
pub mod agent_run;
pub mod config;
pub mod emotion;
pub mod event;
pub mod ids;
pub mod memory;
pub mod message;
pub mod plan;
pub mod task;

pub use agent_definition::{AgentDefinition, LifecycleState};
pub use agent_run::{AgentResult, AgentRun, AgentRunStatus};
pub use config::{AppConfig, GovernanceConfig, LlmConfig, LoggingConfig, OrchestratorConfig, ProviderConfig};
pub use emotion::{EmotionDelta, EmotionalState};
pub use event::{Event, EventType};
pub use ids::{
    new_id, AgentDefinitionId, AgentName, AgentRunId, ConversationId, CorrelationId, EventId,
    MemoryItemId, PlanId, TaskId,
};
pub use memory::{MemoryItem, MemoryKeys, MemoryScope, MemoryType};
pub use message::{Message, MessageRole};
pub use plan::{GovernanceMode, Plan, PlanMetadata, PlanSource};
pub use task::{Task, TaskStatus};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emotional_state_clamps_after_large_delta() {
        let mut state = EmotionalState::default();
        let delta = EmotionDelta {
            curiosity: 10.0,
            mood: -10.0,
            ..Default::default()
        };
        state.apply_delta(&delta);
        assert_eq!(state.curiosity, 1.0);
        assert_eq!(state.mood, -1.0);
    }

    #[test]
    fn plan_next_ready_task_ignores_unknown_dependency() {
        let mut plan = Plan::new();
        let mut task = Task::new("chat_agent", "say hi", json!({}));
        task.depends_on.insert(new_id());
        plan.add_task(task.clone());

        let ready = plan.next_ready_task().expect("task should be ready");
        assert_eq!(ready.id, task.id);
    }

    #[test]
    fn plan_next_ready_task_strands_on_errored_dependency() {
        let mut plan = Plan::new();
        let mut upstream = Task::new("architect_agent", "design", json!({}));
        upstream.mark_error("boom");
        let mut downstream = Task::new("validator_agent", "validate", json!({}));
        downstream.depends_on.insert(upstream.id);

        plan.add_task(upstream);
        plan.add_task(downstream);

        assert!(plan.next_ready_task().is_none());
    }

    #[test]
    fn agent_definition_invariant_is_active_implies_active_state() {
        let mut def = AgentDefinition::new_draft("new_agent", "does things", json!({}));
        def.is_active = true;
        def.set_lifecycle_state(LifecycleState::Test);
        assert!(!def.is_active);
    }

    #[test]
    fn action_result_round_trip_through_json() {
        let item = MemoryItem::new(
            MemoryScope::User,
            MemoryType::Semantic,
            MemoryKeys::user_profile("u1"),
            "likes rust",
            json!({ "profile_candidate": true }),
        );
        let encoded = serde_json::to_string(&item).expect("serialize");
        let decoded: MemoryItem = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(decoded.key, item.key);
        assert_eq!(decoded.content, item.content);
    }
}
