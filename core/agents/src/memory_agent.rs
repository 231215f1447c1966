//! Explicit memorization agent. Grounded on
//! `original_source/agents/memory_agent.py`: resolves scope/type/key/tags/
//! importance/mode/category from the input payload, falling back to the last
//! user message for content, and flags `scope=user ∧ type=semantic` items as
//! profile candidates for `user_profile_agent`/`preference_learner_agent`.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct MemoryAgent;

fn parse_scope(s: &str) -> MemoryScope {
    match s.to_lowercase().as_str() {
        "user" | "utente" => MemoryScope::User,
        "project" | "progetto" => MemoryScope::Project,
        "global" | "globale" => MemoryScope::Global,
        _ => MemoryScope::Conversation,
    }
}

fn parse_type(s: &str) -> MemoryType {
    match s.to_lowercase().as_str() {
        "episodic" | "episodica" => MemoryType::Episodic,
        "procedural" | "procedurale" => MemoryType::Procedural,
        _ => MemoryType::Semantic,
    }
}

#[async_trait]
impl Agent for MemoryAgent {
    fn name(&self) -> &str {
        "memory_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let content = input_payload
            .get("content")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.last_user_message().map(|s| s.to_string()))
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "There's nothing for me to remember in that message.",
                    "stop_for_user_input": false,
                }),
                EmotionDelta { confidence: -0.01, ..Default::default() },
            ));
        }

        let scope = input_payload
            .get("scope")
            .and_then(Value::as_str)
            .map(parse_scope)
            .unwrap_or(MemoryScope::User);
        let r#type = input_payload
            .get("type")
            .and_then(Value::as_str)
            .map(parse_type)
            .unwrap_or(MemoryType::Semantic);
        let key = input_payload
            .get("key")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("note_{}", Utc::now().timestamp_millis()));
        let tags = input_payload.get("tags").cloned().unwrap_or_else(|| json!([]));
        let importance = input_payload.get("importance").cloned().unwrap_or(Value::Null);
        let mode = input_payload.get("mode").and_then(Value::as_str).unwrap_or("explicit");
        let category = input_payload.get("category").cloned().unwrap_or(Value::Null);

        let profile_candidate = matches!(scope, MemoryScope::User) && matches!(r#type, MemoryType::Semantic);

        let metadata = json!({
            "tags": tags,
            "importance": importance,
            "mode": mode,
            "category": category,
            "profile_candidate": profile_candidate,
            "source": "memory_agent",
        });

        let item = memory.store_item(scope, r#type, key.clone(), content.clone(), metadata).await?;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": format!("Got it, I'll remember that: \"{content}\"."),
                "stop_for_user_input": false,
                "memory_item_id": item.id,
            }),
            EmotionDelta { confidence: 0.03, curiosity: 0.01, ..Default::default() },
        ))
    }
}
