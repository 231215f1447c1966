//! Updates the structured user profile (preferences, hobbies, topics,
//! values) from recent conversation and user memories. Grounded on
//! `original_source/agents/user_profile_agent.py`; the default-schema logic
//! lives in `crate::profile_schema`, shared with `preference_learner_agent`
//! and `curiosity_question_agent`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{
    extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider,
    MemoryEngine,
};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

use crate::profile_schema::{ensure_base_profile, stamp_meta};

pub struct UserProfileAgent;

const SYSTEM_PROMPT: &str = "You are the UserProfileAgent of a multi-agent cognitive system. \
Your job is to update a structured JSON user profile based on recent conversation and available \
memories.\n\nIMPORTANT REQUIREMENTS:\n\
- Keep the existing profile schema (main fields unchanged).\n\
- Only update what is supported by evidence (messages/memories).\n\
- Do not invent unsupported facts.\n\
- If a preference is clearly expressed (e.g. \"I hate football\"), update topics and \
avoid_topics accordingly.\n\
- Do not delete useful information already present in the profile: enrich rather than replace \
when there's no conflict.\n\
- Update last_seen and conversation_stats (total_messages, etc).\n\n\
You MUST respond with ONLY a JSON object of the form: \
{\"updated_profile\": {...full profile...}, \"learned_facts\": [\"string\", ...]}.";

#[async_trait]
impl Agent for UserProfileAgent {
    fn name(&self) -> &str {
        "user_profile_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let user_id = input_payload
            .get("user_id")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.user_id.clone());

        let Some(user_id) = user_id else {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "UserProfileAgent: I can't determine the user_id. \
                     I need context.user_id or input_payload.user_id.",
                    "stop_for_user_input": false,
                    "learned_facts": Value::Array(vec![]),
                    "profile_memory_id": Value::Null,
                }),
                EmotionDelta { frustration: 0.02, confidence: -0.02, ..Default::default() },
            ));
        };

        let max_messages = input_payload.get("max_messages").and_then(Value::as_u64).unwrap_or(30).clamp(5, 200) as usize;
        let max_user_memories = input_payload.get("max_user_memories").and_then(Value::as_u64).unwrap_or(50).clamp(10, 200) as u32;

        let profile_key = MemoryKeys::user_profile(&user_id);
        let raw_profile = memory
            .load_item_content(profile_key.clone(), Some(MemoryScope::User), Some(MemoryType::Semantic))
            .await?
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
        let base_profile = ensure_base_profile(&user_id, raw_profile);

        let recent_count = context.recent_messages.len().min(max_messages);
        let serializable_messages: Vec<Value> = context.recent_messages[context.recent_messages.len() - recent_count..]
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content, "timestamp": m.timestamp.to_rfc3339() }))
            .collect();

        let user_memories = memory
            .search_items(Some(MemoryScope::User), Some(MemoryType::Semantic), None, max_user_memories)
            .await?;
        let serializable_memories: Vec<Value> = user_memories
            .iter()
            .map(|it| json!({ "id": it.id, "key": it.key, "content": it.content, "metadata": it.metadata, "created_at": it.created_at.to_rfc3339() }))
            .collect();

        let llm_input = json!({
            "user_id": user_id,
            "current_profile": base_profile,
            "recent_messages": serializable_messages,
            "user_memories": serializable_memories,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&llm_input).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(1024), ..Default::default() };

        let llm_raw = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(raw) => raw,
            Err(err) => {
                return Ok(AgentResult::success(
                    json!({
                        "user_visible_message": format!(
                            "UserProfileAgent: error calling the LLM to update the profile. Details: {err}"
                        ),
                        "stop_for_user_input": false,
                        "learned_facts": Value::Array(vec![]),
                        "profile_memory_id": Value::Null,
                    }),
                    EmotionDelta { frustration: 0.1, confidence: -0.05, ..Default::default() },
                ));
            }
        };

        let mut learned_facts: Vec<String> = Vec::new();
        let mut updated_profile = base_profile.clone();

        match extract_json_object(&llm_raw) {
            None => learned_facts.push("Could not parse JSON from the LLM; profile left unchanged.".to_string()),
            Some(parsed) => {
                if let Some(maybe_profile) = parsed.get("updated_profile").filter(|v| v.is_object()) {
                    updated_profile = maybe_profile.clone();
                }
                if let Some(lf) = parsed.get("learned_facts").and_then(Value::as_array) {
                    learned_facts = lf.iter().map(|v| v.as_str().map(|s| s.to_string()).unwrap_or_else(|| v.to_string())).collect();
                }
            }
        }

        stamp_meta(&mut updated_profile, "user_profile_agent");

        let schema_version = updated_profile.get("schema_version").cloned().unwrap_or(json!(1));
        let store_result = memory
            .store_item(
                MemoryScope::User,
                MemoryType::Semantic,
                profile_key,
                serde_json::to_string(&updated_profile).unwrap_or_default(),
                json!({
                    "agent": "user_profile_agent",
                    "user_id": user_id,
                    "schema_version": schema_version,
                    "learned_facts": learned_facts,
                }),
            )
            .await;

        let profile_memory_id = match &store_result {
            Ok(item) => Some(item.id),
            Err(err) => {
                learned_facts.push(format!("Error saving the profile: {err}"));
                None
            }
        };

        let mut lines = vec![format!("I've updated your internal profile (user: {user_id}).")];
        if !learned_facts.is_empty() {
            lines.push(String::new());
            lines.push("New/updated learned facts:".to_string());
            for f in learned_facts.iter().take(8) {
                lines.push(format!("- {f}"));
            }
            if learned_facts.len() > 8 {
                lines.push(format!("... and {} more.", learned_facts.len() - 8));
            }
        }
        if let Some(id) = profile_memory_id {
            lines.push(String::new());
            lines.push(format!("(Profile saved to internal memory with id: {id}.)"));
        }

        Ok(AgentResult::success(
            json!({
                "user_visible_message": lines.join("\n"),
                "stop_for_user_input": false,
                "user_id": user_id,
                "profile_memory_id": profile_memory_id,
                "learned_facts": learned_facts,
            }),
            EmotionDelta { curiosity: 0.03, confidence: 0.03, fatigue: 0.01, ..Default::default() },
        ))
    }
}
