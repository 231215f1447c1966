//! Updates only the preference-related slices of the user profile (topics,
//! avoid_topics, hobbies, conversational_prefs) from recent conversation and
//! memories tagged as preference/hobby/teaching. Grounded on
//! `original_source/agents/preference_learner_agent.py`; shares
//! `crate::profile_schema` with `user_profile_agent`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{
    extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider,
    MemoryEngine,
};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

use crate::profile_schema::{ensure_base_profile, stamp_meta};

pub struct PreferenceLearnerAgent;

const SYSTEM_PROMPT: &str = "You are the PreferenceLearnerAgent of a multi-agent cognitive system. \
Your job is to update ONLY the parts of the user profile related to preferences, topics, hobbies, \
and conversational style.\n\nYou receive current_profile (full JSON profile), recent_messages, \
and preference_memories (explicit memories such as \"remember that I like X\").\n\nYOU MUST:\n\
- Spot phrases where the user clearly states likes/dislikes.\n\
- Update topics: for each topic mentioned, set 'like' to true/false/'maybe' with a 'confidence'.\n\
- Add/update avoid_topics for subjects the user asked not to touch.\n\
- Update hobbies when clear hobbies/interests emerge.\n\
- Update conversational_prefs when conversation-style preferences emerge.\n\
- Do not invent preferences absent from the provided data.\n\
- Keep the rest of the profile unchanged.\n\n\
REQUIRED RESPONSE (valid JSON only): \
{\"updated_profile\": {...full profile...}, \"preference_updates\": [{\"kind\": \"topic\"|\"hobby\"|\
\"avoid_topic\"|\"conversational_pref\", ...}]}.";

fn candidate_memory(metadata: &Value) -> bool {
    let profile_candidate = metadata.get("profile_candidate").and_then(Value::as_bool).unwrap_or(false);
    let mode = metadata.get("mode").and_then(Value::as_str).unwrap_or("").to_lowercase();
    let tags_match = metadata
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).any(|t| matches!(t.to_lowercase().as_str(), "preference" | "hobby")))
        .unwrap_or(false);

    profile_candidate || matches!(mode.as_str(), "preference" | "hobby" | "teaching") || tags_match
}

fn summarize_update(upd: &Value) -> String {
    let kind = upd.get("kind").and_then(Value::as_str).unwrap_or("unknown");
    let reason = upd.get("reason").and_then(Value::as_str).unwrap_or("");
    let reason_suffix = if reason.is_empty() { String::new() } else { format!(" Reason: {reason}") };

    match kind {
        "topic" => {
            let t = upd.get("topic").and_then(Value::as_str).unwrap_or("?");
            format!("- Topic «{t}»: like={}, confidence={}.{reason_suffix}", upd.get("like").cloned().unwrap_or(Value::Null), upd.get("confidence").cloned().unwrap_or(Value::Null))
        }
        "avoid_topic" => {
            let t = upd.get("topic").and_then(Value::as_str).unwrap_or("?");
            format!("- Avoid topic «{t}».{reason_suffix}")
        }
        "hobby" => {
            let name = upd.get("name").and_then(Value::as_str).unwrap_or("?");
            format!("- Hobby «{name}» (confidence={}).{reason_suffix}", upd.get("confidence").cloned().unwrap_or(Value::Null))
        }
        "conversational_pref" => {
            let field = upd.get("field").and_then(Value::as_str).unwrap_or("?");
            format!("- Conversational preference: {field} = {}.{reason_suffix}", upd.get("value").cloned().unwrap_or(Value::Null))
        }
        _ => format!("- {upd}"),
    }
}

#[async_trait]
impl Agent for PreferenceLearnerAgent {
    fn name(&self) -> &str {
        "preference_learner_agent"
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
                    "user_visible_message": "PreferenceLearnerAgent: I can't determine the user_id. \
                     I need context.user_id or input_payload.user_id.",
                    "stop_for_user_input": false,
                    "preference_updates": Value::Array(vec![]),
                    "profile_memory_id": Value::Null,
                }),
                EmotionDelta { frustration: 0.02, confidence: -0.02, ..Default::default() },
            ));
        };

        let max_messages = input_payload.get("max_messages").and_then(Value::as_u64).unwrap_or(40).clamp(5, 200) as usize;
        let max_pref_mems = input_payload.get("max_preference_memories").and_then(Value::as_u64).unwrap_or(50).clamp(10, 200) as u32;

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

        let all_user_semantic = memory
            .search_items(Some(MemoryScope::User), Some(MemoryType::Semantic), None, max_pref_mems)
            .await?;
        let candidate_memories: Vec<Value> = all_user_semantic
            .iter()
            .filter(|it| candidate_memory(&it.metadata))
            .map(|it| json!({ "id": it.id, "key": it.key, "content": it.content, "metadata": it.metadata, "created_at": it.created_at.to_rfc3339() }))
            .collect();

        let llm_input = json!({
            "user_id": user_id,
            "current_profile": base_profile,
            "recent_messages": serializable_messages,
            "preference_memories": candidate_memories,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&llm_input).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(1024), ..Default::default() };

        let llm_raw = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(raw) => raw,
            Err(err) => {
                return Ok(AgentResult::success(
                    json!({
                        "user_visible_message": format!("PreferenceLearnerAgent: error calling the LLM. Details: {err}"),
                        "stop_for_user_input": false,
                        "preference_updates": Value::Array(vec![]),
                        "profile_memory_id": Value::Null,
                    }),
                    EmotionDelta { frustration: 0.1, confidence: -0.05, ..Default::default() },
                ));
            }
        };

        let mut updated_profile = base_profile.clone();
        let mut preference_updates: Vec<Value> = Vec::new();

        match extract_json_object(&llm_raw) {
            None => preference_updates.push(json!({
                "kind": "error",
                "reason": "Could not parse JSON from the LLM; profile left unchanged.",
            })),
            Some(parsed) => {
                if let Some(maybe_profile) = parsed.get("updated_profile").filter(|v| v.is_object()) {
                    updated_profile = maybe_profile.clone();
                }
                if let Some(pu) = parsed.get("preference_updates").and_then(Value::as_array) {
                    preference_updates = pu.iter().filter(|x| x.is_object()).cloned().collect();
                }
            }
        }

        stamp_meta(&mut updated_profile, "preference_learner_agent");

        let schema_version = updated_profile.get("schema_version").cloned().unwrap_or(json!(1));
        let store_result = memory
            .store_item(
                MemoryScope::User,
                MemoryType::Semantic,
                profile_key,
                serde_json::to_string(&updated_profile).unwrap_or_default(),
                json!({
                    "agent": "preference_learner_agent",
                    "user_id": user_id,
                    "schema_version": schema_version,
                    "preference_updates": preference_updates,
                }),
            )
            .await;

        let profile_memory_id = match &store_result {
            Ok(item) => Some(item.id),
            Err(err) => {
                preference_updates.push(json!({ "kind": "error", "reason": format!("Error saving the profile: {err}") }));
                None
            }
        };

        let mut lines = vec![format!("I've updated your internal preferences (user: {user_id}).")];
        if !preference_updates.is_empty() {
            lines.push(String::new());
            lines.push("Detected preference updates:".to_string());
            for upd in preference_updates.iter().take(8) {
                lines.push(summarize_update(upd));
            }
            if preference_updates.len() > 8 {
                lines.push(format!("... and {} more updates.", preference_updates.len() - 8));
            }
        }
        if let Some(id) = profile_memory_id {
            lines.push(String::new());
            lines.push(format!("(Updated profile saved with id: {id}.)"));
        }

        Ok(AgentResult::success(
            json!({
                "user_visible_message": lines.join("\n"),
                "stop_for_user_input": false,
                "user_id": user_id,
                "profile_memory_id": profile_memory_id,
                "preference_updates": preference_updates,
            }),
            EmotionDelta { curiosity: 0.02, confidence: 0.03, fatigue: 0.005, ..Default::default() },
        ))
    }
}
