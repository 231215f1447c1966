//! Generates 1-3 respectful personal questions from the user's profile and
//! recent conversation, steering clear of disliked/avoided topics. Grounded
//! on `original_source/agents/curiosity_question_agent.py`; shares
//! `crate::profile_schema` with `user_profile_agent`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

use crate::profile_schema::{ensure_base_profile, stamp_meta};

pub struct CuriosityQuestionAgent;

const SYSTEM_PROMPT: &str = "You are the CuriosityQuestionAgent of a multi-agent cognitive system. \
Your job is to generate 1-3 personal, curious, and respectful questions to get to know the user \
better, based on their profile and recent conversation.\n\n\
IMPORTANT RULES:\n\
- Use topics: pick subjects the user likes (like=true, good confidence) and not in avoid_topics.\n\
- NEVER ask about a topic with like=false or listed in avoid_topics.\n\
- Treat hobbies and values as great sources of questions.\n\
- Respect conversational_prefs: deeper questions if likes_deep_conversations=true, lighter otherwise.\n\
- Use recent_themes to avoid repeating the same question immediately.\n\
- Use open_questions if present: you may revisit pending ones or create new ones.\n\
- Modulate count/intensity by emotional_state: high curiosity + low fatigue → 2-3 questions; \
high fatigue → at most 1, or none if inappropriate.\n\
- If force=true in the payload, still try to produce at least one question unless it would \
violate avoid_topics or clear preferences.\n\n\
REQUIRED RESPONSE (valid JSON only): \
{\"questions_to_ask\": [\"...\"], \"updated_profile\": {...full profile...}, \"notes\": \"...\"}. \
If no question is appropriate, return questions_to_ask as an empty list but keep the JSON shape.";

#[async_trait]
impl Agent for CuriosityQuestionAgent {
    fn name(&self) -> &str {
        "curiosity_question_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let user_id = input_payload
            .get("user_id")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.user_id.clone());

        let Some(user_id) = user_id else {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "CuriosityQuestionAgent: I can't determine the user_id. \
                     I need context.user_id or input_payload.user_id.",
                    "stop_for_user_input": false,
                    "questions": Value::Array(vec![]),
                    "profile_memory_id": Value::Null,
                }),
                EmotionDelta { frustration: 0.02, confidence: -0.02, ..Default::default() },
            ));
        };

        let max_messages = input_payload.get("max_messages").and_then(Value::as_u64).unwrap_or(20).clamp(5, 100) as usize;
        let max_questions = input_payload.get("max_questions").and_then(Value::as_u64).unwrap_or(3).clamp(1, 5);
        let force = input_payload.get("force").and_then(Value::as_bool).unwrap_or(false);

        let profile_key = MemoryKeys::user_profile(&user_id);
        let raw_profile = match input_payload.get("user_profile") {
            Some(p) if p.is_object() => Some(p.clone()),
            _ => memory
                .load_item_content(profile_key.clone(), Some(MemoryScope::User), Some(MemoryType::Semantic))
                .await?
                .and_then(|raw| serde_json::from_str::<Value>(&raw).ok()),
        };
        let base_profile = ensure_base_profile(&user_id, raw_profile);

        let recent_count = context.recent_messages.len().min(max_messages);
        let serializable_messages: Vec<Value> = context.recent_messages[context.recent_messages.len() - recent_count..]
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content, "timestamp": m.timestamp.to_rfc3339() }))
            .collect();

        let emo = json!({
            "curiosity": emotional_state.curiosity,
            "confidence": emotional_state.confidence,
            "fatigue": emotional_state.fatigue,
            "frustration": emotional_state.frustration,
        });

        let llm_input = json!({
            "user_id": user_id,
            "user_profile": base_profile,
            "recent_messages": serializable_messages,
            "emotional_state": emo,
            "max_questions": max_questions,
            "force": force,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&llm_input).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(768), ..Default::default() };

        let llm_raw = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(raw) => raw,
            Err(err) => {
                return Ok(AgentResult::success(
                    json!({
                        "user_visible_message": format!("CuriosityQuestionAgent: error calling the LLM. Details: {err}"),
                        "stop_for_user_input": false,
                        "questions": Value::Array(vec![]),
                        "profile_memory_id": Value::Null,
                    }),
                    EmotionDelta { frustration: 0.08, confidence: -0.05, ..Default::default() },
                ));
            }
        };

        let mut questions: Vec<String> = Vec::new();
        let mut updated_profile = base_profile.clone();
        let mut notes = String::new();

        match serde_json::from_str::<Value>(&llm_raw) {
            Ok(parsed) if parsed.is_object() => {
                if let Some(qs) = parsed.get("questions_to_ask").and_then(Value::as_array) {
                    questions = qs
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
                if let Some(p) = parsed.get("updated_profile").filter(|v| v.is_object()) {
                    updated_profile = p.clone();
                }
                if let Some(n) = parsed.get("notes").and_then(Value::as_str) {
                    notes = n.to_string();
                }
            }
            _ => notes = "Could not parse JSON from the LLM; using the base profile and no questions.".to_string(),
        }

        stamp_meta(&mut updated_profile, "curiosity_question_agent");

        let schema_version = updated_profile.get("schema_version").cloned().unwrap_or(json!(1));
        let store_result = memory
            .store_item(
                MemoryScope::User,
                MemoryType::Semantic,
                profile_key,
                serde_json::to_string(&updated_profile).unwrap_or_default(),
                json!({
                    "agent": "curiosity_question_agent",
                    "user_id": user_id,
                    "schema_version": schema_version,
                    "curiosity_notes": notes,
                    "questions": questions,
                }),
            )
            .await;

        let profile_memory_id = match &store_result {
            Ok(item) => Some(item.id),
            Err(err) => {
                notes.push_str(&format!(" (Error saving the profile: {err})"));
                None
            }
        };

        let (user_text, stop_for_user_input) = if questions.is_empty() {
            (
                "I don't have a sensible personal question for you right now, but I'm still learning from our conversations.".to_string(),
                false,
            )
        } else {
            let mut lines = vec!["Would you like to answer a couple of questions about yourself?".to_string(), String::new()];
            for (i, q) in questions.iter().enumerate() {
                lines.push(format!("{}. {q}", i + 1));
            }
            (lines.join("\n"), true)
        };

        let curiosity_delta = if questions.is_empty() { -0.005 } else { -0.02 };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": user_text,
                "stop_for_user_input": stop_for_user_input,
                "user_id": user_id,
                "questions": questions,
                "profile_memory_id": profile_memory_id,
                "curiosity_notes": notes,
            }),
            EmotionDelta { curiosity: curiosity_delta, confidence: 0.02, ..Default::default() },
        ))
    }
}
