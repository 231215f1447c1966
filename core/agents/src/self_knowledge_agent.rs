//! Reads the internal user profile (`user_profile:<user_id>`) and renders a
//! text summary of what the system knows about the user, purely from
//! internal memory. Grounded on
//! `original_source/agents/self_knowledge_agent.py`; uses
//! `MemoryEngine::load_item_content` + manual JSON parsing in place of
//! Python's `memory.load_user_profile_json`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct SelfKnowledgeAgent;

fn render_known_facts(user_id: &str, profile: &Value) -> String {
    let display_name = profile.get("display_name").and_then(Value::as_str).unwrap_or(user_id);
    let mut lines = vec![format!("Here's what I know about you so far, {display_name}:")];

    if let Some(topics) = profile.get("topics").and_then(Value::as_object) {
        let mut liked = Vec::new();
        let mut disliked = Vec::new();
        let mut neutral = Vec::new();
        for (name, info) in topics {
            let like = info.get("like");
            let conf = info.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
            match like.and_then(Value::as_bool) {
                Some(true) => liked.push(format!("{name} (conf. {conf:.2})")),
                Some(false) => disliked.push(format!("{name} (conf. {conf:.2})")),
                _ => neutral.push(name.clone()),
            }
        }
        if !liked.is_empty() {
            lines.push(format!("- You particularly like: {}.", liked.join(", ")));
        }
        if !disliked.is_empty() {
            lines.push(format!("- You prefer to avoid: {}.", disliked.join(", ")));
        }
        if !neutral.is_empty() {
            lines.push(format!("- I've marked some topics as 'neutral' or unclear: {}.", neutral.join(", ")));
        }
    }

    if let Some(avoid) = profile.get("avoid_topics").and_then(Value::as_array) {
        let avoid_str: Vec<&str> = avoid.iter().filter_map(Value::as_str).collect();
        if !avoid_str.is_empty() {
            lines.push(format!("- I should not talk about: {}.", avoid_str.join(", ")));
        }
    }

    if let Some(hobbies) = profile.get("hobbies").and_then(Value::as_array) {
        let hob_str: Vec<String> = hobbies
            .iter()
            .filter_map(|h| {
                let name = h.get("name").and_then(Value::as_str)?;
                let conf = h.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
                Some(format!("{name} (conf. {conf:.2})"))
            })
            .collect();
        if !hob_str.is_empty() {
            lines.push(format!("- Hobbies / personal interests: {}.", hob_str.join(", ")));
        }
    }

    if let Some(values) = profile.get("values").and_then(Value::as_array) {
        let val_str: Vec<&str> = values.iter().filter_map(Value::as_str).collect();
        if !val_str.is_empty() {
            lines.push(format!("- Values I perceive as important to you: {}.", val_str.join(", ")));
        }
    }

    if let Some(prefs) = profile.get("conversational_prefs").and_then(Value::as_object) {
        let mut parts = Vec::new();
        if prefs.get("likes_deep_conversations").and_then(Value::as_bool).unwrap_or(false) {
            parts.push("you enjoy deep conversations".to_string());
        }
        if prefs.get("likes_current_events").and_then(Value::as_bool).unwrap_or(false) {
            parts.push("you're interested in current events".to_string());
        }
        match prefs.get("avoid_politics") {
            Some(Value::Bool(true)) => parts.push("you prefer to avoid political discussions".to_string()),
            Some(Value::String(s)) if s == "maybe" => parts.push("you're unsure about political discussions".to_string()),
            _ => {}
        }
        if !parts.is_empty() {
            lines.push(format!("- Conversational preferences: {}.", parts.join("; ")));
        }
    }

    if let Some(rel) = profile.get("relationship_with_system").and_then(Value::as_object) {
        let mut parts = Vec::new();
        if let Some(trust) = rel.get("trust_level").and_then(Value::as_f64) {
            parts.push(format!("perceived trust level {trust:.2}"));
        }
        if let Some(comfort) = rel.get("comfort_level").and_then(Value::as_f64) {
            parts.push(format!("comfort talking {comfort:.2}"));
        }
        if let Some(notes) = rel.get("notes").and_then(Value::as_str).filter(|s| !s.is_empty()) {
            parts.push(notes.to_string());
        }
        if !parts.is_empty() {
            lines.push(format!("- Relationship with the system: {}.", parts.join("; ")));
        }
    }

    if let Some(recent) = profile.get("recent_themes").and_then(Value::as_array) {
        let rt_str: Vec<&str> = recent.iter().filter_map(|t| t.get("topic").and_then(Value::as_str)).collect();
        if !rt_str.is_empty() {
            lines.push(format!("- Recent themes we've discussed: {}.", rt_str.join(", ")));
        }
    }

    if lines.len() == 1 {
        lines.push(
            "For now the profile is almost empty: I only know you're talking to me, \
             but I don't have much structured information about you yet."
                .to_string(),
        );
    }

    lines.join("\n")
}

#[async_trait]
impl Agent for SelfKnowledgeAgent {
    fn name(&self) -> &str {
        "self_knowledge_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
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
                    "user_visible_message": "I don't yet know who you are because I don't have a \
                     'user_id' in context. I can remember something if you tell me what to call you.",
                    "stop_for_user_input": false,
                }),
                EmotionDelta { curiosity: 0.01, ..Default::default() },
            ));
        };

        let profile_key = MemoryKeys::user_profile(&user_id);
        let raw_profile = memory
            .load_item_content(profile_key, Some(MemoryScope::User), Some(MemoryType::Semantic))
            .await?;

        let Some(raw_profile) = raw_profile else {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": format!(
                        "I don't yet have a structured profile for '{user_id}'. I only know what \
                         emerges from recent messages. If you'd like, tell me about yourself and \
                         user_profile_agent will build the profile."
                    ),
                    "stop_for_user_input": false,
                    "user_id": user_id,
                }),
                EmotionDelta { curiosity: 0.02, ..Default::default() },
            ));
        };

        let profile: Value = match serde_json::from_str(&raw_profile) {
            Ok(p) => p,
            Err(_) => {
                return Ok(AgentResult::success(
                    json!({
                        "user_visible_message": "I found an internal profile, but it seems \
                         corrupted or unreadable. I can rebuild it if you tell me something about \
                         yourself.",
                        "stop_for_user_input": false,
                        "user_id": user_id,
                    }),
                    EmotionDelta { frustration: 0.02, confidence: -0.02, ..Default::default() },
                ));
            }
        };

        let msg = render_known_facts(&user_id, &profile);

        Ok(AgentResult::success(
            json!({
                "user_visible_message": msg,
                "stop_for_user_input": false,
                "user_id": user_id,
                "user_profile_json": profile,
            }),
            EmotionDelta { curiosity: 0.01, confidence: 0.02, ..Default::default() },
        ))
    }
}
