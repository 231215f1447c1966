//! General conversational agent. Grounded on `original_source/agents/chat_agent.py`:
//! reads the user profile (if any), builds a short system prompt from it, and
//! forwards the recent conversation history to the configured LLM provider.
//! The original additionally shells out to `Rscript conversation_logger.R` for
//! side-channel logging; dropped here (see DESIGN.md) since structured
//! tracing already covers this and the subprocess bridge is out of scope.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType, MessageRole};

const BASE_SYSTEM_PROMPT: &str = "You are Mnemos, a helpful and curious conversational assistant. \
Answer naturally and concisely, drawing on the conversation history provided.";

pub struct ChatAgent;

#[async_trait]
impl Agent for ChatAgent {
    fn name(&self) -> &str {
        "chat_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let text = input_payload
            .get("text")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.last_user_message().map(|s| s.to_string()))
            .unwrap_or_default();

        let mut system_prompt = BASE_SYSTEM_PROMPT.to_string();
        if let Some(user_id) = &context.user_id {
            if let Ok(Some(raw)) = memory
                .load_item_content(
                    MemoryKeys::user_profile(user_id),
                    Some(MemoryScope::User),
                    Some(MemoryType::Semantic),
                )
                .await
            {
                if let Ok(profile) = serde_json::from_str::<Value>(&raw) {
                    if let Some(name) = profile.get("display_name").and_then(Value::as_str) {
                        system_prompt.push_str(&format!(" The user's name is {name}."));
                    }
                }
            }
        }

        let mut messages: Vec<LlmMessage> = context
            .recent_messages
            .iter()
            .map(|m| LlmMessage {
                role: match m.role {
                    MessageRole::User => "user".to_string(),
                    MessageRole::Assistant | MessageRole::Agent => "assistant".to_string(),
                    MessageRole::System => "system".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();
        if messages.last().map(|m| m.content.as_str()) != Some(text.as_str()) && !text.is_empty() {
            messages.push(LlmMessage {
                role: "user".to_string(),
                content: text,
            });
        }

        let reply = llm
            .generate(&system_prompt, &messages, &LlmOptions::default())
            .await?;

        Ok(AgentResult::success(
            json!({ "user_visible_message": reply, "stop_for_user_input": false }),
            EmotionDelta {
                confidence: 0.02,
                social_need: -0.02,
                ..Default::default()
            },
        ))
    }
}
