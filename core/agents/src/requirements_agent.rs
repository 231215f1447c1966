//! Intake form. Grounded on `original_source/agents/requirements_agent.py`:
//! asks the LLM to extract a structured requirements sheet from free text,
//! falling back to a deterministic skeleton sheet on any LLM/parse failure.
//! Always sets `stop_for_user_input = true` so the turn ends here and the
//! planner's intake gate (SPEC_FULL.md §4.4) is satisfied on the next turn.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{
    extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider,
    MemoryEngine,
};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct RequirementsAgent;

const SYSTEM_PROMPT: &str = "You are an intake assistant. From the user's message, extract a \
structured requirements sheet. Respond with strict JSON only: \
{\"primary_goal\": str, \"target_variable\": str|null, \"problem_type\": str|null, \
\"domain\": str|null, \"constraints\": [str], \"evaluation\": str|null}.";

fn fallback_sheet(text: &str) -> Value {
    json!({
        "primary_goal": text,
        "target_variable": Value::Null,
        "problem_type": Value::Null,
        "domain": Value::Null,
        "constraints": [],
        "evaluation": Value::Null,
    })
}

#[async_trait]
impl Agent for RequirementsAgent {
    fn name(&self) -> &str {
        "requirements_agent"
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

        let messages = [LlmMessage { role: "user".to_string(), content: text.clone() }];
        let (sheet, llm_used) = match llm.generate(SYSTEM_PROMPT, &messages, &LlmOptions::default()).await {
            Ok(reply) => match extract_json_object(&reply) {
                Some(parsed) if parsed.is_object() => (parsed, true),
                _ => (fallback_sheet(&text), false),
            },
            Err(_) => (fallback_sheet(&text), false),
        };

        let sheet_text = serde_json::to_string(&sheet).unwrap_or_else(|_| "{}".to_string());

        let conversation_key = MemoryKeys::requirements_sheet(&context.conversation_id.to_string());
        memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                conversation_key,
                sheet_text.clone(),
                json!({ "llm_used": llm_used }),
            )
            .await?;

        if let Some(project_id) = &context.project_id {
            memory
                .store_item(
                    MemoryScope::Project,
                    MemoryType::Procedural,
                    MemoryKeys::requirements_sheet(project_id),
                    sheet_text,
                    json!({ "llm_used": llm_used }),
                )
                .await?;
        }

        let message = format!(
            "Thanks, I've captured your requirements: \"{}\". I'll use this to plan the next steps.",
            sheet.get("primary_goal").and_then(Value::as_str).unwrap_or(&text)
        );

        Ok(AgentResult::success(
            json!({
                "user_visible_message": message,
                "requirements_sheet": sheet,
                "stop_for_user_input": true,
            }),
            EmotionDelta { confidence: 0.04, curiosity: 0.02, ..Default::default() },
        ))
    }
}
