//! Designs a new `AgentDefinition` from a natural-language request, in
//! `draft` lifecycle state. Grounded on
//! `original_source/agents/architect_agent.py::ArchitectAgent`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{
    extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider,
    MemoryEngine,
};
use mnemos_types::{AgentDefinition, AgentResult, EmotionDelta, EmotionalState};

pub struct ArchitectAgent;

const SYSTEM_PROMPT: &str = "You design new specialized agents for a cognitive orchestrator. \
Given a request, respond with strict JSON only: \
{\"name\": snake_case_str, \"description\": str (>= 20 chars), \
\"system_prompt_template\": str (>= 10 chars), \"bindings\": object}.";

fn slugify(text: &str) -> String {
    let mut slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    while slug.contains("__") {
        slug = slug.replace("__", "_");
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "new_agent".to_string()
    } else {
        format!("{slug}_agent")
    }
}

fn fallback_design(request: &str) -> Value {
    json!({
        "name": slugify(request),
        "description": format!("Agent drafted from the request: {request}"),
        "system_prompt_template": format!("You help with: {request}"),
        "bindings": {},
    })
}

#[async_trait]
impl Agent for ArchitectAgent {
    fn name(&self) -> &str {
        "architect_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let request = input_payload
            .get("request")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.last_user_message().map(|s| s.to_string()))
            .unwrap_or_else(|| "a new agent".to_string());

        let messages = [LlmMessage { role: "user".to_string(), content: request.clone() }];
        let design = match llm.generate(SYSTEM_PROMPT, &messages, &LlmOptions::default()).await {
            Ok(reply) => extract_json_object(&reply)
                .filter(Value::is_object)
                .unwrap_or_else(|| fallback_design(&request)),
            Err(_) => fallback_design(&request),
        };

        let name = design
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| slugify(&request));
        let description = design
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("no description provided")
            .to_string();

        let config = json!({
            "system_prompt_template": design.get("system_prompt_template").cloned().unwrap_or(Value::Null),
            "bindings": design.get("bindings").cloned().unwrap_or_else(|| json!({})),
        });

        let definition = AgentDefinition::new_draft(name.clone(), description.clone(), config);
        memory.save_agent_definition(&definition).await?;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": format!(
                    "I've drafted a new agent called \"{name}\": {description}. It starts in draft state."
                ),
                "stop_for_user_input": false,
                "agent_definition_id": definition.id,
                "agent_name": name,
            }),
            EmotionDelta { confidence: 0.05, curiosity: 0.03, ..Default::default() },
        ))
    }
}
