//! Generates a skeleton Rust source module for a new `AgentDefinition` and
//! records it as a memory item for review. Grounded on
//! `original_source/agents/codegen_agent.py`.
//!
//! The Python original writes `.py`/`.R` files straight to disk under
//! `agents/`/`r_agents/` and relies on a dynamic loader to pick them up.
//! This process has no hot-reload mechanism (see `agent_reload_agent`) and
//! writing arbitrary generated Rust to the crate tree wouldn't compile
//! without a rebuild anyway, so this port never touches the filesystem: it
//! renders the same kind of skeleton and stores it as a memory item for a
//! human to review and wire in by hand.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentDefinition, AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct CodegenAgent;

fn to_pascal_case(name: &str) -> String {
    let mut out = String::new();
    for part in name.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if !out.ends_with("Agent") {
        out.push_str("Agent");
    }
    out
}

fn render_rust_agent_preview(struct_name: &str, agent_name: &str, description: &str, system_prompt: &str) -> String {
    let prompt_escaped = system_prompt.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"//! {description}
//! (Preview generated by CodegenAgent; not wired into the registry.)

use async_trait::async_trait;
use serde_json::{{json, Value}};

use mnemos_engine::{{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine}};
use mnemos_types::{{AgentResult, EmotionDelta, EmotionalState}};

pub struct {struct_name};

const SYSTEM_PROMPT: &str = "{prompt_escaped}";

#[async_trait]
impl Agent for {struct_name} {{
    fn name(&self) -> &str {{
        "{agent_name}"
    }}

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        _memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {{
        let user_message = input_payload
            .get("user_message")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.last_user_message().map(|s| s.to_string()))
            .unwrap_or_default();

        let text = if !SYSTEM_PROMPT.is_empty() {{
            let messages = [LlmMessage {{ role: "user".to_string(), content: user_message }}];
            let options = LlmOptions {{ max_tokens: Some(512), ..Default::default() }};
            llm.generate(SYSTEM_PROMPT, &messages, &options).await?
        }} else {{
            "I'm an auto-generated agent. I don't have specific logic yet beyond this placeholder.".to_string()
        }};

        Ok(AgentResult::success(
            json!({{ "user_visible_message": text, "stop_for_user_input": false }}),
            EmotionDelta::default(),
        ))
    }}
}}
"#
    )
}

#[async_trait]
impl Agent for CodegenAgent {
    fn name(&self) -> &str {
        "codegen_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let defs = memory.list_agent_definitions().await?;
        if defs.is_empty() {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "CodegenAgent: no AgentDefinition found in memory.",
                    "stop_for_user_input": false,
                }),
                EmotionDelta::default(),
            ));
        }

        let target_id = input_payload.get("target_id").and_then(Value::as_str);
        let candidate: Option<&AgentDefinition> = match target_id {
            Some(id) => defs.iter().find(|d| d.id.to_string() == id),
            None => defs.last(),
        };

        let Some(candidate) = candidate else {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": format!(
                        "CodegenAgent: no AgentDefinition found with id '{}'.",
                        target_id.unwrap_or("")
                    ),
                    "stop_for_user_input": false,
                }),
                EmotionDelta::default(),
            ));
        };

        let dry_run = input_payload.get("dry_run").and_then(Value::as_bool).unwrap_or(false);
        let name = candidate.name.to_lowercase().replace(' ', "_");
        let desc = if candidate.description.trim().is_empty() {
            format!("Auto-generated agent ({name}).")
        } else {
            candidate.description.trim().to_string()
        };
        let struct_name = to_pascal_case(&name);
        let system_prompt_template = candidate
            .config
            .get("system_prompt_template")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let preview_code = render_rust_agent_preview(&struct_name, &name, &desc, &system_prompt_template);
        let preview_key = format!("codegen_preview_{name}");

        let mut messages = Vec::new();
        if dry_run {
            messages.push("dry_run=true: not persisting the generated preview.".to_string());
        } else {
            match memory
                .store_item(
                    MemoryScope::Global,
                    MemoryType::Procedural,
                    preview_key.clone(),
                    preview_code.clone(),
                    json!({ "agent_definition_id": candidate.id, "struct_name": struct_name }),
                )
                .await
            {
                Ok(item) => messages.push(format!("Generated a Rust source preview and saved it as memory item {}.", item.id)),
                Err(err) => messages.push(format!("Error saving the generated preview: {err}")),
            }
        }

        let mut lines = vec![format!("Codegen for AgentDefinition '{}' (id={})", candidate.name, candidate.id)];
        lines.extend(messages);
        lines.push(String::new());
        lines.push("Preview:".to_string());
        lines.push(preview_code.clone());

        Ok(AgentResult::success(
            json!({
                "user_visible_message": lines.join("\n"),
                "stop_for_user_input": false,
                "preview_memory_key": preview_key,
                "struct_name": struct_name,
                "dry_run": dry_run,
            }),
            EmotionDelta { confidence: if dry_run { 0.0 } else { 0.04 }, curiosity: 0.02, ..Default::default() },
        ))
    }
}
