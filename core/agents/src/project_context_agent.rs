//! Builds/updates a structured project context summary (goal, status, TODOs,
//! risks) from prior PROJECT memories, recent conversation, and optional
//! notes/files, saving it under `MemoryKeys::project_context`. Grounded on
//! `original_source/agents/project_context_agent.py`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryItem, MemoryKeys, MemoryScope, MemoryType};

pub struct ProjectContextAgent;

fn safe_project_key(name: &str) -> String {
    let mut key = String::new();
    let mut last_was_sep = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            key.push(c);
            last_was_sep = false;
        } else if !last_was_sep {
            key.push('_');
            last_was_sep = true;
        }
    }
    let key = key.trim_matches('_').to_string();
    if key.is_empty() {
        "default_project".to_string()
    } else {
        key
    }
}

const SYSTEM_PROMPT: &str = "You are the ProjectContextAgent of a multi-agent cognitive system. \
You receive JSON information about a project (name, recent conversation snippet, prior memories, \
optional notes and file snippets). Produce ONE well-structured text summary with this shape:\n\n\
Project name: ...\nMain goal:\n- ...\n\nCurrent status:\n- ...\n\nDone so far:\n- ...\n\n\
Short-term TODOs:\n- ...\n\nRisks / open issues:\n- ...\n\nSystem's personal notes:\n- ...\n\n\
Do not add explanations outside this structure. Do not talk about yourself as an LLM, speak as \
the system organizing the project.";

fn fallback_summary(project_name: &str, existing_count: usize, extra_notes: &str, error: Option<&str>) -> String {
    let mut lines = vec![
        format!("Project name: {project_name}"),
        "Main goal:".to_string(),
        "- (not defined: an LLM would be needed to infer it)".to_string(),
        String::new(),
        "Current status:".to_string(),
    ];
    if existing_count > 0 {
        lines.push(format!("- There are {existing_count} related PROJECT memories."));
    } else {
        lines.push("- No PROJECT memory found for this project.".to_string());
    }

    if !extra_notes.is_empty() {
        lines.push(String::new());
        lines.push("Recent notes:".to_string());
        lines.push(format!("- {extra_notes}"));
    }

    if let Some(err) = error {
        lines.push(String::new());
        lines.push("[Technical note]".to_string());
        lines.push(format!("- Summary generated without an LLM due to: {err}"));
    }

    lines.push(String::new());
    lines.push("Short-term TODOs:".to_string());
    lines.push("- Define more detailed goals and milestones.".to_string());
    lines.push(String::new());
    lines.push("Risks / open issues:".to_string());
    lines.push("- Missing an accurate LLM-generated summary of the context.".to_string());

    lines.join("\n")
}

#[async_trait]
impl Agent for ProjectContextAgent {
    fn name(&self) -> &str {
        "project_context_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let project_name = input_payload
            .get("project_name")
            .or_else(|| input_payload.get("name"))
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "default_project".to_string());
        let project_key = safe_project_key(&project_name);

        let mode = input_payload.get("mode").and_then(Value::as_str).unwrap_or("update").to_string();
        let extra_notes = input_payload.get("extra_notes").and_then(Value::as_str).unwrap_or("").to_string();
        let files: Vec<String> = input_payload
            .get("files")
            .and_then(Value::as_array)
            .map(|a| a.iter().filter_map(|v| v.as_str().map(|s| s.to_string())).collect())
            .unwrap_or_default();
        let max_memories = input_payload.get("max_memories").and_then(Value::as_u64).unwrap_or(15) as u32;
        let max_recent_msgs = input_payload.get("max_recent_messages").and_then(Value::as_u64).unwrap_or(12) as u32;

        let existing_items = memory
            .search_items(Some(MemoryScope::Project), None, Some(project_key.clone()), max_memories)
            .await?;

        let existing_for_llm: Vec<Value> = existing_items
            .iter()
            .map(|m: &MemoryItem| {
                json!({
                    "id": m.id,
                    "key": m.key,
                    "content": m.content.chars().take(600).collect::<String>(),
                    "metadata": m.metadata,
                })
            })
            .collect();

        let recent_messages = memory.get_recent_messages(context.conversation_id, max_recent_msgs).await?;
        let conv_snippet: Vec<Value> = recent_messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content.chars().take(400).collect::<String>() }))
            .collect();

        let mut files_preview: Vec<Value> = Vec::new();
        for path in files.iter().take(5) {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => files_preview.push(json!({
                    "path": path,
                    "content_snippet": content.chars().take(4000).collect::<String>(),
                })),
                Err(_) => files_preview.push(json!({
                    "path": path,
                    "content_snippet": "<error reading file>",
                })),
            }
        }

        let llm_input = json!({
            "project_name": project_name,
            "project_key": project_key,
            "mode": mode,
            "extra_notes": extra_notes,
            "conversation_snippet": conv_snippet,
            "existing_project_memories": existing_for_llm,
            "files_preview": files_preview,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&llm_input).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(900), ..Default::default() };

        let summary_text = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(raw) => raw.trim().to_string(),
            Err(err) => fallback_summary(&project_name, existing_items.len(), &extra_notes, Some(&err.to_string())),
        };

        let metadata = json!({
            "project_name": project_name,
            "project_key": project_key,
            "mode": mode,
            "source": "project_context_agent",
            "num_existing_items": existing_items.len(),
            "files": files,
        });

        let item = memory
            .store_item(
                MemoryScope::Project,
                MemoryType::Semantic,
                MemoryKeys::project_context(&project_key),
                summary_text.clone(),
                metadata,
            )
            .await?;

        let user_msg = format!(
            "I've updated the context for project «{project_name}» (key: {project_key}).\n\nHere's a summary:\n\n{summary_text}"
        );

        Ok(AgentResult::success(
            json!({
                "user_visible_message": user_msg,
                "project_name": project_name,
                "project_key": project_key,
                "stored_item_id": item.id,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.04, curiosity: -0.01, fatigue: 0.02, ..Default::default() },
        ))
    }
}
