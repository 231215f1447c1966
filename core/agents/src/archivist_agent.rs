//! Compacts a group of memories (filtered by scope/type/query) into one
//! denser summary item, so memory doesn't grow unbounded. Grounded on
//! `original_source/agents/archivist_agent.py`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryItem, MemoryScope, MemoryType};

pub struct ArchivistAgent;

fn parse_scope(raw: &str) -> MemoryScope {
    match raw.to_lowercase().as_str() {
        "project" | "progetto" => MemoryScope::Project,
        "user" | "utente" => MemoryScope::User,
        "global" | "globale" => MemoryScope::Global,
        _ => MemoryScope::Conversation,
    }
}

fn parse_type(raw: &str) -> Option<MemoryType> {
    match raw.to_lowercase().as_str() {
        "episodic" | "episodica" => Some(MemoryType::Episodic),
        "semantic" | "semantica" => Some(MemoryType::Semantic),
        "procedural" | "procedurale" => Some(MemoryType::Procedural),
        _ => None,
    }
}

fn scope_label(scope: MemoryScope) -> &'static str {
    match scope {
        MemoryScope::Conversation => "conversation",
        MemoryScope::Project => "project",
        MemoryScope::User => "user",
        MemoryScope::Global => "global",
    }
}

const SYSTEM_PROMPT: &str = "You are the internal Archivist of a multi-agent system. \
You receive a list of memories (conversation logs, notes, agent results). Write a compact \
summary that keeps only the important information. Do not invent new facts or change the \
meaning. Keep the summary to a few sentences or short bullet points. Respond ONLY with the \
summary text, no meta commentary.";

#[async_trait]
impl Agent for ArchivistAgent {
    fn name(&self) -> &str {
        "archivist_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let scope = input_payload
            .get("scope")
            .and_then(Value::as_str)
            .map(parse_scope)
            .unwrap_or(MemoryScope::Conversation);
        let r#type = input_payload.get("type").and_then(Value::as_str).and_then(parse_type);
        let query = input_payload.get("query").and_then(Value::as_str).map(|s| s.to_string());
        let max_items = input_payload
            .get("max_items")
            .and_then(Value::as_u64)
            .unwrap_or(50)
            .clamp(1, 200) as u32;
        let summary_key = input_payload
            .get("summary_key")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("archivist_summary_{}", scope_label(scope)));

        let mut items = memory.search_items(Some(scope), r#type, query.clone(), max_items).await?;

        if items.is_empty() {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": format!(
                        "I didn't find any memories to archive for the requested criteria (scope={}, type={}, query={:?}).",
                        scope_label(scope),
                        r#type.map(|t| format!("{t:?}")).unwrap_or_else(|| "any".to_string()),
                        query,
                    ),
                    "summary_memory_id": Value::Null,
                    "archived_item_ids": Value::Array(vec![]),
                }),
                EmotionDelta { confidence: -0.01, frustration: 0.01, ..Default::default() },
            ));
        }

        items.sort_by_key(|it| it.created_at);

        let serializable: Vec<Value> = items
            .iter()
            .map(|it: &MemoryItem| {
                json!({
                    "id": it.id,
                    "key": it.key,
                    "content": it.content,
                    "created_at": it.created_at.to_rfc3339(),
                })
            })
            .collect();

        let user_payload = json!({
            "scope": scope_label(scope),
            "type": r#type.map(|t| format!("{t:?}").to_lowercase()),
            "query": query,
            "items": serializable,
        });

        let messages = [LlmMessage {
            role: "user".to_string(),
            content: serde_json::to_string(&user_payload).unwrap_or_default(),
        }];
        let options = LlmOptions { max_tokens: Some(512), ..Default::default() };

        let (summary_text, llm_used) = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(text) => (text, true),
            Err(_) => {
                let joined = items.iter().take(5).map(|it| it.content.as_str()).collect::<Vec<_>>().join("\n\n");
                (
                    format!(
                        "I couldn't use the LLM to summarize; here's an excerpt of the most recent memories:\n\n{joined}"
                    ),
                    false,
                )
            }
        };

        let metadata = json!({
            "source_item_ids": items.iter().map(|it| it.id).collect::<Vec<_>>(),
            "source_scope": scope_label(scope),
            "source_type": r#type.map(|t| format!("{t:?}").to_lowercase()),
            "query": query,
            "num_items": items.len(),
            "agent": "archivist_agent",
            "llm_used": llm_used,
        });

        let summary_item = memory
            .store_item(scope, MemoryType::Semantic, summary_key.clone(), summary_text.clone(), metadata)
            .await?;

        let user_msg = format!(
            "I've created a summary of {} memories in the «{}» scope and saved it with id «{}» and key «{}».\n\nSummary:\n{}",
            items.len(),
            scope_label(scope),
            summary_item.id,
            summary_key,
            summary_text,
        );

        Ok(AgentResult::success(
            json!({
                "user_visible_message": user_msg,
                "summary_memory_id": summary_item.id,
                "archived_item_ids": items.iter().map(|it| it.id).collect::<Vec<_>>(),
            }),
            EmotionDelta {
                curiosity: 0.01,
                confidence: 0.02,
                frustration: if llm_used { 0.0 } else { 0.03 },
                ..Default::default()
            },
        ))
    }
}
