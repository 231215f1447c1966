//! Scans `AgentDefinition`s for dangerous substrings and forces `draft`/
//! inactive on a hit, grounded on
//! `original_source/agents/security_review_agent.py` and SPEC_FULL.md §4.6.
//! Security takes absolute precedence over every other governance signal.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::governance::scan_definition;
use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, LifecycleState, MemoryKeys, MemoryScope, MemoryType};

pub struct SecurityReviewAgent;

#[async_trait]
impl Agent for SecurityReviewAgent {
    fn name(&self) -> &str {
        "security_review_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let scan_all = input_payload.get("scan_all").and_then(Value::as_bool).unwrap_or(false);
        let target_name = input_payload.get("target_name").and_then(Value::as_str);

        let mut defs = memory.list_agent_definitions().await?;
        if !scan_all {
            if let Some(name) = target_name {
                defs.retain(|d| d.name == name);
            } else if let Some(last) = defs.pop() {
                defs = vec![last];
            } else {
                defs.clear();
            }
        }

        let mut flagged = Vec::new();
        for def in &mut defs {
            let hits = scan_definition(def);
            if hits.is_empty() {
                continue;
            }

            def.set_lifecycle_state(LifecycleState::Draft);
            def.is_active = false;
            def.config["security_flags"] = json!({ "dangerous_keywords": hits });
            memory.save_agent_definition(def).await?;

            memory
                .store_item(
                    MemoryScope::Global,
                    MemoryType::Procedural,
                    MemoryKeys::SECURITY_ALERT,
                    serde_json::to_string(&json!({
                        "agent": def.name,
                        "dangerous_keywords": hits,
                    }))
                    .unwrap_or_default(),
                    json!({ "severity": "critical" }),
                )
                .await?;

            flagged.push(json!({ "agent": def.name, "dangerous_keywords": hits }));
        }

        let message = if flagged.is_empty() {
            "Security scan complete: no dangerous patterns found.".to_string()
        } else {
            let names: Vec<&str> = flagged
                .iter()
                .filter_map(|f| f.get("agent").and_then(Value::as_str))
                .collect();
            format!(
                "Security scan flagged {} definition(s) and forced them back to draft: {}.",
                flagged.len(),
                names.join(", ")
            )
        };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": message,
                "stop_for_user_input": false,
                "security_flags": flagged,
            }),
            if flagged.is_empty() {
                EmotionDelta { confidence: 0.02, ..Default::default() }
            } else {
                EmotionDelta { frustration: 0.06, confidence: -0.03, ..Default::default() }
            },
        ))
    }
}
