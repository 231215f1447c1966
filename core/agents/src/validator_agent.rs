//! Structural completeness checker over `AgentDefinition`s, grounded on
//! `original_source/agents/architect_agent.py`'s bundled `ValidatorAgent`
//! class and SPEC_FULL.md §4.6. Uses `mnemos_engine::governance::
//! validate_definition` so the check rules live in one place shared with the
//! rest of the governance pipeline.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::governance::validate_definition;
use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, LifecycleState};

pub struct ValidatorAgent;

const MIN_DESCRIPTION_LEN: usize = 20;
const MIN_PROMPT_LEN: usize = 10;

#[async_trait]
impl Agent for ValidatorAgent {
    fn name(&self) -> &str {
        "validator_agent"
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

        let target_name = input_payload.get("target_name").and_then(Value::as_str);
        let mut target = match target_name {
            Some(name) => defs.into_iter().rev().find(|d| d.name == name),
            None => defs.into_iter().last(),
        };

        let Some(def) = target.as_mut() else {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "There's no agent definition to validate yet.",
                    "stop_for_user_input": false,
                }),
                EmotionDelta::default(),
            ));
        };

        let report = validate_definition(def, MIN_DESCRIPTION_LEN, MIN_PROMPT_LEN);

        let auto_promote = input_payload
            .get("auto_promote")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        let mut promoted = false;
        if report.passed && auto_promote && def.lifecycle_state == LifecycleState::Draft {
            def.set_lifecycle_state(LifecycleState::Test);
            memory.save_agent_definition(def).await?;
            promoted = true;
        }

        let message = if report.passed {
            if promoted {
                format!("\"{}\" passed validation and moved to `test`.", def.name)
            } else {
                format!("\"{}\" passed structural validation.", def.name)
            }
        } else {
            format!(
                "\"{}\" failed validation: {}",
                def.name,
                report.failures.join("; ")
            )
        };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": message,
                "stop_for_user_input": false,
                "agent_name": def.name,
                "validation_passed": report.passed,
                "validation_failures": report.failures,
            }),
            if report.passed {
                EmotionDelta { confidence: 0.04, ..Default::default() }
            } else {
                EmotionDelta { frustration: 0.03, confidence: -0.02, ..Default::default() }
            },
        ))
    }
}
