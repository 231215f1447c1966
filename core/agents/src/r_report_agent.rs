//! Builds a narrative report from prior EDA / modeling results. Grounded
//! on `original_source/agents/r_report_agent.py`.
//!
//! The original shells out to `Rscript report_generic.R` to render the
//! report; here the report is assembled directly in Rust from whichever
//! of `eda_result` / `modeling_result` are available, either passed in
//! the payload or read back from the `r_eda_result` / `r_modeling_result`
//! memory keys those two agents persist under.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct RReportAgent;

async fn load_or_fallback(memory: &MemoryEngine, payload_key: &str, input_payload: &Value, memory_key: &str) -> Option<Value> {
    if let Some(v) = input_payload.get(payload_key) {
        if !v.is_null() {
            return Some(v.clone());
        }
    }
    let content = memory
        .load_item_content(memory_key, Some(MemoryScope::Conversation), Some(MemoryType::Procedural))
        .await
        .ok()
        .flatten()?;
    serde_json::from_str::<Value>(&content).ok()
}

fn render_report(eda: &Option<Value>, modeling: &Option<Value>) -> String {
    let mut lines = vec!["Analysis report".to_string(), String::new()];

    match eda {
        Some(eda) if eda.get("ok").and_then(Value::as_bool) != Some(false) => {
            if let Some(summary) = eda.get("eda") {
                lines.push("## Exploratory data analysis".to_string());
                if let (Some(rows), Some(cols)) = (summary.get("n_rows"), summary.get("n_cols")) {
                    lines.push(format!("- Dataset size: {rows} rows x {cols} columns."));
                }
                if let Some(missing) = summary.get("missing_perc").and_then(Value::as_object) {
                    if !missing.is_empty() {
                        lines.push(format!("- {} column(s) have missing values above the reporting threshold.", missing.len()));
                    } else {
                        lines.push("- No column exceeds the missing-value reporting threshold.".to_string());
                    }
                }
                lines.push(String::new());
            }
        }
        Some(eda) => {
            let err = eda.get("error").and_then(Value::as_str).unwrap_or("unknown error");
            lines.push(format!("## Exploratory data analysis\n- Failed: {err}\n"));
        }
        None => {}
    }

    match modeling {
        Some(model) if model.get("ok").and_then(Value::as_bool) != Some(false) => {
            lines.push("## Modeling".to_string());
            let model_type = model.get("model_type").and_then(Value::as_str).unwrap_or("unknown");
            lines.push(format!("- Model: {model_type}."));
            if let Some(n_obs) = model.get("n_obs") {
                lines.push(format!("- Observations used: {n_obs}."));
            }
            for (label, key) in [("Accuracy", "accuracy"), ("RMSE", "rmse"), ("MAE", "mae"), ("R2", "r2")] {
                if let Some(v) = model.get(key).and_then(Value::as_f64) {
                    lines.push(format!("- {label}: {v:.3}."));
                }
            }
            lines.push(String::new());
        }
        Some(model) => {
            let err = model.get("error").and_then(Value::as_str).unwrap_or("unknown error");
            lines.push(format!("## Modeling\n- Failed: {err}\n"));
        }
        None => {}
    }

    if lines.len() <= 2 {
        lines.push("No EDA or modeling results were available to report on yet.".to_string());
    }

    lines.join("\n")
}

#[async_trait]
impl Agent for RReportAgent {
    fn name(&self) -> &str {
        "r_report_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let eda = load_or_fallback(memory, "eda_result", &input_payload, MemoryKeys::R_EDA_RESULT).await;
        let modeling = load_or_fallback(memory, "modeling_result", &input_payload, MemoryKeys::R_MODELING_RESULT).await;

        let report_text = render_report(&eda, &modeling);
        let result = json!({
            "ok": true,
            "report": report_text,
            "used_eda": eda.is_some(),
            "used_modeling": modeling.is_some(),
        });

        let _ = memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                MemoryKeys::R_REPORT_RESULT,
                serde_json::to_string(&result).unwrap_or_default(),
                json!({ "script_name": "report_generic.R" }),
            )
            .await;

        Ok(AgentResult::success(
            json!({ "user_visible_message": "", "r_report_result": result }),
            EmotionDelta { confidence: 0.04, ..Default::default() },
        ))
    }
}
