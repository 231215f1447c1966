//! Explains, in plain language, what the other agents in this turn's plan
//! produced — R churn demo, generic EDA/modeling, DB schema — tuned to the
//! user's preferred detail level. Grounded on
//! `original_source/agents/explanation_agent.py`.
//!
//! The Python original walked `context.plan.tasks` looking for prior
//! results; `AgentContext` here carries no reference to the plan or to
//! sibling task results (see DESIGN.md), so this agent instead reads the
//! same well-known `MemoryEngine` keys those agents persist their output
//! under.

use async_trait::async_trait;
use serde_json::Value;

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{
    AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType,
};

pub struct ExplanationAgent;

const R_CHURN_RESULT_KEY: &str = "r_result_churn_demo";
/// Shared with `analysis_planner_agent`, which stores `{"analysis_plan": [...]}`
/// JSON here (not the Python original's plain newline-joined text) so this
/// agent can parse it back out.
const ANALYSIS_PLAN_KEY: &str = "analysis_plan_text";

async fn load_json(
    memory: &MemoryEngine,
    key: &str,
    scope: MemoryScope,
    r#type: MemoryType,
) -> EngineResult<Option<Value>> {
    let content = memory.load_item_content(key, Some(scope), Some(r#type)).await?;
    Ok(content.and_then(|raw| serde_json::from_str::<Value>(&raw).ok()))
}

fn detail_level_from_profile(profile: &Option<Value>) -> &'static str {
    let Some(profile) = profile else { return "medium" };
    let prefs = profile.get("conversational_prefs").or_else(|| profile.get("conversational_preferences"));
    let Some(prefs) = prefs else { return "medium" };

    match prefs.get("detail_level").and_then(Value::as_str) {
        Some("low") => "low",
        Some("high") => "high",
        Some("medium") => "medium",
        _ => {
            if prefs.get("prefers_concise").and_then(Value::as_bool).unwrap_or(false) {
                "low"
            } else if prefs.get("prefers_detailed").and_then(Value::as_bool).unwrap_or(false) {
                "high"
            } else {
                "medium"
            }
        }
    }
}

#[async_trait]
impl Agent for ExplanationAgent {
    fn name(&self) -> &str {
        "explanation_agent"
    }

    async fn run_impl(
        &self,
        _input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let r_eda = load_json(memory, MemoryKeys::R_EDA_RESULT, MemoryScope::Conversation, MemoryType::Procedural).await?;
        let modeling = load_json(memory, MemoryKeys::R_MODELING_RESULT, MemoryScope::Conversation, MemoryType::Procedural).await?;
        let r_churn = load_json(memory, R_CHURN_RESULT_KEY, MemoryScope::Conversation, MemoryType::Procedural).await?;
        let db_schema = memory
            .load_item_content(MemoryKeys::DATABASE_SCHEMA, Some(MemoryScope::Conversation), Some(MemoryType::Procedural))
            .await?;
        let analysis_plan = load_json(memory, ANALYSIS_PLAN_KEY, MemoryScope::Conversation, MemoryType::Procedural)
            .await?
            .and_then(|v| v.get("analysis_plan").cloned())
            .and_then(|v| v.as_array().cloned());

        let profile = match &context.user_id {
            Some(user_id) => load_json(memory, &MemoryKeys::user_profile(user_id), MemoryScope::User, MemoryType::Semantic).await?,
            None => None,
        };
        let detail_level = detail_level_from_profile(&profile);

        let mut parts: Vec<String> = Vec::new();
        match detail_level {
            "low" => parts.push("Here's a quick summary of what I've done so far:".to_string()),
            "high" => parts.push("Here's a more technical walk-through of what I've done so far:".to_string()),
            _ => parts.push("Here's a summary of the main steps I took:".to_string()),
        }
        parts.push(String::new());

        if let Some(eda) = &r_eda {
            if eda.get("ok").and_then(Value::as_bool) == Some(false) {
                let err = eda.get("error").and_then(Value::as_str).unwrap_or("unknown error");
                parts.push("1) Exploratory data analysis (R) — failed:".to_string());
                parts.push(format!("   · The EDA script reported: {err}"));
            } else {
                parts.push("1) Exploratory data analysis (R):".to_string());
                if let Some(summary) = eda.get("eda") {
                    if let (Some(rows), Some(cols)) = (summary.get("n_rows"), summary.get("n_cols")) {
                        parts.push(format!("   · The dataset has about {rows} rows and {cols} columns."));
                    }
                    if let Some(missing) = summary.get("missing_perc").and_then(Value::as_object) {
                        let mut items: Vec<(String, f64)> = missing
                            .iter()
                            .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
                            .collect();
                        items.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
                        if !items.is_empty() {
                            let descr: Vec<String> = items.iter().take(3).map(|(n, v)| format!("{n} (~{v:.1}% NA)")).collect();
                            parts.push(format!("   · A few columns have notable missing values: {}.", descr.join(", ")));
                        }
                    }
                    if detail_level == "high" && summary.get("numeric_corr_head").is_some() {
                        parts.push("   · I also computed a partial correlation matrix for the numeric variables.".to_string());
                    }
                }
            }
            parts.push(String::new());
        }

        if let Some(model) = &modeling {
            let model_type = model.get("model_type").and_then(Value::as_str).unwrap_or("unknown");
            parts.push("2) Predictive modeling:".to_string());
            let mut line = format!("   · I trained a {model_type} model");
            if let Some(n_obs) = model.get("n_obs") {
                line.push_str(&format!(" on about {n_obs} observations"));
            }
            line.push('.');
            parts.push(line);

            for (label, key) in [("Accuracy", "accuracy"), ("RMSE", "rmse"), ("MAE", "mae"), ("R²", "r2")] {
                if let Some(v) = model.get(key).and_then(Value::as_f64) {
                    parts.push(format!("   · {label} on the test set: {v:.3}."));
                }
            }
            parts.push(String::new());
        }

        if let Some(churn) = &r_churn {
            if churn.get("ok").and_then(Value::as_bool) == Some(false) {
                let err = churn.get("error").and_then(Value::as_str).unwrap_or("unknown error");
                parts.push("3) Churn demo (R) — failed:".to_string());
                parts.push(format!("   · The churn script reported: {err}"));
            } else {
                parts.push("3) Churn demo (logistic regression in R):".to_string());
                if let (Some(n), Some(rate)) = (churn.get("n"), churn.get("churn_rate").and_then(Value::as_f64)) {
                    parts.push(format!("   · I simulated a synthetic dataset of about {n} customers."));
                    parts.push(format!("   · Simulated churn rate in the sample: ~{:.1}%.", rate * 100.0));
                }
                if detail_level != "low" {
                    if let Some(coefs) = churn.get("coefficients").and_then(Value::as_array) {
                        if !coefs.is_empty() {
                            parts.push("   · Main coefficients of the logit model:".to_string());
                            for c in coefs.iter().take(5) {
                                if let (Some(term), Some(est)) = (c.get("term").and_then(Value::as_str), c.get("estimate").and_then(Value::as_f64)) {
                                    parts.push(format!("      - {term}: estimate={est:.3}"));
                                }
                            }
                        }
                    }
                }
            }
            parts.push(String::new());
        }

        if let Some(schema) = &db_schema {
            if !schema.trim().is_empty() {
                parts.push("4) Database schema design (DDL SQL):".to_string());
                if detail_level == "low" {
                    parts.push("   · I generated a SQL schema matching the data and analysis flow.".to_string());
                } else {
                    parts.push("   · I produced a SQL schema (DDL) usable for persisting and orchestrating the analysis.".to_string());
                }
                if detail_level == "high" {
                    parts.push(String::new());
                    parts.push("DDL excerpt:".to_string());
                    parts.push(schema.clone());
                }
                parts.push(String::new());
            }
        }

        let has_prior_results = r_eda.is_some() || modeling.is_some() || r_churn.is_some();
        if let Some(plan) = &analysis_plan {
            if !plan.is_empty() {
                if has_prior_results {
                    parts.push("Finally, here's the general workflow I laid out for the next steps:".to_string());
                } else {
                    parts.push("Here's the general workflow I'd suggest for this analysis:".to_string());
                }
                for step in plan {
                    if let Some(s) = step.as_str() {
                        parts.push(format!("   · {s}"));
                    }
                }
                parts.push(String::new());
            }
        }

        parts.push(format!(
            "(Internal state while I worked on this: curiosity={:.2}, confidence={:.2}, fatigue={:.2}, frustration={:.2})",
            emotional_state.curiosity, emotional_state.confidence, emotional_state.fatigue, emotional_state.frustration
        ));

        let has_anything = has_prior_results
            || db_schema.as_ref().map(|s| !s.trim().is_empty()).unwrap_or(false)
            || analysis_plan.as_ref().map(|p| !p.is_empty()).unwrap_or(false);

        let text = if has_anything {
            parts.join("\n")
        } else {
            "I've processed your request, but I don't have structured results from previous steps yet. \
             We can dig in together if you give me a bit more context."
                .to_string()
        };

        Ok(AgentResult::success(
            serde_json::json!({
                "user_visible_message": text,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.05, curiosity: 0.02, ..Default::default() },
        ))
    }
}
