//! Drafts a generic data-analysis plan (classification / regression /
//! time-series / exploratory), informed by the requirements sheet saved by
//! `requirements_agent` when available. Grounded on
//! `original_source/agents/analysis_planner_agent.py`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct AnalysisPlannerAgent;

const ANALYSIS_PLAN_KEY: &str = "analysis_plan_text";

async fn load_requirements_sheet(context: &AgentContext<'_>, memory: &MemoryEngine) -> Option<Value> {
    let conv_key = MemoryKeys::requirements_sheet(&context.conversation_id.to_string());
    if let Ok(Some(raw)) = memory.load_item_content(conv_key, Some(MemoryScope::Conversation), Some(MemoryType::Procedural)).await {
        if let Ok(v) = serde_json::from_str::<Value>(&raw) {
            return Some(v);
        }
    }

    if let Some(project_id) = &context.project_id {
        let proj_key = MemoryKeys::requirements_sheet(project_id);
        if let Ok(Some(raw)) = memory.load_item_content(proj_key, Some(MemoryScope::Project), Some(MemoryType::Procedural)).await {
            if let Ok(v) = serde_json::from_str::<Value>(&raw) {
                return Some(v);
            }
        }
    }

    None
}

fn classification_steps(goal_txt: &str, tgt_txt: &str) -> Vec<String> {
    vec![
        format!("1. Initial dataset exploration{goal_txt}: size, data quality, feature and target distributions."),
        format!("2. Clear definition of the target variable and time window{tgt_txt}."),
        "3. Feature engineering specific to the domain (e.g. recency/frequency/monetary, behavioral variables, channels).".to_string(),
        "4. Train/test split (holdout or temporal cohort), mindful of class balance and leakage.".to_string(),
        "5. Training one or more classification models (logistic regression, random forest, gradient boosting, etc.).".to_string(),
        "6. Evaluation with AUC, precision/recall, confusion matrix, lift/gain curves.".to_string(),
        "7. Interpretability analysis (feature importance, partial dependence, SHAP) and operational recommendations.".to_string(),
    ]
}

fn regression_steps(goal_txt: &str, tgt_txt: &str) -> Vec<String> {
    vec![
        format!("1. Initial dataset exploration{goal_txt}: size, missing-value rate, distributions of the main variables."),
        format!("2. Clear definition of the continuous target variable{tgt_txt} and candidate features."),
        "3. Data cleaning and feature engineering (scaling, transforms, interactions, outlier handling).".to_string(),
        "4. Train/test split or cross-validation, depending on dataset size and time constraints.".to_string(),
        "5. Training regression models (linear, elastic net, tree/gradient-boosting models).".to_string(),
        "6. Evaluation with RMSE, MAE, R², and model comparison.".to_string(),
        "7. Interpretability analysis (coefficients, feature importance, partial dependence) and a business-friendly summary.".to_string(),
    ]
}

fn time_series_steps(goal_txt: &str) -> Vec<String> {
    vec![
        format!("1. Preliminary time-series analysis{goal_txt}: trend, seasonality, outliers, and regime changes."),
        "2. Defining the forecast horizon and granularity (daily, weekly, monthly, etc.).".to_string(),
        "3. Building lag variables, rolling statistics, calendar indicators, and any external covariates.".to_string(),
        "4. Temporal train/validation/test split, respecting chronological order.".to_string(),
        "5. Training ARIMA/ETS/Prophet-style models or ML models with temporal features.".to_string(),
        "6. Evaluation over time windows with MAPE, sMAPE, RMSE, and comparison across approaches.".to_string(),
        "7. Residual analysis, model diagnostics, and a periodic refresh strategy.".to_string(),
    ]
}

fn exploratory_steps(goal_txt: &str) -> Vec<String> {
    vec![
        format!("1. Understanding the context and exploratory goals{goal_txt} (what questions we actually want to ask the data)."),
        "2. Structural analysis of the dataset: size, variable types, percentage of missing values.".to_string(),
        "3. Univariate and bivariate exploration of key variables (distributions, boxplots, correlations).".to_string(),
        "4. Identifying patterns, interesting segments, and possible anomalies.".to_string(),
        "5. If useful, applying dimensionality-reduction or exploratory clustering techniques.".to_string(),
        "6. Visual synthesis (charts, tables) and hypotheses/ideas for any follow-up modeling.".to_string(),
    ]
}

#[async_trait]
impl Agent for AnalysisPlannerAgent {
    fn name(&self) -> &str {
        "analysis_planner_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let req_sheet = load_requirements_sheet(context, memory).await;

        let mut source = "input_payload";
        let mut problem_type = input_payload.get("problem_type").and_then(Value::as_str).map(|s| s.to_lowercase());
        if problem_type.is_none() {
            if let Some(sheet) = &req_sheet {
                if let Some(pt) = sheet.get("problem_type").and_then(Value::as_str) {
                    let pt = pt.to_lowercase();
                    if !pt.is_empty() {
                        problem_type = Some(pt);
                        source = "requirements_sheet";
                    }
                }
            }
        }

        let problem_type = match problem_type.as_deref() {
            Some("classification") | Some("regression") | Some("time-series") => problem_type.unwrap(),
            Some("clustering") | Some("exploratory") | Some("other") => "exploratory".to_string(),
            _ => "classification".to_string(),
        };

        let primary_goal = req_sheet.as_ref().and_then(|s| s.get("primary_goal").cloned()).unwrap_or(Value::Null);
        let target_variable = req_sheet.as_ref().and_then(|s| s.get("target_variable").cloned()).unwrap_or(Value::Null);
        let domain = req_sheet.as_ref().and_then(|s| s.get("domain").cloned()).unwrap_or(Value::Null);
        let constraints = req_sheet.as_ref().and_then(|s| s.get("constraints").cloned()).unwrap_or_else(|| json!({}));
        let evaluation = req_sheet.as_ref().and_then(|s| s.get("evaluation").cloned()).unwrap_or_else(|| json!({}));

        let data_type = input_payload.get("data_type").and_then(Value::as_str).unwrap_or("tabular").to_string();

        let goal_txt = primary_goal.as_str().map(|g| format!(" (goal: {g})")).unwrap_or_default();
        let tgt_txt = target_variable.as_str().map(|t| format!(" (target: {t})")).unwrap_or_default();

        let steps = match problem_type.as_str() {
            "regression" => regression_steps(&goal_txt, &tgt_txt),
            "time-series" => time_series_steps(&goal_txt),
            "exploratory" => exploratory_steps(&goal_txt),
            _ => classification_steps(&goal_txt, &tgt_txt),
        };

        let mut recommended_agents = vec!["r_eda_agent".to_string()];
        if matches!(problem_type.as_str(), "classification" | "regression") {
            recommended_agents.push("r_analysis_agent".to_string());
        }
        recommended_agents.push("explanation_agent".to_string());

        let plan_struct = json!({
            "schema_version": 1,
            "source": source,
            "problem_type": problem_type,
            "primary_goal": primary_goal,
            "target_variable": target_variable,
            "domain": domain,
            "constraints": constraints,
            "evaluation": evaluation,
            "data_type": data_type,
            "analysis_steps": steps,
            "steps": steps,
            "recommended_agents": recommended_agents,
        });

        let stored_content = json!({ "analysis_plan": steps });
        let _ = memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                ANALYSIS_PLAN_KEY,
                serde_json::to_string(&stored_content).unwrap_or_default(),
                json!({ "agent": "analysis_planner_agent" }),
            )
            .await;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": "",
                "analysis_plan": steps,
                "problem_type": problem_type,
                "requirements_used": req_sheet.is_some(),
                "analysis_plan_structured": plan_struct,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.05, ..Default::default() },
        ))
    }
}
