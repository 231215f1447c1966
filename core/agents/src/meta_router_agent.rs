//! LLM-assisted planner consulted by `mnemos_engine::planner::build_plan`
//! ahead of its own heuristic fallback. Grounded on
//! `original_source/agents/meta_router_agent.py`.
//!
//! The original enumerates a live `ACTIVE_REGISTRY` to describe available
//! agents to the LLM and also performs its own governance-intent detection.
//! `Agent::run_impl` here has no registry handle, and governance detection
//! already runs inside `planner::build_plan` before this agent is ever
//! consulted (see `planner.rs::detect_governance_mode`), so this port
//! drops both: it always reports `governance_mode: false` and focuses on
//! producing a normal `meta_plan` from a static catalogue of known agents,
//! recent diagnostics, and the conversation so far.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState};

pub struct MetaRouterAgent;

const KNOWN_AGENTS: &[(&str, &str)] = &[
    ("chat_agent", "General open-ended conversation."),
    ("memory_agent", "Stores or retrieves a note in long-term memory."),
    ("requirements_agent", "Clarifies and structures a user's requirements."),
    ("database_designer_agent", "Designs and creates a SQLite schema from a request."),
    ("explanation_agent", "Explains prior analytical/structural results in plain language."),
    ("hardware_agent", "Reports a snapshot of host hardware status."),
    ("archivist_agent", "Summarizes and compacts a memory scope."),
    ("state_explainer_agent", "Describes the system's current emotional state."),
    ("project_context_agent", "Builds or updates a project context summary."),
    ("user_profile_agent", "Updates the full structured user profile."),
    ("preference_learner_agent", "Learns user preferences/hobbies/topics."),
    ("curiosity_question_agent", "Asks the user a respectful personal question."),
    ("self_knowledge_agent", "Summarizes what the system knows about the user."),
    ("codebase_agent", "Indexes/searches the codebase or drafts a refactor plan."),
    ("analysis_planner_agent", "Proposes a high-level analytical plan."),
    ("r_eda_agent", "Runs exploratory data analysis."),
    ("r_modeling_agent", "Fits an analytical/predictive model."),
    ("r_report_agent", "Builds a narrative report from prior analysis results."),
    ("r_analysis_agent", "Runs a bundled analysis demo (e.g. churn)."),
];

fn fallback_plan(user_text: &str) -> (Vec<Value>, String) {
    let text = user_text.to_lowercase();
    let notes = "Heuristic fallback plan (no usable LLM response).".to_string();

    let step = |agent: &str, description: &str, input: Value| json!({ "agent": agent, "description": description, "input": input });

    if text.contains("database") || text.contains("schema") || text.contains("tabella") {
        return (
            vec![
                step("database_designer_agent", "Design the database schema from the request.", json!({ "request": user_text })),
                step("explanation_agent", "Explain the proposed schema in plain language.", json!({})),
            ],
            notes,
        );
    }
    if ["churn", "modello", "predict", "prevedere", "classificazione"].iter().any(|kw| text.contains(kw)) {
        return (
            vec![
                step("r_analysis_agent", "Run a churn/analysis demo.", json!({ "analysis_type": "churn_demo" })),
                step("explanation_agent", "Explain the analysis results in plain language.", json!({})),
            ],
            notes,
        );
    }
    if text.contains("eda") || text.contains("esplorativa") {
        return (
            vec![
                step("r_eda_agent", "Run exploratory data analysis.", json!({})),
                step("explanation_agent", "Summarize and explain the EDA results.", json!({})),
            ],
            notes,
        );
    }
    if ["mi chiamo", "sono nato", "mi piace", "non mi piace"].iter().any(|kw| text.contains(kw)) {
        return (
            vec![
                step("preference_learner_agent", "Learn personal preferences from the user's text.", json!({ "user_message": user_text })),
                step("curiosity_question_agent", "Ask one or two personal questions.", json!({})),
            ],
            notes,
        );
    }

    (
        vec![
            step("requirements_agent", "Clarify the user's requirements and goal.", json!({ "user_message": user_text })),
            step("analysis_planner_agent", "Propose a high-level analytical plan.", json!({})),
            step("explanation_agent", "Return a coherent explanation of the plan and next steps.", json!({})),
        ],
        notes,
    )
}

const SYSTEM_PROMPT: &str = "You are the meta-router/planner for a multi-agent system.\n\
You receive:\n\
- a list of available agents (name, description, internal metrics),\n\
- the last user request,\n\
- a current emotional state,\n\
- a short snippet of recent conversation.\n\n\
Build an operational PLAN as a list of steps, where each step specifies which agent to call, \
with what input, any dependencies, and how many retries make sense.\n\n\
Guidance:\n\
- Prefer agents with low failure_rate and enough total_runs.\n\
- Avoid agents with very high failure_rate (> 0.5) if alternatives exist.\n\
- If an agent is much slower than average, use it only if truly necessary.\n\
- Respect max_steps as the maximum number of steps in the plan.\n\n\
Respond with ONLY valid JSON of this minimal shape:\n\
{\n  \"plan\": [\n    {\n      \"agent\": \"agent_name\",\n      \"description\": \"short sub-task description\",\n      \
\"input\": {},\n      \"depends_on\": [],\n      \"max_retries\": 0\n    }\n  ],\n  \"notes\": \"optional short explanation\"\n}\n\
Do not add text outside the JSON.";

#[async_trait]
impl Agent for MetaRouterAgent {
    fn name(&self) -> &str {
        "meta_router_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let max_steps = input_payload.get("max_steps").and_then(Value::as_u64).unwrap_or(8).clamp(1, 20) as usize;
        let force_target_agent = input_payload.get("force_target_agent").and_then(Value::as_str);

        let metrics = memory.get_agent_metrics_from_diagnostics().await.unwrap_or_default();
        let agents_meta: Vec<Value> = KNOWN_AGENTS
            .iter()
            .map(|(name, desc)| {
                let mut meta = json!({ "name": name, "description": desc });
                if let Some(m) = metrics.get(*name) {
                    meta["metrics"] = json!({
                        "total_runs": m.total_runs,
                        "failures": m.failures,
                        "failure_rate": m.failure_rate,
                        "avg_duration_ms": m.avg_duration_ms,
                    });
                    meta["reliability_score"] = json!((1.0 - m.failure_rate).max(0.0));
                }
                meta
            })
            .collect();

        let user_last = context.last_user_message().unwrap_or("").to_string();
        let recent_messages = memory.get_recent_messages(context.conversation_id, 10).await?;
        let mem_snippet: Vec<String> = recent_messages.iter().map(|m| format!("[{:?}] {}", m.role, m.content)).collect();

        let planner_input = json!({
            "available_agents": agents_meta,
            "user_request": user_last,
            "emotional_state": {
                "curiosity": emotional_state.curiosity,
                "confidence": emotional_state.confidence,
                "fatigue": emotional_state.fatigue,
                "frustration": emotional_state.frustration,
                "mood": emotional_state.mood,
                "energy": emotional_state.energy,
                "playfulness": emotional_state.playfulness,
                "social_need": emotional_state.social_need,
                "learning_drive": emotional_state.learning_drive,
            },
            "memory_snippet": mem_snippet.join("\n"),
            "max_steps": max_steps,
            "force_target_agent": force_target_agent,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&planner_input).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(1024), ..Default::default() };

        let parsed = match llm.generate(SYSTEM_PROMPT, &messages, &options).await {
            Ok(raw) => extract_json_object(&raw),
            Err(_) => None,
        };

        let mut plan_list = parsed.as_ref().and_then(|p| p.get("plan")).and_then(Value::as_array).cloned().unwrap_or_default();
        let mut notes = parsed.as_ref().and_then(|p| p.get("notes")).and_then(Value::as_str).unwrap_or("").to_string();

        if plan_list.is_empty() {
            let (fallback, fallback_notes) = fallback_plan(&user_last);
            plan_list = fallback;
            notes = fallback_notes;
        }

        plan_list.truncate(max_steps);

        let enriched_plan: Vec<Value> = plan_list
            .iter()
            .filter_map(|step| {
                let agent_name = step.get("agent").and_then(Value::as_str)?;
                Some(json!({
                    "agent": agent_name,
                    "description": step.get("description").and_then(Value::as_str).unwrap_or("meta-planned step"),
                    "input": step.get("input").cloned().unwrap_or_else(|| json!({})),
                    "depends_on": step.get("depends_on").cloned().unwrap_or_else(|| json!([])),
                    "max_retries": step.get("max_retries").and_then(Value::as_u64).unwrap_or(0),
                }))
            })
            .collect();

        let user_msg = if enriched_plan.is_empty() {
            "MetaRouterAgent couldn't build an operational plan for your request. We can try again \
             with a clearer description of what you want."
                .to_string()
        } else {
            let bullets: Vec<String> = enriched_plan
                .iter()
                .map(|s| format!("- {}: {}", s["agent"].as_str().unwrap_or(""), s["description"].as_str().unwrap_or("")))
                .collect();
            if notes.is_empty() {
                format!("I've built a multi-agent work plan. In summary I'll run:\n\n{}", bullets.join("\n"))
            } else {
                format!("I've built a multi-agent work plan. In summary I'll run:\n\n{}\n\nInternal notes: {notes}", bullets.join("\n"))
            }
        };

        Ok(AgentResult::success(
            json!({
                "user_visible_message": user_msg,
                "meta_plan": enriched_plan,
                "notes": notes,
                "governance_mode": false,
                "governance_reason": "",
                "governance_targets": Value::Array(vec![]),
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.04, curiosity: 0.03, ..Default::default() },
        ))
    }
}
