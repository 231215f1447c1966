use mnemos_types::{
    EmotionalState, GovernanceConfig, MemoryKeys, MemoryScope, MemoryType, Plan, PlanSource, Task,
};
use serde_json::{json, Value};

use crate::agent::{Agent, AgentContext, AgentRegistry};
use crate::json_extract::extract_json_object;
use crate::llm::{LlmMessage, LlmOptions, LlmProvider};
use crate::persistence::MemoryEngine;

/// Explicit-override trigger phrases, checked before any model-assisted or
/// heuristic planning. First match wins.
const EXPLICIT_OVERRIDES: &[(&[&str], &str)] = &[
    (
        &["profilo utente", "profilo interno", "aggiorna il mio profilo"],
        "user_profile_agent",
    ),
    (
        &[
            "impara le mie preferenze",
            "impara le preferenze",
            "aggiorna le mie preferenze",
        ],
        "preference_learner_agent",
    ),
    (
        &[
            "fammi domande personali",
            "fammi 1 o 2 domande personali",
            "fammi qualche domanda su di me",
        ],
        "curiosity_question_agent",
    ),
];

const GOVERNANCE_KEYWORDS: &[&str] = &[
    "nuovo agent",
    "refactor",
    "migliora l'agent",
    "governance",
    "auto-miglioramento",
];

const GOVERNANCE_PIPELINE: &[&str] = &[
    "architect_agent",
    "security_review_agent",
    "validator_agent",
    "critic_agent",
    "curator_agent",
    "codegen_agent",
];

fn lower_contains(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|n| lower.contains(n))
}

fn explicit_override(text: &str) -> Option<&'static str> {
    EXPLICIT_OVERRIDES
        .iter()
        .find(|(phrases, _)| lower_contains(text, phrases))
        .map(|(_, agent)| *agent)
}

fn single_task_plan(agent_name: &str, description: &str, input: Value, source: PlanSource) -> Plan {
    let mut plan = Plan::new();
    plan.metadata.source = Some(source);
    plan.add_task(Task::new(agent_name, description, input));
    plan
}

/// Detect whether this turn should run the fixed governance pipeline
/// instead of normal planning (SPEC_FULL.md §4.4). Returns
/// `(reason, targets)` when triggered.
async fn detect_governance_mode(
    memory: &MemoryEngine,
    config: &GovernanceConfig,
    user_text: &str,
    emotional_state: &EmotionalState,
) -> (bool, Option<String>, Vec<String>) {
    if lower_contains(user_text, GOVERNANCE_KEYWORDS) {
        return (true, Some("governance keyword in user message".to_string()), Vec::new());
    }

    let metrics = memory
        .get_agent_metrics_from_diagnostics()
        .await
        .unwrap_or_default();

    let mut metric_targets: Vec<String> = metrics
        .iter()
        .filter(|(_, m)| m.total_runs >= 5 && m.failure_rate >= config.failure_rate_trigger)
        .map(|(name, _)| name.clone())
        .collect();
    metric_targets.sort();

    if !metric_targets.is_empty() && emotional_state.frustration >= config.frustration_trigger {
        let security_targets = memory
            .find_items_by_key(MemoryKeys::SECURITY_ALERT, Some(MemoryScope::Global), Some(MemoryType::Procedural), 20)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                serde_json::from_str::<Value>(&item.content)
                    .ok()
                    .and_then(|v| v.get("agent").and_then(|a| a.as_str()).map(|s| s.to_string()))
            });

        let mut targets: Vec<String> = metric_targets.clone();
        for t in security_targets {
            if !targets.contains(&t) {
                targets.push(t);
            }
        }

        return (
            true,
            Some(format!(
                "{} agent(s) with failure_rate >= {} and frustration >= {}",
                metric_targets.len(),
                config.failure_rate_trigger,
                config.frustration_trigger
            )),
            targets,
        );
    }

    (false, None, Vec::new())
}

fn build_governance_plan(reason: String, targets: Vec<String>, max_steps: u32) -> Plan {
    let mut plan = Plan::new();
    plan.metadata.source = Some(PlanSource::Heuristic);
    plan.metadata.governance_mode = true;
    plan.metadata.governance_reason = Some(reason);
    plan.metadata.governance_targets = targets.clone();

    for agent_name in GOVERNANCE_PIPELINE.iter().take(max_steps as usize) {
        plan.add_task(Task::new(
            *agent_name,
            format!("governance step: {agent_name}"),
            json!({ "governance_targets": targets }),
        ));
    }
    plan
}

async fn intake_gate_needed(memory: &MemoryEngine, conversation_key: &str) -> bool {
    memory
        .load_item_content(
            MemoryKeys::requirements_sheet(conversation_key),
            None,
            Some(MemoryType::Procedural),
        )
        .await
        .unwrap_or(None)
        .is_none()
}

/// Ask the configured `meta_router_agent`, if registered, to produce a
/// `meta_plan`. Falls back to `None` (letting the caller continue down the
/// priority chain) on any missing agent, error, or empty/unparseable
/// response — exactly mirroring the original's try/except fallback.
async fn try_meta_router_plan(
    registry: &AgentRegistry,
    memory: &MemoryEngine,
    llm: &dyn LlmProvider,
    context: &AgentContext<'_>,
    state: &EmotionalState,
) -> Option<Plan> {
    let agent = registry.get("meta_router_agent").ok()?;
    let result = agent
        .run(json!({}), context, memory, llm, state)
        .await;

    let steps = result.output_payload.get("meta_plan")?.as_array()?.clone();
    if steps.is_empty() {
        return None;
    }

    let mut plan = Plan::new();
    plan.metadata.source = Some(PlanSource::MetaRouter);
    plan.metadata.governance_mode = result
        .output_payload
        .get("governance_mode")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    plan.metadata.notes = result
        .output_payload
        .get("notes")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    for step in steps {
        let agent_name = step.get("agent")?.as_str()?.to_string();
        let description = step
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("meta-planned step")
            .to_string();
        let input = step.get("input").cloned().unwrap_or(json!({}));
        let mut task = Task::new(agent_name, description, input);
        if let Some(max_retries) = step.get("max_retries").and_then(|v| v.as_u64()) {
            task.max_retries = max_retries as u32;
        }
        plan.add_task(task);
    }
    Some(plan)
}

/// Ask the configured LLM provider directly for a JSON plan. Falls back to
/// `None` on parse failure or an empty plan list.
async fn try_llm_plan(llm: &dyn LlmProvider, registry: &AgentRegistry, user_text: &str) -> Option<Plan> {
    let agents_list = registry.list_agents().join(", ");
    let system_prompt = format!(
        "You are a planning assistant. Available agents: {agents_list}. \
         Respond with a strict JSON object: {{\"plan\": [{{\"agent\": str, \"description\": str, \"input\": object}}], \"notes\": str, \"governance_mode\": bool}}."
    );
    let messages = [LlmMessage {
        role: "user".to_string(),
        content: user_text.to_string(),
    }];
    let reply = llm
        .generate(&system_prompt, &messages, &LlmOptions::default())
        .await
        .ok()?;

    let parsed = extract_json_object(&reply)?;
    let steps = parsed.get("plan")?.as_array()?.clone();
    if steps.is_empty() {
        return None;
    }

    let mut plan = Plan::new();
    plan.metadata.source = Some(PlanSource::Llm);
    for step in steps {
        let agent_name = step.get("agent")?.as_str()?.to_string();
        let description = step
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("llm-planned step")
            .to_string();
        let input = step.get("input").cloned().unwrap_or(json!({}));
        plan.add_task(Task::new(agent_name, description, input));
    }
    Some(plan)
}

/// The ordered keyword-trigger table (SPEC_FULL.md §4.4). First match wins;
/// default is a bare `chat_agent` turn.
fn build_heuristic_plan(user_text: &str) -> Plan {
    let mut plan = Plan::new();
    plan.metadata.source = Some(PlanSource::Heuristic);
    plan.metadata.router_mode = Some("heuristic".to_string());

    let text = user_text.to_lowercase();

    if lower_contains(&text, &["database", "schema", "tabella"]) {
        plan.add_task(Task::new("database_designer_agent", "design schema", json!({ "request": user_text })));
        plan.add_task(Task::new("explanation_agent", "explain schema", json!({})));
    } else if lower_contains(&text, &["churn", "modello", "predict", "prevedere", "classificazione"]) {
        plan.add_task(Task::new("r_analysis_agent", "churn demo analysis", json!({ "dataset": "churn_demo" })));
        plan.add_task(Task::new("explanation_agent", "explain analysis", json!({})));
    } else if lower_contains(&text, &["stato del pc", "hardware", "cpu", "ram", "temperatura", "gpu"]) {
        plan.add_task(Task::new("hardware_agent", "report hardware status", json!({})));
    } else if lower_contains(&text, &["memoria"]) && lower_contains(&text, &["riassumi", "archivia", "compatta"]) {
        plan.add_task(Task::new("archivist_agent", "archive memory", json!({ "scope": "user" })));
    } else if lower_contains(&text, &["come stai", "stato interno", "stato emotivo"]) {
        plan.add_task(Task::new("state_explainer_agent", "explain emotional state", json!({})));
    } else if ["ricordati", "ricorda", "memorizza", "annota", "salva in memoria"]
        .iter()
        .any(|t| text.contains(*t))
    {
        let note = strip_trigger_prefix(user_text);
        plan.add_task(Task::new(
            "memory_agent",
            "memorize note",
            json!({ "scope": "user", "content": note }),
        ));
    } else if lower_contains(&text, &["contesto progetto", "riassumi il progetto"]) {
        plan.add_task(Task::new("project_context_agent", "summarize project context", json!({})));
    } else if lower_contains(&text, &["eda", "analisi esplorativa"]) {
        plan.add_task(Task::new("r_eda_agent", "exploratory data analysis", json!({})));
        plan.add_task(Task::new("explanation_agent", "explain eda", json!({})));
    } else if lower_contains(&text, &["nuovo agente", "nuovi agent"]) {
        plan.add_task(Task::new("architect_agent", "design new agent", json!({ "request": user_text })));
        plan.add_task(Task::new("validator_agent", "validate new agent", json!({})));
        plan.add_task(Task::new("security_review_agent", "security scan new agent", json!({})));
        plan.add_task(Task::new("critic_agent", "critique new agent", json!({})));
    } else if lower_contains(
        &text,
        &["mi chiamo", "sono nato", "mi piace", "odio", "adoro", "mia figlia", "mio figlio"],
    ) {
        plan.add_task(Task::new("preference_learner_agent", "learn preference", json!({ "text": user_text })));
        plan.add_task(Task::new("curiosity_question_agent", "ask personal question", json!({})));
    } else {
        plan.add_task(Task::new("chat_agent", "general conversation", json!({ "text": user_text })));
    }

    plan.metadata.governance_mode = false;
    plan
}

/// Full trigger phrases to strip, longest/most-specific first, matching
/// `original_source/core/router.py:545-558`'s `prefixes` list.
const MEMORIZE_PREFIXES: &[&str] = &[
    "ricordati che",
    "ricorda che",
    "salva in memoria",
    "memorizza che",
    "memorizza",
    "annota",
    "segna che",
    "segna",
    "prendi nota",
];

fn strip_trigger_prefix(text: &str) -> String {
    let lower = text.to_lowercase();
    for prefix in MEMORIZE_PREFIXES {
        if let Some(idx) = lower.find(prefix) {
            let note = text[idx + prefix.len()..].trim_matches(|c: char| c == ' ' || c == ':' || c == '.' || c == '-').to_string();
            return if note.is_empty() { text.to_string() } else { note };
        }
    }
    text.to_string()
}

/// Build a fresh `Plan` for one turn, in priority order: explicit override
/// -> governance-mode detection -> intake gate -> meta-router delegation ->
/// LLM-assisted plan -> heuristic fallback.
#[allow(clippy::too_many_arguments)]
pub async fn build_plan(
    registry: &AgentRegistry,
    memory: &MemoryEngine,
    llm: &dyn LlmProvider,
    governance_config: &GovernanceConfig,
    context: &AgentContext<'_>,
    user_text: &str,
    emotional_state: &EmotionalState,
) -> Plan {
    if let Some(agent_name) = explicit_override(user_text) {
        return single_task_plan(
            agent_name,
            "explicit social-command override",
            json!({ "text": user_text }),
            PlanSource::Heuristic,
        );
    }

    let (triggered, reason, targets) =
        detect_governance_mode(memory, governance_config, user_text, emotional_state).await;
    if triggered {
        return build_governance_plan(
            reason.unwrap_or_default(),
            targets,
            governance_config.max_governance_steps,
        );
    }

    let conversation_key = context
        .project_id
        .clone()
        .unwrap_or_else(|| context.conversation_id.to_string());
    if intake_gate_needed(memory, &conversation_key).await {
        return single_task_plan(
            "requirements_agent",
            "capture structured requirements",
            json!({ "text": user_text }),
            PlanSource::Heuristic,
        );
    }

    if let Some(plan) = try_meta_router_plan(registry, memory, llm, context, emotional_state).await {
        return plan;
    }

    if let Some(plan) = try_llm_plan(llm, registry, user_text).await {
        return plan;
    }

    build_heuristic_plan(user_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_defaults_to_chat_agent() {
        let plan = build_heuristic_plan("ciao, come va?");
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].agent_name, "chat_agent");
    }

    #[test]
    fn heuristic_matches_memorize_trigger_and_strips_prefix() {
        let plan = build_heuristic_plan("ricordati che preferisco Ubuntu per lo sviluppo");
        assert_eq!(plan.tasks.len(), 1);
        assert_eq!(plan.tasks[0].agent_name, "memory_agent");
        let content = plan.tasks[0].input_payload.get("content").unwrap().as_str().unwrap();
        assert_eq!(content, "preferisco Ubuntu per lo sviluppo");
    }

    #[test]
    fn heuristic_matches_eda_trigger() {
        let plan = build_heuristic_plan("fammi un'eda sul dataset");
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(plan.tasks[0].agent_name, "r_eda_agent");
        assert_eq!(plan.tasks[1].agent_name, "explanation_agent");
    }

    #[test]
    fn explicit_override_short_circuits_heuristics() {
        assert_eq!(
            explicit_override("fammi qualche domanda su di me"),
            Some("curiosity_question_agent")
        );
    }
}
