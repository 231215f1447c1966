use std::time::Instant;

use mnemos_platform::{correlation_span, record_counter, record_histogram};
use mnemos_types::{
    AgentRun, AgentRunStatus, EventType, GovernanceConfig, MessageRole, OrchestratorConfig,
};
use serde_json::json;
use tracing::Instrument;

use crate::agent::{AgentContext, AgentRegistry};
use crate::emotion;
use crate::llm::LlmProvider;
use crate::persistence::MemoryEngine;
use crate::planner;
use crate::ConversationContext;

/// The collaborators the orchestrator needs for one turn: memory, LLM
/// provider, agent registry and their two configuration blocks. Bundled so
/// `handle_user_message` doesn't grow an unwieldy parameter list.
pub struct OrchestratorDeps<'a> {
    pub memory: &'a MemoryEngine,
    pub llm: &'a dyn LlmProvider,
    pub registry: &'a AgentRegistry,
    pub orchestrator_config: &'a OrchestratorConfig,
    pub governance_config: &'a GovernanceConfig,
}

/// Micro-kernel turn driver (SPEC_FULL.md §4.5). Holds no state of its
/// own beyond its collaborators; all mutable state lives on the
/// caller-owned `ConversationContext`.
pub struct Orchestrator;

const FALLBACK_NO_PLAN: &str =
    "I wasn't able to build an action plan for this request. Could we try rephrasing it?";
const FALLBACK_NO_VISIBLE_OUTPUT: &str =
    "Your request was processed, but no agent produced a visible message. (Possible internal error, check the logs.)";

impl Orchestrator {
    pub async fn handle_user_message(
        context: &mut ConversationContext,
        deps: &OrchestratorDeps<'_>,
        text: &str,
    ) -> String {
        let correlation_id = context.correlation_id;
        let span = correlation_span(correlation_id, "handle_user_message");

        async move {
            emotion::apply_decay_between_turns(&mut context.emotional_state);

            let user_message = context.add_message(MessageRole::User, text).clone();
            if let Err(err) = deps.memory.log_message(context.id, &user_message).await {
                tracing::warn!(error = %err, "failed to persist user message");
            }

            let _ = deps
                .memory
                .log_event(
                    EventType::RequestReceived,
                    correlation_id,
                    json!({ "conversation_id": context.id, "user_message": text }),
                )
                .await;
            record_counter("orchestrator_requests_total", 1);

            let agent_context = AgentContext {
                conversation_id: context.id,
                correlation_id,
                user_id: context.user_id.clone(),
                project_id: context.project_id.clone(),
                recent_messages: &context.messages,
            };

            let plan = planner::build_plan(
                deps.registry,
                deps.memory,
                deps.llm,
                deps.governance_config,
                &agent_context,
                text,
                &context.emotional_state,
            )
            .await;

            if plan.tasks.is_empty() {
                let _ = deps
                    .memory
                    .log_event(
                        EventType::PlanCreated,
                        correlation_id,
                        json!({
                            "conversation_id": context.id,
                            "plan_id": Option::<String>::None,
                            "num_tasks": 0,
                            "warning": "planner returned an empty plan",
                        }),
                    )
                    .await;

                context.add_message(MessageRole::Assistant, FALLBACK_NO_PLAN);
                let assistant_message = context.messages.last().expect("just pushed").clone();
                let _ = deps.memory.log_message(context.id, &assistant_message).await;
                return FALLBACK_NO_PLAN.to_string();
            }

            let _ = deps
                .memory
                .log_event(
                    EventType::PlanCreated,
                    correlation_id,
                    json!({
                        "conversation_id": context.id,
                        "plan_id": plan.id,
                        "num_tasks": plan.tasks.len(),
                        "plan_metadata": &plan.metadata,
                        "tasks": plan.tasks.iter().map(|t| json!({
                            "id": t.id,
                            "agent_name": t.agent_name,
                            "description": t.description,
                            "depends_on": t.depends_on,
                            "max_retries": t.max_retries,
                            "tags": t.tags,
                        })).collect::<Vec<_>>(),
                    }),
                )
                .await;
            record_counter("orchestrator_plans_built_total", 1);

            let mut plan = plan;
            let mut visible_output = String::new();
            let mut tasks_executed: u32 = 0;

            while tasks_executed < deps.orchestrator_config.max_tasks_per_turn {
                let Some(task_id) = plan.next_ready_task().map(|t| t.id) else {
                    break;
                };

                let (agent_name, description) = {
                    let task = plan.task_mut(task_id).expect("id from next_ready_task");
                    (task.agent_name.clone(), task.description.clone())
                };

                let _ = deps
                    .memory
                    .log_event(
                        EventType::TaskAssigned,
                        correlation_id,
                        json!({
                            "plan_id": plan.id,
                            "task_id": task_id,
                            "agent_name": agent_name,
                            "description": description,
                        }),
                    )
                    .await;
                record_counter("orchestrator_tasks_assigned_total", 1);

                let agent_context = AgentContext {
                    conversation_id: context.id,
                    correlation_id,
                    user_id: context.user_id.clone(),
                    project_id: context.project_id.clone(),
                    recent_messages: &context.messages,
                };

                let (chunk, stop_here) = Self::execute_task(
                    &mut plan,
                    task_id,
                    &agent_context,
                    &mut context.emotional_state,
                    deps,
                )
                .await;

                if let Some(chunk) = chunk {
                    if !visible_output.is_empty() {
                        visible_output.push_str("\n\n");
                    }
                    visible_output.push_str(&chunk);
                }

                tasks_executed += 1;
                if stop_here {
                    break;
                }
            }

            if visible_output.is_empty() {
                visible_output = FALLBACK_NO_VISIBLE_OUTPUT.to_string();
            }

            context.add_message(MessageRole::Assistant, visible_output.clone());
            let assistant_message = context.messages.last().expect("just pushed").clone();
            if let Err(err) = deps.memory.log_message(context.id, &assistant_message).await {
                tracing::warn!(error = %err, "failed to persist assistant message");
            }

            visible_output
        }
        .instrument(span)
        .await
    }

    /// Execute one task to a terminal or retry-pending state and return
    /// `(visible_message, stop_for_user_input)` (SPEC_FULL.md §4.5.1).
    async fn execute_task(
        plan: &mut mnemos_types::Plan,
        task_id: mnemos_types::TaskId,
        agent_context: &AgentContext<'_>,
        emotional_state: &mut mnemos_types::EmotionalState,
        deps: &OrchestratorDeps<'_>,
    ) -> (Option<String>, bool) {
        let agent_name = plan
            .task_mut(task_id)
            .expect("task exists")
            .agent_name
            .clone();

        let agent = match deps.registry.get(&agent_name) {
            Ok(agent) => agent,
            Err(err) => {
                let task = plan.task_mut(task_id).expect("task exists");
                task.mark_error(err.to_string());
                return (Some(format!("[ERROR in agent '{agent_name}'] {err}")), false);
            }
        };

        let input_payload = {
            let task = plan.task_mut(task_id).expect("task exists");
            task.mark_running();
            task.input_payload.clone()
        };

        let started_at = Instant::now();
        let started_wall = chrono::Utc::now();
        let result = agent
            .run(input_payload.clone(), agent_context, deps.memory, deps.llm, emotional_state)
            .await;
        record_histogram("orchestrator_task_duration_seconds", started_at.elapsed().as_secs_f64());

        let run = AgentRun::from_result(agent_name.clone(), input_payload, result, started_wall);
        if let Err(err) = deps.memory.log_agent_run(&run).await {
            tracing::warn!(error = %err, agent = %agent_name, "failed to persist agent run");
        }

        emotion::update_on_agent_run(emotional_state, &agent_name, run.status);

        let event_type = match run.status {
            AgentRunStatus::Success => EventType::AgentRunCompleted,
            AgentRunStatus::Failure => EventType::AgentRunFailed,
        };
        let _ = deps
            .memory
            .log_event(
                event_type,
                agent_context.correlation_id,
                json!({
                    "task_id": task_id,
                    "agent_name": agent_name,
                    "run_id": run.id,
                    "status": matches!(run.status, AgentRunStatus::Success),
                }),
            )
            .await;
        record_counter(
            match run.status {
                AgentRunStatus::Success => "orchestrator_agent_runs_success_total",
                AgentRunStatus::Failure => "orchestrator_agent_runs_failure_total",
            },
            1,
        );

        let mut user_msg = run
            .output_payload
            .get("user_visible_message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let task = plan.task_mut(task_id).expect("task exists");
        match run.status {
            AgentRunStatus::Success => {
                task.mark_done(run.output_payload.clone());
            }
            AgentRunStatus::Failure => {
                let error_text = run
                    .output_payload
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown error")
                    .to_string();

                if task.can_retry() {
                    task.requeue_for_retry();
                } else {
                    task.mark_error(error_text.clone());
                }

                if user_msg.is_empty() {
                    user_msg = format!("[ERROR in agent '{agent_name}'] {error_text}");
                }
            }
        }

        let stop_here = run
            .output_payload
            .get("stop_for_user_input")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let visible = if user_msg.is_empty() { None } else { Some(user_msg) };
        (visible, stop_here)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mnemos_types::{AgentResult, EmotionDelta};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct EchoAgent;

    #[async_trait]
    impl crate::Agent for EchoAgent {
        fn name(&self) -> &str {
            "chat_agent"
        }

        async fn run_impl(
            &self,
            _input_payload: serde_json::Value,
            _context: &AgentContext<'_>,
            _memory: &MemoryEngine,
            _llm: &dyn LlmProvider,
            _emotional_state: &mnemos_types::EmotionalState,
        ) -> crate::EngineResult<AgentResult> {
            Ok(AgentResult::success(
                json!({ "user_visible_message": "hello there" }),
                EmotionDelta::default(),
            ))
        }
    }

    struct AlwaysFailsAgent {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl crate::Agent for AlwaysFailsAgent {
        fn name(&self) -> &str {
            "flaky_agent"
        }

        async fn run_impl(
            &self,
            _input_payload: serde_json::Value,
            _context: &AgentContext<'_>,
            _memory: &MemoryEngine,
            _llm: &dyn LlmProvider,
            _emotional_state: &mnemos_types::EmotionalState,
        ) -> crate::EngineResult<AgentResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AgentResult::failure("boom"))
        }
    }

    async fn test_memory() -> MemoryEngine {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.into_path().join("orch-test.sqlite3");
        MemoryEngine::open(path.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn greeting_turn_produces_visible_reply_and_completed_event() {
        let memory = test_memory().await;
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(EchoAgent)).unwrap();
        let llm = crate::EchoProvider;
        let orchestrator_config = OrchestratorConfig::default();
        let governance_config = GovernanceConfig::default();
        let deps = OrchestratorDeps {
            memory: &memory,
            llm: &llm,
            registry: &registry,
            orchestrator_config: &orchestrator_config,
            governance_config: &governance_config,
        };

        let mut context = ConversationContext::new(Some("u1".to_string()));
        let reply = Orchestrator::handle_user_message(&mut context, &deps, "ciao, come va?").await;
        assert_eq!(reply, "hello there");

        let events = memory.get_events(Some(context.correlation_id), 20).await.unwrap();
        let types: Vec<_> = events.iter().map(|e| e.r#type).collect();
        assert_eq!(
            types,
            vec![
                EventType::RequestReceived,
                EventType::PlanCreated,
                EventType::TaskAssigned,
                EventType::AgentRunCompleted,
            ]
        );
    }

    #[tokio::test]
    async fn retry_then_give_up_marks_task_error_after_budget() {
        let memory = test_memory().await;
        let calls = Arc::new(AtomicU32::new(0));
        let mut registry = AgentRegistry::new();
        registry
            .register(Arc::new(AlwaysFailsAgent { calls: calls.clone() }))
            .unwrap();
        let llm = crate::EchoProvider;
        let orchestrator_config = OrchestratorConfig { max_tasks_per_turn: 10 };
        let governance_config = GovernanceConfig::default();
        let deps = OrchestratorDeps {
            memory: &memory,
            llm: &llm,
            registry: &registry,
            orchestrator_config: &orchestrator_config,
            governance_config: &governance_config,
        };

        let mut context = ConversationContext::new(Some("u1".to_string()));
        // Seed requirements so the intake gate doesn't redirect this turn.
        memory
            .store_item(
                mnemos_types::MemoryScope::Conversation,
                mnemos_types::MemoryType::Procedural,
                mnemos_types::MemoryKeys::requirements_sheet(&context.id.to_string()),
                "{}",
                json!({}),
            )
            .await
            .unwrap();

        let mut plan = mnemos_types::Plan::new();
        let mut task = mnemos_types::Task::new("flaky_agent", "always fails", json!({}));
        task.max_retries = 2;
        plan.add_task(task);

        let agent_context = AgentContext {
            conversation_id: context.id,
            correlation_id: context.correlation_id,
            user_id: context.user_id.clone(),
            project_id: None,
            recent_messages: &context.messages,
        };

        let mut total_calls = 0;
        while let Some(task_id) = plan.next_ready_task().map(|t| t.id) {
            let (_, _) = Orchestrator::execute_task(
                &mut plan,
                task_id,
                &agent_context,
                &mut context.emotional_state,
                &deps,
            )
            .await;
            total_calls += 1;
            if total_calls > 10 {
                break;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(plan.tasks[0].status, mnemos_types::TaskStatus::Error);

        let events = memory.get_events(None, 20).await.unwrap();
        let failed_count = events
            .iter()
            .filter(|e| e.r#type == EventType::AgentRunFailed)
            .count();
        assert_eq!(failed_count, 3);
    }
}
