//! Advanced diagnostics: aggregates recent `AgentRun`s into failure rates,
//! slow-agent detection, I/O sanity checks, and emotional anomalies, then
//! writes an alert to procedural memory. Grounded on
//! `original_source/agents/diagnostics_agent.py`.
//!
//! The original also computed `_compute_routing_issues` off `context.plan`;
//! `AgentContext` carries no plan reference here (see DESIGN.md), so that
//! sub-check is dropped rather than faked.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, AgentRun, AgentRunStatus, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct DiagnosticsAgent;

struct FailureStat {
    agent_name: String,
    total_runs: u64,
    failures: u64,
    failure_rate: f64,
    last_error: String,
}

fn compute_failures(runs: &[AgentRun]) -> Vec<FailureStat> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    let mut failures: HashMap<&str, u64> = HashMap::new();
    let mut last_error: HashMap<&str, String> = HashMap::new();

    for r in runs {
        *totals.entry(r.agent_name.as_str()).or_insert(0) += 1;
        if r.status == AgentRunStatus::Failure {
            *failures.entry(r.agent_name.as_str()).or_insert(0) += 1;
            let err = r.output_payload.get("error").and_then(Value::as_str).unwrap_or("").to_string();
            last_error.insert(r.agent_name.as_str(), err);
        }
    }

    let mut scored: Vec<FailureStat> = totals
        .into_iter()
        .map(|(agent_name, total)| {
            let fail = *failures.get(agent_name).unwrap_or(&0);
            FailureStat {
                agent_name: agent_name.to_string(),
                total_runs: total,
                failures: fail,
                failure_rate: if total > 0 { fail as f64 / total as f64 } else { 0.0 },
                last_error: last_error.get(agent_name).cloned().unwrap_or_default(),
            }
        })
        .collect();
    scored.sort_by(|a, b| b.failure_rate.partial_cmp(&a.failure_rate).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

struct PerfStats {
    global_avg: f64,
    slow_agents: Vec<(String, f64)>,
}

fn compute_performance(runs: &[AgentRun]) -> PerfStats {
    let mut durations = Vec::new();
    let mut per_agent: HashMap<&str, Vec<f64>> = HashMap::new();

    for r in runs {
        let dur = (r.finished_at - r.started_at).num_milliseconds() as f64 / 1000.0;
        durations.push(dur);
        per_agent.entry(r.agent_name.as_str()).or_default().push(dur);
    }

    if durations.is_empty() {
        return PerfStats { global_avg: 0.0, slow_agents: Vec::new() };
    }

    let global_avg = durations.iter().sum::<f64>() / durations.len() as f64;
    let mut slow_agents = Vec::new();
    for (agent, ds) in per_agent {
        if ds.is_empty() {
            continue;
        }
        let avg = ds.iter().sum::<f64>() / ds.len() as f64;
        if avg > global_avg * 1.8 {
            slow_agents.push((agent.to_string(), avg));
        }
    }

    PerfStats { global_avg, slow_agents }
}

fn compute_io_problems(runs: &[AgentRun]) -> Vec<String> {
    let mut issues = Vec::new();
    for r in runs {
        if r.input_payload.is_null() || (r.input_payload.is_object() && r.input_payload.as_object().unwrap().is_empty()) {
            issues.push(format!("{}: empty input_payload", r.agent_name));
        }
        if r.output_payload.is_null() {
            issues.push(format!("{}: empty or missing output_payload", r.agent_name));
        }
    }
    issues
}

fn compute_emotional_anomalies(emo: &EmotionalState) -> Vec<String> {
    let mut issues = Vec::new();
    if emo.fatigue > 0.75 {
        issues.push("fatigue very high -> possible cognitive degradation".to_string());
    }
    if emo.frustration > 0.7 {
        issues.push("frustration elevated -> many problematic pipelines".to_string());
    }
    if emo.confidence < 0.2 {
        issues.push("confidence too low -> the system doubts itself".to_string());
    }
    if emo.curiosity > 0.85 {
        issues.push("curiosity elevated -> risk of exploratory loops".to_string());
    }
    issues
}

#[async_trait]
impl Agent for DiagnosticsAgent {
    fn name(&self) -> &str {
        "diagnostics_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        _context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let lookback = input_payload.get("lookback").and_then(Value::as_u64).unwrap_or(200) as u32;
        let runs = memory.get_recent_agent_runs(lookback).await?;

        if runs.is_empty() {
            return Ok(AgentResult::success(
                json!({
                    "user_visible_message": "Not enough runs are available to produce an advanced diagnostic.",
                    "diagnostics": {},
                }),
                EmotionDelta { confidence: -0.01, ..Default::default() },
            ));
        }

        let by_agent = compute_failures(&runs);
        let perf = compute_performance(&runs);
        let io_issues = compute_io_problems(&runs);
        let emotional_anomalies = compute_emotional_anomalies(emotional_state);

        let mut lines = vec!["System diagnostics report".to_string()];

        lines.push(String::new());
        lines.push("Most problematic agents:".to_string());
        for item in by_agent.iter().take(5) {
            lines.push(format!(
                "- {} -> {}/{} failures ({:.1}%)",
                item.agent_name, item.failures, item.total_runs, item.failure_rate * 100.0
            ));
            if !item.last_error.is_empty() {
                lines.push(format!("    last error: {}", &item.last_error.chars().take(120).collect::<String>()));
            }
        }

        lines.push(String::new());
        lines.push("Slowness / inefficiencies:".to_string());
        for (agent, avg) in &perf.slow_agents {
            lines.push(format!("- {agent} -> avg {avg:.2}s (global avg {:.2}s)", perf.global_avg));
        }

        if !io_issues.is_empty() {
            lines.push(String::new());
            lines.push("Input/output communication problems:".to_string());
            for issue in &io_issues {
                lines.push(format!("- {issue}"));
            }
        }

        if !emotional_anomalies.is_empty() {
            lines.push(String::new());
            lines.push("Emotional anomalies:".to_string());
            for issue in &emotional_anomalies {
                lines.push(format!("- {issue}"));
            }
        }

        let report = lines.join("\n");

        let diagnostics = json!({
            "failures": by_agent.iter().map(|i| json!({
                "agent_name": i.agent_name,
                "total_runs": i.total_runs,
                "failures": i.failures,
                "failure_rate": i.failure_rate,
                "last_error": i.last_error,
            })).collect::<Vec<_>>(),
            "performance": {
                "global_avg": perf.global_avg,
                "slow_agents": perf.slow_agents.iter().map(|(a, avg)| json!({"agent_name": a, "avg_duration": avg})).collect::<Vec<_>>(),
            },
            "io_issues": io_issues,
            "emotional_issues": emotional_anomalies,
        });

        memory
            .store_item(
                MemoryScope::Global,
                MemoryType::Procedural,
                MemoryKeys::DIAGNOSTICS,
                serde_json::to_string(&diagnostics).unwrap_or_default(),
                json!({ "severity": "warning" }),
            )
            .await?;

        memory
            .store_item(
                MemoryScope::Global,
                MemoryType::Procedural,
                MemoryKeys::DIAGNOSTIC_ALERT,
                report.clone(),
                json!({ "severity": "warning" }),
            )
            .await?;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": report,
                "diagnostics": diagnostics,
            }),
            EmotionDelta { curiosity: 0.04, frustration: 0.01, fatigue: 0.01, ..Default::default() },
        ))
    }
}
