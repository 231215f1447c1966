//! Indexes the project's code files, answers "where is X used?" searches,
//! and drafts LLM-backed refactoring plans. Grounded on
//! `original_source/agents/codebase_agent.py`; filesystem walk uses
//! `walkdir` the way `examples/lanegrid-agtrace` does.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{json, Value};
use walkdir::WalkDir;

use mnemos_engine::{extract_json_object, Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct CodebaseAgent;

const SKIP_DIRS: &[&str] = &[".git", ".idea", ".vscode", "target", ".venv", "venv", "node_modules", "out"];
const ALLOWED_EXT: &[&str] = &["rs", "R", "r", "md", "txt", "json", "yaml", "yml", "sql", "sh", "toml"];

fn project_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn iter_code_files(root: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    let skip: HashSet<&str> = SKIP_DIRS.iter().copied().collect();
    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |e| {
            if e.file_type().is_dir() {
                let name = e.file_name().to_string_lossy();
                !skip.contains(name.as_ref()) && !name.starts_with('.')
            } else {
                true
            }
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|ext| ext.to_str()).map(|ext| ALLOWED_EXT.contains(&ext)).unwrap_or(false))
        .map(|e| e.path().to_path_buf())
}

async fn build_index(memory: &MemoryEngine, max_files: usize) -> EngineResult<Value> {
    let root = project_root();
    let mut files_info = Vec::new();
    for path in iter_code_files(&root) {
        let rel = path.strip_prefix(&root).unwrap_or(&path).to_string_lossy().to_string();
        let size = std::fs::metadata(&path).ok().map(|m| m.len());
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
        files_info.push(json!({ "path": rel, "size": size, "ext": ext }));
        if files_info.len() >= max_files {
            break;
        }
    }

    let index_obj = json!({
        "root": root.to_string_lossy(),
        "num_files": files_info.len(),
        "files": files_info,
    });

    let _ = memory
        .store_item(
            MemoryScope::Global,
            MemoryType::Procedural,
            "code_index",
            serde_json::to_string(&index_obj).unwrap_or_default(),
            json!({ "agent": "codebase_agent", "num_files": index_obj["num_files"] }),
        )
        .await;

    Ok(index_obj)
}

fn search_occurrences(query: &str, max_hits: usize) -> Vec<Value> {
    let root = project_root();
    let mut hits = Vec::new();
    if query.is_empty() {
        return hits;
    }
    'outer: for path in iter_code_files(&root) {
        let rel = path.strip_prefix(&root).unwrap_or(&path).to_string_lossy().to_string();
        let Ok(content) = std::fs::read_to_string(&path) else { continue };
        for (line_no, line) in content.lines().enumerate() {
            if line.contains(query) {
                hits.push(json!({ "file": rel, "line_no": line_no + 1, "line": line }));
                if hits.len() >= max_hits {
                    break 'outer;
                }
            }
        }
    }
    hits
}

async fn run_index(memory: &MemoryEngine, input_payload: &Value) -> EngineResult<AgentResult> {
    let max_files = input_payload.get("max_files").and_then(Value::as_u64).unwrap_or(500).clamp(50, 2000) as usize;
    let index_obj = build_index(memory, max_files).await?;

    let msg = format!(
        "I've indexed {} code files in the project. Now I can better answer questions like \
         'where is X used?'.",
        index_obj["num_files"]
    );

    Ok(AgentResult::success(
        json!({
            "user_visible_message": msg,
            "index_summary": index_obj,
            "search_results": Value::Array(vec![]),
            "refactor_plan": Value::Null,
            "stop_for_user_input": false,
        }),
        EmotionDelta { curiosity: 0.02, confidence: 0.03, ..Default::default() },
    ))
}

fn run_search(input_payload: &Value) -> AgentResult {
    let query = input_payload.get("query").and_then(Value::as_str).unwrap_or("").trim().to_string();
    let max_hits = input_payload.get("max_hits").and_then(Value::as_u64).unwrap_or(40).clamp(5, 200) as usize;

    if query.is_empty() {
        return AgentResult::success(
            json!({
                "user_visible_message": "Tell me what to search for (e.g. 'where is X used?') by \
                 setting input_payload['query'].",
                "index_summary": Value::Null,
                "search_results": Value::Array(vec![]),
                "refactor_plan": Value::Null,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: -0.02, ..Default::default() },
        );
    }

    let hits = search_occurrences(&query, max_hits);

    let msg = if hits.is_empty() {
        format!("I didn't find any occurrences of '{query}' in the indexed code files.")
    } else {
        let mut lines = vec![format!("I found {} occurrences of '{query}' (showing at most {max_hits}):", hits.len()), String::new()];
        for h in &hits {
            lines.push(format!("- {}:{}: {}", h["file"].as_str().unwrap_or(""), h["line_no"], h["line"].as_str().unwrap_or("")));
        }
        lines.join("\n")
    };

    let (curiosity, confidence) = if hits.is_empty() { (-0.01, -0.01) } else { (0.03, 0.02) };

    AgentResult::success(
        json!({
            "user_visible_message": msg,
            "index_summary": Value::Null,
            "search_results": hits,
            "refactor_plan": Value::Null,
            "stop_for_user_input": false,
        }),
        EmotionDelta { curiosity, confidence, ..Default::default() },
    )
}

const REFACTOR_SYSTEM_PROMPT: &str = "You help plan refactors in a Rust codebase.\n\
You're given:\n\
- a refactor goal (refactor_goal),\n\
- an optional symbol/token to search for (symbol_query),\n\
- some search hits in files (search_hits),\n\
- the last user message.\n\n\
Task:\n\
1) Propose a numbered refactoring plan.\n\
2) For each step specify files involved, risk, and a short note.\n\
3) Follow this JSON schema:\n\
{\n  \"plan_summary\": \"short summary\",\n  \"steps\": [\n    {\n      \"id\": \"step1\",\n      \
\"description\": \"what to do\",\n      \"files\": [\"relative/path1.rs\"],\n      \"risk\": \"low|medium|high\",\n      \
\"estimation\": \"effort estimate\",\n      \"notes\": \"optional details\"\n    }\n  ],\n  \"notes\": \"extra notes\"\n}\n\n\
Respond with ONLY valid JSON, no text outside the JSON.";

async fn run_refactor_plan(
    input_payload: &Value,
    context: &AgentContext<'_>,
    memory: &MemoryEngine,
    llm: &dyn LlmProvider,
    emotional_state: &EmotionalState,
) -> EngineResult<AgentResult> {
    let goal = input_payload.get("goal").and_then(Value::as_str).unwrap_or("").trim().to_string();
    let query = input_payload.get("query").and_then(Value::as_str).unwrap_or("").trim().to_string();
    let max_hits = input_payload.get("max_hits").and_then(Value::as_u64).unwrap_or(30).clamp(5, 100) as usize;

    if goal.is_empty() {
        return Ok(AgentResult::success(
            json!({
                "user_visible_message": "To generate a refactoring plan I need a clear goal. Set \
                 input_payload['goal'], e.g.: \"split the router logic into several modules\".",
                "index_summary": Value::Null,
                "search_results": Value::Array(vec![]),
                "refactor_plan": Value::Null,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: -0.03, ..Default::default() },
        ));
    }

    let hits = if query.is_empty() { Vec::new() } else { search_occurrences(&query, max_hits) };
    let last_user = context.last_user_message().unwrap_or("").to_string();

    let llm_input = json!({
        "project_root": project_root().to_string_lossy(),
        "refactor_goal": goal,
        "symbol_query": query,
        "search_hits": hits,
        "last_user_message": last_user,
        "emotional_state": {
            "curiosity": emotional_state.curiosity,
            "confidence": emotional_state.confidence,
            "fatigue": emotional_state.fatigue,
            "frustration": emotional_state.frustration,
        },
    });

    let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&llm_input).unwrap_or_default() }];
    let options = LlmOptions { max_tokens: Some(900), ..Default::default() };

    let parsed = match llm.generate(REFACTOR_SYSTEM_PROMPT, &messages, &options).await {
        Ok(raw) => extract_json_object(&raw).unwrap_or_else(|| json!({})),
        Err(_) => json!({}),
    };

    let plan_summary = parsed
        .get("plan_summary")
        .and_then(Value::as_str)
        .unwrap_or("Refactoring plan auto-generated from the provided goal.")
        .to_string();
    let steps = parsed.get("steps").cloned().unwrap_or_else(|| json!([]));
    let notes = parsed.get("notes").and_then(Value::as_str).unwrap_or("").to_string();

    let mut lines = vec!["Here's the refactoring plan I propose:".to_string(), String::new()];
    if let Some(arr) = steps.as_array().filter(|a| !a.is_empty()) {
        for step in arr {
            let sid = step.get("id").and_then(Value::as_str).unwrap_or("step");
            let desc = step.get("description").and_then(Value::as_str).unwrap_or("");
            let risk = step.get("risk").and_then(Value::as_str).unwrap_or("n/a");
            let files: Vec<&str> = step.get("files").and_then(Value::as_array).map(|a| a.iter().filter_map(Value::as_str).collect()).unwrap_or_default();
            let mut line = format!("- {sid}: {desc}");
            if !files.is_empty() {
                line.push_str(&format!(" (files involved: {})", files.join(", ")));
            }
            line.push_str(&format!(" [risk: {risk}]"));
            lines.push(line);
        }
    } else {
        lines.push("(I couldn't build a detailed list of steps.)".to_string());
    }
    if !notes.is_empty() {
        lines.push(String::new());
        lines.push(format!("Additional notes: {notes}"));
    }

    let project_id = context.project_id.clone();
    let scope = if project_id.is_some() { MemoryScope::Project } else { MemoryScope::Global };
    let mut metadata = json!({ "agent": "codebase_agent", "goal": goal, "symbol_query": query });
    if let Some(pid) = &project_id {
        metadata["project_id"] = json!(pid);
    }

    let refactor_record = json!({ "plan_summary": plan_summary, "steps": steps, "notes": notes });
    let stored = memory
        .store_item(scope, MemoryType::Procedural, "refactor_plan", serde_json::to_string(&refactor_record).unwrap_or_default(), metadata)
        .await;
    let refactor_memory_id = stored.ok().map(|item| item.id);

    Ok(AgentResult::success(
        json!({
            "user_visible_message": lines.join("\n"),
            "index_summary": Value::Null,
            "search_results": hits,
            "refactor_plan": refactor_record,
            "refactor_memory_id": refactor_memory_id,
            "stop_for_user_input": false,
        }),
        EmotionDelta { curiosity: 0.02, confidence: 0.02, ..Default::default() },
    ))
}

#[async_trait]
impl Agent for CodebaseAgent {
    fn name(&self) -> &str {
        "codebase_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let mode = input_payload.get("mode").and_then(Value::as_str).unwrap_or("search").to_lowercase();

        match mode.as_str() {
            "index" => run_index(memory, &input_payload).await,
            "search" => Ok(run_search(&input_payload)),
            "refactor_plan" => run_refactor_plan(&input_payload, context, memory, llm, emotional_state).await,
            _ => Ok(AgentResult::success(
                json!({
                    "user_visible_message": "CodebaseAgent: unrecognized mode. Use 'index', 'search', or 'refactor_plan'.",
                    "index_summary": Value::Null,
                    "search_results": Value::Array(vec![]),
                    "refactor_plan": Value::Null,
                    "stop_for_user_input": false,
                }),
                EmotionDelta { confidence: -0.02, ..Default::default() },
            )),
        }
    }
}
