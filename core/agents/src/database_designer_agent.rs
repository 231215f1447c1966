//! Designs a minimal SQL schema from a free-text request and physically
//! creates/updates a SQLite file on disk, grounded on
//! `original_source/agents/database_designer_agent.py`. This is the one
//! agent that opens its own `rusqlite::Connection` directly instead of going
//! through `MemoryEngine`'s pooled connection, because its entire purpose is
//! producing a separate demonstration database file (see DESIGN.md).

use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineError, EngineResult, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryKeys, MemoryScope, MemoryType};

pub struct DatabaseDesignerAgent;

fn table_statements(request: &str) -> Vec<&'static str> {
    let lower = request.to_lowercase();
    let mut statements = Vec::new();

    if lower.contains("cliente") || lower.contains("clienti") {
        statements.push(
            "CREATE TABLE IF NOT EXISTS customers (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    name TEXT NOT NULL,\n    email TEXT UNIQUE,\n    created_at TEXT\n);",
        );
    }

    if lower.contains("ordini") || lower.contains("ordine") || lower.contains("orders") {
        statements.push(
            "CREATE TABLE IF NOT EXISTS orders (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    customer_id INTEGER NOT NULL,\n    order_date TEXT,\n    amount REAL,\n    FOREIGN KEY (customer_id) REFERENCES customers(id)\n);",
        );
    }

    if statements.is_empty() {
        statements.push(
            "CREATE TABLE IF NOT EXISTS items (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n    name TEXT NOT NULL,\n    description TEXT,\n    created_at TEXT\n);",
        );
    }

    statements
}

fn create_database(db_path: PathBuf, statements: Vec<&'static str>) -> Result<(), rusqlite::Error> {
    let conn = rusqlite::Connection::open(db_path)?;
    for stmt in statements {
        conn.execute(stmt, [])?;
    }
    Ok(())
}

#[async_trait]
impl Agent for DatabaseDesignerAgent {
    fn name(&self) -> &str {
        "database_designer_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        _llm: &dyn LlmProvider,
        _emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let request = input_payload
            .get("request")
            .and_then(Value::as_str)
            .map(|s| s.to_string())
            .or_else(|| context.last_user_message().map(|s| s.to_string()))
            .unwrap_or_default();

        let statements = table_statements(&request);
        let executed_sql = statements.join("\n\n");

        let db_path = env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("designed_app.db");
        let db_path_display = db_path.display().to_string();

        let creation = tokio::task::spawn_blocking({
            let db_path = db_path.clone();
            move || create_database(db_path, statements)
        })
        .await
        .map_err(|e| EngineError::Other(format!("database_designer_agent task join error: {e}")))?;

        let (output, delta) = match creation {
            Ok(()) => {
                let summary = format!(
                    "I've designed and created (or updated) a SQLite database.\n\n\
                     File path: `{db_path_display}`\n\n\
                     Executed statements:\n\n{executed_sql}\n\n\
                     You can open the file with any SQLite tool."
                );
                (
                    json!({
                        "user_visible_message": "",
                        "db_sql": executed_sql.clone(),
                        "db_path": db_path_display.clone(),
                        "stop_for_user_input": false,
                        "design_summary": summary,
                    }),
                    EmotionDelta { confidence: 0.08, curiosity: 0.03, ..Default::default() },
                )
            }
            Err(err) => {
                let message = format!("I tried to create the database but ran into an error:\n\n{err}");
                (
                    json!({
                        "user_visible_message": message,
                        "db_sql": "",
                        "db_path": db_path_display.clone(),
                        "stop_for_user_input": false,
                    }),
                    EmotionDelta { confidence: -0.05, frustration: 0.1, ..Default::default() },
                )
            }
        };

        memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Procedural,
                MemoryKeys::DATABASE_SCHEMA,
                executed_sql,
                json!({ "db_path": db_path_display }),
            )
            .await?;

        Ok(AgentResult::success(output, delta))
    }
}
