use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde_json::Value;
use tokio::task;

use mnemos_types::{
    AgentDefinition, AgentRun, AgentRunStatus, ConversationId, CorrelationId, Event, EventType,
    LifecycleState, Message, MessageRole, MemoryItem, MemoryScope, MemoryType,
};

use crate::error::{EngineError, EngineResult};

type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Per-agent diagnostics derived from the `agent_runs` table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AgentMetrics {
    pub total_runs: u64,
    pub failures: u64,
    pub failure_rate: f64,
    pub avg_duration_ms: f64,
}

/// Event-sourced, SQLite-backed store for conversations, memory items,
/// agent runs, agent definitions and the append-only event log. Every
/// logical write is one statement (or a tight transaction) run inside
/// `spawn_blocking`, following the teacher's pooled-connection idiom.
#[derive(Clone)]
pub struct MemoryEngine {
    pool: Arc<DbPool>,
}

impl MemoryEngine {
    pub fn open(db_path: &str) -> EngineResult<Self> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = r2d2::Pool::builder()
            .max_size(10)
            .min_idle(Some(1))
            .idle_timeout(Some(Duration::from_secs(300)))
            .build(manager)
            .map_err(EngineError::Pool)?;

        {
            let conn = pool.get().map_err(EngineError::Pool)?;
            ensure_schema(&conn)?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    fn conn(&self) -> EngineResult<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(EngineError::from)
    }

    // --- messages ---

    pub async fn log_message(&self, conversation_id: ConversationId, message: &Message) -> EngineResult<()> {
        let pool = self.pool.clone();
        let conversation_id = conversation_id.to_string();
        let role = role_to_str(message.role).to_string();
        let content = message.content.clone();
        let timestamp = message.timestamp.to_rfc3339();

        task::spawn_blocking(move || -> EngineResult<()> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![uuid::Uuid::new_v4().to_string(), conversation_id, role, content, timestamp],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    pub async fn get_recent_messages(
        &self,
        conversation_id: ConversationId,
        limit: u32,
    ) -> EngineResult<Vec<Message>> {
        let pool = self.pool.clone();
        let conversation_id = conversation_id.to_string();

        task::spawn_blocking(move || -> EngineResult<Vec<Message>> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            let mut stmt = conn.prepare(
                "SELECT role, content, timestamp FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY timestamp DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![conversation_id, limit], |row| {
                let role: String = row.get(0)?;
                let content: String = row.get(1)?;
                let timestamp: String = row.get(2)?;
                Ok((role, content, timestamp))
            })?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, timestamp) = row?;
                messages.push(Message {
                    role: role_from_str(&role),
                    content,
                    timestamp: parse_ts(&timestamp),
                });
            }
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    // --- memory items ---

    pub async fn store_item(
        &self,
        scope: MemoryScope,
        r#type: MemoryType,
        key: impl Into<String>,
        content: impl Into<String>,
        metadata: Value,
    ) -> EngineResult<MemoryItem> {
        let item = MemoryItem::new(scope, r#type, key, content, metadata);
        let pool = self.pool.clone();
        let row = item.clone();

        task::spawn_blocking(move || -> EngineResult<()> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            conn.execute(
                "INSERT INTO memory_items (id, scope, type, key, content, metadata, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row.id.to_string(),
                    scope_to_str(row.scope),
                    type_to_str(row.r#type),
                    row.key,
                    row.content,
                    serde_json::to_string(&row.metadata).unwrap_or_else(|_| "{}".to_string()),
                    row.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))??;

        Ok(item)
    }

    pub async fn find_items_by_key(
        &self,
        key: impl Into<String>,
        scope: Option<MemoryScope>,
        r#type: Option<MemoryType>,
        limit: u32,
    ) -> EngineResult<Vec<MemoryItem>> {
        let key = key.into();
        self.search_items_inner(scope, r#type, Some(key), None, limit)
            .await
    }

    pub async fn search_items(
        &self,
        scope: Option<MemoryScope>,
        r#type: Option<MemoryType>,
        content_substring: Option<String>,
        limit: u32,
    ) -> EngineResult<Vec<MemoryItem>> {
        self.search_items_inner(scope, r#type, None, content_substring, limit)
            .await
    }

    async fn search_items_inner(
        &self,
        scope: Option<MemoryScope>,
        r#type: Option<MemoryType>,
        key: Option<String>,
        content_substring: Option<String>,
        limit: u32,
    ) -> EngineResult<Vec<MemoryItem>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> EngineResult<Vec<MemoryItem>> {
            let conn = pool.get().map_err(EngineError::Pool)?;

            let mut sql = String::from(
                "SELECT id, scope, type, key, content, metadata, created_at FROM memory_items WHERE 1=1",
            );
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(scope) = scope {
                sql.push_str(" AND scope = ?");
                args.push(Box::new(scope_to_str(scope).to_string()));
            }
            if let Some(r#type) = r#type {
                sql.push_str(" AND type = ?");
                args.push(Box::new(type_to_str(r#type).to_string()));
            }
            if let Some(key) = &key {
                sql.push_str(" AND key = ?");
                args.push(Box::new(key.clone()));
            }
            if let Some(substring) = &content_substring {
                sql.push_str(" AND content LIKE ?");
                args.push(Box::new(format!("%{substring}%")));
            }
            sql.push_str(" ORDER BY created_at DESC LIMIT ?");
            args.push(Box::new(limit));

            let mut stmt = conn.prepare(&sql)?;
            let params_ref: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();

            let rows = stmt.query_map(params_ref.as_slice(), |row| {
                let id: String = row.get(0)?;
                let scope: String = row.get(1)?;
                let r#type: String = row.get(2)?;
                let key: String = row.get(3)?;
                let content: String = row.get(4)?;
                let metadata: String = row.get(5)?;
                let created_at: String = row.get(6)?;
                Ok((id, scope, r#type, key, content, metadata, created_at))
            })?;

            let mut items = Vec::new();
            for row in rows {
                let (id, scope, r#type, key, content, metadata, created_at) = row?;
                items.push(MemoryItem {
                    id: id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
                    scope: scope_from_str(&scope),
                    r#type: type_from_str(&r#type),
                    key,
                    content,
                    metadata: serde_json::from_str(&metadata).unwrap_or(Value::Null),
                    created_at: parse_ts(&created_at),
                });
            }
            Ok(items)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    /// The most recently created content for `key` under the given
    /// scope/type filter, or `None` if nothing matches.
    pub async fn load_item_content(
        &self,
        key: impl Into<String>,
        scope: Option<MemoryScope>,
        r#type: Option<MemoryType>,
    ) -> EngineResult<Option<String>> {
        let items = self.find_items_by_key(key, scope, r#type, 1).await?;
        Ok(items.into_iter().next().map(|i| i.content))
    }

    // --- agent runs ---

    pub async fn log_agent_run(&self, run: &AgentRun) -> EngineResult<()> {
        let pool = self.pool.clone();
        let run = run.clone();

        task::spawn_blocking(move || -> EngineResult<()> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            conn.execute(
                "INSERT OR REPLACE INTO agent_runs
                 (id, agent_name, input_payload, output_payload, status, emotion_delta, started_at, finished_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    run.id.to_string(),
                    run.agent_name,
                    serde_json::to_string(&run.input_payload).unwrap_or_else(|_| "{}".to_string()),
                    serde_json::to_string(&run.output_payload).unwrap_or_else(|_| "{}".to_string()),
                    status_to_str(run.status),
                    serde_json::to_string(&run.emotion_delta).unwrap_or_else(|_| "{}".to_string()),
                    run.started_at.to_rfc3339(),
                    run.finished_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    pub async fn get_recent_agent_runs(&self, limit: u32) -> EngineResult<Vec<AgentRun>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> EngineResult<Vec<AgentRun>> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            let mut stmt = conn.prepare(
                "SELECT id, agent_name, input_payload, output_payload, status, emotion_delta, started_at, finished_at
                 FROM agent_runs ORDER BY finished_at DESC LIMIT ?1",
            )?;
            let rows = stmt.query_map(params![limit], row_to_agent_run)?;

            let mut runs = Vec::new();
            for row in rows {
                runs.push(row?);
            }
            runs.reverse();
            Ok(runs)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    /// Per-agent metrics aggregated live from `agent_runs`: total invocations,
    /// failures, failure rate, and mean duration, plus the global mean
    /// duration across every agent (used by diagnostics/critic/curator).
    pub async fn get_agent_metrics_from_diagnostics(&self) -> EngineResult<HashMap<String, AgentMetrics>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> EngineResult<HashMap<String, AgentMetrics>> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            let mut stmt = conn.prepare(
                "SELECT agent_name, status, started_at, finished_at FROM agent_runs",
            )?;
            let rows = stmt.query_map([], |row| {
                let agent_name: String = row.get(0)?;
                let status: String = row.get(1)?;
                let started_at: String = row.get(2)?;
                let finished_at: String = row.get(3)?;
                Ok((agent_name, status, started_at, finished_at))
            })?;

            let mut totals: HashMap<String, (u64, u64, f64)> = HashMap::new();
            let mut global_total_duration = 0.0f64;
            let mut global_total_runs = 0u64;

            for row in rows {
                let (agent_name, status, started_at, finished_at) = row?;
                let duration_ms = (parse_ts(&finished_at) - parse_ts(&started_at))
                    .num_milliseconds()
                    .max(0) as f64;
                let entry = totals.entry(agent_name).or_insert((0, 0, 0.0));
                entry.0 += 1;
                if status == "failure" {
                    entry.1 += 1;
                }
                entry.2 += duration_ms;
                global_total_duration += duration_ms;
                global_total_runs += 1;
            }

            let global_avg = if global_total_runs > 0 {
                global_total_duration / global_total_runs as f64
            } else {
                0.0
            };

            let mut metrics = HashMap::new();
            for (agent_name, (total_runs, failures, total_duration)) in totals {
                let avg_duration_ms = if total_runs > 0 {
                    total_duration / total_runs as f64
                } else {
                    global_avg
                };
                metrics.insert(
                    agent_name,
                    AgentMetrics {
                        total_runs,
                        failures,
                        failure_rate: if total_runs > 0 {
                            failures as f64 / total_runs as f64
                        } else {
                            0.0
                        },
                        avg_duration_ms,
                    },
                );
            }
            Ok(metrics)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    pub async fn get_last_diagnostics(&self) -> EngineResult<Option<Value>> {
        let content = self
            .load_item_content(
                mnemos_types::MemoryKeys::DIAGNOSTICS,
                Some(MemoryScope::Global),
                Some(MemoryType::Procedural),
            )
            .await?;
        Ok(content.and_then(|c| serde_json::from_str(&c).ok()))
    }

    // --- agent definitions ---

    pub async fn save_agent_definition(&self, def: &AgentDefinition) -> EngineResult<()> {
        let pool = self.pool.clone();
        let def = def.clone();

        task::spawn_blocking(move || -> EngineResult<()> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            conn.execute(
                "INSERT INTO agent_definitions (id, name, description, config, is_active, parent_id, lifecycle_state, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(id) DO UPDATE SET
                    description = excluded.description,
                    config = excluded.config,
                    is_active = excluded.is_active,
                    parent_id = excluded.parent_id,
                    lifecycle_state = excluded.lifecycle_state",
                params![
                    def.id.to_string(),
                    def.name,
                    def.description,
                    serde_json::to_string(&def.config).unwrap_or_else(|_| "{}".to_string()),
                    def.is_active as i64,
                    def.parent_id.map(|id| id.to_string()),
                    def.lifecycle_state.as_str(),
                    def.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    pub async fn list_agent_definitions(&self) -> EngineResult<Vec<AgentDefinition>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> EngineResult<Vec<AgentDefinition>> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            let mut stmt = conn.prepare(
                "SELECT id, name, description, config, is_active, parent_id, lifecycle_state, created_at
                 FROM agent_definitions ORDER BY created_at ASC",
            )?;
            let rows = stmt.query_map([], row_to_agent_definition)?;

            let mut defs = Vec::new();
            for row in rows {
                defs.push(row?);
            }
            Ok(defs)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }

    // --- events ---

    pub async fn log_event(
        &self,
        r#type: EventType,
        correlation_id: CorrelationId,
        payload: Value,
    ) -> EngineResult<Event> {
        let event = Event::new(r#type, correlation_id, payload);
        let pool = self.pool.clone();
        let row = event.clone();

        task::spawn_blocking(move || -> EngineResult<()> {
            let conn = pool.get().map_err(EngineError::Pool)?;
            conn.execute(
                "INSERT INTO events (id, type, correlation_id, timestamp, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id.to_string(),
                    event_type_to_str(row.r#type),
                    row.correlation_id.to_string(),
                    row.timestamp.to_rfc3339(),
                    serde_json::to_string(&row.payload).unwrap_or_else(|_| "{}".to_string()),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))??;

        Ok(event)
    }

    pub async fn get_events(
        &self,
        correlation_id: Option<CorrelationId>,
        limit: u32,
    ) -> EngineResult<Vec<Event>> {
        let pool = self.pool.clone();

        task::spawn_blocking(move || -> EngineResult<Vec<Event>> {
            let conn = pool.get().map_err(EngineError::Pool)?;

            let (sql, corr) = match correlation_id {
                Some(id) => (
                    "SELECT id, type, correlation_id, timestamp, payload FROM events
                     WHERE correlation_id = ?1 ORDER BY timestamp ASC LIMIT ?2",
                    Some(id.to_string()),
                ),
                None => (
                    "SELECT id, type, correlation_id, timestamp, payload FROM events
                     ORDER BY timestamp ASC LIMIT ?2",
                    None,
                ),
            };

            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(
                params![corr.unwrap_or_default(), limit],
                row_to_event,
            )?;

            let mut events = Vec::new();
            for row in rows {
                events.push(row?);
            }
            Ok(events)
        })
        .await
        .map_err(|e| EngineError::Other(e.to_string()))?
    }
}

fn row_to_agent_run(row: &rusqlite::Row) -> rusqlite::Result<AgentRun> {
    let id: String = row.get(0)?;
    let agent_name: String = row.get(1)?;
    let input_payload: String = row.get(2)?;
    let output_payload: String = row.get(3)?;
    let status: String = row.get(4)?;
    let emotion_delta: String = row.get(5)?;
    let started_at: String = row.get(6)?;
    let finished_at: String = row.get(7)?;

    Ok(AgentRun {
        id: id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
        agent_name,
        input_payload: serde_json::from_str(&input_payload).unwrap_or(Value::Null),
        output_payload: serde_json::from_str(&output_payload).unwrap_or(Value::Null),
        status: status_from_str(&status),
        emotion_delta: serde_json::from_str(&emotion_delta).unwrap_or_default(),
        started_at: parse_ts(&started_at),
        finished_at: parse_ts(&finished_at),
    })
}

fn row_to_agent_definition(row: &rusqlite::Row) -> rusqlite::Result<AgentDefinition> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let description: String = row.get(2)?;
    let config: String = row.get(3)?;
    let is_active: i64 = row.get(4)?;
    let parent_id: Option<String> = row.get(5)?;
    let lifecycle_state: String = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok(AgentDefinition {
        id: id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
        name,
        description,
        config: serde_json::from_str(&config).unwrap_or(Value::Null),
        is_active: is_active != 0,
        parent_id: parent_id.and_then(|p| p.parse().ok()),
        lifecycle_state: LifecycleState::from_str(&lifecycle_state),
        created_at: parse_ts(&created_at),
    })
}

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<Event> {
    let id: String = row.get(0)?;
    let r#type: String = row.get(1)?;
    let correlation_id: String = row.get(2)?;
    let timestamp: String = row.get(3)?;
    let payload: String = row.get(4)?;

    Ok(Event {
        id: id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
        r#type: event_type_from_str(&r#type),
        correlation_id: correlation_id.parse().unwrap_or_else(|_| uuid::Uuid::new_v4()),
        timestamp: parse_ts(&timestamp),
        payload: serde_json::from_str(&payload).unwrap_or(Value::Null),
    })
}

fn ensure_schema(conn: &rusqlite::Connection) -> EngineResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            id TEXT PRIMARY KEY,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS memory_items (
            id TEXT PRIMARY KEY,
            scope TEXT NOT NULL,
            type TEXT NOT NULL,
            key TEXT NOT NULL,
            content TEXT NOT NULL,
            metadata TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_memory_items_scope_type_key ON memory_items(scope, type, key);
        CREATE INDEX IF NOT EXISTS idx_memory_items_scope_type_created ON memory_items(scope, type, created_at);

        CREATE TABLE IF NOT EXISTS agent_runs (
            id TEXT PRIMARY KEY,
            agent_name TEXT NOT NULL,
            input_payload TEXT NOT NULL,
            output_payload TEXT NOT NULL,
            status TEXT NOT NULL,
            emotion_delta TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS agent_definitions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            config TEXT NOT NULL,
            is_active INTEGER NOT NULL,
            parent_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            type TEXT NOT NULL,
            correlation_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            payload TEXT NOT NULL
        );
        ",
    )?;

    // Additive schema evolution: pre-existing agent_definitions rows get
    // lifecycle_state='draft'. Ignore "duplicate column" on repeated opens.
    let _ = conn.execute(
        "ALTER TABLE agent_definitions ADD COLUMN lifecycle_state TEXT NOT NULL DEFAULT 'draft'",
        [],
    );

    Ok(())
}

fn role_to_str(role: MessageRole) -> &'static str {
    match role {
        MessageRole::User => "user",
        MessageRole::System => "system",
        MessageRole::Assistant => "assistant",
        MessageRole::Agent => "agent",
    }
}

fn role_from_str(s: &str) -> MessageRole {
    match s {
        "system" => MessageRole::System,
        "assistant" => MessageRole::Assistant,
        "agent" => MessageRole::Agent,
        _ => MessageRole::User,
    }
}

fn scope_to_str(scope: MemoryScope) -> &'static str {
    match scope {
        MemoryScope::User => "user",
        MemoryScope::Project => "project",
        MemoryScope::Global => "global",
        MemoryScope::Conversation => "conversation",
    }
}

fn scope_from_str(s: &str) -> MemoryScope {
    match s {
        "project" => MemoryScope::Project,
        "global" => MemoryScope::Global,
        "conversation" => MemoryScope::Conversation,
        _ => MemoryScope::User,
    }
}

fn type_to_str(t: MemoryType) -> &'static str {
    match t {
        MemoryType::Episodic => "episodic",
        MemoryType::Semantic => "semantic",
        MemoryType::Procedural => "procedural",
    }
}

fn type_from_str(s: &str) -> MemoryType {
    match s {
        "procedural" => MemoryType::Procedural,
        "episodic" => MemoryType::Episodic,
        _ => MemoryType::Semantic,
    }
}

fn status_to_str(status: AgentRunStatus) -> &'static str {
    match status {
        AgentRunStatus::Success => "success",
        AgentRunStatus::Failure => "failure",
    }
}

fn status_from_str(s: &str) -> AgentRunStatus {
    match s {
        "failure" => AgentRunStatus::Failure,
        _ => AgentRunStatus::Success,
    }
}

fn event_type_to_str(t: EventType) -> &'static str {
    match t {
        EventType::RequestReceived => "request_received",
        EventType::PlanCreated => "plan_created",
        EventType::TaskAssigned => "task_assigned",
        EventType::AgentRunCompleted => "agent_run_completed",
        EventType::AgentRunFailed => "agent_run_failed",
    }
}

fn event_type_from_str(s: &str) -> EventType {
    match s {
        "plan_created" => EventType::PlanCreated,
        "task_assigned" => EventType::TaskAssigned,
        "agent_run_completed" => EventType::AgentRunCompleted,
        "agent_run_failed" => EventType::AgentRunFailed,
        _ => EventType::RequestReceived,
    }
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_types::{AgentResult, EmotionDelta};

    async fn test_engine() -> MemoryEngine {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.into_path().join("test.sqlite3");
        MemoryEngine::open(path.to_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn store_and_load_item_round_trip() {
        let engine = test_engine().await;
        engine
            .store_item(
                MemoryScope::User,
                MemoryType::Semantic,
                "user_profile:u1",
                "likes rust",
                serde_json::json!({}),
            )
            .await
            .unwrap();

        let content = engine
            .load_item_content("user_profile:u1", Some(MemoryScope::User), Some(MemoryType::Semantic))
            .await
            .unwrap();
        assert_eq!(content.as_deref(), Some("likes rust"));
    }

    #[tokio::test]
    async fn agent_metrics_reflect_failure_rate() {
        let engine = test_engine().await;
        let now = Utc::now();

        for i in 0..5 {
            let result = if i < 3 {
                AgentResult::success(serde_json::json!({}), EmotionDelta::default())
            } else {
                AgentResult::failure("boom")
            };
            let run = AgentRun::from_result("chat_agent", serde_json::json!({}), result, now);
            engine.log_agent_run(&run).await.unwrap();
        }

        let metrics = engine.get_agent_metrics_from_diagnostics().await.unwrap();
        let chat = metrics.get("chat_agent").unwrap();
        assert_eq!(chat.total_runs, 5);
        assert_eq!(chat.failures, 2);
        assert!((chat.failure_rate - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn save_agent_definition_upserts_by_id() {
        let engine = test_engine().await;
        let mut def = AgentDefinition::new_draft("new_agent", "does things", serde_json::json!({}));
        engine.save_agent_definition(&def).await.unwrap();

        def.description = "does more things".to_string();
        engine.save_agent_definition(&def).await.unwrap();

        let defs = engine.list_agent_definitions().await.unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].description, "does more things");
    }
}
