use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{new_id, AgentName, TaskId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Error,
}

/// One scheduled invocation of an agent within a `Plan`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub agent_name: AgentName,
    pub input_payload: Value,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub depends_on: HashSet<TaskId>,
    pub max_retries: u32,
    pub retry_count: u32,
    pub cost_estimate: Option<f64>,
    pub budget: Option<f64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(agent_name: impl Into<String>, description: impl Into<String>, input_payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            description: description.into(),
            agent_name: agent_name.into(),
            input_payload,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            depends_on: HashSet::new(),
            max_retries: 0,
            retry_count: 0,
            cost_estimate: None,
            budget: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn mark_running(&mut self) {
        self.status = TaskStatus::Running;
        self.updated_at = Utc::now();
    }

    pub fn mark_done(&mut self, result: Value) {
        self.status = TaskStatus::Done;
        self.result = Some(result);
        self.updated_at = Utc::now();
    }

    pub fn mark_error(&mut self, error: impl Into<String>) {
        self.status = TaskStatus::Error;
        self.error = Some(error.into());
        self.updated_at = Utc::now();
    }

    /// Revert an errored task to `pending` and bump its retry counter. The
    /// caller is responsible for checking `retry_count < max_retries` first.
    pub fn requeue_for_retry(&mut self) {
        self.retry_count += 1;
        self.status = TaskStatus::Pending;
        self.error = None;
        self.updated_at = Utc::now();
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}
