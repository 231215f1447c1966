use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{new_id, PlanId};
use crate::task::{Task, TaskStatus};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    Heuristic,
    Llm,
    MetaRouter,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceMode {
    Standard,
    SafeDefault,
    Aggressive,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct PlanMetadata {
    pub source: Option<PlanSource>,
    pub router_mode: Option<String>,
    pub governance_mode: bool,
    pub governance_reason: Option<String>,
    pub governance_targets: Vec<String>,
    pub notes: Option<String>,
}

/// A task DAG built fresh for a single turn. Never resumed across turns.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Plan {
    pub id: PlanId,
    pub tasks: Vec<Task>,
    pub metadata: PlanMetadata,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new() -> Self {
        Self {
            id: new_id(),
            tasks: Vec::new(),
            metadata: PlanMetadata::default(),
            created_at: Utc::now(),
        }
    }

    pub fn add_task(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub fn has_pending_tasks(&self) -> bool {
        self.tasks.iter().any(|t| t.status == TaskStatus::Pending)
    }

    /// Return the first `pending` task whose every dependency (known to this
    /// plan) has status exactly `done`. An unknown dependency id is ignored
    /// (treated as already satisfied). A dependency in `error` status
    /// strands its dependent by design: it will never become ready.
    pub fn next_ready_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| {
            t.status == TaskStatus::Pending
                && t.depends_on.iter().all(|dep_id| {
                    self.tasks
                        .iter()
                        .find(|dep| &dep.id == dep_id)
                        .map(|dep| dep.status == TaskStatus::Done)
                        .unwrap_or(true)
                })
        })
    }

    pub fn next_ready_task_mut(&mut self) -> Option<&mut Task> {
        let ready_id = self.next_ready_task().map(|t| t.id);
        ready_id.and_then(move |id| self.tasks.iter_mut().find(|t| t.id == id))
    }

    pub fn task_mut(&mut self, id: crate::ids::TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}
