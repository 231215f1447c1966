use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{new_id, AgentDefinitionId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Draft,
    Test,
    Active,
    Deprecated,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Draft => "draft",
            LifecycleState::Test => "test",
            LifecycleState::Active => "active",
            LifecycleState::Deprecated => "deprecated",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "test" => LifecycleState::Test,
            "active" => LifecycleState::Active,
            "deprecated" => LifecycleState::Deprecated,
            _ => LifecycleState::Draft,
        }
    }

    /// The state a `promote` suggestion maps a definition currently in
    /// `self` onto: draft->test, test->active, active->active,
    /// deprecated->test.
    pub fn promoted(&self) -> Self {
        match self {
            LifecycleState::Draft => LifecycleState::Test,
            LifecycleState::Test => LifecycleState::Active,
            LifecycleState::Active => LifecycleState::Active,
            LifecycleState::Deprecated => LifecycleState::Test,
        }
    }
}

/// A governed, self-describing agent entry — the unit the governance
/// pipeline (security review / validation / critique / curation) operates
/// on. Distinct from the compiled-in `Agent` trait roster: an
/// `AgentDefinition` describes an agent that may or may not yet have a
/// runnable counterpart registered.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgentDefinition {
    pub id: AgentDefinitionId,
    pub name: String,
    pub description: String,
    pub config: Value,
    pub is_active: bool,
    pub parent_id: Option<AgentDefinitionId>,
    pub lifecycle_state: LifecycleState,
    pub created_at: DateTime<Utc>,
}

impl AgentDefinition {
    pub fn new_draft(name: impl Into<String>, description: impl Into<String>, config: Value) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            description: description.into(),
            config,
            is_active: false,
            parent_id: None,
            lifecycle_state: LifecycleState::Draft,
            created_at: Utc::now(),
        }
    }

    /// Enforce the invariant `is_active implies lifecycle_state == active`.
    pub fn set_lifecycle_state(&mut self, state: LifecycleState) {
        self.lifecycle_state = state;
        if state != LifecycleState::Active {
            self.is_active = false;
        }
    }
}
