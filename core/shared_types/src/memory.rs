use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{new_id, MemoryItemId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    User,
    Project,
    Global,
    Conversation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Episodic,
    Semantic,
    Procedural,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MemoryItem {
    pub id: MemoryItemId,
    pub scope: MemoryScope,
    pub r#type: MemoryType,
    pub key: String,
    pub content: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl MemoryItem {
    pub fn new(
        scope: MemoryScope,
        r#type: MemoryType,
        key: impl Into<String>,
        content: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: new_id(),
            scope,
            r#type,
            key: key.into(),
            content: content.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Well-known stable memory keys, per the external-interfaces contract.
pub struct MemoryKeys;

impl MemoryKeys {
    pub fn user_profile(user_id: &str) -> String {
        format!("user_profile:{user_id}")
    }

    pub fn project_context(project_key: &str) -> String {
        format!("project_context::{project_key}")
    }

    pub fn requirements_sheet(conversation_or_project_id: &str) -> String {
        format!("requirements_sheet:{conversation_or_project_id}")
    }

    pub const DIAGNOSTIC_ALERT: &'static str = "diagnostic_alert";
    pub const SECURITY_ALERT: &'static str = "security_alert";
    pub const CRITIC_SUGGESTION: &'static str = "critic_suggestion";
    pub const GENEALOGY_RECORD: &'static str = "genealogy_record";
    pub const PENDING_AGENT_RELOAD: &'static str = "pending_agent_reload";
    pub const R_EDA_RESULT: &'static str = "r_eda_result";
    pub const R_MODELING_RESULT: &'static str = "r_modeling_result";
    pub const R_REPORT_RESULT: &'static str = "r_report_result";
    pub const DATABASE_SCHEMA: &'static str = "database_schema";
    pub const DIAGNOSTICS: &'static str = "diagnostics";
}
