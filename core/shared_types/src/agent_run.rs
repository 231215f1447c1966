use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::emotion::EmotionDelta;
use crate::ids::{new_id, AgentName, AgentRunId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentRunStatus {
    Success,
    Failure,
}

/// A single, immutable record of an agent invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgentRun {
    pub id: AgentRunId,
    pub agent_name: AgentName,
    pub input_payload: Value,
    pub output_payload: Value,
    pub status: AgentRunStatus,
    pub emotion_delta: EmotionDelta,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What a concrete agent implementation returns from `run`, before the
/// orchestrator stamps timestamps and an id onto it.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AgentResult {
    pub output_payload: Value,
    pub emotion_delta: EmotionDelta,
    pub status: AgentRunStatus,
}

impl AgentResult {
    pub fn success(output_payload: Value, emotion_delta: EmotionDelta) -> Self {
        Self {
            output_payload,
            emotion_delta,
            status: AgentRunStatus::Success,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            output_payload: serde_json::json!({ "error": error.into() }),
            emotion_delta: EmotionDelta::failure_default(),
            status: AgentRunStatus::Failure,
        }
    }
}

impl AgentRun {
    pub fn from_result(
        agent_name: impl Into<String>,
        input_payload: Value,
        result: AgentResult,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            agent_name: agent_name.into(),
            input_payload,
            output_payload: result.output_payload,
            status: result.status,
            emotion_delta: result.emotion_delta,
            started_at,
            finished_at: Utc::now(),
        }
    }
}
