use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{new_id, CorrelationId, EventId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RequestReceived,
    PlanCreated,
    TaskAssigned,
    AgentRunCompleted,
    AgentRunFailed,
}

/// One append-only entry in the turn event log — the system's source of
/// truth for replay and diagnostics.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    pub id: EventId,
    pub r#type: EventType,
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl Event {
    pub fn new(r#type: EventType, correlation_id: CorrelationId, payload: Value) -> Self {
        Self {
            id: new_id(),
            r#type,
            correlation_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}
