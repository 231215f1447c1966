use uuid::Uuid;

/// Conversation identifier, stable for the lifetime of a conversation.
pub type ConversationId = Uuid;

/// Identifier for a single planned task within a `Plan`.
pub type TaskId = Uuid;

/// Identifier for a `Plan`, one per turn.
pub type PlanId = Uuid;

/// Identifier for a persisted `MemoryItem`.
pub type MemoryItemId = Uuid;

/// Identifier for a logged `AgentRun`.
pub type AgentRunId = Uuid;

/// Identifier for an `AgentDefinition` row.
pub type AgentDefinitionId = Uuid;

/// Identifier for a logged `Event`.
pub type EventId = Uuid;

/// Correlation id binding all events/runs of a single turn.
pub type CorrelationId = Uuid;

/// Name of a registered agent implementation, e.g. `"chat_agent"`.
pub type AgentName = String;

/// Generate a fresh random id. Centralized so the generation strategy can
/// change in one place.
pub fn new_id() -> Uuid {
    Uuid::new_v4()
}
