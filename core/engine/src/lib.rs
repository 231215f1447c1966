pub mod agent;
pub mod config;
pub mod emotion;
pub mod error;
pub mod governance;
pub mod json_extract;
pub mod llm;
pub mod orchestrator;
pub mod persistence;
pub mod planner;

pub use agent::{Agent, AgentContext, AgentRegistry};
pub use config::load_app_config_with_env;
pub use error::{EngineError, EngineResult};
pub use json_extract::extract_json_object;
pub use llm::{EchoProvider, LlmMessage, LlmOptions, LlmProvider};
pub use orchestrator::{Orchestrator, OrchestratorDeps};
pub use persistence::{AgentMetrics, MemoryEngine};

use chrono::{DateTime, Utc};
use mnemos_types::{ConversationId, CorrelationId, EmotionalState, Message, MessageRole};

/// Mutable per-turn conversation state, exclusively owned by the
/// orchestrator for the duration of a turn (SPEC_FULL.md §3).
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub id: ConversationId,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub messages: Vec<Message>,
    pub emotional_state: EmotionalState,
    pub correlation_id: CorrelationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: Option<String>) -> Self {
        let id = mnemos_types::new_id();
        let now = Utc::now();
        Self {
            id,
            user_id,
            project_id: None,
            messages: Vec::new(),
            emotional_state: EmotionalState::default(),
            correlation_id: id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) -> &Message {
        self.messages.push(Message::new(role, content));
        self.updated_at = Utc::now();
        self.messages.last().expect("just pushed")
    }
}
