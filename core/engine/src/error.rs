use thiserror::Error;

/// The engine's design-level error taxonomy (SPEC_FULL.md §7). Fallible
/// internal functions return `Result<T, EngineError>` and propagate with
/// `?`; only the orchestrator's outermost turn-handling function converts a
/// remaining error into the user-facing fallback string — the orchestrator
/// itself never raises to its caller.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("agent '{agent}' failed: {message}")]
    AgentFailure { agent: String, message: String },

    #[error("failed to build a plan: {0}")]
    PlanBuildFailure(String),

    #[error("persistence error: {0}")]
    PersistenceTransient(String),

    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("security violation: {0}")]
    SecurityViolation(String),

    #[error("failed to parse model output: {0}")]
    ParseFailure(String),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Pool(#[from] r2d2::Error),

    #[error("{0}")]
    Other(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
