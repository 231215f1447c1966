//! The concrete `Agent` roster (SPEC_FULL.md §2/§4.2). Each module grounds
//! one `original_source/agents/*.py` counterpart; `register_all` wires every
//! instance into an `AgentRegistry` at startup, replacing the original's
//! dynamic package-scan discovery hook (SPEC_FULL.md §9).

mod agent_reload_agent;
mod analysis_planner_agent;
mod archivist_agent;
mod architect_agent;
mod chat_agent;
mod codebase_agent;
mod codegen_agent;
mod critic_agent;
mod curator_agent;
mod curiosity_question_agent;
mod database_designer_agent;
mod diagnostics_agent;
mod explanation_agent;
mod hardware_agent;
mod memory_agent;
mod meta_router_agent;
mod preference_learner_agent;
mod profile_schema;
mod project_context_agent;
mod r_analysis_agent;
mod r_eda_agent;
mod r_modeling_agent;
mod r_report_agent;
mod requirements_agent;
mod security_review_agent;
mod self_knowledge_agent;
mod state_explainer_agent;
mod user_profile_agent;
mod validator_agent;

use std::sync::Arc;

use mnemos_engine::{AgentRegistry, EngineResult};

/// Register every concrete agent under its canonical name. Called once at
/// startup (`mnemosd::main`); registration fails only on a duplicate name,
/// which would indicate a programming error in this file.
pub fn register_all(registry: &mut AgentRegistry) -> EngineResult<()> {
    registry.register(Arc::new(chat_agent::ChatAgent))?;
    registry.register(Arc::new(memory_agent::MemoryAgent))?;
    registry.register(Arc::new(requirements_agent::RequirementsAgent))?;
    registry.register(Arc::new(architect_agent::ArchitectAgent))?;
    registry.register(Arc::new(validator_agent::ValidatorAgent))?;
    registry.register(Arc::new(security_review_agent::SecurityReviewAgent))?;
    registry.register(Arc::new(critic_agent::CriticAgent))?;
    registry.register(Arc::new(curator_agent::CuratorAgent))?;
    registry.register(Arc::new(database_designer_agent::DatabaseDesignerAgent))?;
    registry.register(Arc::new(explanation_agent::ExplanationAgent))?;
    registry.register(Arc::new(hardware_agent::HardwareAgent))?;
    registry.register(Arc::new(archivist_agent::ArchivistAgent))?;
    registry.register(Arc::new(state_explainer_agent::StateExplainerAgent))?;
    registry.register(Arc::new(project_context_agent::ProjectContextAgent))?;
    registry.register(Arc::new(user_profile_agent::UserProfileAgent))?;
    registry.register(Arc::new(preference_learner_agent::PreferenceLearnerAgent))?;
    registry.register(Arc::new(curiosity_question_agent::CuriosityQuestionAgent))?;
    registry.register(Arc::new(diagnostics_agent::DiagnosticsAgent))?;
    registry.register(Arc::new(self_knowledge_agent::SelfKnowledgeAgent))?;
    registry.register(Arc::new(agent_reload_agent::AgentReloadAgent))?;
    registry.register(Arc::new(codebase_agent::CodebaseAgent))?;
    registry.register(Arc::new(codegen_agent::CodegenAgent))?;
    registry.register(Arc::new(meta_router_agent::MetaRouterAgent))?;
    registry.register(Arc::new(analysis_planner_agent::AnalysisPlannerAgent))?;
    registry.register(Arc::new(r_eda_agent::REdaAgent))?;
    registry.register(Arc::new(r_modeling_agent::RModelingAgent))?;
    registry.register(Arc::new(r_report_agent::RReportAgent))?;
    registry.register(Arc::new(r_analysis_agent::RAnalysisAgent))?;
    Ok(())
}
