use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub max_input_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LlmConfig {
    pub default_provider: String,
    #[serde(default)]
    pub openai: Option<ProviderConfig>,
    #[serde(default)]
    pub groq: Option<ProviderConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: "echo".to_string(),
            openai: None,
            groq: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_tasks_per_turn: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_turn: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GovernanceConfig {
    pub failure_rate_trigger: f64,
    pub frustration_trigger: f64,
    pub max_governance_steps: u32,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            failure_rate_trigger: 0.6,
            frustration_trigger: 0.4,
            max_governance_steps: 6,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub environment: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            orchestrator: OrchestratorConfig::default(),
            governance: GovernanceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
