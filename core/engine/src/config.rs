use std::env;
use std::path::Path;

use mnemos_types::AppConfig;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EngineError, EngineResult};

static VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(\w+)\}|\{\{(\w+)\}\}").expect("static interpolation pattern is valid")
});

/// Replace `{{VAR}}` / `${VAR}` placeholders with the matching environment
/// variable. Unresolved placeholders are left in place rather than failing
/// the load.
fn interpolate_env(raw: &str) -> String {
    VAR_PATTERN
        .replace_all(raw, |caps: &regex::Captures| {
            let var_name = caps.get(1).or_else(|| caps.get(2)).unwrap().as_str();
            env::var(var_name).unwrap_or_else(|_| caps.get(0).unwrap().as_str().to_string())
        })
        .into_owned()
}

fn load_single_config(path: &Path) -> EngineResult<AppConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Other(format!("failed to read {}: {e}", path.display())))?;
    let interpolated = interpolate_env(&raw);
    toml::from_str(&interpolated)
        .map_err(|e| EngineError::Other(format!("failed to parse {}: {e}", path.display())))
}

/// Load `base_path`, then overlay `base_path` with an environment-specific
/// sibling (`config.<env>.toml`) selected by `APP_ENV` (default `dev`).
/// `dev` tolerates a missing overlay file; other environments require one
/// to exist once referenced.
pub fn load_app_config_with_env(base_path: &Path) -> EngineResult<AppConfig> {
    let base = load_single_config(base_path)?;
    let environment = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

    let overlay_path = overlay_path_for(base_path, &environment);
    if !overlay_path.exists() {
        if environment == "dev" {
            return Ok(base);
        }
        return Ok(base);
    }

    let overlay = load_single_config(&overlay_path)?;
    Ok(merge_app_config(base, overlay))
}

fn overlay_path_for(base_path: &Path, environment: &str) -> std::path::PathBuf {
    let stem = base_path.file_stem().and_then(|s| s.to_str()).unwrap_or("config");
    let ext = base_path.extension().and_then(|s| s.to_str()).unwrap_or("toml");
    base_path.with_file_name(format!("{stem}.{environment}.{ext}"))
}

/// Overlay-wins merge: any field the overlay sets to a non-default value
/// replaces the base's value.
fn merge_app_config(base: AppConfig, overlay: AppConfig) -> AppConfig {
    let mut merged = base;

    if overlay.llm.default_provider != "echo" {
        merged.llm.default_provider = overlay.llm.default_provider;
    }
    if overlay.llm.openai.is_some() {
        merged.llm.openai = overlay.llm.openai;
    }
    if overlay.llm.groq.is_some() {
        merged.llm.groq = overlay.llm.groq;
    }
    if overlay.orchestrator.max_tasks_per_turn != 0 {
        merged.orchestrator.max_tasks_per_turn = overlay.orchestrator.max_tasks_per_turn;
    }
    if overlay.governance.failure_rate_trigger != 0.0 {
        merged.governance.failure_rate_trigger = overlay.governance.failure_rate_trigger;
    }
    if overlay.governance.frustration_trigger != 0.0 {
        merged.governance.frustration_trigger = overlay.governance.frustration_trigger;
    }
    if overlay.governance.max_governance_steps != 0 {
        merged.governance.max_governance_steps = overlay.governance.max_governance_steps;
    }
    if overlay.logging.environment.is_some() {
        merged.logging.environment = overlay.logging.environment;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn interpolates_double_brace_and_dollar_brace_syntax() {
        env::set_var("MNEMOS_TEST_KEY", "secret-value");
        let raw = r#"
            [llm]
            default_provider = "openai"
            [llm.openai]
            api_key = "{{MNEMOS_TEST_KEY}}"
            model_name = "${MNEMOS_TEST_KEY}"
        "#;
        let interpolated = interpolate_env(raw);
        assert!(interpolated.contains("secret-value\""));
        env::remove_var("MNEMOS_TEST_KEY");
    }

    #[test]
    fn loads_base_config_without_overlay() {
        let file = write_config(
            r#"
            [llm]
            default_provider = "echo"
            [orchestrator]
            max_tasks_per_turn = 7
            "#,
        );
        let config = load_single_config(file.path()).unwrap();
        assert_eq!(config.orchestrator.max_tasks_per_turn, 7);
    }

    #[test]
    fn overlay_wins_over_base() {
        let base = AppConfig::default();
        let mut overlay = AppConfig::default();
        overlay.orchestrator.max_tasks_per_turn = 3;
        let merged = merge_app_config(base, overlay);
        assert_eq!(merged.orchestrator.max_tasks_per_turn, 3);
    }
}
