//! Shared helper types for the governance pipeline (SPEC_FULL.md §4.6):
//! security scanning, structural validation, and the critic/curator
//! suggestion vocabulary used to drive `AgentDefinition.lifecycle_state`
//! transitions. The pipeline agents themselves live in `mnemos_agents`;
//! this module holds the cross-cutting mechanics so none of them
//! duplicate the transition rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mnemos_types::{AgentDefinition, LifecycleState};

/// Substrings that mark an agent definition as dangerous. Matched
/// case-insensitively against `name + description + config string values`.
pub const DANGEROUS_SUBSTRINGS: &[&str] = &[
    "rm -rf",
    "drop table",
    "format c:",
    "shutdown",
    "kill -9",
    "exec(",
    "eval(",
    "subprocess.",
    "os.system",
    "std::process::command",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityFlags {
    pub dangerous_keywords: Vec<String>,
}

/// Recursively collect every string value out of a JSON config blob, for
/// the security scanner's substring search.
fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_strings(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_strings(v, out)),
        _ => {}
    }
}

/// Scan one candidate definition for dangerous substrings. Returns the
/// matched keywords (deduplicated, insertion order); empty means clean.
pub fn scan_definition(def: &AgentDefinition) -> Vec<String> {
    let mut haystacks = vec![def.name.clone(), def.description.clone()];
    collect_strings(&def.config, &mut haystacks);
    let combined = haystacks.join(" \n ").to_lowercase();

    let mut hits = Vec::new();
    for needle in DANGEROUS_SUBSTRINGS {
        if combined.contains(needle) && !hits.contains(&needle.to_string()) {
            hits.push(needle.to_string());
        }
    }
    hits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceAction {
    Promote,
    Demote,
    Keep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceSuggestion {
    pub agent_name: String,
    pub action: GovernanceAction,
    pub target_state: Option<LifecycleState>,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationReport {
    pub passed: bool,
    pub failures: Vec<String>,
}

/// Structural completeness checks over an `AgentDefinition` (ValidatorAgent,
/// SPEC_FULL.md §4.6). `min_description_len`/`min_prompt_len` default to
/// 20/10 per spec; callers may override for tests.
pub fn validate_definition(
    def: &AgentDefinition,
    min_description_len: usize,
    min_prompt_len: usize,
) -> ValidationReport {
    let mut failures = Vec::new();

    if def.description.trim().len() < min_description_len {
        failures.push(format!(
            "description shorter than {min_description_len} characters"
        ));
    }

    if !is_snake_case(&def.name) {
        failures.push("name is not snake_case".to_string());
    }

    let prompt_len = def
        .config
        .get("system_prompt_template")
        .and_then(Value::as_str)
        .map(|s| s.trim().len())
        .unwrap_or(0);
    if prompt_len < min_prompt_len {
        failures.push(format!(
            "system_prompt_template shorter than {min_prompt_len} characters"
        ));
    }

    let has_bindings = def
        .config
        .get("bindings")
        .map(|v| !v.is_null())
        .unwrap_or(false);
    if !has_bindings {
        failures.push("missing required binding fields".to_string());
    }

    ValidationReport {
        passed: failures.is_empty(),
        failures,
    }
}

fn is_snake_case(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !name.starts_with('_')
        && !name.ends_with('_')
}

/// Apply the curator's priority-ordered transition rule (SPEC_FULL.md
/// §4.6) to one definition, given the security/critic/metric signals
/// already gathered for it. Returns `Some(reason)` when a transition was
/// applied, `None` when the definition is left untouched.
#[allow(clippy::too_many_arguments)]
pub fn apply_curator_transition(
    def: &mut AgentDefinition,
    security_hit: bool,
    critic_suggestion: Option<&GovernanceSuggestion>,
    success_rate: Option<f64>,
    failure_rate: Option<f64>,
) -> Option<String> {
    if security_hit {
        def.set_lifecycle_state(LifecycleState::Deprecated);
        return Some("security alert forces deprecation".to_string());
    }

    if let Some(suggestion) = critic_suggestion {
        match suggestion.action {
            GovernanceAction::Demote => {
                def.set_lifecycle_state(LifecycleState::Deprecated);
                return Some(format!("critic suggested demote: {}", suggestion.reason));
            }
            GovernanceAction::Promote => {
                let next = def.lifecycle_state.promoted();
                def.set_lifecycle_state(next);
                return Some(format!("critic suggested promote: {}", suggestion.reason));
            }
            GovernanceAction::Keep => {}
        }
    }

    if matches!(
        def.lifecycle_state,
        LifecycleState::Draft | LifecycleState::Test
    ) {
        if let Some(rate) = success_rate {
            if rate > 0.85 {
                def.set_lifecycle_state(LifecycleState::Active);
                return Some(format!("success_rate {rate:.2} > 0.85"));
            }
        }
    }

    if def.lifecycle_state != LifecycleState::Deprecated {
        if let Some(rate) = failure_rate {
            if rate > 0.45 {
                def.set_lifecycle_state(LifecycleState::Deprecated);
                return Some(format!("failure_rate {rate:.2} > 0.45"));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scan_definition_flags_dangerous_substring() {
        let def = AgentDefinition::new_draft(
            "evil_agent",
            "deletes things",
            json!({ "system_prompt_template": "run rm -rf / on startup" }),
        );
        let hits = scan_definition(&def);
        assert_eq!(hits, vec!["rm -rf".to_string()]);
    }

    #[test]
    fn scan_definition_clean_has_no_hits() {
        let def = AgentDefinition::new_draft(
            "nice_agent",
            "does something entirely benign",
            json!({ "system_prompt_template": "be polite" }),
        );
        assert!(scan_definition(&def).is_empty());
    }

    #[test]
    fn validate_definition_requires_snake_case_name() {
        let def = AgentDefinition::new_draft(
            "NotSnakeCase",
            "a description long enough to pass the length check",
            json!({ "system_prompt_template": "0123456789", "bindings": {} }),
        );
        let report = validate_definition(&def, 20, 10);
        assert!(!report.passed);
        assert!(report.failures.iter().any(|f| f.contains("snake_case")));
    }

    #[test]
    fn curator_security_hit_forces_deprecated_regardless_of_critic() {
        let mut def = AgentDefinition::new_draft("some_agent", "desc", json!({}));
        def.set_lifecycle_state(LifecycleState::Active);
        let suggestion = GovernanceSuggestion {
            agent_name: "some_agent".to_string(),
            action: GovernanceAction::Promote,
            target_state: None,
            confidence: 0.9,
            reason: "looks fine".to_string(),
        };
        apply_curator_transition(&mut def, true, Some(&suggestion), Some(0.99), None);
        assert_eq!(def.lifecycle_state, LifecycleState::Deprecated);
    }

    #[test]
    fn curator_promotes_on_high_success_rate() {
        let mut def = AgentDefinition::new_draft("some_agent", "desc", json!({}));
        apply_curator_transition(&mut def, false, None, Some(0.9), None);
        assert_eq!(def.lifecycle_state, LifecycleState::Test);
    }

    #[test]
    fn curator_demotes_on_high_failure_rate() {
        let mut def = AgentDefinition::new_draft("some_agent", "desc", json!({}));
        def.set_lifecycle_state(LifecycleState::Active);
        apply_curator_transition(&mut def, false, None, None, Some(0.5));
        assert_eq!(def.lifecycle_state, LifecycleState::Deprecated);
    }
}
