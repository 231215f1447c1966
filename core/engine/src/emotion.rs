use mnemos_types::{AgentRunStatus, EmotionDelta, EmotionalState};

/// Applied once at the start of every turn, before any task executes.
/// Formulas per the emotional engine contract (SPEC_FULL.md §4.3).
pub fn apply_decay_between_turns(state: &mut EmotionalState) {
    state.fatigue *= 0.9;
    state.frustration *= 0.9;
    state.mood *= 0.95;
    state.energy += 0.1 * (0.6 - state.energy);
    state.social_need *= 0.98;
    state.playfulness *= 0.98;
    state.learning_drive = (state.learning_drive * 0.99 + 0.01).min(1.0);
    state.clamp();
}

/// Applied once per completed agent run, after its own `EmotionDelta` has
/// been summed in. Adds the deterministic success/failure base deltas and
/// the agent-name-conditional bonuses, then clamps.
pub fn update_on_agent_run(state: &mut EmotionalState, agent_name: &str, status: AgentRunStatus) {
    let mut delta = match status {
        AgentRunStatus::Success => EmotionDelta {
            confidence: 0.05,
            curiosity: 0.02,
            fatigue: 0.005,
            frustration: -0.02,
            mood: 0.05,
            energy: 0.03,
            learning_drive: 0.02,
            ..Default::default()
        },
        AgentRunStatus::Failure => EmotionDelta {
            confidence: -0.05,
            frustration: 0.08,
            fatigue: 0.03,
            mood: -0.08,
            energy: -0.02,
            social_need: 0.05,
            ..Default::default()
        },
    };

    if agent_name.contains("requirements") && matches!(status, AgentRunStatus::Failure) {
        delta.frustration += 0.05;
        delta.mood -= 0.03;
    }
    if agent_name.contains("analysis_planner") && matches!(status, AgentRunStatus::Success) {
        delta.curiosity += 0.03;
        delta.learning_drive += 0.03;
    }
    if agent_name.contains("chat") {
        delta.social_need -= 0.02;
    }

    state.apply_delta(&delta);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_pulls_energy_toward_baseline() {
        let mut state = EmotionalState {
            energy: 1.0,
            ..Default::default()
        };
        apply_decay_between_turns(&mut state);
        assert!((state.energy - 0.94).abs() < 1e-9);
    }

    #[test]
    fn chat_agent_success_reduces_social_need_extra() {
        let mut state = EmotionalState::default();
        let before = state.social_need;
        update_on_agent_run(&mut state, "chat_agent", AgentRunStatus::Success);
        assert!(state.social_need < before);
    }

    #[test]
    fn requirements_failure_adds_extra_frustration() {
        let mut plain = EmotionalState::default();
        update_on_agent_run(&mut plain, "database_designer_agent", AgentRunStatus::Failure);

        let mut requirements = EmotionalState::default();
        update_on_agent_run(&mut requirements, "requirements_agent", AgentRunStatus::Failure);

        assert!(requirements.frustration > plain.frustration);
    }
}
