use serde::{Deserialize, Serialize};

/// Bounded nine-scalar emotional state. Every field except `mood` lives in
/// `[0.0, 1.0]`; `mood` lives in `[-1.0, 1.0]`. The decay/update rules that
/// mutate this live in `mnemos_engine::emotion` — this type only owns the
/// data and the clamping invariant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EmotionalState {
    pub curiosity: f64,
    pub fatigue: f64,
    pub frustration: f64,
    pub confidence: f64,
    pub energy: f64,
    pub playfulness: f64,
    pub social_need: f64,
    pub learning_drive: f64,
    pub mood: f64,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self {
            curiosity: 0.5,
            fatigue: 0.0,
            frustration: 0.0,
            confidence: 0.5,
            energy: 0.6,
            playfulness: 0.3,
            social_need: 0.4,
            learning_drive: 0.7,
            mood: 0.0,
        }
    }
}

impl EmotionalState {
    /// Clamp every component to its declared range. Called after every
    /// decay/update application; never left implicit.
    pub fn clamp(&mut self) {
        self.curiosity = clamp01(self.curiosity);
        self.fatigue = clamp01(self.fatigue);
        self.frustration = clamp01(self.frustration);
        self.confidence = clamp01(self.confidence);
        self.energy = clamp01(self.energy);
        self.playfulness = clamp01(self.playfulness);
        self.social_need = clamp01(self.social_need);
        self.learning_drive = clamp01(self.learning_drive);
        self.mood = clamp(self.mood, -1.0, 1.0);
    }

    pub fn apply_delta(&mut self, delta: &EmotionDelta) {
        self.curiosity += delta.curiosity;
        self.fatigue += delta.fatigue;
        self.frustration += delta.frustration;
        self.confidence += delta.confidence;
        self.energy += delta.energy;
        self.playfulness += delta.playfulness;
        self.social_need += delta.social_need;
        self.learning_drive += delta.learning_drive;
        self.mood += delta.mood;
        self.clamp();
    }
}

/// An additive adjustment to an `EmotionalState`, produced by an agent run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct EmotionDelta {
    pub curiosity: f64,
    pub fatigue: f64,
    pub frustration: f64,
    pub confidence: f64,
    pub energy: f64,
    pub playfulness: f64,
    pub social_need: f64,
    pub learning_drive: f64,
    pub mood: f64,
}

impl EmotionDelta {
    /// The default penalty applied when an agent panics/errors without
    /// producing its own delta.
    pub fn failure_default() -> Self {
        Self {
            frustration: 0.1,
            confidence: -0.05,
            ..Default::default()
        }
    }
}

fn clamp01(v: f64) -> f64 {
    clamp(v, 0.0, 1.0)
}

fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
