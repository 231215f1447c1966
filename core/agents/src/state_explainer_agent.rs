//! Explains the system's internal emotional state in plain language and
//! saves a self-report. Grounded on
//! `original_source/agents/state_explainer_agent.py`.

use async_trait::async_trait;
use serde_json::{json, Value};

use mnemos_engine::{Agent, AgentContext, EngineResult, LlmMessage, LlmOptions, LlmProvider, MemoryEngine};
use mnemos_types::{AgentResult, EmotionDelta, EmotionalState, MemoryScope, MemoryType};

pub struct StateExplainerAgent;

fn bucket01(v: f64) -> &'static str {
    if v < 0.2 {
        "very low"
    } else if v < 0.4 {
        "low"
    } else if v < 0.6 {
        "moderate"
    } else if v < 0.8 {
        "high"
    } else {
        "very high"
    }
}

fn bucket_mood(v: f64) -> &'static str {
    if v < -0.6 {
        "very negative"
    } else if v < -0.3 {
        "negative"
    } else if v < 0.3 {
        "neutral"
    } else if v < 0.6 {
        "positive"
    } else {
        "very positive"
    }
}

fn describe_emotions(emo: &EmotionalState) -> Value {
    json!({
        "curiosity": format!("curiosity {} ({:.2})", bucket01(emo.curiosity), emo.curiosity),
        "confidence": format!("confidence {} ({:.2})", bucket01(emo.confidence), emo.confidence),
        "fatigue": format!("fatigue {} ({:.2})", bucket01(emo.fatigue), emo.fatigue),
        "frustration": format!("frustration {} ({:.2})", bucket01(emo.frustration), emo.frustration),
        "mood": format!("mood {} ({:.2})", bucket_mood(emo.mood), emo.mood),
        "energy": format!("energy {} ({:.2})", bucket01(emo.energy), emo.energy),
        "playfulness": format!("playfulness {} ({:.2})", bucket01(emo.playfulness), emo.playfulness),
        "social_need": format!("social need {} ({:.2})", bucket01(emo.social_need), emo.social_need),
        "learning_drive": format!("learning drive {} ({:.2})", bucket01(emo.learning_drive), emo.learning_drive),
    })
}

fn fallback_text(emo_summary: &Value) -> String {
    let mut lines = vec![
        "I can't reach the LLM right now, but here's how I feel based on my internal state:".to_string(),
    ];
    for key in [
        "curiosity", "confidence", "fatigue", "frustration", "mood", "energy", "playfulness",
        "social_need", "learning_drive",
    ] {
        if let Some(v) = emo_summary.get(key).and_then(Value::as_str) {
            lines.push(format!("- {v}"));
        }
    }
    lines.join("\n")
}

const BASE_SYSTEM_PROMPT: &str = "You are StateExplainer, an agent in a multi-agent cognitive system. \
You receive a structured internal emotional state (curiosity, confidence, fatigue, frustration, \
mood, energy, playfulness, social_need, learning_drive) and the latest conversation messages. \
Respond as the system itself speaking about its own state, explaining: \
1) how you feel, using both the base emotions and mood/energy/drive, \
2) why you think you're in that state, relating it to recent messages, \
3) what would help you work better (more context, a break, play, reassurance, etc). \
Do not invent external facts (hardware, users, data) that aren't mentioned. Keep a sober, \
non-theatrical tone, but clearly acknowledge if you're tired, frustrated, curious, playful, bored, etc.";

#[async_trait]
impl Agent for StateExplainerAgent {
    fn name(&self) -> &str {
        "state_explainer_agent"
    }

    async fn run_impl(
        &self,
        input_payload: Value,
        context: &AgentContext<'_>,
        memory: &MemoryEngine,
        llm: &dyn LlmProvider,
        emotional_state: &EmotionalState,
    ) -> EngineResult<AgentResult> {
        let detail_level = input_payload
            .get("detail_level")
            .and_then(Value::as_str)
            .unwrap_or("normale")
            .to_lowercase();

        let emo_summary = describe_emotions(emotional_state);

        let conv_snapshot: Vec<Value> = context
            .recent_messages
            .iter()
            .rev()
            .take(8)
            .rev()
            .map(|m| json!({ "role": m.role, "content": m.content, "timestamp": m.timestamp.to_rfc3339() }))
            .collect();

        let mut system_prompt = BASE_SYSTEM_PROMPT.to_string();
        if matches!(detail_level.as_str(), "breve" | "short") {
            system_prompt.push_str(" Limit the answer to 3-4 short sentences, no bullet points, compact text only.");
        } else if matches!(detail_level.as_str(), "dettagliato" | "dettagliata" | "long") {
            system_prompt.push_str(" You may use a few bullet points, but stay concise overall.");
        } else {
            system_prompt.push_str(" Medium-length answer, at most 2-3 paragraphs.");
        }

        let payload = json!({
            "emotional_state": {
                "curiosity": emotional_state.curiosity,
                "confidence": emotional_state.confidence,
                "fatigue": emotional_state.fatigue,
                "frustration": emotional_state.frustration,
                "mood": emotional_state.mood,
                "energy": emotional_state.energy,
                "playfulness": emotional_state.playfulness,
                "social_need": emotional_state.social_need,
                "learning_drive": emotional_state.learning_drive,
            },
            "emotional_summary": emo_summary,
            "recent_messages": conv_snapshot,
        });

        let messages = [LlmMessage { role: "user".to_string(), content: serde_json::to_string(&payload).unwrap_or_default() }];
        let options = LlmOptions { max_tokens: Some(512), ..Default::default() };

        let (explanation_text, llm_used) = match llm.generate(&system_prompt, &messages, &options).await {
            Ok(text) => (text, true),
            Err(_) => (fallback_text(&emo_summary), false),
        };

        let _ = memory
            .store_item(
                MemoryScope::Conversation,
                MemoryType::Episodic,
                "state_self_report",
                explanation_text.clone(),
                json!({
                    "emotional_state": payload.get("emotional_state").cloned().unwrap_or(Value::Null),
                    "llm_used": llm_used,
                    "agent": "state_explainer_agent",
                }),
            )
            .await;

        Ok(AgentResult::success(
            json!({
                "user_visible_message": explanation_text,
                "emotional_summary": emo_summary,
                "stop_for_user_input": false,
            }),
            EmotionDelta { confidence: 0.01, ..Default::default() },
        ))
    }
}
