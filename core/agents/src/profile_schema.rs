//! Shared default-profile schema, grounded on `user_profile_agent.py`'s
//! `_ensure_base_profile` (duplicated verbatim in `preference_learner_agent.py`
//! and `curiosity_question_agent.py` in the original source; unified here so
//! the three consuming agents share one definition).

use chrono::Utc;
use serde_json::{json, Map, Value};

pub const SCHEMA_VERSION: u32 = 1;

fn default_profile(user_id: &str) -> Value {
    let now = Utc::now().to_rfc3339();
    json!({
        "schema_version": SCHEMA_VERSION,
        "user_id": user_id,
        "display_name": Value::Null,
        "last_seen": now,
        "basic_info": {
            "age_range": Value::Null,
            "location": Value::Null,
            "preferred_language": "it",
        },
        "interaction_style": {
            "prefers_short_answers": Value::Null,
            "likes_technical_detail": Value::Null,
            "likes_humor": Value::Null,
            "sensitivity_level": Value::Null,
            "formality": Value::Null,
        },
        "topics": {},
        "avoid_topics": [],
        "hobbies": [],
        "values": [],
        "conversational_prefs": {
            "likes_deep_conversations": Value::Null,
            "likes_current_events": Value::Null,
            "avoid_politics": Value::Null,
            "privacy_boundaries": [],
            "comfortable_with_personal_questions": Value::Null,
        },
        "recent_themes": [],
        "open_questions": [],
        "relationship_with_system": {
            "trust_level": Value::Null,
            "comfort_level": Value::Null,
            "notes": Value::Null,
        },
        "conversation_stats": {
            "total_sessions": 0,
            "total_messages": 0,
            "first_seen": now,
            "last_session_summary_id": Value::Null,
        },
        "meta": {
            "last_profile_update": Value::Null,
            "updated_by_agent": Value::Null,
            "notes": Value::Null,
        },
    })
}

/// Recursively fill `raw` with any key present in `default` but missing from
/// `raw`, descending into nested objects. Leaf values already present in
/// `raw` are never overwritten.
fn fill_missing(default: &Value, raw: &mut Value) {
    let (Value::Object(default_map), Value::Object(raw_map)) = (default, raw) else {
        return;
    };
    for (key, default_value) in default_map {
        match raw_map.get_mut(key) {
            Some(existing) => fill_missing(default_value, existing),
            None => {
                raw_map.insert(key.clone(), default_value.clone());
            }
        }
    }
}

/// Build (or repair) a user profile so every field the consuming agents read
/// is guaranteed present, without discarding any already-learned data.
pub fn ensure_base_profile(user_id: &str, raw_profile: Option<Value>) -> Value {
    let default = default_profile(user_id);
    let mut profile = match raw_profile {
        Some(Value::Object(map)) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };
    fill_missing(&default, &mut profile);
    profile
}

/// Stamp `meta.last_profile_update`/`meta.updated_by_agent` before persisting.
pub fn stamp_meta(profile: &mut Value, agent_name: &str) {
    if let Some(meta) = profile.get_mut("meta").and_then(Value::as_object_mut) {
        meta.insert(
            "last_profile_update".to_string(),
            json!(Utc::now().to_rfc3339()),
        );
        meta.insert("updated_by_agent".to_string(), json!(agent_name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_missing_top_level_and_nested_keys() {
        let raw = json!({ "display_name": "Ada", "basic_info": { "location": "Rome" } });
        let profile = ensure_base_profile("u1", Some(raw));
        assert_eq!(profile["display_name"], json!("Ada"));
        assert_eq!(profile["basic_info"]["location"], json!("Rome"));
        assert_eq!(profile["basic_info"]["preferred_language"], json!("it"));
        assert_eq!(profile["schema_version"], json!(SCHEMA_VERSION));
        assert!(profile["topics"].is_object());
    }

    #[test]
    fn builds_fresh_default_when_nothing_persisted() {
        let profile = ensure_base_profile("u2", None);
        assert_eq!(profile["user_id"], json!("u2"));
        assert_eq!(profile["conversation_stats"]["total_sessions"], json!(0));
    }
}
