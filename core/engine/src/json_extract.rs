use serde_json::Value;

/// Tolerant JSON-object extraction for language-model output. Tries a
/// direct parse first; if that fails, falls back to the first balanced
/// `{...}` substring found in `raw`. Returns `None` if neither succeeds.
///
/// This deliberately accepts malformed input that happens to contain a
/// well-formed substring (e.g. a model wrapping its JSON in prose) — a
/// named trade-off, not a defect (SPEC_FULL.md §9).
pub fn extract_json_object(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }

    let start = raw.find('{')?;
    let mut depth = 0i32;
    for (offset, ch) in raw[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return serde_json::from_str(&raw[start..end]).ok();
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_clean_json_directly() {
        let raw = r#"{"summary": "ok"}"#;
        assert_eq!(extract_json_object(raw), Some(json!({"summary": "ok"})));
    }

    #[test]
    fn extracts_json_wrapped_in_prose() {
        let raw = "Sure, here is the plan:\n```json\n{\"summary\": \"ok\", \"steps\": [1, 2]}\n```\nHope that helps!";
        assert_eq!(
            extract_json_object(raw),
            Some(json!({"summary": "ok", "steps": [1, 2]}))
        );
    }

    #[test]
    fn returns_none_when_no_object_present() {
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn handles_nested_braces() {
        let raw = r#"prefix {"a": {"b": 1}} suffix"#;
        assert_eq!(extract_json_object(raw), Some(json!({"a": {"b": 1}})));
    }
}
