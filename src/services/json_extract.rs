//! Extraction of a JSON object from free-form LLM output.
//!
//! Text-generation providers routinely wrap the requested JSON in prose or
//! Markdown code fences, so every provider adapter funnels its raw text
//! through [`extract_json_object`] instead of parsing the response body
//! directly.

use serde_json::Value;

/// Extract and parse the first balanced `{...}` object found in `text`.
///
/// Returns `None` when no opening brace exists, the braces never balance
/// (truncated output), or the balanced span is not valid JSON.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let candidate = &text[start..];

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in candidate.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let span = &candidate[..idx + ch.len_utf8()];
                    return serde_json::from_str(span).ok();
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
    fn test_bare_object() {
        let parsed = extract_json_object(r#"{"positive": ["Wisdom"], "negative": []}"#).unwrap();
        assert_eq!(parsed, json!({"positive": ["Wisdom"], "negative": []}));
    }

    #[test]
    fn test_prose_wrapped() {
        let text = r#"Here is the analysis you asked for:
            {"type": "Strategic Thinker", "summary": "..."}
            I hope this helps!"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["type"], "Strategic Thinker");
    }

    #[test]
    fn test_code_fenced() {
        let text = "```json\n{\"positive\": [\"Empathy\"]}\n```";
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["positive"][0], "Empathy");
    }

    #[test]
    fn test_nested_objects() {
        let text = r#"{"features": {"dahi": "high", "mata": "sharp"}, "summary": "ok"}"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["features"]["dahi"], "high");
    }

    #[test]
    fn test_braces_inside_strings() {
        let text = r#"{"summary": "uses { and } freely", "type": "x"}"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["summary"], "uses { and } freely");
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"summary": "a \"quoted\" word"}"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["summary"], "a \"quoted\" word");
    }

    #[test]
    fn test_truncated_output() {
        assert!(extract_json_object(r#"{"positive": ["Wisdom", "Confid"#).is_none());
    }

    #[test]
    fn test_no_object_at_all() {
        assert!(extract_json_object("The model declined to answer.").is_none());
    }

    #[test]
    fn test_balanced_but_invalid_json() {
        assert!(extract_json_object("{positive: yes}").is_none());
    }
}
