//! Structured-output extraction from model answers.
//!
//! Model answers are asked for as JSON but arrive in one of three shapes:
//! a bare JSON document, a ` ```json … ``` ` fence, or a plain ` ``` … ``` `
//! fence. Extraction strategies are tried in that order and the first
//! successful parse wins.
//!
//! Field accessors apply the harness-wide default-substitution policy:
//! absent numeric fields read as zero, absent text fields as empty.

use serde_json::Value;
use thiserror::Error;

/// The answer text contained no parseable JSON in any accepted form.
///
/// Distinct from transport failures: the remote call succeeded but the
/// content is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("answer is not valid JSON in any accepted form (bare, ```json fence, ``` fence)")]
pub struct StructuredParseError;

type Extractor = fn(&str) -> Option<&str>;

/// Candidate extraction strategies, tried in order.
const EXTRACTORS: &[Extractor] = &[whole_payload, json_fenced, bare_fenced];

fn whole_payload(text: &str) -> Option<&str> {
    Some(text)
}

fn json_fenced(text: &str) -> Option<&str> {
    fenced_block(text, "```json")
}

fn bare_fenced(text: &str) -> Option<&str> {
    fenced_block(text, "```")
}

/// Content between `opening` and the next closing ` ``` `.
fn fenced_block<'a>(text: &'a str, opening: &str) -> Option<&'a str> {
    let start = text.find(opening)? + opening.len();
    let end = text[start..].find("```")? + start;
    Some(&text[start..end])
}

/// Parse a model answer into a JSON value, trying each extraction strategy
/// in sequence.
pub fn parse_structured(text: &str) -> Result<Value, StructuredParseError> {
    for extract in EXTRACTORS {
        if let Some(candidate) = extract(text) {
            if let Ok(value) = serde_json::from_str::<Value>(candidate.trim()) {
                return Ok(value);
            }
        }
    }
    Err(StructuredParseError)
}

/// String field with empty-string default.
pub fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Numeric field with zero default. Accepts JSON numbers and numeric
/// strings (the service is inconsistent about which it sends).
pub fn f64_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// String-array field with empty-list default; non-string elements are
/// dropped.
pub fn str_list_field(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_json() {
        let parsed = parse_structured(r#"{"a":1}"#).unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn parses_json_fence() {
        let parsed = parse_structured("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn parses_plain_fence() {
        let parsed = parse_structured("```\n{\"a\":1}\n```").unwrap();
        assert_eq!(parsed, json!({"a": 1}));
    }

    #[test]
    fn all_three_forms_yield_equivalent_objects() {
        let forms = [
            r#"{"a":1}"#.to_string(),
            "```json\n{\"a\":1}\n```".to_string(),
            "```\n{\"a\":1}\n```".to_string(),
        ];
        let parsed: Vec<_> = forms
            .iter()
            .map(|f| parse_structured(f).unwrap())
            .collect();
        assert_eq!(parsed[0], parsed[1]);
        assert_eq!(parsed[1], parsed[2]);
    }

    #[test]
    fn fence_with_surrounding_prose() {
        let text = "Here is the campaign:\n```json\n{\"headline\":\"Go\"}\n```\nEnjoy!";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed["headline"], "Go");
    }

    #[test]
    fn no_valid_json_is_a_parse_error() {
        assert_eq!(parse_structured("not json at all"), Err(StructuredParseError));
        assert_eq!(parse_structured(""), Err(StructuredParseError));
        assert_eq!(
            parse_structured("```\nstill not json\n```"),
            Err(StructuredParseError)
        );
    }

    #[test]
    fn unterminated_fence_is_a_parse_error() {
        assert_eq!(
            parse_structured("```json\n{\"a\":1}"),
            Err(StructuredParseError)
        );
    }

    #[test]
    fn str_field_defaults_empty() {
        let v = json!({"headline": "Big Sale"});
        assert_eq!(str_field(&v, "headline"), "Big Sale");
        assert_eq!(str_field(&v, "missing"), "");
        assert_eq!(str_field(&json!({"headline": 3}), "headline"), "");
    }

    #[test]
    fn f64_field_accepts_numbers_and_numeric_strings() {
        let v = json!({"overall": 8.5, "price": "0.0000021", "bad": "nope"});
        assert!((f64_field(&v, "overall") - 8.5).abs() < f64::EPSILON);
        assert!((f64_field(&v, "price") - 0.0000021).abs() < 1e-12);
        assert_eq!(f64_field(&v, "bad"), 0.0);
        assert_eq!(f64_field(&v, "missing"), 0.0);
    }

    #[test]
    fn str_list_field_drops_non_strings() {
        let v = json!({"keywords": ["sale", 2, "deal"]});
        assert_eq!(str_list_field(&v, "keywords"), vec!["sale", "deal"]);
        assert!(str_list_field(&v, "missing").is_empty());
    }
}
