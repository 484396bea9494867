use serde_json::{json, Map, Value};

use crate::models::ExtractedEntities;

/// Find the first syntactically valid JSON object embedded in free text.
///
/// Each `{` is tried left to right as the start of a JSON value; the first
/// one that parses as an object wins. Prose, code fences and trailing
/// commentary around the object are ignored.
///
/// A malformed outer object does not stop the scan: the next `{`, even one
/// nested inside the broken object, is tried as a candidate of its own. So
/// `{"a": {"b": 1}, oops}` yields `{"b": 1}`.
pub fn extract_first_json_object(text: &str) -> Option<Map<String, Value>> {
    text.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => Some(map),
            _ => None,
        }
    })
}

/// Model reply → analysis object. Replies without an object are kept as
/// an unstructured summary.
pub fn parse_analysis(reply: &str) -> Value {
    match extract_first_json_object(reply) {
        Some(map) => Value::Object(map),
        None => json!({
            "summary": reply,
            "structured": false,
        }),
    }
}

/// False only for the unstructured fallback produced by `parse_analysis`.
pub fn is_structured(analysis: &Value) -> bool {
    analysis.get("structured") != Some(&Value::Bool(false))
}

/// Build entity lists from a model-produced object.
///
/// Missing or null keys become empty lists, a bare scalar becomes a
/// one-item list, and non-string items are kept as their compact JSON.
pub fn entities_from_object(map: &Map<String, Value>) -> ExtractedEntities {
    let list = |key: &str| -> Vec<String> {
        match map.get(key) {
            None | Some(Value::Null) => vec![],
            Some(Value::Array(items)) => items
                .iter()
                .filter(|v| !v.is_null())
                .map(value_to_string)
                .collect(),
            Some(other) => vec![value_to_string(other)],
        }
    };

    ExtractedEntities {
        names: list("names"),
        dates: list("dates"),
        amounts: list("amounts"),
        addresses: list("addresses"),
        phone_numbers: list("phone_numbers"),
        emails: list("emails"),
        other: list("other"),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_object_in_fenced_reply() {
        let reply = "Here you go:\n```json\n{\"store\": \"Corner Shop\", \"total\": \"$4.00\"}\n```\nAnything else?";
        let map = extract_first_json_object(reply).unwrap();
        assert_eq!(map["store"], "Corner Shop");
    }

    #[test]
    fn skips_unbalanced_brace_before_valid_object() {
        let reply = "Use {braces carefully. {\"ok\": true}";
        let map = extract_first_json_object(reply).unwrap();
        assert_eq!(map["ok"], true);
    }

    #[test]
    fn returns_first_of_several_objects() {
        let reply = "{\"a\": 1} and then {\"b\": 2}";
        let map = extract_first_json_object(reply).unwrap();
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn nested_object_returned_whole() {
        let reply = "{\"outer\": {\"inner\": [1, 2]}}";
        let map = extract_first_json_object(reply).unwrap();
        assert_eq!(map["outer"]["inner"][1], 2);
    }

    #[test]
    fn no_object_returns_none() {
        assert!(extract_first_json_object("plain prose").is_none());
        assert!(extract_first_json_object("{ not json }").is_none());
        assert!(extract_first_json_object("").is_none());
    }

    #[test]
    fn malformed_outer_object_yields_nested_candidate() {
        let map = extract_first_json_object("{\"a\": {\"b\": 1}, oops}").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["b"], 1);
    }

    #[test]
    fn structured_flag_only_false_for_fallback() {
        assert!(!is_structured(&parse_analysis("Just prose.")));
        assert!(is_structured(&parse_analysis("{\"store\": \"Corner Shop\"}")));
        assert!(is_structured(&json!({"structured": true})));
    }

    #[test]
    fn parse_analysis_falls_back_to_summary() {
        let value = parse_analysis("Just a grocery receipt.");
        assert_eq!(value["summary"], "Just a grocery receipt.");
        assert_eq!(value["structured"], false);
    }

    #[test]
    fn entities_missing_keys_are_empty() {
        let map = extract_first_json_object("{\"names\": [\"Ana\"]}").unwrap();
        let entities = entities_from_object(&map);
        assert_eq!(entities.names, vec!["Ana"]);
        assert!(entities.dates.is_empty());
        assert!(entities.other.is_empty());
    }

    #[test]
    fn entities_non_string_items_stringified() {
        let map = extract_first_json_object(
            "{\"amounts\": [42.5, \"$3\"], \"other\": [{\"k\": \"v\"}, null], \"emails\": \"a@b.io\"}",
        )
        .unwrap();
        let entities = entities_from_object(&map);
        assert_eq!(entities.amounts, vec!["42.5", "$3"]);
        assert_eq!(entities.other, vec![r#"{"k":"v"}"#]);
        assert_eq!(entities.emails, vec!["a@b.io"]);
    }
}
