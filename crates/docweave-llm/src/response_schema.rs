//! Adapt JSON Schema to the constrained subset structured-output backends accept

use serde_json::{Map, Value};

const STRIPPED_KEYS: [&str; 4] = ["$schema", "$id", "title", "description"];

/// Reduce a JSON-Schema-like value to a response-schema friendly shape.
///
/// - drops `$schema`, `$id`, `title`, `description`
/// - drops `additionalProperties` unless it is a schema object
/// - collapses type lists to one type, preferring the first non-null
/// - drops `required` when it is not a list
/// - recurses into `properties`, `definitions`, `items`, `allOf`, `anyOf`, `oneOf`
pub fn sanitize_response_schema(node: &Value) -> Value {
    match node {
        Value::Object(map) => Value::Object(sanitize_node(map)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_response_schema).collect()),
        other => other.clone(),
    }
}

fn sanitize_node(map: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();

    for (key, value) in map {
        if STRIPPED_KEYS.contains(&key.as_str()) {
            continue;
        }
        let sanitized = match (key.as_str(), value) {
            ("additionalProperties", v) if !v.is_object() => continue,
            ("required", v) if !v.is_array() => continue,
            ("type", Value::Array(types)) => collapse_type_list(types),
            ("properties" | "definitions", Value::Object(children)) => Value::Object(
                children
                    .iter()
                    .map(|(name, child)| (name.clone(), sanitize_response_schema(child)))
                    .collect(),
            ),
            ("items", v) => sanitize_response_schema(v),
            ("allOf" | "anyOf" | "oneOf", Value::Array(branches)) => {
                Value::Array(branches.iter().map(sanitize_response_schema).collect())
            }
            (_, v) => v.clone(),
        };
        out.insert(key.clone(), sanitized);
    }

    out
}

fn collapse_type_list(types: &[Value]) -> Value {
    let strings: Vec<&str> = types.iter().filter_map(Value::as_str).collect();
    if let Some(first) = strings.iter().find(|t| !t.eq_ignore_ascii_case("null")) {
        return Value::String((*first).to_string());
    }
    match (strings.last(), types.first()) {
        (Some(only_null), _) => Value::String((*only_null).to_string()),
        (None, Some(first)) => Value::String(first.to_string()),
        (None, None) => Value::Null,
    }
}
