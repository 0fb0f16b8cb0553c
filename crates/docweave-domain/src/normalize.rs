//! Canonicalization of provider output
//!
//! Normalization never fails. Declared fields are coerced toward their type
//! (or set to `null` when absent), record sets become lists of objects, and
//! anything undeclared is preserved under an `"extra"` key.

use crate::schema::{FieldType, InternalSchema, RecordSet};
use serde_json::{json, Map, Number, Value};

/// Normalize `data` into the canonical shape described by `schema`.
pub fn normalize_output(schema: &InternalSchema, data: &Value) -> Value {
    let Some(object) = schema.wrap_output(data) else {
        return json!({"data": data.clone(), "extra": {}});
    };

    let mut normalized = Map::new();

    for field in &schema.global_fields {
        let value = object
            .get(&field.name)
            .map(|v| coerce_value(&field.field_type, v))
            .unwrap_or(Value::Null);
        normalized.insert(field.name.clone(), value);
    }

    for rs in &schema.record_sets {
        let records = match object.get(&rs.name) {
            Some(Value::Array(records)) => records
                .iter()
                .filter_map(Value::as_object)
                .map(|record| normalize_record(rs, record))
                .collect(),
            _ => Vec::new(),
        };
        normalized.insert(rs.name.clone(), Value::Array(records));
    }

    let extra: Map<String, Value> = object
        .iter()
        .filter(|(key, _)| !normalized.contains_key(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !extra.is_empty() {
        normalized.insert("extra".to_string(), Value::Object(extra));
    }

    Value::Object(normalized)
}

fn normalize_record(rs: &RecordSet, record: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for field in &rs.fields {
        let value = record
            .get(&field.name)
            .map(|v| coerce_value(&field.field_type, v))
            .unwrap_or(Value::Null);
        out.insert(field.name.clone(), value);
    }

    let extra: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| !out.contains_key(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    if !extra.is_empty() {
        out.insert("extra".to_string(), Value::Object(extra));
    }

    Value::Object(out)
}

/// Best-effort coercion of `value` toward `expected`.
///
/// Returns the original value when no sensible conversion exists.
pub fn coerce_value(expected: &FieldType, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }

    let coerced = match expected {
        FieldType::String => Some(Value::String(render_text(value))),
        FieldType::Number => to_float(value)
            .and_then(Number::from_f64)
            .map(Value::Number),
        FieldType::Integer => to_integer(value),
        FieldType::Boolean => Some(Value::Bool(truthy(value))),
        _ => None,
    };

    coerced.unwrap_or_else(|| value.clone())
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(Value::Number(n.clone())),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
            .map(|f| Value::from(f.trunc() as i64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .map(Value::from)
                .or_else(|_| trimmed.parse::<u64>().map(Value::from))
                .ok()
        }
        Value::Bool(b) => Some(Value::from(i64::from(*b))),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "y"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{parse_schema, Field};

    fn invoice_schema() -> InternalSchema {
        InternalSchema {
            global_fields: vec![
                Field::new("invoice_id", FieldType::String).required(),
                Field::new("total", FieldType::Number),
                Field::new("paid", FieldType::Boolean),
            ],
            record_sets: vec![RecordSet::new(
                "line_items",
                vec![
                    Field::new("sku", FieldType::String),
                    Field::new("qty", FieldType::Integer),
                ],
            )],
        }
    }

    #[test]
    fn test_missing_fields_become_null_and_records_default_empty() {
        let out = normalize_output(&invoice_schema(), &json!({"invoice_id": "INV-1"}));
        assert_eq!(
            out,
            json!({"invoice_id": "INV-1", "total": null, "paid": null, "line_items": []})
        );
    }

    #[test]
    fn test_coercion_and_extras() {
        let out = normalize_output(
            &invoice_schema(),
            &json!({
                "invoice_id": 42,
                "total": "12.50",
                "paid": "Yes",
                "line_items": [
                    {"sku": "A1", "qty": "3", "color": "red"},
                    "not a record",
                    {"sku": 7, "qty": 2.9}
                ],
                "currency": "EUR"
            }),
        );

        assert_eq!(out["invoice_id"], "42");
        assert_eq!(out["total"], 12.5);
        assert_eq!(out["paid"], true);
        assert_eq!(
            out["line_items"],
            json!([
                {"sku": "A1", "qty": 3, "extra": {"color": "red"}},
                {"sku": "7", "qty": 2}
            ])
        );
        assert_eq!(out["extra"], json!({"currency": "EUR"}));
    }

    #[test]
    fn test_no_empty_extra() {
        let out = normalize_output(
            &invoice_schema(),
            &json!({"invoice_id": "x", "line_items": [{"sku": "a", "qty": 1}]}),
        );
        assert!(out.get("extra").is_none());
        assert!(out["line_items"][0].get("extra").is_none());
    }

    #[test]
    fn test_non_list_record_set_becomes_empty() {
        let out = normalize_output(&invoice_schema(), &json!({"line_items": {"sku": "a"}}));
        assert_eq!(out["line_items"], json!([]));
    }

    #[test]
    fn test_non_object_escape_hatch() {
        let out = normalize_output(&invoice_schema(), &json!("free text"));
        assert_eq!(out, json!({"data": "free text", "extra": {}}));

        let out = normalize_output(&invoice_schema(), &json!([1, 2]));
        assert_eq!(out, json!({"data": [1, 2], "extra": {}}));
    }

    #[test]
    fn test_top_level_list_scenario() {
        let schema = parse_schema(&json!({
            "type": "array",
            "items": {
                "properties": {"name": {"type": "string"}, "age": {"type": "integer"}},
                "required": ["name"]
            }
        }))
        .unwrap();

        let out = normalize_output(&schema, &json!([{"name": "Ada", "age": "36"}]));
        assert_eq!(out, json!({"items": [{"name": "Ada", "age": 36}]}));
    }

    #[test]
    fn test_coerce_string() {
        assert_eq!(coerce_value(&FieldType::String, &json!("x")), json!("x"));
        assert_eq!(coerce_value(&FieldType::String, &json!(1.5)), json!("1.5"));
        assert_eq!(coerce_value(&FieldType::String, &json!(true)), json!("true"));
        assert_eq!(coerce_value(&FieldType::String, &json!({"a": 1})), json!("{\"a\":1}"));
        assert_eq!(coerce_value(&FieldType::String, &Value::Null), Value::Null);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_value(&FieldType::Number, &json!(" 3.25 ")), json!(3.25));
        assert_eq!(coerce_value(&FieldType::Number, &json!(2)), json!(2.0));
        assert_eq!(coerce_value(&FieldType::Number, &json!(true)), json!(1.0));
        assert_eq!(coerce_value(&FieldType::Number, &json!("abc")), json!("abc"));
        assert_eq!(coerce_value(&FieldType::Number, &json!([1])), json!([1]));
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_value(&FieldType::Integer, &json!(-2.7)), json!(-2));
        assert_eq!(coerce_value(&FieldType::Integer, &json!(" 17 ")), json!(17));
        assert_eq!(coerce_value(&FieldType::Integer, &json!(false)), json!(0));
        assert_eq!(coerce_value(&FieldType::Integer, &json!("1.5")), json!("1.5"));
        assert_eq!(coerce_value(&FieldType::Integer, &json!(u64::MAX)), json!(u64::MAX));
    }

    #[test]
    fn test_coerce_boolean() {
        assert_eq!(coerce_value(&FieldType::Boolean, &json!(" TRUE ")), json!(true));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!("y")), json!(true));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!("no")), json!(false));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!(0)), json!(false));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!(0.5)), json!(true));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!([])), json!(false));
        assert_eq!(coerce_value(&FieldType::Boolean, &json!({"k": 1})), json!(true));
    }

    #[test]
    fn test_unknown_and_structural_types_untouched() {
        let value = json!({"nested": [1, "two"]});
        assert_eq!(coerce_value(&FieldType::Other("money".into()), &value), value);
        assert_eq!(coerce_value(&FieldType::Object, &json!("s")), json!("s"));
        assert_eq!(coerce_value(&FieldType::Array, &json!(5)), json!(5));
    }
}
