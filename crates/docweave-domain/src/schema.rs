//! Schema model: lenient JSON-Schema-like declarations parsed into a flat
//! internal form of global fields plus named record sets.
//!
//! Parsing is permissive. Unknown keys are ignored, unknown
//! field types pass through, and malformed entries are skipped rather than
//! rejected. Only structurally unusable top-level declarations fail.

use crate::error::{DocweaveError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// Declared type of a field
///
/// Type names are lower-cased on construction. Names outside the six known
/// types are kept verbatim in [`FieldType::Other`] and accept any value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// JSON number without a fractional part
    Integer,
    /// JSON boolean
    Boolean,
    /// JSON object
    Object,
    /// JSON array
    Array,
    /// Unrecognized type name (lenient passthrough)
    Other(String),
}

impl FieldType {
    /// Parse a type name; empty names default to `string`
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        match lowered.as_str() {
            "" | "string" => FieldType::String,
            "number" => FieldType::Number,
            "integer" => FieldType::Integer,
            "boolean" => FieldType::Boolean,
            "object" => FieldType::Object,
            "array" => FieldType::Array,
            _ => FieldType::Other(lowered),
        }
    }

    /// Type name as declared (lower-cased)
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Other(name) => name,
        }
    }

    /// Whether this is one of the six recognized types
    pub fn is_known(&self) -> bool {
        !matches!(self, FieldType::Other(_))
    }

    /// Type check used by validation. `null` always passes.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return true;
        }
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
            FieldType::Other(_) => true,
        }
    }
}

impl From<String> for FieldType {
    fn from(raw: String) -> Self {
        FieldType::parse(&raw)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single named, typed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name (key in the output object)
    pub name: String,

    /// Declared type
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,

    /// Whether the key must be present in provider output
    #[serde(default)]
    pub required: bool,

    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_field_type() -> FieldType {
    FieldType::String
}

impl Field {
    /// Create an optional field
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            description: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn json_schema(&self) -> Value {
        let mut node = Map::new();
        if self.field_type.is_known() {
            node.insert("type".to_string(), json!(self.field_type.as_str()));
        }
        if let Some(description) = &self.description {
            node.insert("description".to_string(), json!(description));
        }
        Value::Object(node)
    }
}

/// A named array-of-objects sub-schema (e.g. `line_items`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Key under which the records appear
    pub name: String,

    /// Fields of each record, in declaration order
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl RecordSet {
    /// Create a record set
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Normalized schema: flat global fields plus named record sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalSchema {
    /// Top-level fields
    #[serde(default)]
    pub global_fields: Vec<Field>,

    /// Named record collections
    #[serde(default)]
    pub record_sets: Vec<RecordSet>,
}

impl InternalSchema {
    /// Parse a raw declaration. See [`parse_schema`].
    pub fn parse(raw: &Value) -> Result<Self> {
        parse_schema(raw)
    }

    /// The only record set, when the schema has exactly one and no global
    /// fields. Such schemas also accept a top-level array.
    pub fn single_record_set(&self) -> Option<&RecordSet> {
        match (self.global_fields.is_empty(), self.record_sets.as_slice()) {
            (true, [only]) => Some(only),
            _ => None,
        }
    }

    /// Whether `key` is a declared global field or record set name
    pub fn declares(&self, key: &str) -> bool {
        self.global_fields.iter().any(|f| f.name == key)
            || self.record_sets.iter().any(|rs| rs.name == key)
    }

    /// View provider output as an object, wrapping a top-level array under
    /// the single record set's name when allowed.
    pub(crate) fn wrap_output<'a>(&self, data: &'a Value) -> Option<Cow<'a, Map<String, Value>>> {
        match data {
            Value::Object(map) => Some(Cow::Borrowed(map)),
            Value::Array(_) => self.single_record_set().map(|rs| {
                let mut wrapped = Map::new();
                wrapped.insert(rs.name.clone(), data.clone());
                Cow::Owned(wrapped)
            }),
            _ => None,
        }
    }

    /// Explicit internal form (`{"global_fields": [...], "record_sets": [...]}`)
    pub fn to_value(&self) -> Value {
        json!({
            "global_fields": self.global_fields.iter().map(field_entry).collect::<Vec<_>>(),
            "record_sets": self.record_sets.iter().map(|rs| json!({
                "name": rs.name,
                "fields": rs.fields.iter().map(field_entry).collect::<Vec<_>>(),
            })).collect::<Vec<_>>(),
        })
    }

    /// JSON-Schema object describing the expected output, for providers that
    /// accept a response schema.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.global_fields {
            properties.insert(field.name.clone(), field.json_schema());
        }
        // Record sets win over a same-named array field
        for rs in &self.record_sets {
            let item_properties: Map<String, Value> = rs
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.json_schema()))
                .collect();
            properties.insert(
                rs.name.clone(),
                json!({
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": item_properties,
                        "required": required_names(&rs.fields),
                    },
                }),
            );
        }
        json!({
            "type": "object",
            "properties": properties,
            "required": required_names(&self.global_fields),
        })
    }
}

fn field_entry(field: &Field) -> Value {
    let mut entry = json!({
        "name": field.name,
        "type": field.field_type.as_str(),
        "required": field.required,
    });
    if let (Some(description), Value::Object(map)) = (&field.description, &mut entry) {
        map.insert("description".to_string(), json!(description));
    }
    entry
}

fn required_names(fields: &[Field]) -> Vec<&str> {
    fields
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name.as_str())
        .collect()
}

/// Parse a lenient JSON-Schema-like declaration into an [`InternalSchema`].
///
/// Priority order:
/// 1. explicit `global_fields` / `record_sets` lists
/// 2. `"type": "array"` with an `items` object → one record set
/// 3. object schema with `properties`, optional `record_sets`/`records`
///    siblings, and auto-promotion of array-of-object properties
pub fn parse_schema(raw: &Value) -> Result<InternalSchema> {
    let raw = raw
        .as_object()
        .ok_or_else(|| DocweaveError::Schema("Schema must be a dictionary".to_string()))?;

    let global_fields = match raw.get("global_fields") {
        Some(Value::Array(entries)) => fields_from_list(entries),
        _ => Vec::new(),
    };
    let record_sets = match raw.get("record_sets") {
        Some(Value::Array(entries)) => entries.iter().filter_map(record_set_from_entry).collect(),
        _ => Vec::new(),
    };

    if global_fields.is_empty() && record_sets.is_empty() {
        return from_json_schema(raw);
    }

    Ok(InternalSchema {
        global_fields,
        record_sets,
    })
}

fn from_json_schema(raw: &Map<String, Value>) -> Result<InternalSchema> {
    if is_array_type(raw.get("type")) {
        let items = match raw.get("items") {
            Some(Value::Object(items)) => items,
            _ => {
                return Err(DocweaveError::Schema(
                    "Array schema requires an 'items' object".to_string(),
                ))
            }
        };
        let fields = match items.get("properties") {
            Some(Value::Object(props)) => fields_from_properties(props, items.get("required")),
            _ => Vec::new(),
        };
        let name = raw
            .get("title")
            .and_then(Value::as_str)
            .filter(|title| !title.is_empty())
            .unwrap_or("items");
        return Ok(InternalSchema {
            global_fields: Vec::new(),
            record_sets: vec![RecordSet::new(name, fields)],
        });
    }

    let declares_object = match raw.get("type") {
        None | Some(Value::Null) => true,
        Some(Value::String(t)) => t.eq_ignore_ascii_case("object"),
        Some(_) => false,
    };
    if !declares_object && !raw.contains_key("properties") {
        return Err(DocweaveError::Schema(
            "Top-level schema must be an object".to_string(),
        ));
    }

    let empty = Map::new();
    let properties = raw
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let global_fields = fields_from_properties(properties, raw.get("required"));

    let declared = match raw.get("record_sets") {
        Some(Value::Array(entries)) if !entries.is_empty() => Some(entries),
        _ => raw.get("records").and_then(Value::as_array),
    };
    let mut record_sets: Vec<RecordSet> = declared
        .map(|entries| entries.iter().filter_map(record_set_from_entry).collect())
        .unwrap_or_default();

    // Shorthand: an array property whose items declare properties
    for (name, prop) in properties {
        let Some(prop) = prop.as_object() else {
            continue;
        };
        if !matches!(prop.get("type"), Some(Value::String(t)) if t.eq_ignore_ascii_case("array")) {
            continue;
        }
        let Some(Value::Object(items)) = prop.get("items") else {
            continue;
        };
        if let Some(Value::Object(item_props)) = items.get("properties") {
            record_sets.push(RecordSet::new(
                name.clone(),
                fields_from_properties(item_props, items.get("required")),
            ));
        }
    }

    Ok(InternalSchema {
        global_fields,
        record_sets,
    })
}

fn is_array_type(value: Option<&Value>) -> bool {
    match value {
        Some(Value::String(t)) => t.eq_ignore_ascii_case("array"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|t| t.eq_ignore_ascii_case("array")),
        _ => false,
    }
}

fn record_set_from_entry(entry: &Value) -> Option<RecordSet> {
    let entry = entry.as_object()?;
    let name = entry.get("name")?.as_str()?;
    let fields = match (entry.get("fields"), entry.get("properties")) {
        (Some(Value::Array(list)), _) => fields_from_list(list),
        (_, Some(Value::Object(props))) => fields_from_properties(props, entry.get("required")),
        _ => Vec::new(),
    };
    Some(RecordSet::new(name, fields))
}

fn fields_from_properties(props: &Map<String, Value>, required: Option<&Value>) -> Vec<Field> {
    let required: HashSet<&str> = required
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    props
        .iter()
        .filter_map(|(name, spec)| {
            let spec = spec.as_object()?;
            Some(Field {
                name: name.clone(),
                field_type: type_of(spec),
                required: required.contains(name.as_str()) || flagged_required(spec),
                description: description_of(spec),
            })
        })
        .collect()
}

fn fields_from_list(entries: &[Value]) -> Vec<Field> {
    entries
        .iter()
        .filter_map(|entry| {
            let entry = entry.as_object()?;
            let name = entry.get("name")?.as_str()?;
            Some(Field {
                name: name.to_string(),
                field_type: type_of(entry),
                required: flagged_required(entry),
                description: description_of(entry),
            })
        })
        .collect()
}

fn type_of(spec: &Map<String, Value>) -> FieldType {
    match spec.get("type") {
        None | Some(Value::Null) => FieldType::String,
        Some(Value::String(t)) => FieldType::parse(t),
        // Nullable unions like ["string", "null"]
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| !t.eq_ignore_ascii_case("null"))
            .map(FieldType::parse)
            .unwrap_or(FieldType::String),
        Some(other) => FieldType::parse(&other.to_string()),
    }
}

fn flagged_required(spec: &Map<String, Value>) -> bool {
    matches!(spec.get("required"), Some(Value::Bool(true)))
}

fn description_of(spec: &Map<String, Value>) -> Option<String> {
    spec.get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
}
