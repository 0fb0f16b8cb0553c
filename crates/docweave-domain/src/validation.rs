//! Structural validation of provider output against an [`InternalSchema`]
//!
//! Checks required-key presence and the lenient type table only. A present
//! `null` satisfies a required field; an absent key does not.

use crate::error::{DocweaveError, Result};
use crate::schema::InternalSchema;
use serde_json::Value;

/// Validate `data` against `schema`, failing on the first violation.
pub fn validate_output(schema: &InternalSchema, data: &Value) -> Result<()> {
    let data = schema
        .wrap_output(data)
        .ok_or_else(|| DocweaveError::Schema("Provider output must be a dictionary".to_string()))?;

    for field in &schema.global_fields {
        match data.get(&field.name) {
            None if field.required => {
                return Err(DocweaveError::Schema(format!(
                    "Missing required field '{}'",
                    field.name
                )))
            }
            Some(value) if !field.field_type.accepts(value) => {
                return Err(DocweaveError::Schema(format!(
                    "Field '{}' expected type {}",
                    field.name, field.field_type
                )))
            }
            _ => {}
        }
    }

    for rs in &schema.record_sets {
        let records = match data.get(&rs.name) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(records)) => records,
            Some(_) => {
                return Err(DocweaveError::Schema(format!(
                    "Record set '{}' must be a list",
                    rs.name
                )))
            }
        };

        for (idx, record) in records.iter().enumerate() {
            let record = record.as_object().ok_or_else(|| {
                DocweaveError::Schema(format!("Record {} in '{}' must be an object", idx, rs.name))
            })?;

            for field in &rs.fields {
                match record.get(&field.name) {
                    None if field.required => {
                        return Err(DocweaveError::Schema(format!(
                            "Missing required field '{}' in record {} of '{}'",
                            field.name, idx, rs.name
                        )))
                    }
                    Some(value) if !field.field_type.accepts(value) => {
                        return Err(DocweaveError::Schema(format!(
                            "Field '{}' in record {} of '{}' expected type {}",
                            field.name, idx, rs.name, field.field_type
                        )))
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}
