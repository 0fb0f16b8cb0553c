//! Parse model text output into JSON

use crate::LlmError;
use serde_json::Value;

/// Parse a model reply as JSON, tolerating markdown code fences
pub fn parse_json_content(content: &str) -> Result<Value, LlmError> {
    let json_str = extract_json(content)?;
    serde_json::from_str(json_str)
        .map_err(|e| LlmError::InvalidResponse(format!("JSON parse error: {}", e)))
}

/// Extract the JSON payload, handling markdown code blocks
fn extract_json(content: &str) -> Result<&str, LlmError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(LlmError::InvalidResponse("Empty response".to_string()));
    }

    if let Some(fenced) = trimmed.strip_prefix("```") {
        // Drop the info string (```json) along with the opening fence
        let body = match fenced.find('\n') {
            Some(newline) => &fenced[newline + 1..],
            None => return Err(LlmError::InvalidResponse("Empty code block".to_string())),
        };
        let body = body.trim_end();
        let body = body.strip_suffix("```").unwrap_or(body);
        return Ok(body.trim());
    }

    Ok(trimmed)
}
