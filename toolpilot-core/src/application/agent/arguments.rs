//! Model-produced argument text to a validated argument mapping.

use super::errors::ToolCallError;
use serde_json::{Map, Value};

/// Empty text means no arguments; anything else must be a JSON object.
pub fn parse(tool: &str, raw: &str) -> Result<Map<String, Value>, ToolCallError> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(ToolCallError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("expected a JSON object, got {}", kind(&other)),
        }),
        Err(err) => Err(ToolCallError::InvalidArguments {
            tool: tool.to_string(),
            reason: err.to_string(),
        }),
    }
}

pub fn check_required(
    tool: &str,
    arguments: &Map<String, Value>,
    required: &[String],
) -> Result<(), ToolCallError> {
    let missing = required
        .iter()
        .filter(|name| !arguments.contains_key(name.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ToolCallError::MissingArguments {
            tool: tool.to_string(),
            missing,
        })
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
