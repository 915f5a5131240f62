//! Total normalization of tool results into JSON.
//!
//! A [`ToolValue`] advertises which shapes it can take; [`serialize`] probes
//! them in a fixed order and always produces a value.

use crate::infrastructure::transport::{CallToolResult, ToolContent};
use serde_json::{Map, Value};

/// Nesting depth after which serialization gives up on structure.
pub const MAX_DEPTH: usize = 64;

/// Length cap, in characters, of the string fallback.
pub const MAX_FALLBACK_LEN: usize = 2048;

/// Shapes a tool result can expose. Probed in declaration order.
pub trait ToolValue {
    /// String, number, boolean or null.
    fn primitive(&self) -> Option<Value> {
        None
    }

    fn sequence(&self) -> Option<Vec<&dyn ToolValue>> {
        None
    }

    fn mapping(&self) -> Option<Vec<(&str, &dyn ToolValue)>> {
        None
    }

    /// Content wrapper carrying a single piece of text.
    fn text(&self) -> Option<&str> {
        None
    }

    /// Canonical conversion into a mapping.
    fn to_dict(&self) -> Option<Map<String, Value>> {
        None
    }

    /// Inspectable fields.
    fn attributes(&self) -> Option<Vec<(&str, &dyn ToolValue)>> {
        None
    }

    /// Must terminate even for self-referential values.
    fn describe(&self) -> String;
}

struct DepthExceeded;

pub fn serialize(value: &dyn ToolValue) -> Value {
    match serialize_at(value, 0) {
        Ok(serialized) => serialized,
        Err(DepthExceeded) => Value::String(truncate(value.describe(), MAX_FALLBACK_LEN)),
    }
}

fn serialize_at(value: &dyn ToolValue, depth: usize) -> Result<Value, DepthExceeded> {
    if depth > MAX_DEPTH {
        return Err(DepthExceeded);
    }
    if let Some(primitive) = value.primitive() {
        return Ok(primitive);
    }
    if let Some(items) = value.sequence() {
        return items
            .into_iter()
            .map(|item| serialize_at(item, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }
    if let Some(entries) = value.mapping() {
        return serialize_entries(entries, depth);
    }
    if let Some(text) = value.text() {
        return Ok(Value::String(text.to_string()));
    }
    if let Some(dict) = value.to_dict() {
        let dict = Value::Object(dict);
        return serialize_at(&dict, depth + 1);
    }
    if let Some(attributes) = value.attributes() {
        return serialize_entries(attributes, depth);
    }
    Ok(Value::String(value.describe()))
}

fn serialize_entries(
    entries: Vec<(&str, &dyn ToolValue)>,
    depth: usize,
) -> Result<Value, DepthExceeded> {
    let mut map = Map::new();
    for (key, item) in entries {
        map.insert(key.to_string(), serialize_at(item, depth + 1)?);
    }
    Ok(Value::Object(map))
}

fn truncate(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text,
    }
}

impl ToolValue for Value {
    fn primitive(&self) -> Option<Value> {
        match self {
            Value::Array(_) | Value::Object(_) => None,
            other => Some(other.clone()),
        }
    }

    fn sequence(&self) -> Option<Vec<&dyn ToolValue>> {
        self.as_array()
            .map(|items| items.iter().map(|item| item as &dyn ToolValue).collect())
    }

    fn mapping(&self) -> Option<Vec<(&str, &dyn ToolValue)>> {
        self.as_object().map(|map| {
            map.iter()
                .map(|(key, value)| (key.as_str(), value as &dyn ToolValue))
                .collect()
        })
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl ToolValue for String {
    fn primitive(&self) -> Option<Value> {
        Some(Value::String(self.clone()))
    }

    fn describe(&self) -> String {
        self.clone()
    }
}

impl ToolValue for bool {
    fn primitive(&self) -> Option<Value> {
        Some(Value::Bool(*self))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl ToolValue for i64 {
    fn primitive(&self) -> Option<Value> {
        Some(Value::from(*self))
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl<T: ToolValue> ToolValue for Vec<T> {
    fn sequence(&self) -> Option<Vec<&dyn ToolValue>> {
        Some(self.iter().map(|item| item as &dyn ToolValue).collect())
    }

    fn describe(&self) -> String {
        let parts = self.iter().map(ToolValue::describe).collect::<Vec<_>>();
        format!("[{}]", parts.join(", "))
    }
}

impl ToolValue for ToolContent {
    fn text(&self) -> Option<&str> {
        self.as_text()
    }

    fn to_dict(&self) -> Option<Map<String, Value>> {
        match self.to_value() {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn primitive(&self) -> Option<Value> {
        match self {
            ToolContent::Other(value) if !value.is_array() && !value.is_object() => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    fn describe(&self) -> String {
        self.to_value().to_string()
    }
}

impl ToolValue for CallToolResult {
    fn attributes(&self) -> Option<Vec<(&str, &dyn ToolValue)>> {
        let mut fields: Vec<(&str, &dyn ToolValue)> =
            vec![("content", &self.content as &dyn ToolValue)];
        if let Some(structured) = &self.structured_content {
            fields.push(("structuredContent", structured as &dyn ToolValue));
        }
        fields.push(("isError", &self.is_error as &dyn ToolValue));
        Some(fields)
    }

    fn describe(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }
}
