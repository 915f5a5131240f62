use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;

/// In-process validator or hook attached to a schema node.
pub type SchemaHook = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// JSON-schema-like tree that may also carry invokable leaves.
///
/// Schemas decoded off the wire never contain [`SchemaValue::Callable`];
/// in-process registries may attach them and the catalog adapter strips them
/// before anything reaches the model.
#[derive(Clone)]
pub enum SchemaValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<SchemaValue>),
    /// Insertion-ordered entries.
    Object(Vec<(String, SchemaValue)>),
    Callable(SchemaHook),
}

impl SchemaValue {
    pub fn is_callable(&self) -> bool {
        matches!(self, SchemaValue::Callable(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, SchemaValue::Object(_))
    }

    pub fn get(&self, key: &str) -> Option<&SchemaValue> {
        match self {
            SchemaValue::Object(entries) => entries
                .iter()
                .rev()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Plain JSON with every callable entry dropped, at any depth.
    pub fn to_json(&self) -> Value {
        match self {
            SchemaValue::Null | SchemaValue::Callable(_) => Value::Null,
            SchemaValue::Bool(flag) => Value::Bool(*flag),
            SchemaValue::Number(number) => Value::Number(number.clone()),
            SchemaValue::String(text) => Value::String(text.clone()),
            SchemaValue::Array(items) => Value::Array(
                items
                    .iter()
                    .filter(|item| !item.is_callable())
                    .map(SchemaValue::to_json)
                    .collect(),
            ),
            SchemaValue::Object(entries) => {
                let mut map = Map::new();
                for (key, value) in entries.iter().filter(|(_, v)| !v.is_callable()) {
                    map.insert(key.clone(), value.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Value> for SchemaValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => SchemaValue::Null,
            Value::Bool(flag) => SchemaValue::Bool(flag),
            Value::Number(number) => SchemaValue::Number(number),
            Value::String(text) => SchemaValue::String(text),
            Value::Array(items) => {
                SchemaValue::Array(items.into_iter().map(SchemaValue::from).collect())
            }
            Value::Object(map) => SchemaValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, SchemaValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for SchemaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaValue::Callable(_) => f.write_str("Callable(..)"),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

/// A tool as advertised by the server.
#[derive(Debug, Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<SchemaValue>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<SchemaValue>) -> Self {
        self.input_schema = Some(schema.into());
        self
    }
}

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id, when the provider reports one.
    pub id: Option<String>,
    pub name: String,
    /// Raw JSON argument text exactly as the model produced it.
    pub arguments: String,
}

impl ToolCallRequest {
    pub fn new(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}
