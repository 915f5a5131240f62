//! Adapts server tool descriptors into function-calling schemas.

use crate::domain::types::{SchemaValue, ToolDescriptor};
use serde_json::{Value, json};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Function-calling view of the tools one server advertises.
///
/// Iteration follows the server's listing order. When two descriptors share a
/// name the later one replaces the earlier one in place.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    name: String,
    schema: Value,
}

impl ToolCatalog {
    pub fn adapt(descriptors: Vec<ToolDescriptor>) -> Self {
        let mut catalog = Self::default();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        debug!(tools = catalog.len(), "Adapted tool catalog");
        catalog
    }

    pub fn insert(&mut self, descriptor: ToolDescriptor) {
        let name = descriptor.name.clone();
        let schema = function_schema(descriptor);
        match self.index.get(&name) {
            Some(&position) => {
                warn!(tool = %name, "duplicate tool name, keeping the last definition");
                self.entries[position].schema = schema;
            }
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push(CatalogEntry { name, schema });
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index
            .get(name)
            .map(|&position| &self.entries[position].schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|entry| &entry.schema)
    }

    /// Argument names the tool's schema marks as required.
    pub fn required_arguments(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(|schema| schema.pointer("/function/parameters/required"))
            .and_then(Value::as_array)
            .map(|required| {
                required
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every schema as a JSON array, in listing order.
    pub fn to_value(&self) -> Value {
        Value::Array(self.schemas().cloned().collect())
    }
}

fn function_schema(descriptor: ToolDescriptor) -> Value {
    let parameters = match descriptor.input_schema {
        Some(schema @ SchemaValue::Object(_)) => schema.to_json(),
        Some(other) => {
            warn!(
                tool = %descriptor.name,
                schema = ?other,
                "tool schema is not an object, using an empty one"
            );
            json!({})
        }
        None => json!({}),
    };
    json!({
        "type": "function",
        "function": {
            "name": descriptor.name,
            "description": descriptor.description.unwrap_or_default(),
            "parameters": parameters
        }
    })
}
