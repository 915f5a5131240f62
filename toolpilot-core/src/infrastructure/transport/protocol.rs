//! MCP message shapes used by every transport.

use crate::domain::types::{SchemaValue, ToolDescriptor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2025-06-18";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_LIST_TOOLS: &str = "tools/list";
pub const METHOD_CALL_TOOL: &str = "tools/call";
pub const METHOD_PING: &str = "ping";

pub const METHOD_NOT_FOUND: i64 = -32601;

pub fn initialize_params() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "clientInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "title": "toolpilot"
        },
        "capabilities": {}
    })
}

pub fn list_tools_params(cursor: Option<&str>) -> Value {
    match cursor {
        Some(cursor) => json!({ "cursor": cursor }),
        None => json!({}),
    }
}

pub fn call_tool_params(tool: &str, arguments: Value) -> Value {
    json!({
        "name": tool,
        "arguments": match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        }
    })
}

/// Tool entry from a `tools/list` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl From<ToolInfo> for ToolDescriptor {
    fn from(info: ToolInfo) -> Self {
        ToolDescriptor {
            name: info.name,
            description: info.description,
            input_schema: info.input_schema.map(SchemaValue::from),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    #[serde(default)]
    pub tools: Vec<ToolInfo>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One content block of a tool result.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolContent {
    Text { text: String },
    Image { data: String, mime_type: String },
    Audio { data: String, mime_type: String },
    Resource { resource: Value },
    /// Block types this client does not model, kept verbatim.
    Other(Value),
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolContent::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            ToolContent::Text { text } => json!({ "type": "text", "text": text }),
            ToolContent::Image { data, mime_type } => {
                json!({ "type": "image", "data": data, "mimeType": mime_type })
            }
            ToolContent::Audio { data, mime_type } => {
                json!({ "type": "audio", "data": data, "mimeType": mime_type })
            }
            ToolContent::Resource { resource } => {
                json!({ "type": "resource", "resource": resource })
            }
            ToolContent::Other(value) => value.clone(),
        }
    }

    pub fn from_value(value: Value) -> Self {
        let field = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let parsed = match value.get("type").and_then(Value::as_str) {
            Some("text") => field("text").map(|text| ToolContent::Text { text }),
            Some("image") => field("data")
                .zip(field("mimeType"))
                .map(|(data, mime_type)| ToolContent::Image { data, mime_type }),
            Some("audio") => field("data")
                .zip(field("mimeType"))
                .map(|(data, mime_type)| ToolContent::Audio { data, mime_type }),
            Some("resource") => value
                .get("resource")
                .cloned()
                .map(|resource| ToolContent::Resource { resource }),
            _ => None,
        };
        parsed.unwrap_or(ToolContent::Other(value))
    }
}

impl Serialize for ToolContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ToolContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ToolContent::from_value)
    }
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default)]
    pub is_error: bool,
}

impl CallToolResult {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            ..Self::default()
        }
    }

    pub fn from_structured(value: Value) -> Self {
        Self {
            content: vec![ToolContent::text(value.to_string())],
            structured_content: Some(value),
            is_error: false,
        }
    }

    /// The value handed to the model for this result.
    ///
    /// Structured content wins; a `{"result": x}` wrapper unwraps to `x`.
    /// Without structured content the whole result stands for itself.
    pub fn payload(&self) -> Option<&Value> {
        let structured = self.structured_content.as_ref()?;
        match structured.as_object() {
            Some(map) if map.len() == 1 => map.get("result").or(Some(structured)),
            _ => Some(structured),
        }
    }

    /// Concatenated text blocks, if any.
    pub fn text(&self) -> Option<String> {
        let parts = self
            .content
            .iter()
            .filter_map(ToolContent::as_text)
            .collect::<Vec<_>>();
        (!parts.is_empty()).then(|| parts.join("\n"))
    }

    /// Canonical mapping of the result, as it appears on the wire.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert(
            "content".into(),
            Value::Array(self.content.iter().map(ToolContent::to_value).collect()),
        );
        if let Some(structured) = &self.structured_content {
            map.insert("structuredContent".into(), structured.clone());
        }
        map.insert("isError".into(), Value::Bool(self.is_error));
        map
    }
}
