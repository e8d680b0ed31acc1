//! Payload types for the tool-invocation methods (`initialize`, `tools/list`,
//! `tools/call`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decodes an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Implementation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub server_info: Option<Implementation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default = "object_schema_type")]
    pub schema_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required: Vec<String>,
}

fn object_schema_type() -> String {
    "object".to_string()
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: object_schema_type(),
            properties: Map::new(),
            required: Vec::new(),
        }
    }
}

/// A named, schema-described remote operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input_schema: InputSchema,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListToolsResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EmbeddedResource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a tool response's `content` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        #[serde(default, deserialize_with = "null_as_default")]
        text: String,
    },
    Image {
        /// Base64-encoded image bytes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(
            rename = "mimeType",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        mime_type: Option<String>,
    },
    Resource {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uri: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resource: Option<EmbeddedResource>,
    },
    /// Content kinds this client does not understand (audio, links, ...).
    #[serde(other)]
    Unsupported,
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        ContentItem::Text { text: text.into() }
    }

    /// Typed view of one raw content entry. Entries that do not decode are
    /// `Unsupported`.
    pub fn from_value(value: &Value) -> Self {
        ContentItem::deserialize(value).unwrap_or(ContentItem::Unsupported)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ToolCallMeta {
    #[serde(
        rename = "openai/outputTemplate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_template: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `result` of a `tools/call` invocation. `content` is kept exactly as the
/// server sent it; [`ToolCallResponse::items`] gives the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ToolCallMeta>,
}

impl ToolCallResponse {
    pub fn items(&self) -> Vec<ContentItem> {
        self.content.iter().map(ContentItem::from_value).collect()
    }

    /// Joins every `text` item with newlines. Empty when there are none.
    pub fn text(&self) -> String {
        self.items()
            .into_iter()
            .filter_map(|item| match item {
                ContentItem::Text { text } => Some(text),
                ContentItem::Image { .. }
                | ContentItem::Resource { .. }
                | ContentItem::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn output_template(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.output_template.as_deref())
            .filter(|uri| !uri.trim().is_empty())
    }

    /// Data handed to a widget: the structured payload when present,
    /// otherwise the raw content list.
    pub fn widget_payload(&self) -> Value {
        match &self.structured_content {
            Some(structured) if !structured.is_null() => structured.clone(),
            _ => Value::Array(self.content.clone()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }
}
