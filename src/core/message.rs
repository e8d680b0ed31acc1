use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

/// Mutable state blob a widget keeps between renders.
pub type WidgetState = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// A renderable unit of structured response data bound to a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetInstance {
    pub id: String,
    pub widget_uri: String,
    /// Always the endpoint that produced the parent message.
    pub app_endpoint: String,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<WidgetState>,
}

impl WidgetInstance {
    pub fn new(widget_uri: impl Into<String>, app_endpoint: impl Into<String>, data: Value) -> Self {
        Self {
            id: format!("widget-{}", Uuid::new_v4()),
            widget_uri: widget_uri.into(),
            app_endpoint: app_endpoint.into(),
            data,
            state: None,
        }
    }
}

/// A finalized, immutable conversation entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub widgets: Option<Vec<WidgetInstance>>,
    pub timestamp: DateTime<Utc>,
    pub endpoint: Option<String>,
    pub source_name: Option<String>,
}

impl Message {
    pub fn widgets(&self) -> &[WidgetInstance] {
        self.widgets.as_deref().unwrap_or_default()
    }
}

/// Message fields supplied by the caller; id and timestamp are assigned by
/// the conversation store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub role: Role,
    pub content: String,
    pub widgets: Option<Vec<WidgetInstance>>,
    pub endpoint: Option<String>,
    pub source_name: Option<String>,
}

impl NewMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            widgets: None,
            endpoint: None,
            source_name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn with_widgets(mut self, widgets: Vec<WidgetInstance>) -> Self {
        self.widgets = Some(widgets);
        self
    }

    pub fn with_source(mut self, endpoint: impl Into<String>, name: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.source_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationMetadata {
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    /// Append-only; insertion order is display order.
    pub messages: Vec<Message>,
    pub widget_states: HashMap<String, WidgetState>,
    pub metadata: ConversationMetadata,
}

impl Conversation {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            widget_states: HashMap::new(),
            metadata: ConversationMetadata {
                started_at: now,
                last_activity: now,
            },
        }
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn widget(&self, widget_id: &str) -> Option<&WidgetInstance> {
        self.messages
            .iter()
            .flat_map(|message| message.widgets())
            .find(|widget| widget.id == widget_id)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
