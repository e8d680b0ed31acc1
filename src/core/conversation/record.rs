//! Persisted form of a conversation.
//!
//! This is the only place that converts between the in-memory
//! [`Conversation`] and its stored JSON text: timestamps become RFC 3339
//! strings and the widget-state map becomes a list of `[id, state]` pairs
//! sorted by widget id.

use crate::core::message::{
    Conversation, ConversationMetadata, Message, Role, WidgetInstance, WidgetState,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid conversation record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationRecord {
    id: String,
    #[serde(default)]
    messages: Vec<MessageRecord>,
    #[serde(default)]
    widget_states: Vec<(String, WidgetState)>,
    metadata: MetadataRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord {
    id: String,
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    widgets: Option<Vec<WidgetInstance>>,
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataRecord {
    started_at: String,
    last_activity: String,
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RecordError> {
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|source| RecordError::Timestamp {
            value: value.to_string(),
            source,
        })
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            role: message.role,
            content: message.content.clone(),
            widgets: message.widgets.clone(),
            timestamp: format_timestamp(&message.timestamp),
            endpoint: message.endpoint.clone(),
            source_name: message.source_name.clone(),
        }
    }
}

impl TryFrom<MessageRecord> for Message {
    type Error = RecordError;

    fn try_from(record: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Message {
            timestamp: parse_timestamp(&record.timestamp)?,
            id: record.id,
            role: record.role,
            content: record.content,
            widgets: record.widgets,
            endpoint: record.endpoint,
            source_name: record.source_name,
        })
    }
}

pub fn encode(conversation: &Conversation) -> Result<Vec<u8>, RecordError> {
    let mut widget_states: Vec<(String, WidgetState)> = conversation
        .widget_states
        .iter()
        .map(|(id, state)| (id.clone(), state.clone()))
        .collect();
    widget_states.sort_by(|a, b| a.0.cmp(&b.0));

    let record = ConversationRecord {
        id: conversation.id.clone(),
        messages: conversation.messages.iter().map(MessageRecord::from).collect(),
        widget_states,
        metadata: MetadataRecord {
            started_at: format_timestamp(&conversation.metadata.started_at),
            last_activity: format_timestamp(&conversation.metadata.last_activity),
        },
    };
    Ok(serde_json::to_vec(&record)?)
}

pub fn decode(bytes: &[u8]) -> Result<Conversation, RecordError> {
    let record: ConversationRecord = serde_json::from_slice(bytes)?;
    let messages = record
        .messages
        .into_iter()
        .map(Message::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Conversation {
        id: record.id,
        messages,
        widget_states: record.widget_states.into_iter().collect(),
        metadata: ConversationMetadata {
            started_at: parse_timestamp(&record.metadata.started_at)?,
            last_activity: parse_timestamp(&record.metadata.last_activity)?,
        },
    })
}
