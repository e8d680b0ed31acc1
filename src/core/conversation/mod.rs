//! The active conversation and its durable copy.
//!
//! The in-memory conversation is the source of truth. Every mutation is
//! written through to the [`KeyValueStore`] immediately; storage failures are
//! logged and otherwise ignored so a broken disk never interrupts a chat.

pub mod record;

use crate::core::message::{Conversation, Message, NewMessage, WidgetState};
use crate::core::storage::KeyValueStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

pub const CONVERSATION_KEY_PREFIX: &str = "nlweb:conversation:";
/// Holds the id of the conversation a restarted process should resume.
pub const CURRENT_CONVERSATION_KEY: &str = "nlweb:current-conversation";

pub fn conversation_key(conversation_id: &str) -> String {
    format!("{CONVERSATION_KEY_PREFIX}{conversation_id}")
}

pub struct ConversationStore {
    storage: Arc<dyn KeyValueStore>,
    current: Option<Conversation>,
}

impl ConversationStore {
    /// A store with no active conversation; one is created on first access.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    /// A store that continues the conversation recorded as current in
    /// `storage`, if that record can still be read.
    pub fn resume(storage: Arc<dyn KeyValueStore>) -> Self {
        let mut store = Self::new(storage);
        store.current = store
            .current_pointer()
            .and_then(|conversation_id| store.restore(&conversation_id));
        if let Some(conversation) = &store.current {
            debug!(conversation_id = %conversation.id, "Resumed conversation");
        }
        store
    }

    /// Returns the active conversation, creating and persisting an empty one
    /// if there is none.
    pub fn current_conversation(&mut self) -> &Conversation {
        self.current_mut()
    }

    /// The active conversation, without creating one.
    pub fn current_if_any(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Starts a fresh conversation, replacing the active one in memory. The
    /// previous record stays in storage.
    pub fn create_conversation(&mut self) -> &Conversation {
        let conversation = Conversation::new();
        debug!(conversation_id = %conversation.id, "Created conversation");
        self.write_pointer(&conversation.id);
        self.current = Some(conversation);
        self.persist_current();
        self.current.get_or_insert_with(Conversation::new)
    }

    fn current_mut(&mut self) -> &mut Conversation {
        if self.current.is_none() {
            self.create_conversation();
        }
        self.current.get_or_insert_with(Conversation::new)
    }

    /// Finalizes `message` with a fresh id and timestamp, appends it, and
    /// persists the conversation.
    pub fn add_message(&mut self, message: NewMessage) -> Message {
        let conversation = self.current_mut();

        // Keep timestamps non-decreasing even if the wall clock steps back.
        let now = Utc::now();
        let timestamp = conversation
            .last_message()
            .map_or(now, |last| last.timestamp.max(now));

        let message = Message {
            id: Uuid::new_v4().to_string(),
            role: message.role,
            content: message.content,
            widgets: message.widgets,
            timestamp,
            endpoint: message.endpoint,
            source_name: message.source_name,
        };
        conversation.messages.push(message.clone());
        conversation.metadata.last_activity = timestamp;

        self.persist_current();
        message
    }

    pub fn set_widget_state(&mut self, widget_id: &str, state: WidgetState) {
        self.current_mut()
            .widget_states
            .insert(widget_id.to_string(), state);
        self.persist_current();
    }

    pub fn widget_state(&mut self, widget_id: &str) -> Option<&WidgetState> {
        self.current_mut().widget_states.get(widget_id)
    }

    /// Messages of the given conversation, or of the active one when `None`.
    pub fn history(&self, conversation_id: Option<&str>) -> Vec<Message> {
        let current = self.current.as_ref();
        match (conversation_id, current) {
            (None, Some(current)) => current.messages.clone(),
            (None, None) => Vec::new(),
            (Some(id), Some(current)) if current.id == id => current.messages.clone(),
            (Some(id), _) => self
                .restore(id)
                .map(|conversation| conversation.messages)
                .unwrap_or_default(),
        }
    }

    /// Loads a conversation from storage. Missing or unreadable records yield
    /// `None`.
    pub fn restore(&self, conversation_id: &str) -> Option<Conversation> {
        let key = conversation_key(conversation_id);
        let bytes = match self.storage.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(%conversation_id, "No stored conversation");
                return None;
            }
            Err(err) => {
                error!(%conversation_id, error = %err, "Failed to read conversation");
                return None;
            }
        };

        match record::decode(&bytes) {
            Ok(conversation) => Some(conversation),
            Err(err) => {
                error!(%conversation_id, error = %err, "Failed to restore conversation");
                None
            }
        }
    }

    /// Deletes the active conversation's record and forgets it. The next
    /// access starts a new conversation.
    pub fn clear(&mut self) {
        if let Some(conversation) = self.current.take() {
            if let Err(err) = self.storage.remove(&conversation_key(&conversation.id)) {
                error!(conversation_id = %conversation.id, error = %err, "Failed to delete conversation");
            }
        }
        if let Err(err) = self.storage.remove(CURRENT_CONVERSATION_KEY) {
            error!(error = %err, "Failed to clear current conversation pointer");
        }
    }

    fn persist_current(&self) {
        let Some(conversation) = &self.current else {
            return;
        };
        let bytes = match record::encode(conversation) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(conversation_id = %conversation.id, error = %err, "Failed to serialize conversation");
                return;
            }
        };
        if let Err(err) = self.storage.set(&conversation_key(&conversation.id), &bytes) {
            error!(conversation_id = %conversation.id, error = %err, "Failed to persist conversation");
        }
    }

    fn write_pointer(&self, conversation_id: &str) {
        if let Err(err) = self
            .storage
            .set(CURRENT_CONVERSATION_KEY, conversation_id.as_bytes())
        {
            error!(%conversation_id, error = %err, "Failed to record current conversation");
        }
    }

    fn current_pointer(&self) -> Option<String> {
        match self.storage.get(CURRENT_CONVERSATION_KEY) {
            Ok(Some(bytes)) => String::from_utf8(bytes)
                .ok()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            Ok(None) => None,
            Err(err) => {
                error!(error = %err, "Failed to read current conversation pointer");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
