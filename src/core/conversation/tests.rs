use super::*;
use crate::core::message::{Role, WidgetInstance};
use crate::core::storage::{FileStore, MemoryStore, StorageError};
use serde_json::json;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Counts writes and can be told to fail every operation.
#[derive(Default)]
struct InstrumentedStore {
    inner: MemoryStore,
    writes: AtomicUsize,
    failing: bool,
}

impl InstrumentedStore {
    fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn unavailable() -> StorageError {
        StorageError::Read {
            path: "unavailable".into(),
            source: std::io::Error::other("disk unavailable"),
        }
    }
}

impl KeyValueStore for InstrumentedStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.failing {
            return Err(Self::unavailable());
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Self::unavailable());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.failing {
            return Err(Self::unavailable());
        }
        self.inner.remove(key)
    }
}

fn memory_store() -> (Arc<MemoryStore>, ConversationStore) {
    let storage = Arc::new(MemoryStore::new());
    let store = ConversationStore::new(storage.clone());
    (storage, store)
}

#[test]
fn current_conversation_is_created_once() {
    let (storage, mut store) = memory_store();
    assert!(store.current_if_any().is_none());

    let first = store.current_conversation().id.clone();
    let second = store.current_conversation().id.clone();
    assert_eq!(first, second);

    let persisted = storage
        .get(&conversation_key(&first))
        .expect("get")
        .expect("new conversation should be persisted");
    let restored = record::decode(&persisted).expect("decode");
    assert!(restored.messages.is_empty());
}

#[test]
fn add_message_assigns_unique_ids_and_ordered_timestamps() {
    let (_storage, mut store) = memory_store();
    let mut ids = HashSet::new();
    let mut previous = None;

    for i in 0..50 {
        let message = store.add_message(NewMessage::user(format!("query {i}")));
        assert!(ids.insert(message.id.clone()), "duplicate id {}", message.id);
        if let Some(previous) = previous {
            assert!(message.timestamp >= previous);
        }
        previous = Some(message.timestamp);
    }

    let conversation = store.current_conversation();
    assert_eq!(conversation.messages.len(), 50);
    assert_eq!(conversation.messages[0].content, "query 0");
    assert_eq!(conversation.messages[49].content, "query 49");
    assert_eq!(
        conversation.metadata.last_activity,
        conversation.messages[49].timestamp
    );
}

#[test]
fn add_message_keeps_caller_fields() {
    let (_storage, mut store) = memory_store();
    let widget = WidgetInstance::new("ui://list", "http://recipes.test", json!({"items": []}));
    let message = store.add_message(
        NewMessage::assistant("Found it")
            .with_widgets(vec![widget.clone()])
            .with_source("http://recipes.test", "Recipes"),
    );

    assert_eq!(message.role, Role::Assistant);
    assert_eq!(message.content, "Found it");
    assert_eq!(message.widgets(), [widget]);
    assert_eq!(message.endpoint.as_deref(), Some("http://recipes.test"));
    assert_eq!(message.source_name.as_deref(), Some("Recipes"));
}

#[test]
fn every_message_is_written_through() {
    let storage = Arc::new(InstrumentedStore::default());
    let mut store = ConversationStore::new(storage.clone());
    store.current_conversation();
    let after_create = storage.writes();

    store.add_message(NewMessage::user("one"));
    store.add_message(NewMessage::user("two"));
    assert_eq!(storage.writes(), after_create + 2);

    store.set_widget_state("widget-1", WidgetState::new());
    assert_eq!(storage.writes(), after_create + 3);
}

#[test]
fn widget_state_is_stored_and_persisted() {
    let (storage, mut store) = memory_store();
    let mut state = WidgetState::new();
    state.insert("page".to_string(), json!(2));
    store.set_widget_state("widget-a", state.clone());

    assert_eq!(store.widget_state("widget-a"), Some(&state));
    assert_eq!(store.widget_state("widget-b"), None);

    let id = store.current_conversation().id.clone();
    let reopened = ConversationStore::new(storage);
    let restored = reopened.restore(&id).expect("restore");
    assert_eq!(restored.widget_states.get("widget-a"), Some(&state));
}

#[test]
fn restore_round_trips_full_conversation() {
    let (storage, mut store) = memory_store();
    store.add_message(NewMessage::user("pie"));
    store.add_message(
        NewMessage::assistant("Pies")
            .with_widgets(vec![WidgetInstance::new(
                "ui://list",
                "http://recipes.test",
                json!({"items": [{"name": "Apple"}]}),
            )])
            .with_source("http://recipes.test", "Recipes"),
    );
    let mut state = WidgetState::new();
    state.insert("open".to_string(), json!(true));
    store.set_widget_state("w1", state);

    let original = store.current_conversation().clone();
    let restored = ConversationStore::new(storage)
        .restore(&original.id)
        .expect("restore");
    assert_eq!(restored, original);
}

#[test]
fn restore_of_missing_or_corrupt_record_is_none() {
    let (storage, store) = memory_store();
    assert!(store.restore("nope").is_none());

    storage
        .set(&conversation_key("broken"), b"{\"id\": 3")
        .expect("set");
    assert!(store.restore("broken").is_none());
}

#[test]
fn resume_continues_the_current_conversation() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(temp_dir.path()));

    let mut first = ConversationStore::new(storage.clone());
    first.add_message(NewMessage::user("hello"));
    let original = first.current_conversation().clone();
    drop(first);

    let mut resumed = ConversationStore::resume(storage.clone());
    assert_eq!(resumed.current_if_any(), Some(&original));
    resumed.add_message(NewMessage::user("again"));
    assert_eq!(resumed.current_conversation().id, original.id);
    assert_eq!(resumed.history(None).len(), 2);
}

#[test]
fn resume_without_pointer_starts_empty() {
    let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut store = ConversationStore::resume(storage);
    assert!(store.current_if_any().is_none());
    assert!(store.current_conversation().messages.is_empty());
}

#[test]
fn resume_with_corrupt_record_starts_new_conversation() {
    let storage = Arc::new(MemoryStore::new());
    storage
        .set(CURRENT_CONVERSATION_KEY, b"abc")
        .expect("set pointer");
    storage
        .set(&conversation_key("abc"), b"garbage")
        .expect("set record");

    let mut store = ConversationStore::resume(storage);
    assert!(store.current_if_any().is_none());
    assert_ne!(store.current_conversation().id, "abc");
}

#[test]
fn clear_deletes_record_and_starts_over() {
    let (storage, mut store) = memory_store();
    store.add_message(NewMessage::user("hello"));
    let old_id = store.current_conversation().id.clone();

    store.clear();
    assert!(store.current_if_any().is_none());
    assert_eq!(storage.get(&conversation_key(&old_id)).expect("get"), None);
    assert_eq!(storage.get(CURRENT_CONVERSATION_KEY).expect("get"), None);

    let new_id = store.current_conversation().id.clone();
    assert_ne!(new_id, old_id);
    assert!(store.current_conversation().messages.is_empty());
}

#[test]
fn history_reads_current_or_named_conversation() {
    let (storage, mut store) = memory_store();
    assert!(store.history(None).is_empty());

    store.add_message(NewMessage::user("first"));
    let first_id = store.current_conversation().id.clone();
    store.create_conversation();
    store.add_message(NewMessage::user("second"));

    let current: Vec<String> = store
        .history(None)
        .into_iter()
        .map(|message| message.content)
        .collect();
    assert_eq!(current, ["second"]);

    let earlier: Vec<String> = store
        .history(Some(&first_id))
        .into_iter()
        .map(|message| message.content)
        .collect();
    assert_eq!(earlier, ["first"]);
    assert!(store.history(Some("unknown")).is_empty());
    drop(storage);
}

#[test]
fn storage_failures_never_reach_the_caller() {
    let storage = Arc::new(InstrumentedStore::failing());
    let mut store = ConversationStore::resume(storage.clone());

    let message = store.add_message(NewMessage::user("still works"));
    store.set_widget_state("w", WidgetState::new());
    assert_eq!(store.history(None), vec![message]);
    assert!(store.restore("anything").is_none());
    store.clear();
    assert!(storage.writes() > 0);
}
