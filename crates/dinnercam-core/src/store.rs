//! Ordered message store with a best-effort persistence hook.
//!
//! In-memory state is the source of truth; the sink converges
//! asynchronously and its failures never roll back a mutation.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PersistError;
use crate::ids;
use crate::message::{Message, MessagePatch};

/// Persistence collaborator notified after every mutation.
#[async_trait]
pub trait ConversationSink: Send + Sync {
    async fn save(&self, message: Message) -> Result<(), PersistError>;
}

pub struct MessageStore {
    messages: Vec<Message>,
    sink: Option<Arc<dyn ConversationSink>>,
    synced: bool,
}

impl MessageStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            sink: None,
            synced: false,
        }
    }

    pub fn with_sink(sink: Arc<dyn ConversationSink>) -> Self {
        Self {
            messages: Vec::new(),
            sink: Some(sink),
            synced: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Whether the initial restore has run. Turns are refused before it has.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    /// Insert at the end, assigning identity if absent. Returns the id.
    pub fn append(&mut self, mut message: Message) -> String {
        if message.id.is_empty() {
            message.id = ids::new_message_id();
        }
        let id = message.id.clone();
        self.persist(message.clone());
        self.messages.push(message);
        id
    }

    /// Merge `patch` into the message with the given id and re-persist it.
    /// An unknown id is a logged no-op, not an error.
    pub fn update(&mut self, id: &str, patch: MessagePatch) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == id) else {
            tracing::warn!("update for unknown message id: {id}");
            return;
        };
        patch.apply(message);
        let snapshot = message.clone();
        self.persist(snapshot);
    }

    /// Replace the store contents from a persisted snapshot.
    ///
    /// Ids are deduplicated within the batch (a collision gets a fresh
    /// suffix; original order is preserved). An empty snapshot synthesizes
    /// a single welcome message, persisted once.
    pub fn restore(&mut self, snapshot: Vec<Message>, display_name: &str) {
        self.messages.clear();

        if snapshot.is_empty() {
            tracing::debug!("empty conversation snapshot, starting welcome flow");
            let welcome = Message::assistant(welcome_text(display_name));
            self.persist(welcome.clone());
            self.messages.push(welcome);
            self.synced = true;
            return;
        }

        let mut seen: HashSet<String> = HashSet::new();
        for mut message in snapshot {
            if message.id.is_empty() {
                message.id = ids::new_message_id();
            }
            while seen.contains(&message.id) {
                let fresh = ids::dedup_id(&message.id);
                tracing::warn!(
                    "duplicate message id {} in snapshot, reassigned to {fresh}",
                    message.id
                );
                message.id = fresh;
            }
            seen.insert(message.id.clone());
            self.messages.push(message);
        }
        self.synced = true;
    }

    /// Empty the store and reset synchronization state so the next load
    /// runs a fresh restore.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.synced = false;
    }

    fn persist(&self, message: Message) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = sink.save(message).await {
                tracing::warn!("failed to persist message: {e}");
            }
        });
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

fn welcome_text(display_name: &str) -> String {
    let name = if display_name.trim().is_empty() {
        "there"
    } else {
        display_name
    };
    format!(
        "Hi {name}! 🍳 I'm DinnerCam, your cooking assistant. Tell me anything \
         about today's meal!\n\n\
         📸 Snap a photo of your fridge to check your ingredients,\n\
         📝 tell me what you have on hand,\n\
         💬 or just ask for cooking advice!"
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct CountingSink {
        saves: AtomicUsize,
        saved: Mutex<Vec<Message>>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationSink for CountingSink {
        async fn save(&self, message: Message) -> Result<(), PersistError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.saved.lock().unwrap().push(message);
            if self.fail {
                return Err(PersistError("backend down".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_append_assigns_identity() {
        let mut store = MessageStore::new();
        let mut message = Message::user("hi");
        message.id.clear();
        let id = store.append(message);
        assert!(!id.is_empty());
        assert_eq!(store.get(&id).unwrap().content, "hi");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let mut store = MessageStore::new();
        store.append(Message::user("hi"));
        store.update("no-such-id", MessagePatch::content("changed"));
        assert_eq!(store.messages()[0].content, "hi");
    }

    #[test]
    fn test_update_twice_with_same_patch_is_idempotent() {
        let mut store = MessageStore::new();
        let id = store.append(Message::assistant("working"));
        store.update(&id, MessagePatch::content("done"));
        let once = store.get(&id).unwrap().clone();
        store.update(&id, MessagePatch::content("done"));
        assert_eq!(store.get(&id).unwrap(), &once);
    }

    #[test]
    fn test_restore_dedups_colliding_ids_preserving_order() {
        let mut store = MessageStore::new();
        let mut first = Message::user("first");
        first.id = "dup".to_string();
        let mut second = Message::assistant("second");
        second.id = "dup".to_string();

        store.restore(vec![first, second], "Alice");

        assert_eq!(store.len(), 2);
        assert_eq!(store.messages()[0].content, "first");
        assert_eq!(store.messages()[1].content, "second");
        assert_eq!(store.messages()[0].id, "dup");
        assert_ne!(store.messages()[1].id, "dup");
        assert!(store.messages()[1].id.starts_with("dup-"));
        assert!(store.is_synced());
    }

    #[tokio::test]
    async fn test_restore_empty_synthesizes_welcome_persisted_once() {
        let sink = Arc::new(CountingSink::default());
        let mut store = MessageStore::with_sink(sink.clone());

        store.restore(Vec::new(), "Alice");

        assert_eq!(store.len(), 1);
        let welcome = &store.messages()[0];
        assert!(welcome.content.contains("Alice"));

        tokio::task::yield_now().await;
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
        assert_eq!(sink.saved.lock().unwrap()[0].id, welcome.id);
    }

    #[tokio::test]
    async fn test_persistence_failure_never_rolls_back() {
        let sink = Arc::new(CountingSink {
            fail: true,
            ..Default::default()
        });
        let mut store = MessageStore::with_sink(sink.clone());

        let id = store.append(Message::user("kept"));
        tokio::task::yield_now().await;

        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
        assert_eq!(store.get(&id).unwrap().content, "kept");
    }

    #[tokio::test]
    async fn test_update_persists_updated_message_only() {
        let sink = Arc::new(CountingSink::default());
        let mut store = MessageStore::with_sink(sink.clone());

        let id = store.append(Message::assistant("working"));
        store.append(Message::user("other"));
        store.update(&id, MessagePatch::content("done"));
        tokio::task::yield_now().await;

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 3);
        let last = saved.last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.content, "done");
    }

    #[test]
    fn test_clear_resets_sync_state() {
        let mut store = MessageStore::new();
        store.restore(vec![Message::user("hi")], "Alice");
        assert!(store.is_synced());

        store.clear();
        assert!(store.is_empty());
        assert!(!store.is_synced());
    }

    #[test]
    fn test_timestamps_non_decreasing_in_insertion_order() {
        let mut store = MessageStore::new();
        for i in 0..5 {
            store.append(Message::user(format!("m{i}")));
        }
        let messages = store.messages();
        for pair in messages.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
