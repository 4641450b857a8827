use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::banter::storage::{LocalStore, StorageError};

use super::conversation::Conversation;

/// Fixed durable-store key for the serialized conversation list
pub const CONVERSATIONS_KEY: &str = "conversations";

/// Maximum accepted conversation title length, in characters
pub const MAX_TITLE_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Owner of the authoritative in-memory conversation list.
///
/// The durable store is a passive mirror: it is read once at `load()` and
/// rewritten in full after every mutation, so a caller that has observed a
/// mutation's result never sees memory and storage diverge. Write failures
/// are recorded in `last_error` and do not roll back the in-memory change;
/// the next successful write reconciles storage.
pub struct ConversationStore {
    store: Arc<dyn LocalStore>,
    conversations: Vec<Conversation>,
    is_loading: bool,
    last_error: Option<StoreError>,
}

impl ConversationStore {
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self {
            store,
            conversations: Vec::new(),
            is_loading: false,
            last_error: None,
        }
    }

    /// Load the conversation list from the durable store.
    ///
    /// An absent key yields an empty list. Corrupt or old-shape data is
    /// logged and treated as absent; this never propagates a parse error.
    /// Each loaded conversation's messages run through the duplicate filter.
    pub fn load(&mut self) {
        self.is_loading = true;

        let payload = match self.store.get(CONVERSATIONS_KEY) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to read conversations, starting empty");
                self.last_error = Some(StoreError::Storage(e));
                self.conversations = Vec::new();
                self.is_loading = false;
                return;
            }
        };

        self.conversations = match payload {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(mut conversations) => {
                    for conversation in &mut conversations {
                        let before = conversation.messages.len();
                        conversation.dedup_messages();
                        let dropped = before - conversation.messages.len();
                        if dropped > 0 {
                            warn!(
                                conversation_id = %conversation.id,
                                dropped,
                                "Dropped duplicate messages while loading"
                            );
                        }
                    }
                    // Newest created first
                    conversations.sort_by_key(|c| std::cmp::Reverse(c.created_at));
                    conversations
                }
                Err(e) => {
                    warn!(error = %e, "Stored conversations are unparseable, starting empty");
                    Vec::new()
                }
            },
        };

        info!(count = self.conversations.len(), "Loaded conversations");
        self.is_loading = false;
    }

    /// Create a conversation, optionally seeded with a first user message,
    /// insert it at the front of the list, and persist.
    ///
    /// Returns the created conversation synchronously; any message sending
    /// happens as a separate step through the send coordinator.
    pub fn create_conversation(&mut self, initial_message: Option<&str>) -> Conversation {
        let conversation = Conversation::new(initial_message);
        debug!(conversation_id = %conversation.id, "Created conversation");

        self.conversations.insert(0, conversation.clone());
        self.persist();

        conversation
    }

    /// Replace the conversation with a matching id (insert at the front if
    /// absent), refresh its `updated_at`, and persist.
    pub fn update_conversation(&mut self, mut conversation: Conversation) {
        conversation.updated_at = chrono::Utc::now();

        match self.conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(existing) => *existing = conversation,
            None => self.conversations.insert(0, conversation),
        }

        self.persist();
    }

    /// Rename a conversation.
    ///
    /// Unlike deletion, renaming something that never existed is an error.
    pub fn update_conversation_title(&mut self, id: &str, title: &str) -> Result<(), StoreError> {
        if !self.conversations.iter().any(|c| c.id == id) {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation("Title cannot be empty".to_string()));
        }
        if trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(StoreError::Validation(format!(
                "Title too long (max {} characters)",
                MAX_TITLE_LEN
            )));
        }

        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.set_title(trimmed.to_string());
        }

        self.persist();
        Ok(())
    }

    /// Remove a conversation. Absence is a no-op, not an error.
    pub fn delete_conversation(&mut self, id: &str) {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);

        if self.conversations.len() != before {
            debug!(conversation_id = %id, "Deleted conversation");
        }

        self.persist();
    }

    /// Empty the list and remove the durable-store key entirely.
    pub fn clear_history(&mut self) {
        self.conversations.clear();

        match self.store.remove(CONVERSATIONS_KEY) {
            Ok(()) => {
                info!("Cleared conversation history");
                self.last_error = None;
            }
            Err(e) => {
                error!(error = %e, "Failed to remove conversations key");
                self.last_error = Some(StoreError::Storage(e));
            }
        }
    }

    /// Remove a single message from a conversation. Absence of either id is
    /// a no-op. Used by the optimistic-send rollback path.
    pub fn remove_message(&mut self, conversation_id: &str, message_id: &str) {
        let removed = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .map(|c| c.remove_message(message_id))
            .unwrap_or(false);

        if removed {
            debug!(
                conversation_id = %conversation_id,
                message_id = %message_id,
                "Removed message"
            );
        }

        self.persist();
    }

    /// Get a conversation by id
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// All conversations, newest created first
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&StoreError> {
        self.last_error.as_ref()
    }

    /// Write the full in-memory list back to the durable store.
    ///
    /// Failures are recorded, not propagated: the in-memory list stays
    /// authoritative for the session.
    fn persist(&mut self) {
        let result = serde_json::to_string(&self.conversations)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(CONVERSATIONS_KEY, &json));

        match result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                error!(error = %e, "Failed to persist conversations");
                self.last_error = Some(StoreError::Storage(e));
            }
        }
    }
}
