use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::{Message, Role, truncate_content};

/// Title used for conversations created without an initial message
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum display length of a derived title, ellipsis included
const TITLE_MAX_CHARS: usize = 50;
const TITLE_PREFIX_CHARS: usize = 47;
const TITLE_ELLIPSIS: &str = "...";

/// A conversation and its full message history
///
/// This is both the in-memory representation and the persisted record: the
/// durable store holds a JSON array of these, with timestamps serialized as
/// ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a conversation, optionally seeded with a first user message.
    ///
    /// With an initial message the title is derived from its prefix;
    /// otherwise the default placeholder title is used.
    pub fn new(initial_message: Option<&str>) -> Self {
        let now = Utc::now();

        let seeded = initial_message.map(str::trim).filter(|m| !m.is_empty());

        let title = seeded.map(derive_title).unwrap_or_else(|| DEFAULT_TITLE.to_string());

        // Seeded content is bounded by truncation rather than rejected, so
        // creation stays infallible; the send path rejects over-long input.
        let messages = seeded
            .map(|content| vec![Message::new(Role::User, truncate_content(content))])
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            messages,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message and refresh `updated_at`
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Remove the message with the given id. Absence is a no-op.
    ///
    /// Used by the optimistic-send rollback path; deliberately does not
    /// refresh `updated_at`.
    pub fn remove_message(&mut self, message_id: &str) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != message_id);
        self.messages.len() != before
    }

    /// Set the title and refresh `updated_at`
    pub fn set_title(&mut self, title: String) {
        self.title = title;
        self.updated_at = Utc::now();
    }

    /// Drop duplicate messages, keeping the first occurrence of each
    /// `(role, content, timestamp)` triple and of each id.
    ///
    /// Safety net for the read path: the write path never produces
    /// duplicates, but historical data may contain them.
    pub fn dedup_messages(&mut self) {
        let mut seen_keys: HashSet<(Role, String, DateTime<Utc>)> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();

        self.messages.retain(|m| {
            let key = (m.role, m.content.clone(), m.timestamp);

            // Check both sets before inserting into either, so a dropped
            // message never consumes a triple or an id.
            if seen_keys.contains(&key) || seen_ids.contains(&m.id) {
                return false;
            }

            seen_keys.insert(key);
            seen_ids.insert(m.id.clone());
            true
        });
    }
}

/// Derive a conversation title from the first user message: the message
/// itself when short enough, otherwise a 47-character prefix plus "..."
/// (50 characters total).
pub fn derive_title(message: &str) -> String {
    let trimmed = message.trim();

    if trimmed.chars().count() <= TITLE_MAX_CHARS {
        trimmed.to_string()
    } else {
        let prefix: String = trimmed.chars().take(TITLE_PREFIX_CHARS).collect();
        format!("{}{}", prefix, TITLE_ELLIPSIS)
    }
}
