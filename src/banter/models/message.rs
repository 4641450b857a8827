use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum accepted message length, in characters
pub const MAX_MESSAGE_LEN: usize = 10_000;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message within a conversation
///
/// The id and timestamp are assigned at creation and never change; ordering
/// within a conversation is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id and the current time
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

}

/// Validate user-supplied message content, returning the trimmed text.
///
/// Rejects content that is empty after trimming or longer than
/// [`MAX_MESSAGE_LEN`] characters.
pub fn validate_content(content: &str) -> Result<&str, String> {
    let trimmed = content.trim();

    if trimmed.is_empty() {
        return Err("Message cannot be empty".to_string());
    }

    let char_count = trimmed.chars().count();
    if char_count > MAX_MESSAGE_LEN {
        return Err(format!(
            "Message too long: {} characters (max {})",
            char_count, MAX_MESSAGE_LEN
        ));
    }

    Ok(trimmed)
}

/// Bound content to at most [`MAX_MESSAGE_LEN`] characters.
///
/// Used where over-long content is accepted rather than rejected, such as
/// seeding a conversation's first message at creation time.
pub fn truncate_content(content: &str) -> String {
    if content.chars().count() <= MAX_MESSAGE_LEN {
        content.to_string()
    } else {
        content.chars().take(MAX_MESSAGE_LEN).collect()
    }
}
