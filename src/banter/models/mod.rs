pub mod conversation;
pub mod conversation_store;
pub mod message;

pub use conversation::{Conversation, DEFAULT_TITLE};
pub use conversation_store::{CONVERSATIONS_KEY, ConversationStore, StoreError};
pub use message::{MAX_MESSAGE_LEN, Message, Role};
