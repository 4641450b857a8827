use std::sync::Arc;

use tracing::{debug, error, info};

use crate::banter::models::message::{Message, Role, validate_content};
use crate::banter::models::{Conversation, ConversationStore};

use super::completion::{CompletionClient, CompletionError, CompletionRequest};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

/// Drives the optimistic send/receive cycle for one user message.
///
/// The user message is appended to the conversation before the completion
/// call, so the UI shows it immediately. On success the assistant reply is
/// appended after it; on failure the optimistic message is removed again and
/// the error is recorded — a pending message is never left stuck.
///
/// `send` takes `&mut self`, so one coordinator never runs overlapping
/// sends; a send's rollback only ever targets the message id it created.
pub struct MessageSendCoordinator {
    client: Arc<dyn CompletionClient>,
    system_prompt: Option<String>,
    is_pending: bool,
    pending_message_id: Option<String>,
    last_error: Option<SendError>,
}

impl MessageSendCoordinator {
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: Option<String>) -> Self {
        Self {
            client,
            system_prompt,
            is_pending: false,
            pending_message_id: None,
            last_error: None,
        }
    }

    /// Send a user message into a conversation.
    ///
    /// Invalid content fails before any side effect; the completion
    /// collaborator is never contacted. After a completion failure the
    /// conversation's messages are exactly what they were before the call.
    pub async fn send(
        &mut self,
        content: &str,
        conversation_id: &str,
        store: &mut ConversationStore,
    ) -> Result<(), SendError> {
        let trimmed = match validate_content(content) {
            Ok(trimmed) => trimmed.to_string(),
            Err(reason) => {
                let err = SendError::Validation(reason);
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let Some(conversation) = store.get(conversation_id).cloned() else {
            let err = SendError::ConversationNotFound(conversation_id.to_string());
            self.last_error = Some(err.clone());
            return Err(err);
        };

        let user_message = Message::new(Role::User, trimmed.clone());
        let rollback_id = user_message.id.clone();

        self.is_pending = true;
        self.pending_message_id = Some(rollback_id.clone());

        // Optimistic append, visible immediately
        let mut updated = conversation;
        updated.push_message(user_message);
        store.update_conversation(updated);

        debug!(conversation_id = %conversation_id, "Awaiting completion");
        let result = self
            .client
            .complete(CompletionRequest {
                message: trimmed,
                system_prompt: self.system_prompt.clone(),
            })
            .await;

        let outcome = match result {
            Ok(completion) => {
                self.append_assistant_reply(conversation_id, completion.response, store);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, conversation_id = %conversation_id, "Completion failed, rolling back");
                store.remove_message(conversation_id, &rollback_id);
                let err = SendError::Completion(e);
                self.last_error = Some(err.clone());
                Err(err)
            }
        };

        self.pending_message_id = None;
        self.is_pending = false;
        outcome
    }

    fn append_assistant_reply(
        &self,
        conversation_id: &str,
        response: String,
        store: &mut ConversationStore,
    ) {
        // The conversation can only have gone away if it was deleted while
        // the completion call was in flight; drop the reply in that case.
        let Some(conversation) = store.get(conversation_id).cloned() else {
            info!(conversation_id = %conversation_id, "Conversation gone, dropping reply");
            return;
        };

        let mut updated: Conversation = conversation;
        updated.push_message(Message::new(Role::Assistant, response));
        store.update_conversation(updated);
    }

    pub fn is_pending(&self) -> bool {
        self.is_pending
    }

    pub fn last_error(&self) -> Option<&SendError> {
        self.last_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::banter::storage::InMemoryStore;

    use super::super::completion::CompletionResponse;
    use super::*;

    /// Scripted completion client for tests
    struct FakeClient {
        reply: Result<String, CompletionError>,
        calls: AtomicUsize,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl FakeClient {
        fn succeeding(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(CompletionError::Upstream {
                    status: 500,
                    detail: "AI service error".to_string(),
                }),
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for FakeClient {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock() = Some(request);

            self.reply.clone().map(|response| CompletionResponse {
                response,
                processing_time_ms: 1,
            })
        }
    }

    fn new_store() -> ConversationStore {
        let mut store = ConversationStore::new(Arc::new(InMemoryStore::new()));
        store.load();
        store
    }

    #[tokio::test]
    async fn test_success_appends_user_then_assistant() {
        let mut store = new_store();
        let conv = store.create_conversation(None);

        let client = Arc::new(FakeClient::succeeding("Hi!"));
        let mut coordinator = MessageSendCoordinator::new(client.clone(), None);

        coordinator.send("Hello", &conv.id, &mut store).await.unwrap();

        let messages = &store.get(&conv.id).unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi!");
        assert!(!coordinator.is_pending());
        assert!(coordinator.last_error().is_none());
    }

    #[tokio::test]
    async fn test_content_is_trimmed_before_sending() {
        let mut store = new_store();
        let conv = store.create_conversation(None);

        let client = Arc::new(FakeClient::succeeding("ok"));
        let mut coordinator = MessageSendCoordinator::new(client.clone(), None);

        coordinator.send("  Hello  ", &conv.id, &mut store).await.unwrap();

        assert_eq!(store.get(&conv.id).unwrap().messages[0].content, "Hello");
        assert_eq!(
            client.last_request.lock().as_ref().unwrap().message,
            "Hello"
        );
    }

    #[tokio::test]
    async fn test_failure_rolls_back_optimistic_message() {
        let mut store = new_store();
        let conv = store.create_conversation(Some("earlier message"));
        let before = store.get(&conv.id).unwrap().messages.clone();

        let client = Arc::new(FakeClient::failing());
        let mut coordinator = MessageSendCoordinator::new(client, None);

        let result = coordinator.send("doomed", &conv.id, &mut store).await;

        assert!(matches!(result, Err(SendError::Completion(_))));
        assert_eq!(store.get(&conv.id).unwrap().messages, before);
        assert!(!coordinator.is_pending());
        assert!(matches!(
            coordinator.last_error(),
            Some(SendError::Completion(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_content_never_contacts_collaborator() {
        let mut store = new_store();
        let conv = store.create_conversation(None);
        let client = Arc::new(FakeClient::succeeding("unused"));
        let mut coordinator = MessageSendCoordinator::new(client.clone(), None);

        let result = coordinator.send("   ", &conv.id, &mut store).await;

        assert!(matches!(result, Err(SendError::Validation(_))));
        assert!(store.get(&conv.id).unwrap().messages.is_empty());
        assert_eq!(client.call_count(), 0);
        assert!(matches!(
            coordinator.last_error(),
            Some(SendError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_conversation_fails_without_side_effects() {
        let mut store = new_store();
        let client = Arc::new(FakeClient::succeeding("unused"));
        let mut coordinator = MessageSendCoordinator::new(client.clone(), None);

        let result = coordinator.send("hello", "missing", &mut store).await;

        assert!(matches!(result, Err(SendError::ConversationNotFound(_))));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_system_prompt_is_forwarded() {
        let mut store = new_store();
        let conv = store.create_conversation(None);
        let client = Arc::new(FakeClient::succeeding("ok"));
        let mut coordinator =
            MessageSendCoordinator::new(client.clone(), Some("be brief".to_string()));

        coordinator.send("hello", &conv.id, &mut store).await.unwrap();

        assert_eq!(
            client
                .last_request
                .lock()
                .as_ref()
                .unwrap()
                .system_prompt
                .as_deref(),
            Some("be brief")
        );
    }

    #[tokio::test]
    async fn test_new_conversation_scenario() {
        // createConversation() -> default title, then a successful send
        let mut store = new_store();
        let conv = store.create_conversation(None);
        assert_eq!(conv.title, "New Conversation");
        assert!(conv.messages.is_empty());

        let client = Arc::new(FakeClient::succeeding("Hi!"));
        let mut coordinator = MessageSendCoordinator::new(client, None);
        coordinator.send("Hello", &conv.id, &mut store).await.unwrap();

        let messages = &store.get(&conv.id).unwrap().messages;
        let summary: Vec<(Role, &str)> =
            messages.iter().map(|m| (m.role, m.content.as_str())).collect();
        assert_eq!(
            summary,
            vec![(Role::User, "Hello"), (Role::Assistant, "Hi!")]
        );
    }
}
