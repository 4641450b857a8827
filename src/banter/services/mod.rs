pub mod completion;
pub mod send_coordinator;

pub use completion::{
    CompletionClient, CompletionError, CompletionRequest, CompletionResponse,
    HttpCompletionClient,
};
pub use send_coordinator::{MessageSendCoordinator, SendError};
