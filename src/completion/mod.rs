mod openai;
mod types;

#[cfg(test)]
pub mod testing;

pub use openai::OpenAIClient;
use types::{ChatMessage, ChatRole};

use async_trait::async_trait;

/// A single system + user exchange sent to the completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub system: String,
    pub user: String,
}
impl Conversation {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// The ordered message list: system instruction first, then the user body.
    pub fn messages(&self) -> [ChatMessage; 2] {
        [
            ChatMessage::new(ChatRole::System, &self.system),
            ChatMessage::new(ChatRole::User, &self.user),
        ]
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Completion provider rejected the credential: {0}")]
    Authentication(String),
    #[error("Completion provider rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("Completion provider API error: {0}")]
    Api(String),
    #[error("Unexpected completion failure: {0}")]
    Unclassified(String),
    #[error("Completion client is not configured")]
    NotConfigured,
}
impl CompletionError {
    /// The fixed user-facing reply sent in place of a completion.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            CompletionError::Authentication(_) => {
                "Sorry, there is a configuration problem. Please contact the administrator."
            }
            CompletionError::RateLimited(_) => {
                "I'm receiving a lot of requests right now. Please try again in a few seconds."
            }
            CompletionError::Api(_) => {
                "Sorry, I couldn't process your request right now. Could you try again?"
            }
            CompletionError::Unclassified(_) => {
                "There was a problem processing your message. Please try rephrasing it."
            }
            CompletionError::NotConfigured => {
                "The service is temporarily unavailable. Please try again later."
            }
        }
    }
}

pub type CompletionResult = Result<String, CompletionError>;

/// Sends a conversation to a completion provider, making exactly one request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, conversation: &Conversation) -> CompletionResult;
}
