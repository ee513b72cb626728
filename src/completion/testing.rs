use crate::completion::{CompletionClient, CompletionResult, Conversation};
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns a canned result and records every conversation it is asked to complete.
pub struct FakeCompletionClient {
    result: CompletionResult,
    calls: Mutex<Vec<Conversation>>,
}
impl FakeCompletionClient {
    pub fn new(result: CompletionResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(Ok(text.to_string()))
    }

    pub fn calls(&self) -> Vec<Conversation> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for FakeCompletionClient {
    async fn complete(&self, conversation: &Conversation) -> CompletionResult {
        self.calls.lock().unwrap().push(conversation.clone());
        self.result.clone()
    }
}

/// Panics on every call.
pub struct PanickingCompletionClient;

#[async_trait]
impl CompletionClient for PanickingCompletionClient {
    async fn complete(&self, _conversation: &Conversation) -> CompletionResult {
        panic!("completion client exploded");
    }
}
