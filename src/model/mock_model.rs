//! Completion model that answers from memory, for tests and offline runs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    one_or_many::OneOrMany,
};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Content(OneOrMany<AssistantContent>),
    Fail(String),
}

/// Returns a configured reply and counts how often it was asked
///
/// Clones share the reply and the counter, so a test can keep one handle
/// while the pipeline owns another. Without configuration every call
/// returns empty text.
#[derive(Debug, Clone)]
pub struct MockCompletionModel {
    reply: Arc<Mutex<Reply>>,
    calls: Arc<AtomicUsize>,
}

impl MockCompletionModel {
    pub fn new() -> Self {
        Self {
            reply: Arc::new(Mutex::new(Reply::Content(OneOrMany::one(
                AssistantContent::text(""),
            )))),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every following call with `content`
    pub async fn set_response(&self, content: OneOrMany<AssistantContent>) {
        *self.reply.lock().await = Reply::Content(content);
    }

    /// Answer every following call with `text`
    pub async fn set_text_response(&self, text: &str) {
        self.set_response(OneOrMany::one(AssistantContent::text(text)))
            .await;
    }

    /// Fail every following call with a provider error
    pub async fn set_error(&self, message: &str) {
        *self.reply.lock().await = Reply::Fail(message.to_string());
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockCompletionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.reply.lock().await.clone() {
            Reply::Content(choice) => Ok(CompletionResponse {
                choice,
                raw_response: String::new(),
            }),
            Reply::Fail(message) => Err(CompletionError::ProviderError(message)),
        }
    }
}
