//! Text generation behind a small trait so the router never sees the model

use async_trait::async_trait;
use rig::{
    agent::{Agent, AgentBuilder},
    completion::{Completion as _, CompletionModel},
    message::AssistantContent,
};
use tracing::{debug, instrument};

use crate::search::context::{ANSWER_PREAMBLE, build_prompt};
use crate::search::error::SearchError;

/// Text-in/text-out answer synthesis
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Answer `question` from `context`; may return an empty string
    async fn generate(&self, question: &str, context: &str) -> Result<String, SearchError>;
}

/// [`TextGenerator`] backed by a `rig` agent carrying the answer policy preamble
pub struct RigGenerator<C: CompletionModel> {
    agent: Agent<C>,
}

impl<C: CompletionModel> RigGenerator<C> {
    pub fn new(model: C) -> Self {
        Self {
            agent: AgentBuilder::new(model).preamble(ANSWER_PREAMBLE).build(),
        }
    }
}

#[async_trait]
impl<C> TextGenerator for RigGenerator<C>
where
    C: CompletionModel + Send + Sync + 'static,
{
    #[instrument(skip(self, context), fields(context_len = context.len()))]
    async fn generate(&self, question: &str, context: &str) -> Result<String, SearchError> {
        let prompt = build_prompt(question, context);
        let response = self.agent.completion(prompt, vec![]).await?.send().await?;

        let text = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        debug!(response_len = text.len(), "Generated answer");
        Ok(text)
    }
}
