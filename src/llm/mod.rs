pub mod parse;
pub mod prompts;

use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use tracing::debug;

use crate::error::StageError;
use crate::extract::Link;

/// Single-shot chat-completion client for the three pipeline prompts.
/// Calls are synchronous from the pipeline's point of view: no streaming,
/// no retry on malformed output. The API key comes from OPENAI_API_KEY.
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(model: String, max_tokens: u32) -> Self {
        LlmClient {
            client: Client::new(),
            model,
            max_tokens,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, StageError> {
        let external = |e: &dyn std::fmt::Display| StageError::ExternalService(e.to_string());

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| external(&e))?
                .into()])
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| external(&e))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| external(&e))?;
        debug!(choices = response.choices.len(), "completion received");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| StageError::ExternalService("empty completion".to_string()))
    }

    /// First pass: rank candidate URLs by job-listing likelihood. Returns
    /// the raw response text; parsing is the caller's concern.
    pub async fn rank_links(&self, urls: &[String]) -> Result<String, StageError> {
        self.complete(&prompts::render_link_ranker(urls)).await
    }

    /// Second pass: pick out job-position links from (url, text) pairs.
    pub async fn job_positions(&self, links: &[Link]) -> Result<String, StageError> {
        self.complete(&prompts::render_open_positions(links)).await
    }

    /// Third pass: next-page detection over the page's URL list.
    pub async fn next_page(&self, urls: &[String]) -> Result<String, StageError> {
        self.complete(&prompts::render_next_page(urls)).await
    }
}
