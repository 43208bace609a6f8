// AI implementation using an OpenAI-compatible chat-completions API
//
// This is the infrastructure implementation of BaseAI.
// Business logic (what to prompt for) lives in domain layers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use completion_client::{ChatRequest, CompletionClient, Message};

use super::BaseAI;

/// Default sampling temperature for blog drafting
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Upper bound on completion size (a long-form post fits comfortably)
const MAX_COMPLETION_TOKENS: u32 = 4096;

/// OpenAI implementation of AI capabilities
#[derive(Clone)]
pub struct OpenAIClient {
    client: CompletionClient,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: CompletionClient::new(api_key),
            model: model.into(),
        }
    }

    /// Point at a proxy or compatible provider instead of api.openai.com
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Bound each completion request; a hung provider fails the tick after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = self
            .client
            .with_timeout(timeout)
            .context("Failed to configure completion client timeout")?;
        Ok(self)
    }
}

#[async_trait]
impl BaseAI for OpenAIClient {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        tracing::debug!(
            prompt_length = user_prompt.len(),
            model = %self.model,
            "Calling completion API"
        );

        let request = ChatRequest::new(&self.model)
            .message(Message::system(system_prompt))
            .message(Message::user(user_prompt))
            .temperature(DEFAULT_TEMPERATURE)
            .max_tokens(MAX_COMPLETION_TOKENS)
            .json_object();

        let response = self.client.chat_completion(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                prompt_preview = %user_prompt.chars().take(200).collect::<String>(),
                "Completion API call failed"
            );
            // Keep the typed error so callers can read the provider status
            anyhow::Error::new(e)
        })?;

        tracing::info!(
            response_length = response.content.len(),
            total_tokens = response.usage.map(|u| u.total_tokens),
            model = %self.model,
            "Completion API response received"
        );

        Ok(response.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
