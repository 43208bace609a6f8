//! Minimal chat-completions client
//!
//! A small client for OpenAI-compatible `/chat/completions` endpoints with no
//! domain-specific logic. Unlike a plain `reqwest` call, provider failures keep
//! their HTTP status so callers can tell billing errors (402) from outages.
//!
//! # Example
//!
//! ```rust,ignore
//! use completion_client::{ChatRequest, CompletionClient, Message};
//!
//! let client = CompletionClient::from_env()?;
//!
//! let response = client
//!     .chat_completion(
//!         ChatRequest::new("gpt-4o-mini")
//!             .message(Message::system("You write blog posts."))
//!             .message(Message::user("Write about Rust"))
//!             .json_object(),
//!     )
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{CompletionError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completions API client.
#[derive(Clone)]
pub struct CompletionClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl CompletionClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CompletionError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, compatible providers, tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Returns the first choice's content. Non-2xx responses become
    /// [`CompletionError::Api`] carrying the provider's status and message.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "completion request failed");
                CompletionError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = provider_message(&error_text);
            warn!(status = %status, error = %message, "completion API error");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Parse("No choices in completion response".into()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "chat completion"
        );

        Ok(ChatResponse {
            content,
            usage: raw.usage,
        })
    }
}

/// Pull `error.message` out of a provider error body, falling back to the raw text.
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<types::ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty error body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest::new("gpt-4o-mini")
            .message(Message::system("You are terse."))
            .message(Message::user("Say hi"))
    }

    #[test]
    fn test_client_builder() {
        let client = CompletionClient::new("sk-test").with_base_url("https://custom.api.com/v1/");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url(), "https://custom.api.com/v1");
    }

    #[test]
    fn provider_message_prefers_error_envelope() {
        let body = r#"{"error":{"message":"Insufficient credits","type":"billing"}}"#;
        assert_eq!(provider_message(body), "Insufficient credits");
        assert_eq!(provider_message("upstream down"), "upstream down");
        assert_eq!(provider_message(""), "empty error body");
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}],
                    "usage":{"prompt_tokens":3,"completion_tokens":1,"total_tokens":4}}"#,
            )
            .create_async()
            .await;

        let client = CompletionClient::new("sk-test").with_base_url(server.url());
        let response = client.chat_completion(request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.content, "hi");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(4));
    }

    #[tokio::test]
    async fn payment_required_keeps_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(402)
            .with_body(r#"{"error":{"message":"Insufficient credits"}}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("sk-test").with_base_url(server.url());
        let err = client.chat_completion(request()).await.unwrap_err();

        assert_eq!(err.status(), Some(402));
        assert!(err.is_billing());
        assert!(err.to_string().contains("Insufficient credits"));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"unexpected":true}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("sk-test").with_base_url(server.url());
        let err = client.chat_completion(request()).await.unwrap_err();

        assert!(matches!(err, CompletionError::Parse(_)));
    }

    #[tokio::test]
    async fn empty_choices_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let client = CompletionClient::new("sk-test").with_base_url(server.url());
        let err = client.chat_completion(request()).await.unwrap_err();

        assert!(matches!(err, CompletionError::Parse(_)));
    }
}
