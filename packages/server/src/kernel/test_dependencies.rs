// TestDependencies - mock implementations for testing
//
// Provides an in-memory ServerDeps with a scripted AI for tests and local runs.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use completion_client::CompletionError;

use super::jobs::MemoryJobStore;
use super::{BaseAI, ServerDeps};
use crate::domains::automation::MemoryRotationStore;
use crate::domains::blog::MemoryBlogPostStore;

// =============================================================================
// Mock AI
// =============================================================================

/// Arguments captured from a completion call
#[derive(Debug, Clone)]
pub struct AiCallArgs {
    pub system_prompt: String,
    pub user_prompt: String,
}

enum MockResponse {
    Text(String),
    ProviderError { status: u16, message: String },
}

/// Scripted `BaseAI`: returns queued responses in order and records calls.
///
/// Fails when the queue is empty.
#[derive(Clone, Default)]
pub struct MockAI {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    calls: Arc<Mutex<Vec<AiCallArgs>>>,
}

impl MockAI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.push_response(text);
        self
    }

    /// Queue a provider failure with the given HTTP status
    pub fn with_provider_error(self, status: u16, message: impl Into<String>) -> Self {
        self.push_provider_error(status, message);
        self
    }

    pub fn push_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockResponse::Text(text.into()));
    }

    pub fn push_provider_error(&self, status: u16, message: impl Into<String>) {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(MockResponse::ProviderError {
                status,
                message: message.into(),
            });
    }

    /// Get all completion calls made so far
    pub fn calls(&self) -> Vec<AiCallArgs> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(AiCallArgs {
                system_prompt: system_prompt.to_string(),
                user_prompt: user_prompt.to_string(),
            });

        let next = self
            .responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::ProviderError { status, message }) => {
                Err(CompletionError::Api { status, message }.into())
            }
            None => Err(anyhow!("MockAI has no queued response")),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// In-memory dependencies with handles kept for assertions.
pub struct TestDependencies {
    pub ai: MockAI,
    pub posts: Arc<MemoryBlogPostStore>,
    pub rotation: Arc<MemoryRotationStore>,
    pub jobs: Arc<MemoryJobStore>,
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            ai: MockAI::new(),
            posts: Arc::new(MemoryBlogPostStore::new()),
            rotation: Arc::new(MemoryRotationStore::new()),
            jobs: Arc::new(MemoryJobStore::new()),
        }
    }

    pub fn mock_ai(mut self, ai: MockAI) -> Self {
        self.ai = ai;
        self
    }

    /// Build a `ServerDeps` sharing this instance's stores and mock.
    pub fn server_deps(&self) -> Arc<ServerDeps> {
        Arc::new(ServerDeps::new(
            None,
            Arc::new(self.ai.clone()),
            self.posts.clone(),
            self.rotation.clone(),
            self.jobs.clone(),
        ))
    }
}
