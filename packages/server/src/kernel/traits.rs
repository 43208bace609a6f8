// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (what to prompt for, how to parse it) lives in domain layers.
//
// Naming convention: Base* for trait names (e.g., BaseAI)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt expecting a JSON object response (returns raw text).
    ///
    /// Provider failures are returned as `completion_client::CompletionError`
    /// inside the `anyhow::Error`, so callers can downcast to read the HTTP
    /// status.
    async fn complete_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Model identifier used for completions (for logging and auditing)
    fn model(&self) -> &str;
}
