//! Inference backend trait — the abstraction over text generation.
//!
//! A backend receives the conversation so far plus the assembled document
//! context and returns the assistant's reply. The chat session calls
//! `generate()` without knowing whether it talks to a real model or a
//! test double.
//!
//! Implementations: OpenAI-compatible HTTP endpoints, a fixed placeholder.

use async_trait::async_trait;

use crate::error::BackendError;
use crate::message::ChatMessage;

#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// A human-readable name for this backend (e.g., "openai", "placeholder").
    fn name(&self) -> &str;

    /// Generate a reply. `history` ends with the user message being answered.
    async fn generate(
        &self,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<String, BackendError>;
}
