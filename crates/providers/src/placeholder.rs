//! Placeholder backend.
//!
//! Answers every turn with a canned message. Used when no API key is
//! configured so the rest of the pipeline still runs end to end.

use async_trait::async_trait;
use ragdesk_core::error::BackendError;
use ragdesk_core::inference::InferenceBackend;
use ragdesk_core::message::ChatMessage;
use std::time::Duration;
use tracing::debug;

pub const PLACEHOLDER_REPLY: &str = "I'm analyzing your documents and will provide a response \
     based on the context. This is a placeholder response. To get real answers, configure an \
     inference provider and API key in config.toml.";

#[derive(Debug, Clone, Default)]
pub struct PlaceholderBackend {
    delay: Duration,
}

impl PlaceholderBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait this long before answering, to mimic a slow model.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl InferenceBackend for PlaceholderBackend {
    fn name(&self) -> &str {
        "placeholder"
    }

    async fn generate(
        &self,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<String, BackendError> {
        debug!(
            messages = history.len(),
            context_chars = context.chars().count(),
            "Placeholder backend answering"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(PLACEHOLDER_REPLY.to_string())
    }
}
