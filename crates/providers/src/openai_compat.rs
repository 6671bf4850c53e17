//! OpenAI-compatible backend.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM and any endpoint exposing
//! `/chat/completions`. The document context travels in the system message,
//! followed by the conversation history.

use async_trait::async_trait;
use ragdesk_config::InferenceConfig;
use ragdesk_core::error::BackendError;
use ragdesk_core::inference::InferenceBackend;
use ragdesk_core::message::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

fn build_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

impl OpenAiCompatBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let defaults = InferenceConfig::default();
        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: defaults.model,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            system_prompt: defaults.system_prompt,
            timeout_secs: defaults.timeout_secs,
            client: build_client(defaults.timeout_secs),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key)
    }

    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::new("openrouter", "https://openrouter.ai/api/v1", api_key)
    }

    /// Ollama ignores the key, any value works.
    pub fn ollama(base_url: Option<&str>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama",
        )
    }

    /// Copy model, sampling, prompt and timeout settings from config.
    pub fn with_settings(mut self, config: &InferenceConfig) -> Self {
        self.model = config.model.clone();
        self.temperature = config.temperature;
        self.max_tokens = config.max_tokens;
        self.system_prompt = config.system_prompt.clone();
        self.with_timeout_secs(config.timeout_secs)
    }

    /// Per-request HTTP timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self.client = build_client(timeout_secs);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    /// System prompt plus documents, then the conversation.
    fn to_api_messages(
        system_prompt: &str,
        history: &[ChatMessage],
        context: &str,
    ) -> Vec<ApiMessage> {
        let system = if context.is_empty() {
            system_prompt.to_string()
        } else {
            format!("{system_prompt}\n\nDocuments:\n{context}")
        };

        std::iter::once(ApiMessage {
            role: "system".into(),
            content: Some(system),
        })
        .chain(history.iter().map(|m| ApiMessage {
            role: match m.role {
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
            },
            content: Some(m.content.clone()),
        }))
        .collect()
    }

    fn request_body(&self, history: &[ChatMessage], context: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&self.system_prompt, history, context),
            "temperature": self.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    fn extract_reply(response: ApiResponse) -> Result<String, BackendError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl InferenceBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        history: &[ChatMessage],
        context: &str,
    ) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(history, context);

        debug!(
            backend = %self.name,
            model = %self.model,
            messages = history.len(),
            context_chars = context.chars().count(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    BackendError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(BackendError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(BackendError::Api {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| BackendError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        Self::extract_reply(api_response)
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openrouter_constructor() {
        let backend = OpenAiCompatBackend::openrouter("sk-test");
        assert_eq!(backend.name(), "openrouter");
        assert!(backend.base_url.contains("openrouter.ai"));
    }

    #[test]
    fn ollama_constructor() {
        let backend = OpenAiCompatBackend::ollama(None);
        assert_eq!(backend.name(), "ollama");
        assert!(backend.base_url.contains("localhost:11434"));

        let backend = OpenAiCompatBackend::ollama(Some("http://gpu-box:11434/v1/"));
        assert_eq!(backend.base_url, "http://gpu-box:11434/v1");
    }

    #[test]
    fn context_goes_into_system_message() {
        let history = vec![ChatMessage::user("What is in the report?", 0)];
        let messages = OpenAiCompatBackend::to_api_messages(
            "Be brief.",
            &history,
            "q3.pdf: documents/1-q3.pdf",
        );
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(
            messages[0].content.as_deref(),
            Some("Be brief.\n\nDocuments:\nq3.pdf: documents/1-q3.pdf")
        );
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content.as_deref(), Some("What is in the report?"));
    }

    #[test]
    fn empty_context_leaves_prompt_alone() {
        let messages = OpenAiCompatBackend::to_api_messages("Be brief.", &[], "");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content.as_deref(), Some("Be brief."));
    }

    #[test]
    fn history_roles_are_mapped_in_order() {
        let history = vec![
            ChatMessage::user("hello", 0),
            ChatMessage::assistant("hi there", 1),
            ChatMessage::user("more", 2),
        ];
        let roles: Vec<_> = OpenAiCompatBackend::to_api_messages("", &history, "")
            .into_iter()
            .map(|m| m.role)
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    }

    #[test]
    fn request_body_uses_settings() {
        let config = InferenceConfig {
            model: "llama3".into(),
            max_tokens: Some(256),
            ..Default::default()
        };
        let backend = OpenAiCompatBackend::ollama(None).with_settings(&config);
        let body = backend.request_body(&[ChatMessage::user("hi", 0)], "");
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn request_body_omits_unset_max_tokens() {
        let backend = OpenAiCompatBackend::openai("sk-test").with_model("gpt-4o");
        let body = backend.request_body(&[], "");
        assert_eq!(body["model"], "gpt-4o");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn reply_is_first_choice() {
        let response: ApiResponse = serde_json::from_str(
            r#"{"id":"x","model":"m","choices":[
                {"index":0,"message":{"role":"assistant","content":"hi there"}},
                {"index":1,"message":{"role":"assistant","content":"ignored"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(OpenAiCompatBackend::extract_reply(response).unwrap(), "hi there");
    }

    #[test]
    fn no_choices_is_an_api_error() {
        let response: ApiResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = OpenAiCompatBackend::extract_reply(response).unwrap_err();
        assert!(matches!(err, BackendError::Api { status_code: 200, .. }));
    }

    #[test]
    fn timeout_follows_config() {
        let backend = OpenAiCompatBackend::openai("sk-test");
        assert_eq!(backend.timeout_secs(), InferenceConfig::default().timeout_secs);

        let config = InferenceConfig {
            timeout_secs: 300,
            ..Default::default()
        };
        let backend = backend.with_settings(&config);
        assert_eq!(backend.timeout_secs(), 300);
    }

    #[tokio::test]
    async fn silent_endpoint_reports_configured_timeout() {
        // Accepts the connection and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let backend = OpenAiCompatBackend::new("custom", base_url, "key").with_timeout_secs(1);
        let err = backend
            .generate(&[ChatMessage::user("hi", 0)], "")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout { timeout_secs: 1 }));
        server.abort();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let backend = OpenAiCompatBackend::new("custom", "http://127.0.0.1:9/v1", "key");
        let err = backend
            .generate(&[ChatMessage::user("hi", 0)], "")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }
}
