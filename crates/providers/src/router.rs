//! Backend selection from configuration.

use ragdesk_config::InferenceConfig;
use ragdesk_core::error::BackendError;
use ragdesk_core::inference::InferenceBackend;
use std::sync::Arc;
use tracing::{info, warn};

use crate::openai_compat::OpenAiCompatBackend;
use crate::placeholder::PlaceholderBackend;

/// Build the backend named by `config.provider`.
///
/// Hosted providers without an API key fall back to the placeholder backend.
/// An unknown provider without a `base_url` is an error.
pub fn build_from_config(
    config: &InferenceConfig,
) -> Result<Arc<dyn InferenceBackend>, BackendError> {
    let provider = config.provider.as_str();

    if provider == "placeholder" {
        return Ok(Arc::new(PlaceholderBackend::new()));
    }

    let backend = if provider == "ollama" {
        OpenAiCompatBackend::ollama(config.base_url.as_deref())
    } else {
        let Some(api_key) = config.api_key.clone() else {
            warn!(provider, "No API key configured, using the placeholder backend");
            return Ok(Arc::new(PlaceholderBackend::new()));
        };

        let base_url = config
            .base_url
            .clone()
            .or_else(|| default_base_url(provider).map(String::from))
            .ok_or_else(|| {
                BackendError::NotConfigured(format!(
                    "provider '{provider}' needs inference.base_url"
                ))
            })?;

        OpenAiCompatBackend::new(provider, base_url, api_key)
    };

    let backend = backend.with_settings(config);
    info!(provider, model = backend.model(), "Inference backend ready");
    Ok(Arc::new(backend))
}

/// Base URL for well-known OpenAI-compatible providers.
fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "deepseek" => Some("https://api.deepseek.com/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "together" => Some("https://api.together.xyz/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str, api_key: Option<&str>) -> InferenceConfig {
        InferenceConfig {
            provider: provider.into(),
            api_key: api_key.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_placeholder() {
        let backend = build_from_config(&config("placeholder", Some("sk"))).unwrap();
        assert_eq!(backend.name(), "placeholder");
    }

    #[test]
    fn missing_key_falls_back_to_placeholder() {
        let backend = build_from_config(&config("openai", None)).unwrap();
        assert_eq!(backend.name(), "placeholder");
    }

    #[test]
    fn hosted_provider_with_key() {
        let backend = build_from_config(&config("openrouter", Some("sk-or"))).unwrap();
        assert_eq!(backend.name(), "openrouter");
    }

    #[test]
    fn ollama_needs_no_key() {
        let backend = build_from_config(&config("ollama", None)).unwrap();
        assert_eq!(backend.name(), "ollama");
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let err = build_from_config(&config("custom", Some("k"))).err().unwrap();
        assert!(matches!(err, BackendError::NotConfigured(_)));

        let mut cfg = config("custom", Some("k"));
        cfg.base_url = Some("http://localhost:9999/v1".into());
        let backend = build_from_config(&cfg).unwrap();
        assert_eq!(backend.name(), "custom");
    }

    #[test]
    fn known_providers_have_base_urls() {
        assert!(default_base_url("openai").is_some());
        assert!(default_base_url("groq").is_some());
        assert!(default_base_url("my-own-thing").is_none());
    }
}
