//! Configuration loading, validation, and management for ragdesk.
//!
//! Loads configuration from `~/.ragdesk/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default aggregate document budget: 100 MiB.
pub const DEFAULT_BUDGET_BYTES: u64 = 100 * 1024 * 1024;

/// Default number of characters of document context sent per turn.
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

/// The root configuration structure.
///
/// Maps directly to `~/.ragdesk/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document ingestion and store settings
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Context assembly settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Language model backend settings
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Blob storage settings
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Aggregate byte budget per store
    #[serde(default = "default_budget_bytes")]
    pub budget_bytes: u64,

    /// MIME patterns accepted for file uploads (`image/*` matches by prefix)
    #[serde(default = "default_accepted_mime_types")]
    pub accepted_mime_types: Vec<String>,

    /// Label given to pasted text when the caller supplies none
    #[serde(default = "default_text_document_name")]
    pub text_document_name: String,

    /// Guess the MIME type from the file extension when none is declared
    #[serde(default = "default_true")]
    pub guess_mime_types: bool,
}

fn default_budget_bytes() -> u64 {
    DEFAULT_BUDGET_BYTES
}

fn default_accepted_mime_types() -> Vec<String> {
    [
        "image/*",
        "video/*",
        "audio/*",
        "application/pdf",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "text/csv",
        "text/plain",
        "text/markdown",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_text_document_name() -> String {
    "Text Document".into()
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            budget_bytes: default_budget_bytes(),
            accepted_mime_types: default_accepted_mime_types(),
            text_document_name: default_text_document_name(),
            guess_mime_types: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum characters of assembled context per turn
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Appended after the last included document when some were dropped.
    /// `{n}` is replaced by the number of dropped documents.
    #[serde(default = "default_truncation_marker")]
    pub truncation_marker: String,
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

fn default_truncation_marker() -> String {
    "[... {n} more document(s) omitted]".into()
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            truncation_marker: default_truncation_marker(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Backend: "openai", "openrouter", "ollama", "custom", or "placeholder"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model name sent to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// API key (env overrides apply when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Per-call generation timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Instructions placed ahead of the document context
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_system_prompt() -> String {
    "You are a helpful assistant. Answer the user's questions using the documents \
     they have provided. If the documents do not contain the answer, say so."
        .into()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend: "filesystem", "memory", or "http"
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Directory for the filesystem backend (default: ~/.ragdesk/blobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    /// Object store endpoint for the http backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Cache-Control max-age sent with uploads
    #[serde(default = "default_cache_control_secs")]
    pub cache_control_secs: u64,
}

fn default_storage_backend() -> String {
    "filesystem".into()
}
fn default_bucket() -> String {
    "documents".into()
}
fn default_cache_control_secs() -> u64 {
    3600
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            root_dir: None,
            base_url: None,
            bucket: default_bucket(),
            api_key: None,
            cache_control_secs: default_cache_control_secs(),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("root_dir", &self.root_dir)
            .field("base_url", &self.base_url)
            .field("bucket", &self.bucket)
            .field("api_key", &redact(&self.api_key))
            .field("cache_control_secs", &self.cache_control_secs)
            .finish()
    }
}

impl StorageConfig {
    /// Directory used by the filesystem backend.
    pub fn resolved_root_dir(&self) -> PathBuf {
        self.root_dir
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("blobs"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ragdesk/config.toml).
    ///
    /// Also checks environment variables:
    /// - `RAGDESK_API_KEY`, then `OPENAI_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `RAGDESK_PROVIDER`, `RAGDESK_MODEL`
    /// - `RAGDESK_STORAGE_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.inference.api_key.is_none() {
            self.inference.api_key = std::env::var("RAGDESK_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("RAGDESK_PROVIDER") {
            self.inference.provider = provider;
        }

        if let Ok(model) = std::env::var("RAGDESK_MODEL") {
            self.inference.model = model;
        }

        if self.storage.api_key.is_none() {
            self.storage.api_key = std::env::var("RAGDESK_STORAGE_KEY").ok();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ragdesk")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.documents.budget_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "documents.budget_bytes must be greater than 0".into(),
            ));
        }

        if self.context.max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_chars must be greater than 0".into(),
            ));
        }

        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "inference.timeout_secs must be greater than 0".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.inference.temperature) {
            return Err(ConfigError::ValidationError(
                "inference.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        match self.storage.backend.as_str() {
            "filesystem" | "memory" => {}
            "http" if self.storage.base_url.is_none() => {
                return Err(ConfigError::ValidationError(
                    "storage.base_url is required for the http backend".into(),
                ));
            }
            "http" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown storage.backend '{other}' (expected filesystem, memory or http)"
                )));
            }
        }

        Ok(())
    }

    /// Whether the inference backend has a key to talk to a hosted model.
    pub fn has_api_key(&self) -> bool {
        self.inference.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
