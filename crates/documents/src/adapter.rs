//! Source adapter — normalizes user inputs into document drafts.
//!
//! | Input | Name | Size | Payload | I/O |
//! |-------|------|------|---------|-----|
//! | File | filename | byte length | storage locator | one gateway `put` |
//! | URL | host | 0 | the URL | none |
//! | Text | label | UTF-8 byte length | inline text | none |
//!
//! The adapter never retries a failed upload; that is the gateway's or the
//! caller's call.

use futures::future::try_join_all;
use ragdesk_config::DocumentsConfig;
use ragdesk_core::document::{DocumentDraft, DocumentRecord};
use ragdesk_core::error::IngestError;
use ragdesk_core::storage::StorageGateway;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::accept::AcceptPolicy;
use crate::store::DocumentStore;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A binary file supplied by the user.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub bytes: Vec<u8>,
    pub name: String,
    /// Declared MIME type; guessed from the name when absent
    pub mime_type: Option<String>,
}

impl FileInput {
    pub fn new(bytes: Vec<u8>, name: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            bytes,
            name: name.into(),
            mime_type,
        }
    }

    /// Read a file from disk. The MIME type is left to the adapter to guess.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(bytes, name, None))
    }
}

/// A URL reference. Not fetched at ingestion time.
#[derive(Debug, Clone)]
pub struct UrlInput {
    pub url: String,
}

impl UrlInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Pasted text.
#[derive(Debug, Clone)]
pub struct TextInput {
    pub text: String,
    /// Label for the document; the configured default when absent
    pub name: Option<String>,
}

impl TextInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: None,
        }
    }

    pub fn named(text: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: Some(name.into()),
        }
    }
}

/// Any input the adapter can normalize.
#[derive(Debug, Clone)]
pub enum SourceInput {
    File(FileInput),
    Url(UrlInput),
    Text(TextInput),
}

impl SourceInput {
    /// Bytes this input will count against the store budget.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::File(file) => file.bytes.len() as u64,
            Self::Url(_) => 0,
            Self::Text(text) => text.text.len() as u64,
        }
    }
}

impl From<FileInput> for SourceInput {
    fn from(input: FileInput) -> Self {
        Self::File(input)
    }
}

impl From<UrlInput> for SourceInput {
    fn from(input: UrlInput) -> Self {
        Self::Url(input)
    }
}

impl From<TextInput> for SourceInput {
    fn from(input: TextInput) -> Self {
        Self::Text(input)
    }
}

pub struct SourceAdapter {
    storage: Arc<dyn StorageGateway>,
    accept: AcceptPolicy,
    text_document_name: String,
    guess_mime_types: bool,
}

impl SourceAdapter {
    /// Create an adapter that accepts every file type.
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self {
            storage,
            accept: AcceptPolicy::any(),
            text_document_name: "Text Document".into(),
            guess_mime_types: true,
        }
    }

    pub fn from_config(storage: Arc<dyn StorageGateway>, config: &DocumentsConfig) -> Self {
        Self::new(storage)
            .with_accept_policy(AcceptPolicy::from_config(config))
            .with_text_document_name(&config.text_document_name)
            .with_mime_guessing(config.guess_mime_types)
    }

    pub fn with_accept_policy(mut self, accept: AcceptPolicy) -> Self {
        self.accept = accept;
        self
    }

    pub fn with_text_document_name(mut self, name: impl Into<String>) -> Self {
        self.text_document_name = name.into();
        self
    }

    pub fn with_mime_guessing(mut self, enabled: bool) -> Self {
        self.guess_mime_types = enabled;
        self
    }

    /// Normalize one input.
    pub async fn ingest(&self, input: SourceInput) -> Result<DocumentDraft, IngestError> {
        match input {
            SourceInput::File(file) => self.ingest_file(file).await,
            SourceInput::Url(url) => self.ingest_url(url),
            SourceInput::Text(text) => self.ingest_text(text),
        }
    }

    /// Normalize several inputs, preserving their order. File uploads run
    /// concurrently. The first failure fails the whole batch; blobs already
    /// uploaded by other inputs are left in storage.
    pub async fn ingest_batch(
        &self,
        inputs: Vec<SourceInput>,
    ) -> Result<Vec<DocumentDraft>, IngestError> {
        let count = inputs.len();
        let drafts = try_join_all(inputs.into_iter().map(|input| self.ingest(input))).await?;
        info!(count, "Ingested batch");
        Ok(drafts)
    }

    /// Ingest `inputs` and admit them to `store` as one batch.
    ///
    /// The budget is checked before anything is uploaded, so a batch that
    /// cannot fit leaves no blobs behind.
    pub async fn ingest_into(
        &self,
        inputs: Vec<SourceInput>,
        store: &DocumentStore,
    ) -> ragdesk_core::Result<Vec<DocumentRecord>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let requested = inputs
            .iter()
            .try_fold(0u64, |sum, input| sum.checked_add(input.size_bytes()))
            .unwrap_or(u64::MAX);
        store.ensure_fits(requested).await?;

        let drafts = self.ingest_batch(inputs).await?;
        Ok(store.add_batch(drafts).await?)
    }

    pub async fn ingest_file(&self, input: FileInput) -> Result<DocumentDraft, IngestError> {
        let mime_type = self.resolve_mime_type(&input);
        if !self.accept.accepts(&mime_type) {
            return Err(IngestError::UnsupportedType {
                name: input.name,
                mime_type,
            });
        }

        let locator = self.storage.put(&input.bytes, &input.name, &mime_type).await?;
        debug!(
            name = %input.name,
            mime_type = %mime_type,
            size_bytes = input.bytes.len(),
            storage = self.storage.name(),
            "Stored file input"
        );

        Ok(DocumentDraft::file(
            input.name,
            mime_type,
            input.bytes.len() as u64,
            locator,
        ))
    }

    pub fn ingest_url(&self, input: UrlInput) -> Result<DocumentDraft, IngestError> {
        let raw = input.url.trim();
        let parsed = Url::parse(raw).map_err(|e| IngestError::InvalidUrl {
            url: input.url.clone(),
            reason: e.to_string(),
        })?;

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| IngestError::InvalidUrl {
                url: input.url.clone(),
                reason: "URL has no host".into(),
            })?;

        Ok(DocumentDraft::url(host, raw))
    }

    pub fn ingest_text(&self, input: TextInput) -> Result<DocumentDraft, IngestError> {
        if input.text.trim().is_empty() {
            return Err(IngestError::EmptyInput);
        }

        let name = input
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.text_document_name.clone());

        Ok(DocumentDraft::text(name, input.text))
    }

    fn resolve_mime_type(&self, input: &FileInput) -> String {
        if let Some(declared) = input.mime_type.as_deref().map(str::trim)
            && !declared.is_empty()
        {
            return declared.to_string();
        }

        if self.guess_mime_types
            && let Some(guess) = mime_guess::from_path(&input.name).first_raw()
        {
            return guess.to_string();
        }

        FALLBACK_MIME.to_string()
    }
}
