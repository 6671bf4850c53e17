//! Error types for the ragdesk domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; every variant is
//! recoverable by the caller. Nothing here is meant to abort the process.

use thiserror::Error;

use crate::document::DocumentId;

/// Everything that can go wrong when documents are added to a session:
/// normalizing the inputs or admitting them to the store.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures while normalizing a user-supplied input into a document.
#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Input is empty")]
    EmptyInput,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Unsupported file type '{mime_type}' for {name}")]
    UnsupportedType { name: String, mime_type: String },
}

impl From<StorageError> for IngestError {
    fn from(err: StorageError) -> Self {
        Self::StorageUnavailable(err.to_string())
    }
}

/// Failures of a Document Store mutation. State is unchanged when returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error(
        "Budget exceeded: adding {requested} bytes to {current} bytes would exceed the {budget} byte budget"
    )]
    BudgetExceeded {
        requested: u64,
        current: u64,
        budget: u64,
    },

    #[error("Document not found: {0}")]
    NotFound(DocumentId),
}

/// Failures of a chat turn.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    #[error("A reply is still pending; wait for it before sending another message")]
    InvalidState,

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Generation failed: {0}")]
    GenerationFailed(#[from] BackendError),

    #[error("Session is closed")]
    Closed,

    #[error("Reply discarded: the session moved on while it was being generated")]
    Superseded,
}

/// Failures reported by an inference backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend not configured: {0}")]
    NotConfigured(String),
}

/// Failures reported by a storage gateway.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Storage backend unreachable: {0}")]
    Unavailable(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),

    #[error("Storage rejected upload: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },
}
