//! Document ingestion and storage for ragdesk.
//!
//! Inputs flow one way:
//!
//! 1. **Normalize** a file, URL or pasted text into a [`DocumentDraft`]
//!    ([`SourceAdapter`]); files are persisted through the storage gateway
//! 2. **Admit** drafts into the session's [`DocumentStore`], which assigns
//!    ids and enforces the aggregate byte budget atomically per batch
//!
//! [`DocumentDraft`]: ragdesk_core::DocumentDraft

pub mod accept;
pub mod adapter;
pub mod store;

pub use accept::AcceptPolicy;
pub use adapter::{FileInput, SourceAdapter, SourceInput, TextInput, UrlInput};
pub use store::DocumentStore;
