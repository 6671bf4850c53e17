//! # ragdesk Core
//!
//! Domain types, traits, and error definitions for the ragdesk document
//! chat engine. This crate does **no I/O**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators (blob storage and the language model) are
//! defined as traits here. Implementations live in their respective crates.
//! This enables:
//! - Swapping implementations via configuration
//! - Deterministic testing with fake backends
//! - Clean dependency graph (all crates depend inward on core)

pub mod document;
pub mod error;
pub mod event;
pub mod inference;
pub mod message;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use document::{DocumentDraft, DocumentId, DocumentKind, DocumentRecord, format_size};
pub use error::{BackendError, ChatError, Error, IngestError, Result, StorageError, StoreError};
pub use event::{DomainEvent, EventBus};
pub use inference::InferenceBackend;
pub use message::{ChatMessage, Role, SessionId};
pub use storage::StorageGateway;
