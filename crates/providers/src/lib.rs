//! Inference backends for ragdesk.
//!
//! All backends implement `ragdesk_core::InferenceBackend`.
//! [`build_from_config`] picks one from the `[inference]` section.

pub mod openai_compat;
pub mod placeholder;
pub mod router;

pub use openai_compat::OpenAiCompatBackend;
pub use placeholder::PlaceholderBackend;
pub use router::build_from_config;
