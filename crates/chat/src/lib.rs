//! The chat side of ragdesk.
//!
//! Each user turn follows the same cycle:
//!
//! 1. **Gate** — only an idle session accepts a message
//! 2. **Record** the user message
//! 3. **Assemble** a bounded context from the session's documents
//! 4. **Generate** a reply through the inference backend (with a timeout)
//! 5. **Record** the reply, unless the session moved on in the meantime

pub mod assembler;
pub mod session;

pub use assembler::{AssembledContext, AssemblyMetadata, ContextAssembler, assemble};
pub use session::{ChatSession, SessionState};
