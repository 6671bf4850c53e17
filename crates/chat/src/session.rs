//! Chat session state machine.
//!
//! ```text
//! Idle --submit--> AwaitingReply --reply/failure--> Idle
//!   \                  |
//!    +-----close-------+-------------------------> Closed
//! ```
//!
//! Only one backend call is in flight per session. Every call is tagged with
//! the session's generation counter; `close` and `reset` bump the counter,
//! so a reply that arrives afterwards is dropped instead of being recorded.
//! The state lock is never held across the backend call.

use chrono::Utc;
use ragdesk_config::{AppConfig, DEFAULT_MAX_CONTEXT_CHARS};
use ragdesk_core::error::{BackendError, ChatError};
use ragdesk_core::event::{DomainEvent, EventBus};
use ragdesk_core::inference::InferenceBackend;
use ragdesk_core::message::{ChatMessage, SessionId};
use ragdesk_documents::DocumentStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::assembler::{AssemblyMetadata, ContextAssembler};

/// Default time a backend gets to answer one turn.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    AwaitingReply,
    Closed,
}

#[derive(Debug)]
struct Shared {
    state: SessionState,
    messages: Vec<ChatMessage>,
    generation: u64,
    next_turn: u64,
    last_assembly: Option<AssemblyMetadata>,
}

impl Shared {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            messages: Vec::new(),
            generation: 0,
            next_turn: 0,
            last_assembly: None,
        }
    }

    fn push(&mut self, message: impl FnOnce(u64) -> ChatMessage) -> ChatMessage {
        let message = message(self.next_turn);
        self.next_turn += 1;
        self.messages.push(message.clone());
        message
    }
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns the session to `Idle` if a submit future is dropped mid-turn.
struct PendingTurn {
    shared: Arc<Mutex<Shared>>,
    generation: u64,
    finished: bool,
}

impl Drop for PendingTurn {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut shared = lock(&self.shared);
        if shared.generation == self.generation && shared.state == SessionState::AwaitingReply {
            shared.state = SessionState::Idle;
            shared.generation += 1;
            debug!("Turn abandoned before the reply arrived");
        }
    }
}

/// One conversation bound to one document store.
pub struct ChatSession {
    id: SessionId,
    store: Arc<DocumentStore>,
    backend: Arc<dyn InferenceBackend>,
    assembler: ContextAssembler,
    timeout: Duration,
    shared: Arc<Mutex<Shared>>,
    events: Option<Arc<EventBus>>,
}

impl ChatSession {
    pub fn new(store: Arc<DocumentStore>, backend: Arc<dyn InferenceBackend>) -> Self {
        Self {
            id: SessionId::new(),
            store,
            backend,
            assembler: ContextAssembler::new(DEFAULT_MAX_CONTEXT_CHARS),
            timeout: DEFAULT_TURN_TIMEOUT,
            shared: Arc::new(Mutex::new(Shared::new())),
            events: None,
        }
    }

    /// Session with the context bound and turn timeout taken from config.
    pub fn from_config(
        store: Arc<DocumentStore>,
        backend: Arc<dyn InferenceBackend>,
        config: &AppConfig,
    ) -> Self {
        Self::new(store, backend)
            .with_assembler(ContextAssembler::from_config(&config.context))
            .with_timeout(Duration::from_secs(config.inference.timeout_secs))
    }

    pub fn with_assembler(mut self, assembler: ContextAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.shared).state
    }

    /// Snapshot of the conversation so far.
    pub fn history(&self) -> Vec<ChatMessage> {
        lock(&self.shared).messages.clone()
    }

    /// What the most recent turn sent as context.
    pub fn last_assembly(&self) -> Option<AssemblyMetadata> {
        lock(&self.shared).last_assembly.clone()
    }

    /// Run one turn: record `text`, ask the backend, record its reply.
    ///
    /// On failure the user message stays in the history and the session is
    /// back in `Idle`. Returns `Superseded` or `Closed` when the session was
    /// reset or closed while the backend was working.
    pub async fn submit(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let (generation, history) = {
            let mut shared = lock(&self.shared);
            match shared.state {
                SessionState::Closed => return Err(ChatError::Closed),
                SessionState::AwaitingReply => return Err(ChatError::InvalidState),
                SessionState::Idle => {}
            }

            let text = text.trim();
            if text.is_empty() {
                return Err(ChatError::EmptyMessage);
            }

            shared.push(|turn| ChatMessage::user(text, turn));
            shared.state = SessionState::AwaitingReply;
            (shared.generation, shared.messages.clone())
        };

        let mut pending = PendingTurn {
            shared: Arc::clone(&self.shared),
            generation,
            finished: false,
        };

        let records = self.store.list().await;
        let context = self.assembler.assemble(&records);
        debug!(
            session = %self.id,
            documents = context.metadata.documents_included,
            omitted = context.metadata.documents_omitted(),
            chars = context.metadata.chars,
            "Assembled context"
        );

        let outcome =
            match tokio::time::timeout(self.timeout, self.backend.generate(&history, &context.text))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                }),
            };
        pending.finished = true;

        let mut shared = lock(&self.shared);
        if shared.generation != generation {
            debug!(session = %self.id, "Dropping stale reply");
            return Err(match shared.state {
                SessionState::Closed => ChatError::Closed,
                _ => ChatError::Superseded,
            });
        }
        shared.state = SessionState::Idle;
        shared.last_assembly = Some(context.metadata);

        match outcome {
            Ok(reply) => {
                let message = shared.push(|turn| ChatMessage::assistant(reply, turn));
                drop(shared);
                info!(
                    session = %self.id,
                    turn = message.turn_index,
                    backend = self.backend.name(),
                    "Reply recorded"
                );
                self.publish(DomainEvent::TurnCompleted {
                    session_id: self.id.to_string(),
                    turn_index: message.turn_index,
                    backend: self.backend.name().to_string(),
                    timestamp: Utc::now(),
                });
                Ok(message)
            }
            Err(e) => {
                drop(shared);
                warn!(session = %self.id, backend = self.backend.name(), error = %e, "Generation failed");
                self.publish(DomainEvent::TurnFailed {
                    session_id: self.id.to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                Err(ChatError::GenerationFailed(e))
            }
        }
    }

    /// Clear the conversation and discard any pending reply.
    pub fn reset(&self) -> Result<(), ChatError> {
        let mut shared = lock(&self.shared);
        if shared.state == SessionState::Closed {
            return Err(ChatError::Closed);
        }
        shared.messages.clear();
        shared.next_turn = 0;
        shared.generation += 1;
        shared.state = SessionState::Idle;
        shared.last_assembly = None;
        info!(session = %self.id, "Session reset");
        Ok(())
    }

    /// Move to `Closed`. Idempotent.
    pub fn close(&self) {
        {
            let mut shared = lock(&self.shared);
            if shared.state == SessionState::Closed {
                return;
            }
            shared.state = SessionState::Closed;
            shared.generation += 1;
        }
        info!(session = %self.id, "Session closed");
        self.publish(DomainEvent::SessionClosed {
            session_id: self.id.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}
