//! Domain event system — decoupled communication between bounded contexts.
//!
//! The document store and chat session publish events when something
//! interesting happens. A UI layer (or a log sink) subscribes to react
//! without being wired into either component.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::document::DocumentId;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A batch of documents was admitted to a store
    DocumentsAdded {
        ids: Vec<DocumentId>,
        total_bytes: u64,
        timestamp: DateTime<Utc>,
    },

    /// A document was removed from a store
    DocumentRemoved {
        id: DocumentId,
        timestamp: DateTime<Utc>,
    },

    /// The selected document changed (None = cleared)
    SelectionChanged {
        id: Option<DocumentId>,
        timestamp: DateTime<Utc>,
    },

    /// An assistant reply was recorded
    TurnCompleted {
        session_id: String,
        turn_index: u64,
        backend: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn ended without a reply
    TurnFailed {
        session_id: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// A session reached its terminal state
    SessionClosed {
        session_id: String,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::DocumentRemoved {
            id: DocumentId(3),
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::DocumentRemoved { id, .. } => assert_eq!(*id, DocumentId(3)),
            other => panic!("Expected DocumentRemoved, got {other:?}"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::SessionClosed {
            session_id: "s1".into(),
            timestamp: Utc::now(),
        });
    }
}
