//! Document store — the session's ordered, budgeted document registry.
//!
//! `add_batch` is the only mutation that can fail on the budget. The budget
//! check and the append happen under one write lock, so two concurrent
//! batches can never each pass the check and jointly exceed the budget.
//! No lock is held across an await point outside this module.

use chrono::Utc;
use ragdesk_core::document::{DocumentDraft, DocumentId, DocumentRecord};
use ragdesk_core::error::StoreError;
use ragdesk_core::event::{DomainEvent, EventBus};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Default aggregate budget: 100 MiB.
pub const DEFAULT_BUDGET_BYTES: u64 = ragdesk_config::DEFAULT_BUDGET_BYTES;

struct StoreState {
    records: Vec<DocumentRecord>,
    total_bytes: u64,
    next_id: u64,
    selected: Option<DocumentId>,
}

pub struct DocumentStore {
    state: RwLock<StoreState>,
    budget_bytes: u64,
    events: Option<Arc<EventBus>>,
}

impl DocumentStore {
    /// Create an empty store with the given aggregate byte budget.
    pub fn new(budget_bytes: u64) -> Self {
        Self {
            state: RwLock::new(StoreState {
                records: Vec::new(),
                total_bytes: 0,
                next_id: 1,
                selected: None,
            }),
            budget_bytes,
            events: None,
        }
    }

    /// Create a store with the default 100 MiB budget.
    pub fn with_default_budget() -> Self {
        Self::new(DEFAULT_BUDGET_BYTES)
    }

    /// Publish store changes on `bus`.
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// Admit a batch of drafts, all or nothing.
    ///
    /// Records are appended in input order, each under a fresh id. If the
    /// batch would push the total over the budget, nothing changes.
    pub async fn add_batch(
        &self,
        drafts: Vec<DocumentDraft>,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let requested = drafts
            .iter()
            .try_fold(0u64, |sum, d| sum.checked_add(d.size_bytes));

        let added = {
            let mut state = self.state.write().await;
            let prospective = self.admit(state.total_bytes, requested)?;

            let mut added = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let id = DocumentId(state.next_id);
                state.next_id += 1;
                added.push(DocumentRecord::from_draft(id, draft));
            }
            state.records.extend(added.iter().cloned());
            state.total_bytes = prospective;
            added
        };

        if !added.is_empty() {
            let size_bytes: u64 = added.iter().map(|r| r.size_bytes).sum();
            info!(count = added.len(), size_bytes, "Added documents");
            self.publish(DomainEvent::DocumentsAdded {
                ids: added.iter().map(|r| r.id).collect(),
                total_bytes: size_bytes,
                timestamp: Utc::now(),
            });
        }

        Ok(added)
    }

    /// Check that `requested` more bytes would fit without admitting
    /// anything. Lets callers refuse a batch before uploading it;
    /// `add_batch` still has the final say.
    pub async fn ensure_fits(&self, requested: u64) -> Result<(), StoreError> {
        let current = self.state.read().await.total_bytes;
        self.admit(current, Some(requested)).map(|_| ())
    }

    /// New total after adding `requested` to `current`. `None` means the
    /// batch size itself overflowed.
    fn admit(&self, current: u64, requested: Option<u64>) -> Result<u64, StoreError> {
        match requested.and_then(|r| current.checked_add(r)) {
            Some(prospective) if prospective <= self.budget_bytes => Ok(prospective),
            _ => {
                let requested = requested.unwrap_or(u64::MAX);
                warn!(
                    requested,
                    current,
                    budget = self.budget_bytes,
                    "Rejected document batch over budget"
                );
                Err(StoreError::BudgetExceeded {
                    requested,
                    current,
                    budget: self.budget_bytes,
                })
            }
        }
    }

    /// Remove a document. Clears the selection if it pointed at it.
    pub async fn remove(&self, id: DocumentId) -> Result<DocumentRecord, StoreError> {
        let (removed, selection_cleared) = {
            let mut state = self.state.write().await;
            let index = state
                .records
                .iter()
                .position(|r| r.id == id)
                .ok_or(StoreError::NotFound(id))?;

            let removed = state.records.remove(index);
            state.total_bytes -= removed.size_bytes;

            let selection_cleared = state.selected == Some(id);
            if selection_cleared {
                state.selected = None;
            }
            (removed, selection_cleared)
        };

        debug!(document_id = %id, size_bytes = removed.size_bytes, "Removed document");
        self.publish(DomainEvent::DocumentRemoved {
            id,
            timestamp: Utc::now(),
        });
        if selection_cleared {
            self.publish(DomainEvent::SelectionChanged {
                id: None,
                timestamp: Utc::now(),
            });
        }

        Ok(removed)
    }

    /// Point the selection at a document currently in the store.
    pub async fn select(&self, id: DocumentId) -> Result<(), StoreError> {
        {
            let mut state = self.state.write().await;
            if !state.records.iter().any(|r| r.id == id) {
                return Err(StoreError::NotFound(id));
            }
            state.selected = Some(id);
        }

        self.publish(DomainEvent::SelectionChanged {
            id: Some(id),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Unselect without removing anything.
    pub async fn clear_selection(&self) {
        let had_selection = self.state.write().await.selected.take().is_some();
        if had_selection {
            self.publish(DomainEvent::SelectionChanged {
                id: None,
                timestamp: Utc::now(),
            });
        }
    }

    /// The selected document, if any.
    pub async fn selected(&self) -> Option<DocumentRecord> {
        let state = self.state.read().await;
        let id = state.selected?;
        state.records.iter().find(|r| r.id == id).cloned()
    }

    pub async fn get(&self, id: DocumentId) -> Option<DocumentRecord> {
        let state = self.state.read().await;
        state.records.iter().find(|r| r.id == id).cloned()
    }

    /// Snapshot of all documents in insertion order.
    pub async fn list(&self) -> Vec<DocumentRecord> {
        self.state.read().await.records.clone()
    }

    /// Sum of `size_bytes` over all current documents.
    pub async fn total_size(&self) -> u64 {
        self.state.read().await.total_bytes
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    pub fn budget(&self) -> u64 {
        self.budget_bytes
    }

    /// Bytes that can still be added.
    pub async fn remaining_budget(&self) -> u64 {
        self.budget_bytes
            .saturating_sub(self.state.read().await.total_bytes)
    }

    /// Drop every document (session end). Ids keep counting up.
    pub async fn clear(&self) {
        let (removed, selection_cleared): (Vec<DocumentId>, bool) = {
            let mut state = self.state.write().await;
            state.total_bytes = 0;
            let selection_cleared = state.selected.take().is_some();
            (state.records.drain(..).map(|r| r.id).collect(), selection_cleared)
        };

        for id in removed {
            self.publish(DomainEvent::DocumentRemoved {
                id,
                timestamp: Utc::now(),
            });
        }
        if selection_cleared {
            self.publish(DomainEvent::SelectionChanged {
                id: None,
                timestamp: Utc::now(),
            });
        }
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::with_default_budget()
    }
}
