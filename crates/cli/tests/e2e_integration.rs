//! End-to-end integration tests for the ragdesk pipeline.
//!
//! These tests drive user inputs through the source adapter, the document
//! store, context assembly and the chat session, with scripted backends in
//! place of a real model.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ragdesk_chat::{ChatSession, ContextAssembler, SessionState, assemble};
use ragdesk_config::{AppConfig, InferenceConfig};
use ragdesk_core::document::{DocumentDraft, DocumentId, DocumentKind};
use ragdesk_core::error::{BackendError, ChatError, IngestError, StorageError, StoreError};
use ragdesk_core::event::{DomainEvent, EventBus};
use ragdesk_core::inference::InferenceBackend;
use ragdesk_core::message::{ChatMessage, Role};
use ragdesk_core::storage::StorageGateway;
use ragdesk_documents::{DocumentStore, FileInput, SourceAdapter, SourceInput, TextInput, UrlInput};
use ragdesk_storage::{FileSystemStorage, InMemoryStorage};
use tokio::sync::Notify;

// ── Test doubles ─────────────────────────────────────────────────────────

/// Returns scripted results in sequence and records every context it saw.
struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    contexts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    fn new(replies: Vec<Result<String, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            contexts: Mutex::new(Vec::new()),
        }
    }

    fn text(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "e2e_scripted"
    }

    async fn generate(
        &self,
        _history: &[ChatMessage],
        context: &str,
    ) -> Result<String, BackendError> {
        self.contexts.lock().unwrap().push(context.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedBackend exhausted"))
    }
}

/// Blocks until released so a turn can be observed mid-flight.
struct GatedBackend {
    started: Notify,
    release: Notify,
}

#[async_trait::async_trait]
impl InferenceBackend for GatedBackend {
    fn name(&self) -> &str {
        "e2e_gated"
    }

    async fn generate(&self, _: &[ChatMessage], _: &str) -> Result<String, BackendError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok("answer to a".into())
    }
}

/// A storage gateway that is always down.
struct OfflineStorage;

#[async_trait::async_trait]
impl StorageGateway for OfflineStorage {
    fn name(&self) -> &str {
        "offline"
    }

    async fn put(&self, _: &[u8], _: &str, _: &str) -> Result<String, StorageError> {
        Err(StorageError::Unavailable("connection refused".into()))
    }
}

fn pdf(name: &str, bytes: &[u8]) -> SourceInput {
    FileInput::new(bytes.to_vec(), name, Some("application/pdf".into())).into()
}

// ── E2E: full pipeline ───────────────────────────────────────────────────

#[tokio::test]
async fn e2e_ingest_assemble_and_answer() {
    let storage = Arc::new(InMemoryStorage::new());
    let adapter = SourceAdapter::new(storage.clone());
    let store = Arc::new(DocumentStore::with_default_budget());

    let drafts = adapter
        .ingest_batch(vec![
            pdf("report.pdf", b"%PDF-1.7 quarterly numbers"),
            UrlInput::new("https://example.com/pricing").into(),
            TextInput::new("Meeting notes: ship on Friday").into(),
        ])
        .await
        .unwrap();
    let records = store.add_batch(drafts).await.unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0].kind, DocumentKind::File);
    assert_eq!(records[0].size_bytes, 26);
    assert_eq!(records[1].name, "example.com");
    assert_eq!(records[1].size_bytes, 0);
    assert_eq!(records[2].name, "Text Document");
    assert_eq!(store.total_size().await, 26 + 29);
    assert_eq!(storage.len().await, 1);

    let locator = records[0].locator.clone().unwrap();
    assert!(locator.starts_with("memory://"));
    assert!(locator.ends_with("-report.pdf"));
    assert_eq!(
        storage.get(&locator).await.unwrap(),
        b"%PDF-1.7 quarterly numbers".to_vec()
    );

    let backend = Arc::new(ScriptedBackend::text("Ship date is Friday."));
    let session = ChatSession::new(Arc::clone(&store), backend.clone());
    let reply = session.submit("When do we ship?").await.unwrap();
    assert_eq!(reply.content, "Ship date is Friday.");

    let contexts = backend.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(
        contexts[0],
        format!(
            "report.pdf: {locator}\n\
             example.com: https://example.com/pricing\n\
             Text Document: Meeting notes: ship on Friday"
        )
    );
}

#[tokio::test]
async fn e2e_hello_turn_walks_the_state_machine() {
    let backend = Arc::new(GatedBackend {
        started: Notify::new(),
        release: Notify::new(),
    });
    let session = Arc::new(ChatSession::new(
        Arc::new(DocumentStore::with_default_budget()),
        backend.clone(),
    ));

    let turn = tokio::spawn({
        let session = Arc::clone(&session);
        async move { session.submit("a").await }
    });
    backend.started.notified().await;

    assert_eq!(session.state(), SessionState::AwaitingReply);
    let err = session.submit("b").await.unwrap_err();
    assert!(matches!(err, ChatError::InvalidState));
    let history = session.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].content, "a");

    backend.release.notify_one();
    turn.await.unwrap().unwrap();

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].role, Role::Assistant);
    assert_eq!(history[1].content, "answer to a");
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn e2e_failed_generation_keeps_state_intact() {
    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(BackendError::Network("connection reset".into())),
        Ok("second time lucky".into()),
    ]));
    let session = ChatSession::new(Arc::new(DocumentStore::with_default_budget()), backend);

    let err = session.submit("hello").await.unwrap_err();
    assert!(matches!(
        err,
        ChatError::GenerationFailed(BackendError::Network(_))
    ));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.history().len(), 1);

    let reply = session.submit("hello").await.unwrap();
    assert_eq!(reply.content, "second time lucky");
    assert_eq!(session.history().len(), 3);
}

// ── E2E: budget and store invariants ─────────────────────────────────────

#[tokio::test]
async fn e2e_oversized_batch_is_rejected_atomically() {
    let store = DocumentStore::with_default_budget();
    assert_eq!(store.budget(), 104_857_600);

    let err = store
        .add_batch(vec![
            DocumentDraft::file("a.mp4", "video/mp4", 60_000_000, "blobs/a.mp4"),
            DocumentDraft::file("b.mp4", "video/mp4", 50_000_000, "blobs/b.mp4"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::BudgetExceeded { .. }));
    assert!(store.is_empty().await);
    assert_eq!(store.total_size().await, 0);
}

#[tokio::test]
async fn e2e_over_budget_files_never_reach_disk() {
    let dir = tempfile::tempdir().unwrap();
    let blobs = dir.path().join("blobs");
    let adapter = SourceAdapter::new(Arc::new(FileSystemStorage::new(blobs.clone())));
    let store = DocumentStore::new(100);

    let err = adapter
        .ingest_into(
            vec![pdf("a.pdf", &[1u8; 60]), pdf("b.pdf", &[2u8; 50])],
            &store,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ragdesk_core::Error::Store(StoreError::BudgetExceeded { requested: 110, .. })
    ));
    assert!(store.is_empty().await);
    assert!(!blobs.exists());
}

#[tokio::test]
async fn e2e_budget_counts_text_bytes_across_batches() {
    let adapter = SourceAdapter::new(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::new(10);

    for _ in 0..2 {
        let draft = adapter.ingest_text(TextInput::new("hello")).unwrap();
        store.add_batch(vec![draft]).await.unwrap();
    }
    assert_eq!(store.total_size().await, 10);
    assert_eq!(store.remaining_budget().await, 0);

    let draft = adapter.ingest_text(TextInput::new("!")).unwrap();
    let err = store.add_batch(vec![draft]).await.unwrap_err();
    assert_eq!(
        err,
        StoreError::BudgetExceeded {
            requested: 1,
            current: 10,
            budget: 10,
        }
    );
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn e2e_removed_documents_stay_gone() {
    let adapter = SourceAdapter::new(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::with_default_budget();

    let draft = adapter.ingest_url(UrlInput::new("https://example.com/a")).unwrap();
    let first = store.add_batch(vec![draft.clone()]).await.unwrap()[0].clone();
    store.select(first.id).await.unwrap();

    store.remove(first.id).await.unwrap();
    assert!(store.selected().await.is_none());
    assert_eq!(
        store.select(first.id).await.unwrap_err(),
        StoreError::NotFound(first.id)
    );
    assert!(store.get(first.id).await.is_none());

    let again = store.add_batch(vec![draft]).await.unwrap()[0].clone();
    assert_ne!(again.id, first.id);
    assert_eq!(store.len().await, 1);
}

// ── E2E: ingestion failures ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_whitespace_text_creates_nothing() {
    let adapter = SourceAdapter::new(Arc::new(InMemoryStorage::new()));
    let store = DocumentStore::with_default_budget();

    let result = adapter.ingest_batch(vec![TextInput::new("  ").into()]).await;
    assert!(matches!(result, Err(IngestError::EmptyInput)));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn e2e_storage_outage_surfaces_as_ingest_error() {
    let adapter = SourceAdapter::new(Arc::new(OfflineStorage));

    let result = adapter
        .ingest_batch(vec![
            TextInput::new("fine on its own").into(),
            pdf("report.pdf", b"bytes"),
        ])
        .await;
    assert!(matches!(result, Err(IngestError::StorageUnavailable(_))));
}

#[tokio::test]
async fn e2e_invalid_url_is_rejected() {
    let adapter = SourceAdapter::new(Arc::new(InMemoryStorage::new()));
    let err = adapter.ingest_url(UrlInput::new("not a url")).unwrap_err();
    assert!(matches!(err, IngestError::InvalidUrl { .. }));
}

#[tokio::test]
async fn e2e_files_land_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = SourceAdapter::new(Arc::new(FileSystemStorage::new(dir.path().to_path_buf())));

    let draft = adapter
        .ingest(FileInput::new(b"a,b\n1,2\n".to_vec(), "sales.csv", None).into())
        .await
        .unwrap();

    assert_eq!(draft.mime_type.as_deref(), Some("text/csv"));
    let path = draft.locator.unwrap();
    assert!(path.ends_with("-sales.csv"));
    assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");
}

// ── E2E: configuration wiring ────────────────────────────────────────────

#[tokio::test]
async fn e2e_config_driven_session_with_placeholder_backend() {
    let mut config = AppConfig::default();
    config.context.max_chars = 40;
    config.inference = InferenceConfig {
        provider: "openai".into(),
        api_key: None,
        ..Default::default()
    };

    let backend = ragdesk_providers::build_from_config(&config.inference).unwrap();
    assert_eq!(backend.name(), "placeholder");

    let store = Arc::new(DocumentStore::new(config.documents.budget_bytes));
    store
        .add_batch(vec![
            DocumentDraft::text("short", "fits"),
            DocumentDraft::text("long", "x".repeat(100)),
        ])
        .await
        .unwrap();

    let session = ChatSession::from_config(Arc::clone(&store), backend, &config);
    let reply = session.submit("summarize").await.unwrap();
    assert_eq!(
        reply.content,
        ragdesk_providers::placeholder::PLACEHOLDER_REPLY
    );

    let meta = session.last_assembly().unwrap();
    assert_eq!(meta.max_chars, 40);
    assert_eq!(meta.documents_included, 1);
    assert!(meta.chars <= 40);
}

#[tokio::test]
async fn e2e_assembly_matches_free_function() {
    let store = DocumentStore::with_default_budget();
    store
        .add_batch(vec![
            DocumentDraft::text("a", "one"),
            DocumentDraft::url("example.com", "https://example.com"),
        ])
        .await
        .unwrap();
    let records = store.list().await;

    assert_eq!(assemble(&[], 500), "");
    assert_eq!(
        ContextAssembler::new(500).assemble(&records).text,
        assemble(&records, 500)
    );
}

#[tokio::test]
async fn e2e_events_follow_the_workflow() {
    let bus = Arc::new(EventBus::new(32));
    let mut rx = bus.subscribe();

    let store =
        Arc::new(DocumentStore::with_default_budget().with_event_bus(Arc::clone(&bus)));
    let session = ChatSession::new(Arc::clone(&store), Arc::new(ScriptedBackend::text("ok")))
        .with_event_bus(Arc::clone(&bus));

    let ids: Vec<DocumentId> = store
        .add_batch(vec![DocumentDraft::text("t", "hello")])
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    session.submit("hi").await.unwrap();
    session.close();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.len(), 3);
    assert!(matches!(
        seen[0].as_ref(),
        DomainEvent::DocumentsAdded { ids: added, total_bytes: 5, .. } if *added == ids
    ));
    assert!(matches!(seen[1].as_ref(), DomainEvent::TurnCompleted { .. }));
    assert!(matches!(seen[2].as_ref(), DomainEvent::SessionClosed { .. }));
}
