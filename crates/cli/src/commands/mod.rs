//! Subcommands and the pieces they share.

pub mod chat;
pub mod config_cmd;
pub mod ingest;
pub mod init;

use clap::Args;
use ragdesk_config::AppConfig;
use ragdesk_core::document::{DocumentRecord, format_size};
use ragdesk_core::event::EventBus;
use ragdesk_core::storage::StorageGateway;
use ragdesk_documents::{
    DocumentStore, FileInput, SourceAdapter, SourceInput, TextInput, UrlInput,
};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Documents named on the command line.
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// File to ingest (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// URL to reference (repeatable)
    #[arg(short, long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Text to add as a document (repeatable)
    #[arg(short, long = "text", value_name = "TEXT")]
    pub texts: Vec<String>,
}

impl SourceArgs {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.urls.is_empty() && self.texts.is_empty()
    }

    /// Bytes these sources will count against the budget, from file
    /// metadata so nothing has to be read yet.
    pub async fn declared_bytes(&self) -> Result<u64, Box<dyn Error>> {
        let mut total = self
            .texts
            .iter()
            .fold(0u64, |sum, t| sum.saturating_add(t.len() as u64));
        for path in &self.files {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
            total = total.saturating_add(metadata.len());
        }
        Ok(total)
    }

    /// Read files from disk and wrap everything as adapter inputs.
    pub async fn into_inputs(self) -> Result<Vec<SourceInput>, Box<dyn Error>> {
        let mut inputs =
            Vec::with_capacity(self.files.len() + self.urls.len() + self.texts.len());
        for path in &self.files {
            inputs.push(read_file(path).await?.into());
        }
        inputs.extend(self.urls.into_iter().map(|u| UrlInput::new(u).into()));
        inputs.extend(self.texts.into_iter().map(|t| TextInput::new(t).into()));
        Ok(inputs)
    }
}

async fn read_file(path: &std::path::Path) -> Result<FileInput, Box<dyn Error>> {
    FileInput::from_path(path)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", path.display()).into())
}

/// The store, adapter and event bus for one CLI run.
pub struct Workspace {
    pub config: AppConfig,
    pub events: Arc<EventBus>,
    pub store: Arc<DocumentStore>,
    pub adapter: SourceAdapter,
}

impl Workspace {
    /// Must be called inside the tokio runtime: domain events are
    /// forwarded to the log by a background task.
    pub fn new(config: AppConfig) -> Self {
        let storage = ragdesk_storage::build_from_config(&config.storage);
        Self::with_storage(config, storage)
    }

    /// Like [`Workspace::new`] with an explicit storage gateway.
    pub fn with_storage(config: AppConfig, storage: Arc<dyn StorageGateway>) -> Self {
        let events = Arc::new(EventBus::default());
        spawn_event_logger(&events);

        debug!(storage = storage.name(), "Storage gateway ready");
        let adapter = SourceAdapter::from_config(storage, &config.documents);
        let store = Arc::new(
            DocumentStore::new(config.documents.budget_bytes).with_event_bus(Arc::clone(&events)),
        );

        Self {
            config,
            events,
            store,
            adapter,
        }
    }

    /// Ingest `inputs` and admit them to the store as one batch.
    pub async fn add(
        &self,
        inputs: Vec<SourceInput>,
    ) -> ragdesk_core::Result<Vec<DocumentRecord>> {
        self.adapter.ingest_into(inputs, &self.store).await
    }

    /// Check the budget against file sizes on disk, then read and add.
    pub async fn add_sources(
        &self,
        sources: SourceArgs,
    ) -> Result<Vec<DocumentRecord>, Box<dyn Error>> {
        let declared = sources.declared_bytes().await?;
        self.store.ensure_fits(declared).await?;
        let inputs = sources.into_inputs().await?;
        Ok(self.add(inputs).await?)
    }
}

fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            debug!(?event, "Domain event");
        }
    });
}

/// Print the store contents with sizes and budget usage.
pub async fn print_documents(store: &DocumentStore) {
    let records = store.list().await;
    let selected = store.selected().await.map(|r| r.id);

    if records.is_empty() {
        println!("  (no documents)");
    }
    for record in &records {
        let marker = if Some(record.id) == selected { "*" } else { " " };
        println!(
            "  {marker} {:<8} {:<5} {:>10}  {}",
            record.id.to_string(),
            record.kind.to_string(),
            format_size(record.size_bytes),
            record.name
        );
    }
    println!(
        "  {} document(s), {} of {} used",
        records.len(),
        format_size(store.total_size().await),
        format_size(store.budget())
    );
}
