//! `ragdesk ingest` — ingest documents and list them.

use ragdesk_config::AppConfig;

use super::{SourceArgs, Workspace, print_documents};

pub async fn run(sources: SourceArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if sources.is_empty() {
        return Err("Nothing to ingest: pass --file, --url or --text".into());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let workspace = Workspace::new(config);

    workspace.add_sources(sources).await?;

    if json {
        let records = workspace.store.list().await;
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print_documents(&workspace.store).await;
    }

    Ok(())
}
