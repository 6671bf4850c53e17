//! `ragdesk chat` — single-message or interactive chat over ingested documents.

use ragdesk_chat::ChatSession;
use ragdesk_config::AppConfig;
use ragdesk_core::document::DocumentId;
use ragdesk_core::error::ChatError;
use ragdesk_documents::{TextInput, UrlInput};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

use super::{SourceArgs, Workspace, print_documents};

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Message(String),
    Docs,
    Select(String),
    Unselect,
    Remove(String),
    AddUrl(String),
    AddText(String),
    AddFile(PathBuf),
    Reset,
    Help,
    Exit,
    Unknown(String),
}

/// `None` for blank lines.
fn parse_line(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if matches!(line, "exit" | "quit") {
        return Some(ReplCommand::Exit);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(ReplCommand::Message(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim().to_string()),
        None => (command, String::new()),
    };

    Some(match name {
        "docs" | "ls" => ReplCommand::Docs,
        "select" => ReplCommand::Select(arg),
        "unselect" => ReplCommand::Unselect,
        "remove" | "rm" => ReplCommand::Remove(arg),
        "add-url" => ReplCommand::AddUrl(arg),
        "add-text" => ReplCommand::AddText(arg),
        "add-file" => ReplCommand::AddFile(PathBuf::from(arg)),
        "reset" => ReplCommand::Reset,
        "help" | "?" => ReplCommand::Help,
        "exit" | "quit" | "q" => ReplCommand::Exit,
        other => ReplCommand::Unknown(other.to_string()),
    })
}

fn parse_id(arg: &str) -> Result<DocumentId, String> {
    arg.parse()
        .map_err(|_| format!("'{arg}' is not a document id (try doc-1 or 1)"))
}

pub async fn run(
    sources: SourceArgs,
    message: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let backend = ragdesk_providers::build_from_config(&config.inference)?;
    if backend.name() == "placeholder" {
        eprintln!("  Note: no inference provider configured, replies are placeholders.");
        eprintln!("  Set OPENAI_API_KEY or edit {}", AppConfig::config_path().display());
    }

    let workspace = Workspace::new(config);
    workspace.add_sources(sources).await?;

    let session =
        ChatSession::from_config(Arc::clone(&workspace.store), backend, &workspace.config)
            .with_event_bus(Arc::clone(&workspace.events));

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let result = session.submit(&msg).await;
        eprint!("\r              \r");
        let reply = result?;
        println!("{}", reply.content);
        session.close();
        return Ok(());
    }

    println!();
    println!("  ragdesk — Interactive Chat");
    println!();
    println!("  Backend:   {}", session.backend_name());
    println!("  Model:     {}", workspace.config.inference.model);
    println!("  Documents:");
    print_documents(&workspace.store).await;
    println!();
    println!("  Type a question, or /help for commands. /exit to quit.");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let Some(command) = parse_line(&line) else {
            prompt()?;
            continue;
        };

        match command {
            ReplCommand::Exit => break,
            ReplCommand::Message(text) => ask(&session, &text).await,
            ReplCommand::Docs => print_documents(&workspace.store).await,
            ReplCommand::Select(arg) => match parse_id(&arg) {
                Ok(id) => match workspace.store.select(id).await {
                    Ok(()) => println!("  Selected {id}"),
                    Err(e) => eprintln!("  [Error] {e}"),
                },
                Err(e) => eprintln!("  [Error] {e}"),
            },
            ReplCommand::Unselect => {
                workspace.store.clear_selection().await;
                println!("  Selection cleared");
            }
            ReplCommand::Remove(arg) => match parse_id(&arg) {
                Ok(id) => match workspace.store.remove(id).await {
                    Ok(record) => println!("  Removed {} ({})", record.id, record.name),
                    Err(e) => eprintln!("  [Error] {e}"),
                },
                Err(e) => eprintln!("  [Error] {e}"),
            },
            ReplCommand::AddUrl(url) => {
                report_added(workspace.add(vec![UrlInput::new(url).into()]).await);
            }
            ReplCommand::AddText(text) => {
                report_added(workspace.add(vec![TextInput::new(text).into()]).await);
            }
            ReplCommand::AddFile(path) => {
                let sources = SourceArgs {
                    files: vec![path],
                    ..Default::default()
                };
                report_added(workspace.add_sources(sources).await);
            }
            ReplCommand::Reset => match session.reset() {
                Ok(()) => println!("  Conversation cleared."),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            ReplCommand::Help => print_help(),
            ReplCommand::Unknown(name) => eprintln!("  Unknown command /{name}. Try /help."),
        }

        prompt()?;
    }

    session.close();
    workspace.store.clear().await;

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

async fn ask(session: &ChatSession, text: &str) {
    eprint!("  ...");
    let result = session.submit(text).await;
    eprint!("\r     \r");

    match result {
        Ok(reply) => {
            println!();
            for line in reply.content.lines() {
                println!("  Assistant > {line}");
            }
            println!();
        }
        Err(ChatError::GenerationFailed(e)) => {
            eprintln!("  [Error] {e}");
            eprintln!("  Your message is kept; send it again to retry.");
        }
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

fn report_added<E: std::fmt::Display>(result: Result<Vec<ragdesk_core::DocumentRecord>, E>) {
    match result {
        Ok(records) => {
            for record in records {
                println!("  Added {} ({})", record.id, record.name);
            }
        }
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_help() {
    println!("  /docs              list documents");
    println!("  /select <id>       mark a document as selected");
    println!("  /unselect          clear the selection");
    println!("  /remove <id>       remove a document");
    println!("  /add-url <url>     add a URL reference");
    println!("  /add-text <text>   add pasted text");
    println!("  /add-file <path>   upload a file");
    println!("  /reset             clear the conversation");
    println!("  /exit              quit");
}
