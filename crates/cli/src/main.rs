//! ragdesk CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Write a default config
//! - `ingest`  — Ingest documents and list them
//! - `chat`    — Ingest documents, then chat about them
//! - `config`  — Show, locate or validate the config

use clap::{Parser, Subcommand};

mod commands;

use commands::SourceArgs;

#[derive(Parser)]
#[command(
    name = "ragdesk",
    about = "ragdesk — chat with your documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config directory and a default config.toml
    Init,

    /// Ingest documents and print the resulting document list
    Ingest {
        #[command(flatten)]
        sources: SourceArgs,

        /// Print the documents as JSON
        #[arg(long)]
        json: bool,
    },

    /// Chat about a set of documents
    Chat {
        #[command(flatten)]
        sources: SourceArgs,

        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Print the config file location
    Path,
    /// Load and validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Ingest { sources, json } => commands::ingest::run(sources, json).await?,
        Commands::Chat { sources, message } => commands::chat::run(sources, message).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
        },
    }

    Ok(())
}
