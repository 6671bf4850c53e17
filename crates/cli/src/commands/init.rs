//! `ragdesk init` — first-time setup.

use ragdesk_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = AppConfig::config_path();

    println!("ragdesk — First-Time Setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("  Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n  Config already exists at: {}", config_path.display());
        println!("  Edit it manually or delete it and re-run init.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("  Created config.toml at: {}", config_path.display());

    let blob_dir = AppConfig::default().storage.resolved_root_dir();
    println!("  Uploaded files will be stored in: {}", blob_dir.display());

    println!("\n  Next steps:");
    println!("    1. Set an API key: export OPENAI_API_KEY=sk-...");
    println!("       (without one, replies come from the placeholder backend)");
    println!("    2. Try: ragdesk chat --file report.pdf --text \"some notes\"");
    println!();

    Ok(())
}
