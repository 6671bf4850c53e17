//! `ragdesk config` — configuration management commands.

use ragdesk_config::AppConfig;

const REDACTED: &str = "[REDACTED]";

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   Config parsed successfully");

            let mut warnings = Vec::new();

            if !config.has_api_key() && config.inference.provider != "ollama" {
                warnings.push(
                    "No API key set (set RAGDESK_API_KEY or OPENAI_API_KEY); \
                     replies will come from the placeholder backend",
                );
            }

            if config.inference.provider == "custom" && config.inference.base_url.is_none() {
                warnings.push("Provider 'custom' needs inference.base_url");
            }

            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.inference.provider);
            println!("   Model:     {}", config.inference.model);
            println!("   Storage:   {}", config.storage.backend);
            println!("   Budget:    {} bytes", config.documents.budget_bytes);
            println!("   Context:   {} chars", config.context.max_chars);
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&redacted(config))?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}

fn redacted(mut config: AppConfig) -> AppConfig {
    if config.inference.api_key.is_some() {
        config.inference.api_key = Some(REDACTED.into());
    }
    if config.storage.api_key.is_some() {
        config.storage.api_key = Some(REDACTED.into());
    }
    config
}
