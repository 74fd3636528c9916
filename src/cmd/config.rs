//! Configuration view and validation commands — `taskboard config`.

use anyhow::{Context, Result};

use super::super::ConfigCommands;
use taskboard::config::{TaskboardConfig, TaskboardToml};

/// Keep the first few characters of a secret so it can still be recognised.
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    format!("{}****", visible)
}

fn masked(toml: &TaskboardToml) -> TaskboardToml {
    let mut toml = toml.clone();
    toml.backend.api_key = toml.backend.api_key.as_deref().map(mask);
    toml.backend.access_token = toml.backend.access_token.as_deref().map(mask);
    toml
}

pub fn cmd_config(config: &TaskboardConfig, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Taskboard Configuration");
            println!("=======================");
            println!();

            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => {
                    println!("No taskboard.toml found at {}", config.config_file().display());
                    println!("Using defaults. Run 'taskboard config init' to create one.");
                }
            }
            println!();
            println!("Effective values (with env overrides, secrets masked):");
            println!();
            let rendered = toml::to_string_pretty(&masked(&config.toml))
                .context("Failed to render configuration")?;
            println!("{}", rendered.trim_end());
            if let Some(base) = config.toml.storage_public_url() {
                println!();
                println!("Public object URLs: {}/storage/v1/object/public/...", base.trim_end_matches('/'));
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init { force }) => {
            let path = config.init(force)?;
            println!("Created taskboard.toml at {}", path.display());
            println!();
            println!("You can now customize:");
            println!("  - [backend] url, api_key");
            println!("  - [webhook] forward_url, mode, port");
            println!("  - [board] rollback, default_columns");
            println!();
        }
    }

    Ok(())
}
