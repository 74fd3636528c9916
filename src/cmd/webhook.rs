//! Storage webhook forwarder command — `taskboard webhook serve`.

use anyhow::Result;

use super::super::WebhookCommands;
use taskboard::config::{ENV_FORWARD_URL, TaskboardConfig};
use taskboard::webhook::{WebhookServerConfig, start_server};

pub async fn cmd_webhook(config: &TaskboardConfig, command: WebhookCommands) -> Result<()> {
    match command {
        WebhookCommands::Serve { host, port, mode } => {
            let section = &config.toml.webhook;
            let Some(forward_url) = section.forward_url.clone() else {
                anyhow::bail!(
                    "No forward URL configured: set webhook.forward_url in taskboard.toml or {}",
                    ENV_FORWARD_URL
                );
            };
            let Some(storage_public_url) = config.toml.storage_public_url() else {
                anyhow::bail!(
                    "No storage URL configured: set webhook.storage_public_url or backend.url"
                );
            };

            start_server(WebhookServerConfig {
                host: host.unwrap_or_else(|| section.host.clone()),
                port: port.unwrap_or(section.port),
                forward_url,
                storage_public_url: storage_public_url.to_string(),
                mode: mode.unwrap_or(section.mode),
                timeout_secs: section.timeout_secs,
            })
            .await
        }
    }
}
