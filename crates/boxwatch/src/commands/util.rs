//! Shared helpers for command handlers.

use std::io::IsTerminal;

use boxwatch_api::{HttpConfig, OsemClient};
use boxwatch_config::Config;
use boxwatch_core::{EmailTransport, NotifierRegistry, SlackTransport};
use tracing::debug;

use crate::error::CliError;

const BOX_ID_LEN: usize = 24;

/// Box ids are 24 hex characters (MongoDB object ids).
pub fn validate_box_ids(ids: &[String]) -> Result<(), CliError> {
    for id in ids {
        if id.len() != BOX_ID_LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CliError::Validation {
                field: "box id".into(),
                reason: format!("'{id}' is not a 24 character hex id"),
            });
        }
    }
    Ok(())
}

/// Client for the configured openSenseMap API.
pub fn api_client(cfg: &Config) -> Result<OsemClient, CliError> {
    OsemClient::new(cfg.api_url()?, &HttpConfig::default()).map_err(|e| CliError::Config {
        message: e.to_string(),
    })
}

/// HTTP client for the webhook transport.
pub fn http_client() -> Result<reqwest::Client, CliError> {
    HttpConfig::default()
        .build_client()
        .map_err(|e| CliError::Config {
            message: e.to_string(),
        })
}

/// Register a transport for every `[email]` / `[slack]` section present.
pub fn build_registry(cfg: &Config, http: &reqwest::Client) -> NotifierRegistry {
    let mut registry = NotifierRegistry::new();
    if let Some(settings) = cfg.smtp_settings() {
        registry.register(EmailTransport::new(settings));
    }
    if let Some(webhook) = cfg.slack_webhook() {
        registry.register(SlackTransport::new(webhook, http.clone()));
    }
    debug!(transports = ?registry.kinds(), "notification transports");
    registry
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Name of this machine, for test notifications.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".into())
}
