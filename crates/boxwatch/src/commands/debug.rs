//! Debug subcommand handlers.

use tracing::{info, warn};

use boxwatch_config::Config;
use boxwatch_core::{Notification, Notifier, TransportConfig, TransportKind};

use crate::cli::{DebugArgs, DebugCommand};
use crate::commands::util;
use crate::error::CliError;

pub async fn handle(args: DebugArgs, cfg: &Config) -> Result<(), CliError> {
    match args.command {
        DebugCommand::Notifications => notifications(cfg).await,
    }
}

/// Send a test notification through every registered transport.
///
/// Transport options come from `[healthchecks.default]`. A transport that
/// cannot be set up or fails to deliver is logged and skipped.
async fn notifications(cfg: &Config) -> Result<(), CliError> {
    let http = util::http_client()?;
    let registry = util::build_registry(cfg, &http);
    if registry.is_empty() {
        warn!("no notification transport configured; add an [email] or [slack] section");
        return Ok(());
    }

    let defaults = cfg.resolve_notify_config("default")?;
    let notification = Notification::test(&util::hostname());

    for kind in registry.kinds() {
        let options = transport_config(kind, defaults.notifications.as_ref());
        info!(transport = %kind, "testing notifier with options {options:?}");

        let notifier = match registry.resolve(options.as_ref()) {
            Ok(n) => n,
            Err(e) => {
                warn!(transport = %kind, "could not initialize notifier, configuration might be missing? {e}");
                continue;
            }
        };
        match notifier.submit(&notification).await {
            Ok(()) => info!(transport = %kind, "test notification submitted, check the specified inbox"),
            Err(e) => warn!(transport = %kind, "could not submit test notification: {e}"),
        }
    }
    Ok(())
}

/// Options for `kind`: the default block if it selects `kind`, else the
/// option-less form where the transport has one.
fn transport_config(kind: TransportKind, default: Option<&TransportConfig>) -> Option<TransportConfig> {
    match default {
        Some(config) if config.kind() == kind => Some(config.clone()),
        _ => match kind {
            TransportKind::Slack => Some(TransportConfig::Slack),
            TransportKind::Email => None,
        },
    }
}
