//! Repeated checks until Ctrl-C.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use boxwatch_config::Config;

use crate::cli::{CheckTarget, WatchArgs};
use crate::commands::check::CheckRun;
use crate::commands::util;
use crate::error::CliError;

fn interval(args: &WatchArgs, cfg: &Config) -> Result<Duration, CliError> {
    match args.interval {
        Some(0) => Err(CliError::Validation {
            field: "interval".into(),
            reason: "must be at least 1 minute".into(),
        }),
        Some(minutes) => Ok(Duration::from_secs(minutes.saturating_mul(60))),
        None => Ok(cfg.watch_interval()),
    }
}

pub async fn handle(args: WatchArgs, cfg: &Config) -> Result<(), CliError> {
    if let CheckTarget::Boxes { ids } = &args.target {
        util::validate_box_ids(ids)?;
    }
    let interval = interval(&args, cfg)?;
    let run = CheckRun::new(cfg)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutting down after the current check");
                on_signal.cancel();
            }
            Err(e) => warn!("cannot listen for Ctrl-C: {e}"),
        }
    });

    info!("starting watch mode, checking every {}", humanize(interval));
    let (run, target) = (&run, &args.target);
    boxwatch_core::watch::watch(interval, cancel, move || run.run(target)).await?;
    Ok(())
}

fn humanize(interval: Duration) -> String {
    let minutes = interval.as_secs() / 60;
    if minutes == 1 {
        "minute".into()
    } else {
        format!("{minutes} minutes")
    }
}
