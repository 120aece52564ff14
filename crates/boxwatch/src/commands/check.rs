//! One-off checks, and the cycle shared with `watch`.

use chrono::Utc;
use tracing::{debug, info};

use boxwatch_api::OsemClient;
use boxwatch_config::Config;
use boxwatch_core::{
    BoxFailure, BoxFilters, CoreError, Dispatcher, ResultCache, StatusFilter, log_results,
    runner,
};

use crate::cli::{BoxFilterArgs, CheckArgs, CheckTarget};
use crate::commands::util;
use crate::error::CliError;

impl From<BoxFilterArgs> for BoxFilters {
    fn from(args: BoxFilterArgs) -> Self {
        Self {
            date: args.date,
            exposure: args.exposure,
            grouptag: args.grouptag,
            model: args.model,
            phenomenon: args.phenomenon,
        }
    }
}

/// Everything one check cycle needs, built once per invocation.
pub struct CheckRun<'a> {
    cfg: &'a Config,
    client: OsemClient,
    /// Set when notifications are enabled.
    notify: Option<(Dispatcher, StatusFilter)>,
}

impl<'a> CheckRun<'a> {
    pub fn new(cfg: &'a Config) -> Result<Self, CliError> {
        let client = util::api_client(cfg)?;
        let http = util::http_client()?;
        let notify = cfg
            .status_filter()?
            .map(|filter| (Dispatcher::new(util::build_registry(cfg, &http)), filter));
        Ok(Self {
            cfg,
            client,
            notify,
        })
    }

    /// Check the targeted boxes once and send due notifications.
    ///
    /// Every box is attempted; failed boxes are reported together at the end.
    pub async fn run(&self, target: &CheckTarget) -> Result<(), CoreError> {
        let ids = self.box_ids(target).await?;
        let configs = self.cfg.box_configs(ids.iter().map(String::as_str));
        let results = runner::evaluate(&self.client, &configs, Utc::now()).await;
        let summary = log_results(&results);
        debug!(?summary, "check finished");

        let mut failures: Vec<BoxFailure> = results.failures().to_vec();
        if let Some((dispatcher, filter)) = &self.notify {
            let mut cache = (!self.cfg.no_cache).then(|| ResultCache::load(self.cfg.cache_file()));
            let report = dispatcher.dispatch(&results, *filter, cache.as_mut()).await;
            failures.extend(report.failures);
        }

        BoxFailure::aggregate(&failures)
    }

    async fn box_ids(&self, target: &CheckTarget) -> Result<Vec<String>, CoreError> {
        match target {
            CheckTarget::Boxes { ids } => Ok(ids.clone()),
            CheckTarget::All(filters) => {
                let boxes = self
                    .client
                    .get_all_boxes(&BoxFilters::from(filters.clone()))
                    .await?;
                info!("found {} box(es) on {}", boxes.len(), self.client.base_url());
                Ok(boxes.into_iter().map(|b| b.id).collect())
            }
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: CheckArgs, cfg: &Config) -> Result<(), CliError> {
    if let CheckTarget::Boxes { ids } = &args.target {
        util::validate_box_ids(ids)?;
    }
    CheckRun::new(cfg)?.run(&args.target).await?;
    Ok(())
}
