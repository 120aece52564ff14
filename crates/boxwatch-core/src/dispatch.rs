// ── Notification dispatch ──
//
// Per box: diff against the cache, apply the status filter, compose one
// notification, submit it with retries, and only then record the box's
// full result set in the cache. A box whose delivery fails keeps its old
// cache state, so the same changes are offered again on the next cycle.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::cache::{Change, ResultCache};
use crate::error::CoreError;
use crate::model::{BoxCheckResults, BoxEvaluation, BoxFailure, StatusFilter};
use crate::notify::{Notification, Notifier, NotifierRegistry};

/// Total submit attempts per notification.
pub const DEFAULT_ATTEMPTS: u32 = 3;
/// Fixed pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// Boxes a notification was delivered for.
    pub notified: Vec<String>,
    /// Boxes with nothing due.
    pub unchanged: Vec<String>,
    /// Boxes whose notification could not be configured or delivered.
    pub failures: Vec<BoxFailure>,
}

impl DispatchReport {
    pub fn ensure_success(&self) -> Result<(), CoreError> {
        BoxFailure::aggregate(&self.failures)
    }
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: NotifierRegistry,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(registry: NotifierRegistry) -> Self {
        Self {
            registry,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Notify about changed results of every evaluated box.
    ///
    /// With a cache, a result is due when its status differs from the
    /// cached one (a rule instance never seen before counts as changed)
    /// and it passes `filter`. With `cache = None` every result passing
    /// `filter` is due and nothing is recorded. The cache is persisted
    /// once at the end; a failed write is logged and the run goes on.
    pub async fn dispatch(
        &self,
        results: &BoxCheckResults,
        filter: StatusFilter,
        mut cache: Option<&mut ResultCache>,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();

        for evaluation in results.boxes() {
            let box_id = evaluation.sensebox.id.as_str();
            let due = due_results(cache.as_deref(), evaluation, filter);

            if due.is_empty() {
                debug!(box_id, "no notifications due");
                if let Some(c) = cache.as_deref_mut() {
                    c.update(box_id, &evaluation.results);
                }
                report.unchanged.push(box_id.to_owned());
                continue;
            }

            match self.notify_box(evaluation, &due).await {
                Ok(()) => {
                    if let Some(c) = cache.as_deref_mut() {
                        c.update(box_id, &evaluation.results);
                    }
                    report.notified.push(box_id.to_owned());
                }
                Err(e) => {
                    error!(box_id, "{e}");
                    report.failures.push(BoxFailure {
                        box_id: box_id.to_owned(),
                        error: e,
                    });
                }
            }
        }

        if let Some(Err(e)) = cache.as_deref().map(ResultCache::persist) {
            warn!("{e}");
        }

        if report.notified.is_empty() && report.failures.is_empty() {
            info!("No notifications due.");
        }
        report
    }

    async fn notify_box(
        &self,
        evaluation: &BoxEvaluation,
        due: &[Change<'_>],
    ) -> Result<(), CoreError> {
        let sensebox = &evaluation.sensebox;
        let transport = evaluation.config().and_then(|c| c.notifications.as_ref());
        let notifier = self.registry.resolve(transport)?;
        let transport = transport.map(|t| t.kind().to_string()).unwrap_or_default();

        let notification = Notification::compose(sensebox, due, Utc::now());
        self.submit_with_retry(notifier.as_ref(), &notification, &transport)
            .await?;

        let issues = due.iter().filter(|c| c.result.is_failed()).count();
        info!(
            box_id = %sensebox.id,
            transport = %transport,
            "Sent notification for {} via {transport} with {issues} new issue(s) and {} OK result(s)",
            sensebox.name,
            due.len() - issues
        );
        Ok(())
    }

    async fn submit_with_retry(
        &self,
        notifier: &dyn Notifier,
        notification: &Notification,
        transport: &str,
    ) -> Result<(), CoreError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match notifier.submit(notification).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts => {
                    warn!(
                        transport,
                        attempt,
                        "{e}; retrying in {}",
                        humantime::format_duration(self.retry.delay)
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(CoreError::DeliveryExhausted {
                        transport: transport.to_owned(),
                        attempts,
                        message: e.to_string(),
                    });
                }
            }
        }
    }
}

fn due_results<'a>(
    cache: Option<&ResultCache>,
    evaluation: &'a BoxEvaluation,
    filter: StatusFilter,
) -> Vec<Change<'a>> {
    let changed: Vec<Change<'a>> = match cache {
        Some(cache) => cache.diff(&evaluation.sensebox.id, &evaluation.results),
        None => evaluation
            .results
            .iter()
            .map(|result| Change {
                result,
                previous: None,
            })
            .collect(),
    };

    changed
        .into_iter()
        .filter(|c| filter.admits(c.result.status))
        .collect()
}
