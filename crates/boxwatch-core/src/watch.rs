// ── Watch loop ──
//
// Runs a cycle immediately, then once per interval. A cycle always runs
// to completion; shutdown is only observed between cycles. A failed cycle
// ends the loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CoreError;

pub async fn watch<F, Fut>(
    interval: Duration,
    cancel: CancellationToken,
    mut cycle: F,
) -> Result<(), CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), CoreError>>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!("watch stopped");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        cycle().await?;
        debug!(
            "next check in {}",
            humantime::format_duration(interval)
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(30 * 60);

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_per_interval() {
        let cancel = CancellationToken::new();
        let cycles = Arc::new(AtomicU32::new(0));
        let started = tokio::time::Instant::now();

        let result = watch(INTERVAL, cancel.clone(), || {
            let cycles = Arc::clone(&cycles);
            let cancel = cancel.clone();
            async move {
                if cycles.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    cancel.cancel();
                }
                Ok(())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(cycles.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= INTERVAL * 2);
        assert!(started.elapsed() < INTERVAL * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_ends_the_loop() {
        let cycles = Arc::new(AtomicU32::new(0));

        let result = watch(INTERVAL, CancellationToken::new(), || {
            let cycles = Arc::clone(&cycles);
            async move {
                if cycles.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                    return Err(CoreError::Timeout);
                }
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(CoreError::Timeout)));
        assert_eq!(cycles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = watch(INTERVAL, cancel, || async { Err(CoreError::Timeout) }).await;
        assert!(result.is_ok());
    }
}
