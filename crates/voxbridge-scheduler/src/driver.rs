use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use voxbridge_sync::SyncOrchestrator;

use crate::backoff::RetryPolicy;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Pause between the end of one run and the start of the next.
    pub interval: Duration,
    /// Delay before the first run after process start.
    pub startup_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15 * 60),
            startup_delay: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Runs one orchestrator on a timer, with bounded retry around failures.
///
/// Waits for each run to finish before scheduling the next, so overlapping
/// runs of the same scheduled task cannot happen. Independent manual
/// triggers may still overlap; the store's upsert contract absorbs that.
pub struct SyncScheduler {
    orchestrator: Arc<SyncOrchestrator>,
    config: SchedulerConfig,
}

impl SyncScheduler {
    pub fn new(orchestrator: Arc<SyncOrchestrator>, config: SchedulerConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Loop until the token is cancelled. All waits race the token so
    /// shutdown is prompt.
    pub async fn run(self, cancel: CancellationToken) {
        if !sleep_unless_cancelled(&cancel, self.config.startup_delay).await {
            return;
        }

        loop {
            self.run_once_with_retries(&cancel).await;

            if !sleep_unless_cancelled(&cancel, self.config.interval).await {
                return;
            }
        }
    }

    async fn run_once_with_retries(&self, cancel: &CancellationToken) {
        if let Err(err) = self.orchestrator.sync_assistants().await {
            tracing::warn!(%err, "assistant catalog sync failed");
        }

        for attempt in 1..=self.config.retry.max_attempts {
            match self.orchestrator.run().await {
                Ok(summary) => {
                    tracing::info!(
                        run_id = %summary.run_id,
                        updated = summary.updated,
                        skipped = summary.skipped,
                        errors = summary.errors,
                        "scheduled sync finished"
                    );
                    return;
                }
                Err(err) => {
                    if attempt == self.config.retry.max_attempts {
                        tracing::error!(%err, attempt, "sync failed, giving up until next interval");
                        return;
                    }
                    let delay = self.config.retry.delay_for(attempt);
                    tracing::warn!(%err, attempt, delay_ms = delay.as_millis() as u64, "sync failed, retrying");
                    if !sleep_unless_cancelled(cancel, delay).await {
                        return;
                    }
                }
            }
        }
    }
}

/// False when cancelled before the delay elapses.
async fn sleep_unless_cancelled(cancel: &CancellationToken, delay: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use voxbridge_provider::ConversationSource;
    use voxbridge_schema::Provider;
    use voxbridge_store::CallStore;

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationSource for CountingSource {
        fn provider(&self) -> Provider {
            Provider::ElevenLabs
        }

        async fn list_conversations(&self) -> Result<Vec<Value>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(anyhow!("remote unreachable"))
            } else {
                Ok(vec![])
            }
        }

        async fn get_conversation(&self, _external_id: &str) -> Result<Value> {
            Err(anyhow!("unused"))
        }

        async fn list_assistants(&self) -> Result<Vec<Value>> {
            Ok(vec![])
        }
    }

    fn scheduler(fail: bool, calls: Arc<AtomicUsize>) -> SyncScheduler {
        let store = CallStore::open_in_memory().unwrap();
        let orchestrator = Arc::new(SyncOrchestrator::new(
            Arc::new(CountingSource { calls, fail }),
            store,
        ));
        SyncScheduler::new(
            orchestrator,
            SchedulerConfig {
                interval: Duration::from_secs(600),
                startup_delay: Duration::from_secs(1),
                retry: RetryPolicy::new(3, vec![5_000, 10_000]),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn failed_run_is_retried_up_to_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler(true, calls.clone()).run(cancel.clone()));

        // Startup delay (1s) + backoffs (5s, 10s) all elapse well within
        // the first interval.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn successful_run_fires_once_per_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler(false, calls.clone()).run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_startup_delay_prevents_any_run() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(scheduler(true, calls.clone()).run(cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
        handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
