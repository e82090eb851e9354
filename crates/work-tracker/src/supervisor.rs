//! Generic "restart on crash, else propagate" supervisor for a periodic
//! task, with a randomized sleep interval pinned to its floor while the
//! task has an on-chain transaction outstanding.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use threshold_errors::{NodeError, Result};

/// Result of one tick of a tracked task.
pub enum TaskOutcome {
    Continue,
    Crashed(String),
}

#[async_trait]
pub trait WorkTask: Send + Sync {
    async fn run_once(&self) -> TaskOutcome;

    /// Whether a transaction this task issued is still pending
    /// confirmation. While true, the tracker ticks at `min_interval`
    /// instead of a randomized one, to notice confirmation promptly.
    fn tx_outstanding(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct WorkTrackerConfig {
    pub min_interval: Duration,
    pub max_interval: Duration,
    /// Mirrors `RestartableTask.handle_errors`'s `crash_on_error`: when
    /// true, a crash is propagated instead of restarted.
    pub abort_on_error: bool,
}

impl Default for WorkTrackerConfig {
    fn default() -> Self {
        WorkTrackerConfig {
            min_interval: Duration::from_secs(60),
            max_interval: Duration::from_secs(30 * 60),
            abort_on_error: false,
        }
    }
}

pub struct WorkTracker<T: WorkTask> {
    task: T,
    config: WorkTrackerConfig,
}

impl<T: WorkTask> WorkTracker<T> {
    pub fn new(task: T, config: WorkTrackerConfig) -> Self {
        WorkTracker { task, config }
    }

    fn next_interval(&self) -> Duration {
        if self.task.tx_outstanding() {
            return self.config.min_interval;
        }
        let min = self.config.min_interval.as_secs();
        let max = self.config.max_interval.as_secs().max(min);
        let secs = rand::thread_rng().gen_range(min..=max);
        Duration::from_secs(secs)
    }

    /// Runs until `shutdown` fires or the task crashes under
    /// `abort_on_error`.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) -> Result<()> {
        loop {
            match self.task.run_once().await {
                TaskOutcome::Continue => {}
                TaskOutcome::Crashed(error) => {
                    tracing::warn!(%error, "work tracker task failed");
                    if self.config.abort_on_error {
                        return Err(NodeError::InternalError);
                    }
                    tracing::debug!("work tracker crashed, restarting");
                }
            }

            let interval = self.next_interval();
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTask {
        calls: Arc<AtomicUsize>,
        crash_once: Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl WorkTask for CountingTask {
        async fn run_once(&self) -> TaskOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.crash_once.swap(false, Ordering::SeqCst) {
                TaskOutcome::Crashed("simulated".into())
            } else {
                TaskOutcome::Continue
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restarts_after_a_crash_when_not_aborting() {
        let calls = Arc::new(AtomicUsize::new(0));
        let crash_once = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let task = CountingTask { calls: calls.clone(), crash_once };
        let config = WorkTrackerConfig {
            min_interval: Duration::from_secs(60),
            max_interval: Duration::from_secs(60),
            abort_on_error: false,
        };
        let tracker = WorkTracker::new(task, config);
        let (tx, rx) = tokio::sync::watch::channel(false);

        let handle = tokio::spawn(async move { tracker.run(rx).await });
        tokio::time::advance(Duration::from_secs(65)).await;
        tokio::time::advance(Duration::from_secs(65)).await;
        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert!(calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn aborts_on_crash_when_configured_to() {
        let calls = Arc::new(AtomicUsize::new(0));
        let crash_once = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let task = CountingTask { calls, crash_once };
        let config = WorkTrackerConfig { abort_on_error: true, ..Default::default() };
        let tracker = WorkTracker::new(task, config);
        let (_tx, rx) = tokio::sync::watch::channel(false);

        let err = tracker.run(rx).await.unwrap_err();
        assert!(matches!(err, NodeError::InternalError));
    }
}
