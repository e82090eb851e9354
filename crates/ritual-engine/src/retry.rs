//! Exponential backoff for posting to the coordinator contract: 3 attempts,
//! base 2s, capped at 30s.

use std::future::Future;
use std::time::Duration;
use threshold_errors::Result;

const MAX_ATTEMPTS: u32 = 3;
const BASE_DELAY: Duration = Duration::from_secs(2);
const MAX_DELAY: Duration = Duration::from_secs(30);

pub async fn with_backoff<F, Fut, T>(label: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for n in 0..MAX_ATTEMPTS {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                tracing::warn!(attempt = n + 1, %label, error = %e, "coordinator post failed");
                last_err = Some(e);
                if n + 1 < MAX_ATTEMPTS {
                    let delay = (BASE_DELAY * 2u32.pow(n)).min(MAX_DELAY);
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use threshold_errors::NodeError;

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, NodeError>(7) }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_backoff("test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(NodeError::CoordinatorTxReverted("nope".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), MAX_ATTEMPTS);
    }
}
