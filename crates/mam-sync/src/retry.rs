//! Bounded retry around ledger calls.

use std::future::Future;

use backoff::backoff::Backoff;
use tracing::warn;

use crate::config::RetryPolicy;
use crate::error::{Result, SyncError};

/// Run `call` until it succeeds, fails permanently, or the policy runs out.
///
/// Only transient store errors are retried. The whole loop, sleeps
/// included, is bounded by `policy.timeout`.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = mam_store::Result<T>>,
{
    let attempts = async {
        let mut backoff = policy.backoff();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < policy.attempts() => {
                    let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
                    warn!(operation, attempt, ?delay, error = %e, "transient ledger failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() => {
                    return Err(SyncError::TransientFailure {
                        attempts: attempt,
                        message: e.to_string(),
                    })
                }
                Err(e) => return Err(SyncError::Store(e)),
            }
        }
    };

    tokio::time::timeout(policy.timeout, attempts)
        .await
        .map_err(|_| SyncError::Timeout(format!("{} exceeded {:?}", operation, policy.timeout)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use mam_store::StoreError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = with_retry(&quick(5), "test", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::TransientFailure("flaky".into()))
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&quick(3), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::TransientFailure("down".into()))
        })
        .await;

        assert!(matches!(
            result,
            Err(SyncError::TransientFailure { attempts: 3, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<()> = with_retry(&quick(5), "test", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::InvalidData("corrupt".into()))
        })
        .await;

        assert!(matches!(result, Err(SyncError::Store(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_bounds_retries() {
        let policy = RetryPolicy {
            timeout: Duration::from_millis(30),
            ..RetryPolicy::fixed(1_000, Duration::from_millis(10))
        };
        let result: Result<()> = with_retry(&policy, "test", || async {
            Err(StoreError::TransientFailure("down".into()))
        })
        .await;

        assert!(matches!(result, Err(SyncError::Timeout(_))));
    }
}
