//! Bounded retry for persistence after a successful analysis

use std::future::Future;
use std::time::Duration;

use storage::StorageError;
use tracing::warn;

/// How often and how patiently to retry a transient store failure
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Delay before retry `n` is `backoff * n`
    pub backoff: Duration,
}

/// Run `op` until it succeeds, fails permanently, or retries run out
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut op: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.retries => {
                attempt += 1;
                warn!(
                    "{} failed, retrying ({}/{}): {}",
                    what, attempt, policy.retries, e
                );
                metrics::counter!("sentinel_persist_retries_total").increment(1);
                tokio::time::sleep(policy.backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            backoff: Duration::from_millis(10),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_retried() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&policy(2), "insert", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StorageError::DatabaseError("database is locked".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&policy(1), "insert", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::DatabaseError("disk I/O error".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&policy(3), "insert", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::ConstraintViolation("CHECK constraint failed".into()))
        })
        .await;

        assert!(matches!(result, Err(StorageError::ConstraintViolation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
