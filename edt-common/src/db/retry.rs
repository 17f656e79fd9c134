//! Retry for transactions that lose a write-lock race
//!
//! Store transactions start deferred and take the write lock on their first
//! write. When another connection committed in between, SQLite refuses the
//! upgrade with SQLITE_BUSY instead of waiting, so the whole transaction has to
//! be run again against a fresh snapshot.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Total time a store operation keeps retrying after lock errors
pub const MAX_LOCK_WAIT_MS: u64 = 10_000;

const INITIAL_BACKOFF_MS: u64 = 5;
const MAX_BACKOFF_MS: u64 = 200;

/// Run `operation` until it returns something other than a lock error, or
/// `max_wait_ms` has elapsed.
///
/// Each call of `operation` must open its own transaction so a retry observes
/// what the competing writer committed. Non-lock errors are returned at once.
/// When the budget runs out the last lock error is returned unchanged.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let max_duration = Duration::from_millis(max_wait_ms);
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Store operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if !err.is_busy() => return Err(err),
            Err(err) => {
                let elapsed = start_time.elapsed();
                if elapsed >= max_duration {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        elapsed_ms = elapsed.as_millis() as u64,
                        max_wait_ms,
                        "Store operation still locked, giving up"
                    );
                    return Err(err);
                }

                tracing::debug!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    "Store locked, retrying"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
        }
    }
}

/// Convenience wrapper over [`retry_on_lock`] with [`MAX_LOCK_WAIT_MS`]
pub async fn with_lock_retry<F, Fut, T>(operation_name: &str, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_on_lock(operation_name, MAX_LOCK_WAIT_MS, operation).await
}

impl Error {
    /// True when the store refused a lock (SQLITE_BUSY / SQLITE_LOCKED family)
    pub fn is_busy(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                let busy_code = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| matches!(code & 0xff, 5 | 6))
                    .unwrap_or(false);
                busy_code || db_err.message().contains("database is locked")
            }
            _ => false,
        }
    }
}
