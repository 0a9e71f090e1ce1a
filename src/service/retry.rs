//! Shared retry policy for outbound service calls
//!
//! Both the embedding and vector index clients retry through this single
//! policy: bounded attempts, exponential backoff, and a caller-supplied
//! predicate deciding which errors are transient.

use std::future::Future;
use std::time::Duration;

/// Maximum attempts per logical call (1 initial + 2 retries)
pub const MAX_ATTEMPTS: u32 = 3;

const BASE_BACKOFF_MS: u64 = 250;

/// Run `op` up to [`MAX_ATTEMPTS`] times, backing off exponentially between
/// attempts. Errors for which `is_retryable` returns false are returned
/// immediately.
pub async fn with_backoff<T, E, F, Fut, P>(op_name: &str, is_retryable: P, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS && is_retryable(&e) => {
                let backoff = Duration::from_millis(BASE_BACKOFF_MS << (attempt - 1));
                tracing::warn!(
                    op = %op_name,
                    attempt = attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
