//! Bounded retry over rate-limit failures with exponential backoff.
//!
//! Formula mirrors the teacher's router: `base * 2^(attempt-1)`, capped.

use std::time::Duration;
use tracing::debug;

const BASE_DELAY_MS: u64 = 500;
const MAX_DELAY_MS: u64 = 30_000;

pub fn backoff_delay(attempt: u32) -> Duration {
    let delay = BASE_DELAY_MS.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)));
    Duration::from_millis(delay.min(MAX_DELAY_MS))
}

/// Runs `attempt_fn` up to `max_retries + 1` times, retrying only on errors
/// for which `is_retryable` returns true. Sleeps with exponential backoff
/// between attempts. On exhaustion, returns the last error observed.
pub async fn with_retry<T, E, F, Fut>(
    max_retries: u32,
    mut attempt_fn: F,
    is_retryable: impl Fn(&E) -> bool,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match attempt_fn(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < max_retries && is_retryable(&error) => {
                let delay = backoff_delay(attempt + 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying after rate limit");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_millis(500));
        assert_eq!(backoff_delay(2), Duration::from_millis(1000));
        assert_eq!(backoff_delay(7), Duration::from_millis(MAX_DELAY_MS));
    }

    #[tokio::test]
    async fn stops_after_max_retries() {
        let mut attempts = 0;
        let result: Result<(), &str> = with_retry(
            2,
            |_attempt| {
                attempts += 1;
                async { Err("rate limited") }
            },
            |_| true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_errors() {
        let mut attempts = 0;
        let result: Result<(), &str> = with_retry(
            5,
            |_attempt| {
                attempts += 1;
                async { Err("fatal") }
            },
            |_| false,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
