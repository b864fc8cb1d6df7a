//! Exponential-backoff retry helper shared by the LLM client and the MCP
//! supervisor's reconnect logic.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Backoff schedule for [`retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt.
    pub multiplier: f64,
}

impl RetryConfig {
    /// `initial_delay` doubling, default cap of 3 retries — matches the
    /// engine's "retry up to 3 times, delays 1s/2s/4s" contract (4 total
    /// calls).
    #[must_use]
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let scale = self.multiplier.powi(attempt as i32);
        Duration::from_secs_f64(self.initial_delay.as_secs_f64() * scale)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// How a retried operation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Succeeded on the first attempt.
    ImmediateSuccess,
    /// Succeeded after one or more retries.
    SucceededAfterRetry { attempts: u32 },
    /// Every attempt failed.
    Exhausted { attempts: u32 },
}

/// Run `op`, retrying on `Err` per `config`, backing off between attempts.
///
/// `is_retryable` lets the caller classify errors — e.g. an LLM client
/// retries on transient network/5xx errors but not on an auth failure.
/// Returns the last result once attempts are exhausted.
pub async fn retry<T, E, F, Fut, R>(
    config: RetryConfig,
    is_retryable: R,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_attempts || !is_retryable(&err) {
                    return Err(err);
                }
                let delay = config.delay_for(attempt);
                attempt += 1;
                warn!(attempt, ?delay, "retrying after transient failure");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_immediately_without_delay() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(
            RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                multiplier: 2.0,
            },
            |_: &&str| true,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            },
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(
            RetryConfig {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                multiplier: 2.0,
            },
            |_: &&str| true,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("boom")
            },
        )
        .await;
        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, &str> = retry(
            RetryConfig::standard(),
            |_: &&str| false,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("fatal")
            },
        )
        .await;
        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
