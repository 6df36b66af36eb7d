//! Retry engine: bounded attempts with exponential backoff and jitter for
//! external calls.

use std::future::Future;
use std::time::Duration;

use reframe_core::ReframeError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Retry policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier for each subsequent wait (exponential factor).
    pub backoff_factor: f64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Add random jitter (±25% of computed delay).
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay_ms: 500,
            backoff_factor: 2.0,
            max_delay_ms: 5_000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Compute the delay before retry number `retry_number` (1-indexed).
    pub fn delay_for(&self, retry_number: u32) -> Duration {
        if retry_number == 0 {
            return Duration::ZERO;
        }
        let delay_ms =
            self.base_delay_ms as f64 * self.backoff_factor.powi((retry_number - 1) as i32);
        let delay_ms = delay_ms.min(self.max_delay_ms as f64) as u64;

        let delay_ms = if self.jitter {
            let jitter = (delay_ms / 4) as i64;
            let offset: i64 = if jitter > 0 {
                (rand_offset() % (jitter as u64 * 2)) as i64 - jitter
            } else {
                0
            };
            (delay_ms as i64 + offset).max(0) as u64
        } else {
            delay_ms
        };

        Duration::from_millis(delay_ms)
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Simple xorshift64 for jitter without pulling in a full rand dep.
fn rand_offset() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static SEED: AtomicU64 = AtomicU64::new(0x9e3779b97f4a7c15);
    let x = SEED.load(Ordering::Relaxed);
    let x = x ^ (x << 13);
    let x = x ^ (x >> 7);
    let x = x ^ (x << 17);
    SEED.store(x, Ordering::Relaxed);
    x
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy is exhausted. Only [`ReframeError::is_retryable`] errors are retried.
pub async fn retry_async<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, ReframeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ReframeError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match op().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(label, attempts, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && policy.should_retry(attempts) => {
                let delay = policy.delay_for(attempts);
                warn!(
                    label,
                    attempt = attempts,
                    max = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Call failed, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn exponential_backoff_grows() {
        let policy = RetryPolicy {
            jitter: false,
            max_delay_ms: 60_000,
            ..Default::default()
        };
        let d1 = policy.delay_for(1).as_millis();
        let d2 = policy.delay_for(2).as_millis();
        let d3 = policy.delay_for(3).as_millis();
        assert!(d2 > d1, "delay should grow: {d1} < {d2}");
        assert!(d3 > d2, "delay should grow: {d2} < {d3}");
    }

    #[test]
    fn respects_max_delay() {
        let policy = RetryPolicy {
            max_delay_ms: 2_000,
            jitter: false,
            ..Default::default()
        };
        assert!(policy.delay_for(10).as_millis() <= 2_000);
    }

    #[test]
    fn jitter_stays_within_a_quarter() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let d = policy.delay_for(1).as_millis();
            assert!((375..=625).contains(&d), "jittered delay {d}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transport_failures_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        let result = retry_async(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ReframeError::transport("openai", "reset"))
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failures_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_async(&RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ReframeError::quota_or_auth("openai", "401")) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_when_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            ..Default::default()
        };
        let result: Result<(), _> = retry_async(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ReframeError::transport("tavily", "down")) }
        })
        .await;
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
