//! Retry policy for flaky registry endpoints.
//!
//! Modeled as an explicit policy value injected into the adapters rather than
//! inlined sleeps, so the backoff blocks only the retrying task's pool slot.

use core::time::Duration;

const LOG_TARGET: &str = "     retry";

/// Max attempts and linear backoff for one logical fetch.
///
/// `max_retries` counts retries on top of the original request. The delay
/// before retry `n` (zero-based) is `base_delay + step * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub step: Duration,
}

impl RetryPolicy {
    /// A policy that never retries: one attempt, failure is final.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    /// Delay to sleep before the zero-based retry `n`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay + self.step * retry
    }

    /// Run `op` until it succeeds or the retry budget is exhausted, sleeping
    /// the linear backoff between attempts. Only the calling task sleeps.
    pub async fn run<T, F, Fut>(&self, name: &str, mut op: F) -> crate::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        let mut retry = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if retry < self.max_retries => {
                    let delay = self.backoff(retry);
                    log::debug!(
                        target: LOG_TARGET,
                        "retrying {name} (retry {}, delay {}ms): {e}",
                        retry + 1,
                        delay.as_millis(),
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::ZERO,
            step: Duration::ZERO,
        }
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            step: Duration::from_millis(500),
        };

        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn succeeds_without_retry() {
        let calls = Cell::new(0u32);
        let result = instant_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Cell::new(0u32);
        let result = instant_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                let attempt = calls.get();
                async move {
                    if attempt < 3 {
                        Err(ohno::app_err!("transient"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let calls = Cell::new(0u32);
        let result: crate::Result<u32> = instant_policy(3)
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(ohno::app_err!("still down")) }
            })
            .await;

        assert!(result.is_err());
        // One original attempt plus three retries.
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn none_policy_makes_a_single_attempt() {
        let calls = Cell::new(0u32);
        let result: crate::Result<u32> = RetryPolicy::none()
            .run("test", || {
                calls.set(calls.get() + 1);
                async { Err(ohno::app_err!("down")) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
