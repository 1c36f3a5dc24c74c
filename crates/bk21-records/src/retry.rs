//! Backoff for spreadsheet quota errors (HTTP 429).
//!
//! Transient transport failures are retried by the HTTP middleware. Quota
//! exhaustion needs much longer pauses, so whole task steps are re-run here.

use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, TaskError};

/// Errors that can signal quota exhaustion.
pub trait QuotaError {
    /// True when the request was rejected for quota reasons.
    fn is_quota(&self) -> bool;
}

impl QuotaError for ClientError {
    fn is_quota(&self) -> bool {
        self.is_rate_limited()
    }
}

impl QuotaError for TaskError {
    fn is_quota(&self) -> bool {
        self.is_rate_limited()
    }
}

/// Wait schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaBackoff {
    /// `step * (n + 1)` before attempt `n + 2`.
    Linear {
        /// Base wait.
        step: Duration,
        /// Total attempts, including the first.
        max_attempts: u32,
    },
    /// `initial * 2^n` before attempt `n + 2`.
    Exponential {
        /// First wait.
        initial: Duration,
        /// Total attempts, including the first.
        max_attempts: u32,
    },
}

impl QuotaBackoff {
    /// Policy for provisioning a student: 70 s, 140 s, ... up to 10 attempts.
    #[must_use]
    pub fn provisioning(unit: Duration) -> Self {
        Self::Linear { step: unit * 70, max_attempts: 10 }
    }

    /// Policy for refreshing one tab: 30 s, 60 s, 120 s, 3 attempts.
    #[must_use]
    pub fn refresh(unit: Duration) -> Self {
        Self::Exponential { initial: unit * 30, max_attempts: 3 }
    }

    /// Total attempts allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        match self {
            Self::Linear { max_attempts, .. } | Self::Exponential { max_attempts, .. } => {
                *max_attempts
            }
        }
    }

    /// Wait after the failed attempt `attempt` (0-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Linear { step, .. } => step.saturating_mul(attempt.saturating_add(1)),
            Self::Exponential { initial, .. } => {
                initial.saturating_mul(2u32.saturating_pow(attempt))
            }
        }
    }
}

/// Run `op`, re-running it after a quota error while attempts remain.
/// Any other error is returned immediately.
pub async fn with_quota_retry<T, E, F, Fut>(policy: QuotaBackoff, mut op: F) -> Result<T, E>
where
    E: QuotaError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts().max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_quota() && attempt + 1 < max_attempts => {
                let wait = policy.delay(attempt);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    wait_secs = wait.as_secs(),
                    "Quota exceeded, waiting before retry"
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_quota() {
                    tracing::error!(attempts = max_attempts, error = %e, "Quota retries exhausted");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_linear_delays() {
        let policy = QuotaBackoff::provisioning(Duration::from_secs(1));
        assert_eq!(policy.delay(0), Duration::from_secs(70));
        assert_eq!(policy.delay(1), Duration::from_secs(140));
        assert_eq!(policy.max_attempts(), 10);
    }

    #[test]
    fn test_exponential_delays() {
        let policy = QuotaBackoff::refresh(Duration::from_secs(1));
        let waits: Vec<u64> = (0..3).map(|n| policy.delay(n).as_secs()).collect();
        assert_eq!(waits, vec![30, 60, 120]);
    }

    #[test]
    fn test_retries_quota_until_success() {
        let calls = Cell::new(0);
        let policy = QuotaBackoff::Linear { step: Duration::ZERO, max_attempts: 5 };

        let result: Result<u32, ClientError> = tokio_test::block_on(with_quota_retry(policy, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(ClientError::rate_limited(1)) } else { Ok(n) } }
        }));

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = QuotaBackoff::Exponential { initial: Duration::ZERO, max_attempts: 3 };

        let result: Result<(), ClientError> = tokio_test::block_on(with_quota_retry(policy, || {
            calls.set(calls.get() + 1);
            async { Err(ClientError::rate_limited(1)) }
        }));

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_other_errors_are_not_retried() {
        let calls = Cell::new(0);
        let policy = QuotaBackoff::Linear { step: Duration::ZERO, max_attempts: 10 };

        let result: Result<(), TaskError> = tokio_test::block_on(with_quota_retry(policy, || {
            calls.set(calls.get() + 1);
            async { Err(TaskError::config("boom")) }
        }));

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
