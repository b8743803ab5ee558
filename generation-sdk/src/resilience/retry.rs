//! Bounded retry with exponential backoff
//!
//! The retry loop gives every attempt its own timeout, classifies each
//! failure structurally, and sleeps `2^(attempt+1) * base` between attempts,
//! where the base depends on whether the provider throttled us or failed
//! transiently. Fatal kinds end the loop immediately.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{ErrorKind, GenerationError, Result};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt; attempts are numbered `0..=retry_budget`
    pub retry_budget: u32,

    /// Independent timeout applied to each attempt
    pub attempt_timeout: Duration,

    /// Backoff base after a rate-limited attempt
    pub rate_limit_base: Duration,

    /// Backoff base after a transient failure
    pub transient_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_budget: 2,
            attempt_timeout: Duration::from_secs(30),
            rate_limit_base: Duration::from_millis(2000),
            transient_base: Duration::from_millis(1000),
        }
    }
}

impl fmt::Display for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RetryPolicy {{ retry_budget: {}, attempt_timeout: {:?}, rate_limit_base: {:?}, transient_base: {:?} }}",
            self.retry_budget, self.attempt_timeout, self.rate_limit_base, self.transient_base
        )
    }
}

impl RetryPolicy {
    /// Same policy with a different retry budget
    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Total number of attempts the policy allows
    pub fn max_attempts(&self) -> u32 {
        self.retry_budget.saturating_add(1)
    }

    /// Upper bound on the wall-clock time of one call under this policy.
    ///
    /// Every attempt may run to its timeout, and every gap between attempts
    /// may use the larger of the two backoff bases.
    pub fn worst_case_latency(&self) -> Duration {
        let timeouts = self.attempt_timeout.saturating_mul(self.max_attempts());
        let slowest_base = self.rate_limit_base.max(self.transient_base);
        (0..self.retry_budget).fold(timeouts, |total, attempt| {
            total.saturating_add(slowest_base.saturating_mul(backoff_factor(attempt)))
        })
    }
}

fn backoff_factor(attempt: u32) -> u32 {
    2u32.checked_pow(attempt.saturating_add(1)).unwrap_or(u32::MAX)
}

/// Delay to wait after `attempt` failed with `kind`, or `None` if the kind is not retried
pub fn backoff_delay(kind: ErrorKind, attempt: u32, policy: &RetryPolicy) -> Option<Duration> {
    let base = match kind {
        ErrorKind::RateLimitExceeded => policy.rate_limit_base,
        ErrorKind::TransientNetwork => policy.transient_base,
        _ => return None,
    };
    Some(base.saturating_mul(backoff_factor(attempt)))
}

/// How a single attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    AuthError,
    QuotaExceeded,
    TransientError,
    ParseError,
    /// The provider rejected the request as malformed or misconfigured
    Rejected,
    Cancelled,
}

impl AttemptOutcome {
    fn from_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::RateLimitExceeded => AttemptOutcome::RateLimited,
            ErrorKind::Authentication => AttemptOutcome::AuthError,
            ErrorKind::QuotaExceeded => AttemptOutcome::QuotaExceeded,
            ErrorKind::TransientNetwork => AttemptOutcome::TransientError,
            ErrorKind::Parse => AttemptOutcome::ParseError,
            ErrorKind::Configuration | ErrorKind::Validation => AttemptOutcome::Rejected,
            ErrorKind::Cancelled => AttemptOutcome::Cancelled,
        }
    }
}

/// Record of one attempt, kept for the lifetime of a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationAttempt {
    pub index: u32,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcome: AttemptOutcome,
}

/// Terminal result of the retry loop together with its attempt log
#[derive(Debug)]
pub struct RetryOutcome<T> {
    pub result: Result<T>,
    pub attempts: Vec<GenerationAttempt>,
}

impl<T> RetryOutcome<T> {
    /// Number of attempts that were started
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

/// Executor for retry operations with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the specified policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Get the current retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails fatally, or the budget is spent.
    ///
    /// `operation` receives the attempt index. Cancellation is checked before
    /// each attempt, while an attempt is in flight, and during backoff.
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return RetryOutcome {
                    result: Err(GenerationError::cancelled(format!(
                        "Cancelled before attempt {}",
                        attempt
                    ))),
                    attempts,
                };
            }

            let started_at = Utc::now();
            let clock = tokio::time::Instant::now();
            let timeout = self.policy.attempt_timeout;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(GenerationError::cancelled(format!(
                    "Cancelled during attempt {}",
                    attempt
                ))),
                timed = tokio::time::timeout(timeout, operation(attempt)) => match timed {
                    Ok(result) => result,
                    Err(_) => Err(GenerationError::transient(format!(
                        "Attempt {} timed out after {:?}",
                        attempt, timeout
                    ))),
                },
            };

            attempts.push(GenerationAttempt {
                index: attempt,
                started_at,
                duration_ms: clock.elapsed().as_millis() as u64,
                outcome: match &result {
                    Ok(_) => AttemptOutcome::Success,
                    Err(err) => AttemptOutcome::from_kind(err.kind()),
                },
            });

            let err = match result {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(attempt, "attempt succeeded after retries");
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts,
                    };
                }
                Err(err) => err,
            };

            let kind = err.kind();
            let delay = match backoff_delay(kind, attempt, &self.policy) {
                Some(delay) if attempt < self.policy.retry_budget => delay,
                _ => {
                    if kind.is_retryable() {
                        tracing::warn!(
                            attempt,
                            kind = %kind,
                            "retry budget of {} exhausted: {}",
                            self.policy.retry_budget,
                            err
                        );
                    }
                    return RetryOutcome {
                        result: Err(err.at_attempt(attempt).with_context_value("attempts", attempt + 1)),
                        attempts,
                    };
                }
            };

            tracing::warn!(
                attempt,
                kind = %kind,
                delay_ms = delay.as_millis() as u64,
                "attempt {}/{} failed, retrying: {}",
                attempt + 1,
                self.policy.max_attempts(),
                err
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return RetryOutcome {
                        result: Err(GenerationError::cancelled(format!(
                            "Cancelled during backoff after attempt {}",
                            attempt
                        ))),
                        attempts,
                    };
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}
