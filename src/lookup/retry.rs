//! Opt-in bounded retry around a lookup.
//!
//! The pipeline itself never retries: a failed lookup is terminal for that
//! identifier in that run. Operators who want more resilience wrap the
//! rate-limited client in [`Retrying`], which re-issues transient failures
//! with exponential backoff. Because the wrapped client is rate limited,
//! every retry still respects the service's request ceiling.
//!
//! # Example
//!
//! ```
//! use phonecheck_core::lookup::{FailureType, Outcome, RetryDecision, RetryPolicy, classify_outcome};
//!
//! let policy = RetryPolicy::with_max_attempts(3);
//! let failure = classify_outcome(&Outcome::ApiError(503));
//! assert_eq!(failure, Some(FailureType::Transient));
//!
//! match policy.should_retry(FailureType::Transient, 1) {
//!     RetryDecision::Retry { delay, attempt } => println!("retry #{attempt} in {delay:?}"),
//!     RetryDecision::DoNotRetry { reason } => println!("giving up: {reason}"),
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info, instrument};

use super::client::Lookup;
use super::outcome::Outcome;
use crate::parser::Identifier;
use crate::record::Schema;

/// Default maximum attempts: a single attempt, no retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Upper bound accepted from configuration.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;
const MAX_JITTER: Duration = Duration::from_millis(500);

/// How a failed outcome should be treated by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// May succeed on retry: transport failures, 408, 5xx.
    Transient,
    /// The service throttled us (429).
    RateLimited,
    /// Will not change on retry: other 4xx and unexpected statuses.
    Permanent,
}

/// Decision on whether to retry a failed lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after `delay`; `attempt` is the 1-indexed number of the next attempt.
    Retry {
        /// Backoff before the next attempt.
        delay: Duration,
        /// Number of the next attempt.
        attempt: u32,
    },
    /// Stop retrying.
    DoNotRetry {
        /// Human-readable reason.
        reason: String,
    },
}

/// Exponential backoff configuration.
///
/// `delay = min(base_delay * multiplier^(attempt-1), max_delay) + jitter`
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with explicit settings. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f32,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }

    /// Default backoff with a custom attempt count.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Maximum attempts including the first.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether this policy ever retries.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Decides whether to retry after `attempt` (1-indexed) failed.
    #[instrument(skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts {
            debug!(attempt, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        let delay = self.calculate_delay(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        RetryDecision::Retry {
            delay,
            attempt: attempt + 1,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn calculate_delay(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let exponent = f64::from(attempt.saturating_sub(1));
        let delay_ms = base_ms * f64::from(self.backoff_multiplier).powf(exponent);
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped_ms as u64) + jitter()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(0..=MAX_JITTER.as_millis() as u64))
}

/// Classifies an outcome for retry purposes. `None` means "not a failure
/// that retrying could change" (success or a rejected identifier).
#[must_use]
#[allow(clippy::match_same_arms)]
pub fn classify_outcome(outcome: &Outcome) -> Option<FailureType> {
    match outcome {
        Outcome::Success(_) | Outcome::InvalidFormat => None,
        Outcome::RequestFailed(_) => Some(FailureType::Transient),
        Outcome::ApiError(status) => Some(match *status {
            408 => FailureType::Transient,
            429 => FailureType::RateLimited,
            500..=599 => FailureType::Transient,
            _ => FailureType::Permanent,
        }),
    }
}

/// Retries transient failures of the inner lookup under a [`RetryPolicy`].
#[derive(Debug)]
pub struct Retrying<L> {
    inner: L,
    policy: RetryPolicy,
}

impl<L> Retrying<L> {
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub fn new(inner: L, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<L: Lookup> Lookup for Retrying<L> {
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome {
        let mut attempt = 1;
        loop {
            let outcome = self.inner.lookup(identifier, schema).await;
            let Some(failure_type) = classify_outcome(&outcome) else {
                return outcome;
            };
            match self.policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    info!(
                        identifier = %identifier,
                        outcome = %outcome,
                        next_attempt = next,
                        delay_ms = delay.as_millis(),
                        "retrying lookup"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(identifier = %identifier, %reason, "not retrying lookup");
                    return outcome;
                }
            }
        }
    }
}
