//! Minimum-interval rate limiting for lookup calls.
//!
//! The lookup service enforces a hard ceiling (5 requests per minute for
//! the public endpoint), so every call goes through one [`RateLimiter`].
//! A call may only start once `interval` has elapsed since the previous
//! call *finished*, whether that call succeeded or failed.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use phonecheck_core::lookup::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::new(Duration::from_secs(12));
//!
//! {
//!     // First call proceeds immediately.
//!     let _permit = limiter.acquire().await;
//!     // ... issue request
//! } // completion time recorded here
//!
//! // Second call waits until 12s after the first one completed.
//! let _permit = limiter.acquire().await;
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Default interval between calls: 60s / 5 requests.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(12);

/// Serializes lookup calls and spaces them at least `interval` apart.
///
/// Holding a [`RatePermit`] excludes every other caller, so at most one
/// call is in flight at a time even if the limiter is shared.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    disabled: bool,
    /// Completion time of the previous call; `None` before the first call.
    last_completed: Mutex<Option<Instant>>,
    /// Total time spent waiting, in milliseconds.
    waited_ms: AtomicU64,
}

/// Permission to issue exactly one call.
///
/// Dropping the permit records the call's completion time.
#[derive(Debug)]
#[must_use = "dropping the permit immediately ends the rate-limited section"]
pub struct RatePermit<'a> {
    guard: MutexGuard<'a, Option<Instant>>,
}

impl Drop for RatePermit<'_> {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}

impl RateLimiter {
    /// Creates a limiter enforcing `interval` between calls.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            interval,
            disabled: interval.is_zero(),
            last_completed: Mutex::new(None),
            waited_ms: AtomicU64::new(0),
        }
    }

    /// Creates a limiter that never waits (calls are still serialized).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Whether waiting is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// The configured minimum interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total time callers have spent waiting for their turn.
    #[must_use]
    pub fn total_waited(&self) -> Duration {
        Duration::from_millis(self.waited_ms.load(Ordering::SeqCst))
    }

    /// Waits for the caller's turn and returns a permit for one call.
    ///
    /// The first call proceeds immediately.
    pub async fn acquire(&self) -> RatePermit<'_> {
        let guard = self.last_completed.lock().await;

        if !self.disabled
            && let Some(last) = *guard
        {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let delay = self.interval.saturating_sub(elapsed);
                debug!(delay_ms = delay.as_millis(), "waiting for rate limit interval");
                self.record_wait(delay);
                tokio::time::sleep(delay).await;
            }
        }

        RatePermit { guard }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn record_wait(&self, delay: Duration) {
        self.waited_ms
            .fetch_add(delay.as_millis() as u64, Ordering::SeqCst);
    }
}
