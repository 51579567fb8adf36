//! Remote lookup: HTTP client, rate limiting, and opt-in retry.
//!
//! The pieces compose as decorators around the [`Lookup`] trait:
//!
//! ```text
//! Retrying<RateLimited<HttpLookup>>   (retry is optional)
//! ```
//!
//! [`RateLimited`] is the single serialization point of the pipeline; every
//! HTTP call, including retries, passes through it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use phonecheck_core::lookup::{
//!     DEFAULT_INTERVAL, DEFAULT_REQUEST_TIMEOUT, HttpLookup, Lookup, RateLimited, RateLimiter,
//! };
//! use phonecheck_core::parser::normalize;
//! use phonecheck_core::record::Schema;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpLookup::new("http://phone-number-api.com/csv/", DEFAULT_REQUEST_TIMEOUT)?;
//! let client = RateLimited::new(http, Arc::new(RateLimiter::new(DEFAULT_INTERVAL)));
//!
//! let outcome = client.lookup(&normalize("+17202764654")?, &Schema::default()).await;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

mod client;
mod outcome;
pub mod rate_limiter;
mod retry;

pub use client::{
    ClientError, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT, HttpLookup, Lookup, RateLimited,
    parse_base_url, split_response,
};
pub use outcome::{
    API_ERROR_TAG, INVALID_FORMAT_TAG, Outcome, REQUEST_FAILED_TAG, is_remote_failure_tag,
};
pub use rate_limiter::{DEFAULT_INTERVAL, RateLimiter, RatePermit};
pub use retry::{
    DEFAULT_MAX_ATTEMPTS, FailureType, MAX_ATTEMPTS_LIMIT, RetryDecision, RetryPolicy, Retrying,
    classify_outcome,
};
