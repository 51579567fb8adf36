//! HTTP lookup client and the rate-limited wrapper around it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use super::outcome::Outcome;
use super::rate_limiter::RateLimiter;
use crate::parser::Identifier;
use crate::record::Schema;

/// Default base URL of the public lookup service (CSV flavor).
pub const DEFAULT_BASE_URL: &str = "http://phone-number-api.com/csv/";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User-Agent sent with every lookup.
const USER_AGENT: &str = concat!("phonecheck/", env!("CARGO_PKG_VERSION"));

/// Errors raised while constructing a lookup client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL does not parse or is not http(s).
    #[error("invalid lookup base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// The rejected URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// reqwest failed to build the client.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Looks up one identifier.
///
/// Implementations never return errors: every failure mode is an
/// [`Outcome`] variant. This trait uses `async_trait` so decorators and the
/// CLI can hold a `Box<dyn Lookup>`.
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Issues the lookup and classifies the result.
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome;
}

#[async_trait]
impl<L: Lookup + ?Sized> Lookup for Box<L> {
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome {
        (**self).lookup(identifier, schema).await
    }
}

#[async_trait]
impl<L: Lookup + ?Sized> Lookup for Arc<L> {
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome {
        (**self).lookup(identifier, schema).await
    }
}

/// Issues exactly one GET per lookup against the remote service.
///
/// Request shape: `GET <base_url>?number=<identifier>&fields=<names>`.
/// The response body of a 200 is a single comma-separated line with the
/// requested fields in order.
#[derive(Debug, Clone)]
pub struct HttpLookup {
    client: Client,
    base_url: Url,
}

impl HttpLookup {
    /// Creates a client for `base_url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] for malformed or non-http(s)
    /// URLs and [`ClientError::Build`] if reqwest cannot build a client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self { client, base_url })
    }

    /// Builds the full request URL for one identifier.
    #[must_use]
    pub fn request_url(&self, identifier: &Identifier, schema: &Schema) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("number", identifier.as_str())
            .append_pair("fields", &schema.api_fields());
        url
    }
}

#[async_trait]
impl Lookup for HttpLookup {
    #[instrument(skip(self, schema), fields(identifier = %identifier))]
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome {
        let url = self.request_url(identifier, schema);
        debug!(url = %url, "sending lookup request");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(error) => {
                let cause = describe_transport_error(&error);
                warn!(%cause, "lookup request failed");
                return Outcome::RequestFailed(cause);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "lookup returned error status");
            return Outcome::ApiError(status.as_u16());
        }

        match response.text().await {
            Ok(body) => {
                let values = split_response(&body);
                debug!(fields = values.len(), "lookup succeeded");
                Outcome::Success(values)
            }
            Err(error) => {
                let cause = describe_transport_error(&error);
                warn!(%cause, "failed to read lookup response body");
                Outcome::RequestFailed(cause)
            }
        }
    }
}

/// Routes every call of the inner lookup through a [`RateLimiter`].
///
/// The limiter's permit is held for the duration of the call, so the next
/// call cannot start until `interval` after this one completes.
#[derive(Debug)]
pub struct RateLimited<L> {
    inner: L,
    limiter: Arc<RateLimiter>,
}

impl<L> RateLimited<L> {
    /// Wraps `inner` with `limiter`.
    #[must_use]
    pub fn new(inner: L, limiter: Arc<RateLimiter>) -> Self {
        Self { inner, limiter }
    }

    /// The shared limiter.
    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

#[async_trait]
impl<L: Lookup> Lookup for RateLimited<L> {
    async fn lookup(&self, identifier: &Identifier, schema: &Schema) -> Outcome {
        let _permit = self.limiter.acquire().await;
        self.inner.lookup(identifier, schema).await
    }
}

/// Splits a 200 body into fields: trimmed, then split on every comma.
#[must_use]
pub fn split_response(body: &str) -> Vec<String> {
    body.trim().split(',').map(str::to_string).collect()
}

/// Parses a lookup base URL, accepting only `http` and `https`.
///
/// # Errors
///
/// Returns [`ClientError::InvalidBaseUrl`] describing the problem.
pub fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidBaseUrl {
            url: raw.to_string(),
            reason: format!("scheme '{}' is not supported", url.scheme()),
        });
    }
    Ok(url)
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}
