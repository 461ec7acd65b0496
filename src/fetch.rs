//! Authenticated retrieval of the listing page.
//!
//! One GET per call with the configured cookies and user agent. Failures are
//! returned as-is: retrying or re-authenticating is up to whoever calls.

use futures::StreamExt;
use reqwest::header::{HeaderValue, COOKIE, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::{Config, ConfigError};

/// Errors that can occur while fetching the listing page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the configured size limit
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    /// A cookie name or value cannot be sent as a header
    #[error("Cookies contain characters not allowed in a header")]
    InvalidCookie,
}

/// Where and how to fetch the listing page.
///
/// The cookie header is held as a secret so it stays out of logs and
/// debug output.
#[derive(Debug)]
pub struct Source {
    pub url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_bytes: usize,
    cookie_header: Option<SecretString>,
}

impl Source {
    pub fn new(url: Url) -> Self {
        let defaults = Config::default();
        Self {
            url,
            timeout: defaults.request_timeout(),
            max_bytes: defaults.max_page_bytes,
            user_agent: defaults.user_agent,
            cookie_header: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut source = Self::new(config.source_url()?);
        source.user_agent = config.user_agent.clone();
        source.timeout = config.request_timeout();
        source.max_bytes = config.max_page_bytes;
        Ok(source.with_cookies(
            config
                .cookies
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        ))
    }

    /// Sets the cookies sent with the request, in the given order.
    pub fn with_cookies<'a>(
        mut self,
        cookies: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let header = cookies
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        self.cookie_header = (!header.is_empty()).then(|| SecretString::from(header));
        self
    }

    pub fn has_cookies(&self) -> bool {
        self.cookie_header.is_some()
    }
}

/// Fetches the listing page and returns its body as text.
pub async fn fetch_listing(
    client: &reqwest::Client,
    source: &Source,
) -> Result<String, FetchError> {
    let mut request = client
        .get(source.url.clone())
        .header(USER_AGENT, source.user_agent.as_str());

    if let Some(cookies) = &source.cookie_header {
        let mut value = HeaderValue::from_str(cookies.expose_secret())
            .map_err(|_| FetchError::InvalidCookie)?;
        value.set_sensitive(true);
        request = request.header(COOKIE, value);
    } else {
        tracing::warn!(url = %source.url, "Fetching listing without session cookies");
    }

    let response = tokio::time::timeout(source.timeout, request.send())
        .await
        .map_err(|_| FetchError::Timeout(source.timeout))?
        .map_err(FetchError::Network)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url = %source.url, status = %status, "Listing fetch failed");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let read = read_limited_text(response, source.max_bytes);
    let body = tokio::time::timeout(source.timeout, read)
        .await
        .map_err(|_| FetchError::Timeout(source.timeout))??;
    tracing::debug!(url = %source.url, bytes = body.len(), "Fetched listing page");
    Ok(body)
}

/// Collects the body, refusing anything over `limit` bytes and anything
/// shorter than its declared Content-Length.
async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, FetchError> {
    let declared = response.content_length();
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(FetchError::ResponseTooLarge(limit));
    }

    let mut body = Vec::with_capacity(declared.map_or(0, |len| len as usize));
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Err(FetchError::ResponseTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }

    match declared {
        Some(expected) if (body.len() as u64) < expected => Err(FetchError::IncompleteResponse {
            expected,
            received: body.len(),
        }),
        _ => String::from_utf8(body).map_err(|_| FetchError::InvalidUtf8),
    }
}
