use thiserror::Error;
use url::Url;

/// Errors that can occur when turning scraped or configured text into a URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    /// The text could not be parsed, even relative to the page URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Parses an absolute http(s) URL, as used for the configured source page.
///
/// # Examples
///
/// ```
/// use watched_feed::util::parse_http_url;
///
/// let url = parse_http_url("https://example.org/watched").unwrap();
/// assert_eq!(url.host_str(), Some("example.org"));
///
/// assert!(parse_http_url("file:///etc/passwd").is_err());
/// assert!(parse_http_url("/watched").is_err());
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    require_http(Url::parse(url_str.trim())?)
}

/// Resolves an `href`/`src` value found on a page against the page URL.
///
/// Absolute values pass through unchanged; relative and protocol-relative
/// values are joined onto `base`. The result must be http(s).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use watched_feed::util::resolve_url;
///
/// let base = Url::parse("https://example.org/watched").unwrap();
/// assert_eq!(
///     resolve_url(&base, "/g/1/abc/").unwrap().as_str(),
///     "https://example.org/g/1/abc/"
/// );
/// assert_eq!(
///     resolve_url(&base, "//cdn.example.org/t.jpg").unwrap().as_str(),
///     "https://cdn.example.org/t.jpg"
/// );
/// assert!(resolve_url(&base, "javascript:void(0)").is_err());
/// ```
pub fn resolve_url(base: &Url, raw: &str) -> Result<Url, UrlError> {
    require_http(base.join(raw.trim())?)
}

fn require_http(url: Url) -> Result<Url, UrlError> {
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_owned())),
    }
}
