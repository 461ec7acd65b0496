//! Utility functions shared across modules.
//!
//! - **URL handling**: parse the configured source page and resolve
//!   `href`/`src` values scraped from it into absolute http(s) URLs

mod url_resolver;

pub use url_resolver::{parse_http_url, resolve_url, UrlError};
