//! Configuration file parser for ~/.config/watched-feed/config.toml.
//!
//! The config file is optional, and a missing file yields `Config::default()`.
//! Without `[cookies]` the site will not serve the listing, so in practice
//! at least the session cookies need to be set. Unknown keys are ignored by
//! serde but logged as warnings to catch typos.
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::listing::{PostedZone, RowPolicy};
use crate::util::{parse_http_url, UrlError};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid timezone {0:?}: expected \"local\" or an offset like \"+09:00\"")]
    InvalidTimezone(String),

    #[error("Invalid source_url: {0}")]
    InvalidSourceUrl(#[from] UrlError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// User agent of a desktop Firefox; the site serves a different page to
/// unknown clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:98.0) Gecko/20100101 Firefox/98.0";

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks cookie values, which are session credentials.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Listing page to fetch.
    pub source_url: String,

    /// Address the feed server binds to.
    pub listen: String,

    /// User-Agent header sent upstream.
    pub user_agent: String,

    /// Zone attached to posted dates: "local" or a fixed offset like "+09:00".
    pub timezone: String,

    /// Upstream request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Largest listing page accepted, in bytes.
    pub max_page_bytes: usize,

    /// What to do with a listing row that cannot be extracted.
    pub on_malformed_row: RowPolicy,

    /// Cookies sent with the upstream request (name -> value).
    pub cookies: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: "https://exhentai.org/watched".to_string(),
            listen: "127.0.0.1:8000".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timezone: "local".to_string(),
            request_timeout_secs: 30,
            max_page_bytes: 5 * 1024 * 1024,
            on_malformed_row: RowPolicy::Abort,
            cookies: BTreeMap::new(),
        }
    }
}

/// Mask cookie values in Debug output to prevent session leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cookies: BTreeMap<&str, &str> = self
            .cookies
            .keys()
            .map(|name| (name.as_str(), "[REDACTED]"))
            .collect();
        f.debug_struct("Config")
            .field("source_url", &self.source_url)
            .field("listen", &self.listen)
            .field("user_agent", &self.user_agent)
            .field("timezone", &self.timezone)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_page_bytes", &self.max_page_bytes)
            .field("on_malformed_row", &self.on_malformed_row)
            .field("cookies", &cookies)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "source_url",
        "listen",
        "user_agent",
        "timezone",
        "request_timeout_secs",
        "max_page_bytes",
        "on_malformed_row",
        "cookies",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file gives `Config::default()`. Unknown keys are
    /// accepted and reported with a warning.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = Self::read_bounded(path)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        Self::warn_unknown_keys(&content);
        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            source = %config.source_url,
            cookies = config.cookies.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Reads at most `MAX_FILE_SIZE` bytes; `None` when the file does not exist.
    fn read_bounded(path: &Path) -> Result<Option<String>, ConfigError> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let too_large = |size: u64| {
            ConfigError::TooLarge(format!(
                "{size} bytes, limit is {} bytes",
                Self::MAX_FILE_SIZE
            ))
        };
        let size = file.metadata()?.len();
        if size > Self::MAX_FILE_SIZE {
            return Err(too_large(size));
        }

        let mut content = String::new();
        let read = file.take(Self::MAX_FILE_SIZE + 1).read_to_string(&mut content)?;
        if read as u64 > Self::MAX_FILE_SIZE {
            return Err(too_large(read as u64));
        }
        Ok(Some(content))
    }

    fn warn_unknown_keys(content: &str) {
        let Ok(table) = content.parse::<toml::Table>() else {
            return;
        };
        for key in table.keys().filter(|k| !Self::KNOWN_KEYS.contains(&k.as_str())) {
            tracing::warn!(key = %key, "Unknown key in config file, ignoring");
        }
    }

    /// Zone attached to posted dates.
    pub fn zone(&self) -> Result<PostedZone, ConfigError> {
        self.timezone
            .parse::<PostedZone>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// The listing page URL, validated as absolute http(s).
    pub fn source_url(&self) -> Result<Url, ConfigError> {
        Ok(parse_http_url(&self.source_url)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================
