use chrono::{DateTime, FixedOffset};
use std::fmt;
use url::Url;

/// One gallery as listed on the watched page.
///
/// Every field is populated: extraction fails the row instead of emitting
/// a partial record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryRecord {
    /// Display name of the gallery (trimmed, never empty).
    pub title: String,
    /// Absolute gallery URL. Doubles as the feed entry id.
    pub link: Url,
    /// Absolute URL of the preview image.
    pub thumbnail_url: Url,
    /// Posted time, localized to the configured zone.
    pub published_at: DateTime<FixedOffset>,
}

/// Layout preset the site renders the listing in.
///
/// The site stores this per account, so whatever the account last chose in
/// a browser is what we get.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    Compact,
    Minimal,
    MinimalPlus,
    Extended,
    Thumbnail,
}

/// Structural family of a [`DisplayMode`]; one extractor per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Compact,
    Extended,
    Thumbnail,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 5] = [
        DisplayMode::Compact,
        DisplayMode::Minimal,
        DisplayMode::MinimalPlus,
        DisplayMode::Extended,
        DisplayMode::Thumbnail,
    ];

    /// Maps the selector option label to a mode. Surrounding whitespace is
    /// ignored, everything else must match exactly.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Compact" => Some(DisplayMode::Compact),
            "Minimal" => Some(DisplayMode::Minimal),
            "Minimal+" => Some(DisplayMode::MinimalPlus),
            "Extended" => Some(DisplayMode::Extended),
            "Thumbnail" => Some(DisplayMode::Thumbnail),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Compact => "Compact",
            DisplayMode::Minimal => "Minimal",
            DisplayMode::MinimalPlus => "Minimal+",
            DisplayMode::Extended => "Extended",
            DisplayMode::Thumbnail => "Thumbnail",
        }
    }

    /// Minimal and Minimal+ render the same table as Compact.
    pub fn layout(self) -> Layout {
        match self {
            DisplayMode::Compact | DisplayMode::Minimal | DisplayMode::MinimalPlus => {
                Layout::Compact
            }
            DisplayMode::Extended => Layout::Extended,
            DisplayMode::Thumbnail => Layout::Thumbnail,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
