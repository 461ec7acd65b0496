use scraper::Html;
use serde::Deserialize;
use url::Url;

use super::date::PostedZone;
use super::detect::detect_mode;
use super::extract::{
    CompactExtractor, ExtendedExtractor, Extractor, FieldContext, ThumbnailExtractor,
};
use super::{GalleryRecord, Layout, ListingError};

/// What to do with a row that fails extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowPolicy {
    /// Fail the whole page on the first bad row.
    #[default]
    Abort,
    /// Log the bad row and keep going.
    Skip,
}

/// Mode detection plus the matching extractor, as one `parse` call.
///
/// Holds no per-request state; a single pipeline can serve any number of
/// pages, concurrently or not.
#[derive(Debug, Clone)]
pub struct ExtractionPipeline {
    base: Url,
    zone: PostedZone,
    policy: RowPolicy,
}

impl ExtractionPipeline {
    /// `base` is the URL the page was fetched from; relative links on the
    /// page are resolved against it.
    pub fn new(base: Url) -> Self {
        Self {
            base,
            zone: PostedZone::default(),
            policy: RowPolicy::default(),
        }
    }

    pub fn with_zone(mut self, zone: PostedZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_policy(mut self, policy: RowPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Extracts gallery records from a listing page, in document order.
    pub fn parse(&self, html: &str) -> Result<Vec<GalleryRecord>, ListingError> {
        let document = Html::parse_document(html);
        let mode = detect_mode(&document)?;

        let extractor: &dyn Extractor = match mode.layout() {
            Layout::Compact => &CompactExtractor,
            Layout::Extended => &ExtendedExtractor,
            Layout::Thumbnail => &ThumbnailExtractor,
        };

        let rows = extractor.rows(&document)?;
        tracing::debug!(mode = %mode, rows = rows.len(), "Detected listing layout");

        let mut records = Vec::with_capacity(rows.len());
        for (index, row) in rows.into_iter().enumerate() {
            let ctx = FieldContext {
                base: &self.base,
                zone: self.zone,
                row: index + 1,
            };
            match extractor.record(row, &ctx) {
                Ok(record) => records.push(record),
                Err(e) if self.policy == RowPolicy::Skip => {
                    tracing::warn!(mode = %mode, error = %e, "Skipping malformed listing row");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(mode = %mode, records = records.len(), "Extracted listing");
        Ok(records)
    }
}
