//! Extraction of gallery records from the watched-galleries listing page.
//!
//! The site renders the listing in one of five display modes chosen per
//! account. This module detects which one produced a page and extracts
//! records with the matching strategy:
//!
//! - [`detect`](detect_mode) - reads the mode selector (`#dms`)
//! - [`extract`] - one [`Extractor`] per layout family
//! - [`ExtractionPipeline`] - detection, dispatch and the row failure policy
//!
//! Everything here is synchronous and pure: HTML text in, records out.
//!
//! # Example
//!
//! ```ignore
//! use watched_feed::listing::{ExtractionPipeline, PostedZone, RowPolicy};
//!
//! let pipeline = ExtractionPipeline::new(url)
//!     .with_zone(PostedZone::Local)
//!     .with_policy(RowPolicy::Abort);
//! let records = pipeline.parse(&html)?;
//! ```

mod date;
mod detect;
mod error;
pub mod extract;
mod pipeline;
mod types;

pub use date::{parse_posted, PostedZone, POSTED_FORMAT};
pub use detect::detect_mode;
pub use error::ListingError;
pub use extract::{CompactExtractor, ExtendedExtractor, Extractor, ThumbnailExtractor};
pub use pipeline::{ExtractionPipeline, RowPolicy};
pub use types::{DisplayMode, GalleryRecord, Layout};
