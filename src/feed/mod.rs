//! Atom feed generation for extracted gallery records.
//!
//! - [`FeedBuilder`] - writes the Atom document with `quick-xml`
//! - [`FeedMeta`] - fixed channel metadata (title, link, id, author)
//!
//! # Example
//!
//! ```ignore
//! use watched_feed::feed::{FeedBuilder, FeedMeta};
//!
//! let xml = FeedBuilder::new(FeedMeta::default()).build(&records)?;
//! ```

mod atom;

pub use atom::{FeedBuilder, FeedMeta, ATOM_CONTENT_TYPE};
