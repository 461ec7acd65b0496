//! Watched-galleries listing as an Atom feed.
//!
//! - [`listing`] - display-mode detection and record extraction
//! - [`feed`] - Atom serialization
//! - [`fetch`] - authenticated retrieval of the listing page
//! - [`config`] - TOML configuration
//! - [`server`] - HTTP front end

pub mod config;
pub mod feed;
pub mod fetch;
pub mod listing;
pub mod server;
pub mod util;
