//! Per-layout field extraction.
//!
//! Each extractor splits the page into rows and turns a single row into a
//! [`GalleryRecord`]. What to do when a row fails is not decided here; the
//! pipeline applies the configured [`RowPolicy`](super::RowPolicy).

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::date::{parse_posted, PostedZone};
use super::{GalleryRecord, ListingError};
use crate::util::resolve_url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

const LISTING_TABLE: &str = "table.itg";
const THUMBNAIL_GRID: &str = "div.itg";

static LISTING_TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| selector(LISTING_TABLE));
static THUMBNAIL_GRID_SEL: LazyLock<Selector> = LazyLock::new(|| selector(THUMBNAIL_GRID));
static POSTED: LazyLock<Selector> = LazyLock::new(|| selector(r#"div[id^="posted_"]"#));

static COMPACT_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("td.glname a"));
static COMPACT_TITLE: LazyLock<Selector> = LazyLock::new(|| selector("div.glink"));
static COMPACT_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("td div.glthumb div img"));

static EXTENDED_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector(".gl1e a"));
static EXTENDED_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector(".gl1e img"));
static EXTENDED_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".glink"));

static THUMBNAIL_CELL: LazyLock<Selector> = LazyLock::new(|| selector(".gl1t"));
static THUMBNAIL_IMAGE: LazyLock<Selector> = LazyLock::new(|| selector("img"));

/// Compact rows lazy-load their images: `src` holds a placeholder until the
/// browser swaps in `data-src`.
pub const LAZY_IMAGE_ATTRS: &[&str] = &["data-src", "src"];
pub const PLAIN_IMAGE_ATTRS: &[&str] = &["src"];

/// Per-row inputs shared by every field rule.
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Page URL, used to resolve relative links.
    pub base: &'a Url,
    pub zone: PostedZone,
    /// 1-based position of the row in the listing.
    pub row: usize,
}

/// Extraction strategy for one listing layout.
pub trait Extractor {
    /// Row elements of the listing, in document order. A page without a
    /// listing container has no rows.
    fn rows<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, ListingError>;

    /// Builds the record for a single row.
    fn record(
        &self,
        row: ElementRef<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<GalleryRecord, ListingError>;
}

/// Compact, Minimal and Minimal+ layouts: one table, a header row, one
/// gallery per row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactExtractor;

/// Extended layout: one table whose direct rows are galleries. Rows carry a
/// nested tag table that must not be mistaken for galleries.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtendedExtractor;

/// Thumbnail layout: a grid of cells instead of a table.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailExtractor;

impl Extractor for CompactExtractor {
    fn rows<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, ListingError> {
        let Some(table) = container(document, &LISTING_TABLE_SEL, LISTING_TABLE)? else {
            return Ok(Vec::new());
        };
        // First row is the column header.
        Ok(direct_rows(table).into_iter().skip(1).collect())
    }

    fn record(
        &self,
        row: ElementRef<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<GalleryRecord, ListingError> {
        let anchor = select_one(row, &COMPACT_ANCHOR, "link", ctx.row)?;
        let title_el = select_one(anchor, &COMPACT_TITLE, "title", ctx.row)?;
        let title = required_text(title_el, "title", ctx.row)?;
        let link = attr_url(anchor, &["href"], "link", ctx)?;
        let image = select_one(row, &COMPACT_IMAGE, "thumbnail", ctx.row)?;
        let thumbnail_url = attr_url(image, LAZY_IMAGE_ATTRS, "thumbnail", ctx)?;

        Ok(GalleryRecord {
            title,
            link,
            thumbnail_url,
            published_at: posted(row, ctx)?,
        })
    }
}

impl Extractor for ExtendedExtractor {
    fn rows<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, ListingError> {
        let Some(table) = container(document, &LISTING_TABLE_SEL, LISTING_TABLE)? else {
            return Ok(Vec::new());
        };
        Ok(direct_rows(table))
    }

    fn record(
        &self,
        row: ElementRef<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<GalleryRecord, ListingError> {
        let anchor = select_one(row, &EXTENDED_ANCHOR, "link", ctx.row)?;
        let link = attr_url(anchor, &["href"], "link", ctx)?;
        let title_el = select_one(row, &EXTENDED_TITLE, "title", ctx.row)?;
        let title = required_text(title_el, "title", ctx.row)?;
        let image = select_one(row, &EXTENDED_IMAGE, "thumbnail", ctx.row)?;
        let thumbnail_url = attr_url(image, PLAIN_IMAGE_ATTRS, "thumbnail", ctx)?;

        Ok(GalleryRecord {
            title,
            link,
            thumbnail_url,
            published_at: posted(row, ctx)?,
        })
    }
}

impl Extractor for ThumbnailExtractor {
    fn rows<'a>(&self, document: &'a Html) -> Result<Vec<ElementRef<'a>>, ListingError> {
        let Some(grid) = container(document, &THUMBNAIL_GRID_SEL, THUMBNAIL_GRID)? else {
            return Ok(Vec::new());
        };
        Ok(grid.select(&THUMBNAIL_CELL).collect())
    }

    fn record(
        &self,
        row: ElementRef<'_>,
        ctx: &FieldContext<'_>,
    ) -> Result<GalleryRecord, ListingError> {
        // The title anchor sits directly in the cell; the image has its own
        // anchor further down.
        let anchor = only(
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == "a"),
            "link",
            ctx.row,
        )?;
        let title = required_text(anchor, "title", ctx.row)?;
        let link = attr_url(anchor, &["href"], "link", ctx)?;
        let image = select_one(row, &THUMBNAIL_IMAGE, "thumbnail", ctx.row)?;
        let thumbnail_url = attr_url(image, PLAIN_IMAGE_ATTRS, "thumbnail", ctx)?;

        Ok(GalleryRecord {
            title,
            link,
            thumbnail_url,
            published_at: posted(row, ctx)?,
        })
    }
}

/// Locates the single listing container, if the page has one.
fn container<'a>(
    document: &'a Html,
    sel: &Selector,
    css: &'static str,
) -> Result<Option<ElementRef<'a>>, ListingError> {
    let mut matches = document.select(sel);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        return Err(ListingError::AmbiguousListing { selector: css });
    }
    Ok(first)
}

/// Rows belonging to `table` itself: its `tr` children plus those of its
/// `thead`/`tbody`/`tfoot` sections. Rows of nested tables are excluded.
fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|row| row.value().name() == "tr"),
            ),
            _ => {}
        }
    }
    rows
}

/// Exactly one match of `sel` under `scope`.
fn select_one<'a>(
    scope: ElementRef<'a>,
    sel: &Selector,
    field: &'static str,
    row: usize,
) -> Result<ElementRef<'a>, ListingError> {
    only(scope.select(sel), field, row)
}

/// Exactly one element from `matches`; none is missing, several is
/// ambiguous.
fn only<'a>(
    mut matches: impl Iterator<Item = ElementRef<'a>>,
    field: &'static str,
    row: usize,
) -> Result<ElementRef<'a>, ListingError> {
    let first = matches
        .next()
        .ok_or(ListingError::MissingField { field, row })?;
    if matches.next().is_some() {
        return Err(ListingError::AmbiguousField { field, row });
    }
    Ok(first)
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn required_text(
    el: ElementRef<'_>,
    field: &'static str,
    row: usize,
) -> Result<String, ListingError> {
    let text = text_of(el);
    if text.is_empty() {
        return Err(ListingError::MissingField { field, row });
    }
    Ok(text)
}

/// First attribute from `preference` that is present with a non-blank
/// value.
pub fn first_attr<'a>(el: ElementRef<'a>, preference: &[&str]) -> Option<&'a str> {
    preference
        .iter()
        .filter_map(|name| el.value().attr(name))
        .find(|value| !value.trim().is_empty())
}

fn attr_url(
    el: ElementRef<'_>,
    preference: &[&str],
    field: &'static str,
    ctx: &FieldContext<'_>,
) -> Result<Url, ListingError> {
    let raw = first_attr(el, preference).ok_or(ListingError::MissingField {
        field,
        row: ctx.row,
    })?;
    resolve_url(ctx.base, raw).map_err(|_| ListingError::InvalidUrl {
        value: raw.to_string(),
        row: ctx.row,
    })
}

fn posted(
    row: ElementRef<'_>,
    ctx: &FieldContext<'_>,
) -> Result<chrono::DateTime<chrono::FixedOffset>, ListingError> {
    let el = select_one(row, &POSTED, "posted date", ctx.row)?;
    parse_posted(&text_of(el), ctx.zone, ctx.row)
}
