use anyhow::{Context, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::Cursor;

use crate::listing::GalleryRecord;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Feed-level `updated` of a feed with no entries.
const EMPTY_FEED_UPDATED: &str = "1970-01-01T00:00:00+00:00";

/// Media type the feed is served with.
pub const ATOM_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Channel-level metadata of the generated feed.
///
/// These describe the generator, not the listing, and never change with the
/// records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMeta {
    pub title: String,
    pub link: String,
    pub id: String,
    pub author: String,
}

impl Default for FeedMeta {
    fn default() -> Self {
        Self::for_source("https://exhentai.org/watched")
    }
}

impl FeedMeta {
    /// Default title and author, with link and id pointing at `source`.
    pub fn for_source(source: &str) -> Self {
        Self {
            title: "ExHentai Watched".to_string(),
            link: source.to_string(),
            id: source.to_string(),
            author: "ExHentai RSS Generator".to_string(),
        }
    }
}

/// Serializes gallery records into an Atom document.
#[derive(Debug, Clone, Default)]
pub struct FeedBuilder {
    meta: FeedMeta,
}

impl FeedBuilder {
    pub fn new(meta: FeedMeta) -> Self {
        Self { meta }
    }

    pub fn meta(&self) -> &FeedMeta {
        &self.meta
    }

    /// Renders `records` as an Atom feed, one entry per record in input order.
    ///
    /// The feed-level `updated` is the newest record's timestamp, or the Unix
    /// epoch for an empty listing, so the output depends on nothing but the
    /// input.
    pub fn build(&self, records: &[GalleryRecord]) -> Result<String> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .context("Failed to write XML declaration")?;

        let mut feed = BytesStart::new("feed");
        feed.push_attribute(("xmlns", ATOM_NS));
        writer
            .write_event(Event::Start(feed))
            .context("Failed to write feed element")?;

        write_text_element(&mut writer, "title", &self.meta.title)?;
        write_link(&mut writer, &self.meta.link, Some("self"))?;
        write_text_element(&mut writer, "id", &self.meta.id)?;
        let updated = records
            .iter()
            .map(|r| r.published_at)
            .max()
            .map_or_else(|| EMPTY_FEED_UPDATED.to_string(), |newest| newest.to_rfc3339());
        write_text_element(&mut writer, "updated", &updated)?;

        writer
            .write_event(Event::Start(BytesStart::new("author")))
            .context("Failed to write author element")?;
        write_text_element(&mut writer, "name", &self.meta.author)?;
        writer
            .write_event(Event::End(BytesEnd::new("author")))
            .context("Failed to write author end")?;

        for record in records {
            write_entry(&mut writer, record)?;
        }

        writer
            .write_event(Event::End(BytesEnd::new("feed")))
            .context("Failed to write feed end")?;

        let result = writer.into_inner().into_inner();
        String::from_utf8(result).context("Generated feed contains invalid UTF-8")
    }
}

fn write_entry(writer: &mut Writer<Cursor<Vec<u8>>>, record: &GalleryRecord) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new("entry")))
        .context("Failed to write entry element")?;

    write_text_element(writer, "title", &record.title)?;
    write_link(writer, record.link.as_str(), None)?;
    write_text_element(writer, "updated", &record.published_at.to_rfc3339())?;
    write_text_element(writer, "id", record.link.as_str())?;

    // The image markup travels as CDATA so readers treat it as HTML payload
    // rather than feed structure.
    let mut content = BytesStart::new("content");
    content.push_attribute(("type", "html"));
    writer
        .write_event(Event::Start(content))
        .context("Failed to write content element")?;
    let img = thumbnail_markup(record.thumbnail_url.as_str())?;
    writer
        .write_event(Event::CData(BytesCData::new(img)))
        .context("Failed to write content body")?;
    writer
        .write_event(Event::End(BytesEnd::new("content")))
        .context("Failed to write content end")?;

    writer
        .write_event(Event::End(BytesEnd::new("entry")))
        .context("Failed to write entry end")?;
    Ok(())
}

/// `<img src="…" alt="thumbnail"/>` with the attribute escaped.
fn thumbnail_markup(src: &str) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut img = BytesStart::new("img");
    let src = xml_safe(src);
    img.push_attribute(("src", &*src));
    img.push_attribute(("alt", "thumbnail"));
    writer
        .write_event(Event::Empty(img))
        .context("Failed to write thumbnail markup")?;
    String::from_utf8(writer.into_inner().into_inner())
        .context("Thumbnail markup contains invalid UTF-8")
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .with_context(|| format!("Failed to write {name} element"))?;
    writer
        .write_event(Event::Text(BytesText::new(&xml_safe(text))))
        .with_context(|| format!("Failed to write {name} text"))?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .with_context(|| format!("Failed to write {name} end"))?;
    Ok(())
}

fn write_link(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    href: &str,
    rel: Option<&str>,
) -> Result<()> {
    let mut link = BytesStart::new("link");
    if let Some(rel) = rel {
        link.push_attribute(("rel", rel));
    }
    let href = xml_safe(href);
    link.push_attribute(("href", &*href));
    writer
        .write_event(Event::Empty(link))
        .context("Failed to write link element")
}

/// Drops characters XML 1.0 does not allow anywhere in a document.
fn xml_safe(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};
    use pretty_assertions::assert_eq;
    use url::Url;

    fn record(n: u32, posted: &str) -> GalleryRecord {
        GalleryRecord {
            title: format!("Gallery {n}"),
            link: Url::parse(&format!("https://example.org/g/{n}/abc/")).unwrap(),
            thumbnail_url: Url::parse(&format!("https://example.org/t/{n}.jpg")).unwrap(),
            published_at: DateTime::<FixedOffset>::parse_from_rfc3339(posted).unwrap(),
        }
    }

    #[test]
    fn test_empty_feed_has_metadata_only() {
        let xml = FeedBuilder::default().build(&[]).unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#));
        assert!(xml.contains("<title>ExHentai Watched</title>"));
        assert!(xml.contains(r#"<link rel="self" href="https://exhentai.org/watched"/>"#));
        assert!(xml.contains("<id>https://exhentai.org/watched</id>"));
        assert!(xml.contains("<name>ExHentai RSS Generator</name>"));
        assert!(!xml.contains("<entry>"));
        assert!(xml.contains("<updated>1970-01-01T00:00:00+00:00</updated>"));
    }

    #[test]
    fn test_entry_layout() {
        let xml = FeedBuilder::default()
            .build(&[record(1, "2022-04-01T13:45:00+09:00")])
            .unwrap();
        let expected = r#"  <entry>
    <title>Gallery 1</title>
    <link href="https://example.org/g/1/abc/"/>
    <updated>2022-04-01T13:45:00+09:00</updated>
    <id>https://example.org/g/1/abc/</id>
    <content type="html"><![CDATA[<img src="https://example.org/t/1.jpg" alt="thumbnail"/>]]>"#;
        assert!(xml.contains(expected), "unexpected entry layout:\n{xml}");
        assert!(xml.trim_end().ends_with("</entry>\n</feed>"));
    }

    #[test]
    fn test_feed_updated_is_newest_record() {
        let xml = FeedBuilder::default()
            .build(&[
                record(1, "2022-04-01T13:45:00+00:00"),
                record(2, "2022-04-02T09:00:00+00:00"),
                record(3, "2022-03-30T23:59:00+00:00"),
            ])
            .unwrap();
        assert!(xml.contains("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>"));
        assert!(xml.contains("  <updated>2022-04-02T09:00:00+00:00</updated>\n  <author>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut r = record(1, "2022-04-01T13:45:00+00:00");
        r.title = "Tom & Jerry <Vol. 2>".to_string();
        let xml = FeedBuilder::default().build(&[r]).unwrap();
        assert!(xml.contains("<title>Tom &amp; Jerry &lt;Vol. 2&gt;</title>"));
    }

    #[test]
    fn test_thumbnail_attribute_is_escaped() {
        let markup = thumbnail_markup("https://example.org/t.jpg?a=1&b=2").unwrap();
        assert_eq!(
            markup,
            r#"<img src="https://example.org/t.jpg?a=1&amp;b=2" alt="thumbnail"/>"#
        );
    }

    #[test]
    fn test_custom_meta() {
        let meta = FeedMeta::for_source("https://example.org/watched");
        let xml = FeedBuilder::new(meta).build(&[]).unwrap();
        assert!(xml.contains("<id>https://example.org/watched</id>"));
        assert!(xml.contains("<title>ExHentai Watched</title>"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let records = vec![
            record(1, "2022-04-01T13:45:00+09:00"),
            record(2, "2022-04-01T12:00:00+09:00"),
        ];
        let builder = FeedBuilder::default();
        assert_eq!(builder.build(&records).unwrap(), builder.build(&records).unwrap());
    }

    #[test]
    fn test_control_characters_dropped_from_text() {
        let mut r = record(1, "2022-04-01T13:45:00+00:00");
        r.title = "Be\u{1}ta\u{b} \u{fffe}Vol.\t2".to_string();
        let xml = FeedBuilder::default().build(&[r]).unwrap();
        assert!(xml.contains("<title>Beta Vol.\t2</title>"), "{xml}");
        assert!(!xml.contains('\u{1}'));
        assert!(!xml.contains('\u{b}'));
        assert!(!xml.contains('\u{fffe}'));
    }

    #[test]
    fn test_xml_safe_borrows_clean_text() {
        assert!(matches!(xml_safe("Gallery ★ 2"), Cow::Borrowed("Gallery ★ 2")));
        assert_eq!(xml_safe("a\u{0}b\u{1f}c\r\n"), "abc\r\n");
        assert!(is_xml_char('\u{10000}'));
        assert!(!is_xml_char('\u{ffff}'));
    }

    #[test]
    fn test_only_feed_link_is_self() {
        let xml = FeedBuilder::default()
            .build(&[record(1, "2022-04-01T13:45:00+09:00")])
            .unwrap();
        assert_eq!(xml.matches(r#"rel="self""#).count(), 1);
        assert!(xml.contains(r#"<link href="https://example.org/g/1/abc/"/>"#));
    }
}
