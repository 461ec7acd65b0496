//! Integration tests for the generated Atom document.
//!
//! The output is read back with `feed-rs`, an independent Atom parser, so
//! these tests check what a feed reader would actually see.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use url::Url;
use watched_feed::feed::{FeedBuilder, FeedMeta};
use watched_feed::listing::{ExtractionPipeline, GalleryRecord, PostedZone};

fn record(n: usize, title: &str, minutes_ago: i64) -> GalleryRecord {
    let offset = FixedOffset::east_opt(9 * 3600).unwrap();
    let base = offset.with_ymd_and_hms(2022, 4, 1, 13, 45, 0).unwrap();
    GalleryRecord {
        title: title.to_string(),
        link: Url::parse(&format!("https://exhentai.org/g/{n}/token{n}/")).unwrap(),
        thumbnail_url: Url::parse(&format!("https://s.exhentai.org/t/{n}.jpg")).unwrap(),
        published_at: base - chrono::Duration::minutes(minutes_ago),
    }
}

fn read_back(xml: &str) -> feed_rs::model::Feed {
    feed_rs::parser::parse(xml.as_bytes()).expect("generated feed should parse")
}

#[test]
fn test_channel_metadata() {
    let xml = FeedBuilder::default().build(&[]).unwrap();
    let feed = read_back(&xml);

    assert_eq!(feed.feed_type, feed_rs::model::FeedType::Atom);
    assert_eq!(feed.id, "https://exhentai.org/watched");
    assert_eq!(
        feed.title.map(|t| t.content).as_deref(),
        Some("ExHentai Watched")
    );
    assert_eq!(feed.links[0].href, "https://exhentai.org/watched");
    assert_eq!(feed.links[0].rel.as_deref(), Some("self"));
    assert_eq!(feed.authors[0].name, "ExHentai RSS Generator");
    assert_eq!(feed.updated, Utc.timestamp_opt(0, 0).single());
    assert!(feed.entries.is_empty());
}

#[test]
fn test_entries_match_records() {
    let records = vec![
        record(1, "Alpha & Omega", 0),
        record(2, "<Beta>", 30),
        record(3, "Gamma \"quoted\"", 90),
    ];
    let xml = FeedBuilder::default().build(&records).unwrap();
    let feed = read_back(&xml);

    assert_eq!(feed.entries.len(), records.len());
    for (entry, record) in feed.entries.iter().zip(&records) {
        assert_eq!(entry.id, record.link.as_str());
        assert_eq!(entry.links[0].href, record.link.as_str());
        assert_eq!(
            entry.title.as_ref().map(|t| t.content.as_str()),
            Some(record.title.as_str())
        );
        assert_eq!(
            entry.updated,
            Some(record.published_at.with_timezone(&Utc))
        );

        let content = entry.content.as_ref().expect("entry content");
        let body = content.body.as_deref().unwrap_or_default();
        assert!(
            body.contains(&format!(r#"src="{}""#, record.thumbnail_url)),
            "content should reference the thumbnail: {body}"
        );
        assert!(body.contains("<img"));
    }

    assert_eq!(
        feed.updated,
        Some(records[0].published_at.with_timezone(&Utc))
    );
}

#[test]
fn test_custom_source_metadata() {
    let meta = FeedMeta::for_source("https://example.org/watched");
    let feed = read_back(&FeedBuilder::new(meta).build(&[]).unwrap());
    assert_eq!(feed.id, "https://example.org/watched");
}

#[test]
fn test_fixture_to_feed() {
    let html = include_str!("fixtures/compact.html");
    let records = ExtractionPipeline::new(Url::parse("https://exhentai.org/watched").unwrap())
        .with_zone(PostedZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap()))
        .parse(html)
        .unwrap();
    let xml = FeedBuilder::default().build(&records).unwrap();

    assert!(xml.contains("<updated>2022-04-01T13:45:00+09:00</updated>"));
    let ids: Vec<String> = read_back(&xml).entries.into_iter().map(|e| e.id).collect();
    assert_eq!(
        ids,
        vec![
            "https://exhentai.org/g/2201001/0a1b2c3d4e/",
            "https://exhentai.org/g/2201002/5f6a7b8c9d/",
            "https://exhentai.org/g/2201003/e0f1a2b3c4/",
        ]
    );
}

#[test]
fn test_control_characters_in_scraped_title_stay_out_of_feed() {
    let html = include_str!("fixtures/compact.html").replace(
        r#"<div class="glink">Beta</div>"#,
        "<div class=\"glink\">Be\u{1}ta\u{b}</div>",
    );
    let records = ExtractionPipeline::new(Url::parse("https://exhentai.org/watched").unwrap())
        .with_zone(PostedZone::Fixed(FixedOffset::east_opt(9 * 3600).unwrap()))
        .parse(&html)
        .unwrap();
    let xml = FeedBuilder::default().build(&records).unwrap();

    assert!(!xml.contains('\u{1}'));
    assert!(!xml.contains('\u{b}'));
    assert!(xml.contains("<title>Beta</title>"));
    assert_eq!(read_back(&xml).entries.len(), 3);
}

#[test]
fn test_build_twice_is_byte_identical() {
    let records: Vec<_> = (0..5).map(|n| record(n, "Same", n as i64)).collect();
    let builder = FeedBuilder::default();
    assert_eq!(
        builder.build(&records).unwrap(),
        builder.build(&records).unwrap()
    );
}

proptest! {
    #[test]
    fn prop_entry_count_and_order_preserved(
        offsets in proptest::collection::vec(0i64..100_000, 0..25)
    ) {
        let records: Vec<GalleryRecord> = offsets
            .iter()
            .enumerate()
            .map(|(n, minutes)| record(n, &format!("Gallery {n}"), *minutes))
            .collect();
        let xml = FeedBuilder::default().build(&records).unwrap();
        let feed = read_back(&xml);

        prop_assert_eq!(feed.entries.len(), records.len());
        for (entry, record) in feed.entries.iter().zip(&records) {
            prop_assert_eq!(entry.id.as_str(), record.link.as_str());
        }

        let newest: Option<DateTime<Utc>> = records
            .iter()
            .map(|r| r.published_at.with_timezone(&Utc))
            .max();
        prop_assert_eq!(feed.updated, newest.or(Utc.timestamp_opt(0, 0).single()));
    }
}
