// tests/providers_rss.rs
use news_triangulator::ingest::providers::rss::{parse_feed, RssSource};
use news_triangulator::ingest::types::ItemSource;

const RSS_XML: &str = include_str!("fixtures/rss_sample.xml");
const ATOM_XML: &str = include_str!("fixtures/atom_sample.xml");
const BROKEN_XML: &str = include_str!("fixtures/broken.xml");
const ATOM_SPLIT_XML: &str = include_str!("fixtures/atom_split_links.xml");
const GB2312_XML: &[u8] = include_bytes!("fixtures/gb2312_sample.xml");

#[test]
fn rss_fixture_parses_all_items() {
    let items = parse_feed(RSS_XML).expect("rss parse");
    assert_eq!(items.len(), 3);
    assert!(items[0]
        .title
        .as_deref()
        .is_some_and(|t| t.contains("tariff dispute")));
    assert!(items[0].description.as_deref().is_some_and(|d| d.contains("<p>")));
    assert!(items[2].description.is_none());
}

#[test]
fn atom_fixture_parses_entries() {
    let items = parse_feed(ATOM_XML).expect("atom parse");
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].link.as_deref(),
        Some("https://www.aljazeera.com/news/2025/1/6/gaza-ceasefire")
    );
    assert_eq!(items[0].published.as_deref(), Some("2025-01-06T03:00:00Z"));
    assert!(items[1].description.is_some());
}

#[test]
fn atom_links_around_the_title_pick_the_alternate() {
    let items = parse_feed(ATOM_SPLIT_XML).expect("atom parse");
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].link.as_deref(),
        Some("https://www.aljazeera.com/news/2025/1/6/red-sea-shipping")
    );
    assert_eq!(
        items[1].link.as_deref(),
        Some("https://www.aljazeera.com/news/2025/1/6/oil-output-talks")
    );
    assert_eq!(
        items[1].title.as_deref(),
        Some("Oil output talks resume in Riyadh")
    );
}

#[tokio::test]
async fn gb2312_file_is_decoded_from_its_declaration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chinanews.xml");
    std::fs::write(&path, GB2312_XML).unwrap();

    let items = RssSource::from_file("chinanews", &path)
        .fetch_items()
        .await
        .expect("gb2312 feed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title.as_deref(), Some("中国新闻"));
    assert_eq!(items[0].description.as_deref(), Some("关税政策调整"));
}

#[test]
fn broken_fixture_is_an_error() {
    assert!(parse_feed(BROKEN_XML).is_err());
}

#[tokio::test]
async fn file_source_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("feed.xml");
    std::fs::write(&path, RSS_XML).unwrap();

    let src = RssSource::from_file("xinhua", &path);
    assert_eq!(src.fetch_items().await.unwrap().len(), 3);

    let missing = RssSource::from_file("gone", dir.path().join("missing.xml"));
    let err = missing.fetch_items().await.unwrap_err();
    assert!(format!("{err:#}").contains("missing.xml"));
}
