// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use quick_xml::encoding::{decode, detect_encoding};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use std::path::PathBuf;

use crate::ingest::types::{ItemSource, RawItem};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default, rename = "item")]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    /// `<content:encoded>`; the deserializer matches on the local name.
    encoded: Option<String>,
    #[serde(default)]
    content: Vec<TextNode>,
}

impl RssItem {
    /// `description`, then `content:encoded`, then plain `content`.
    fn body(&mut self) -> Option<String> {
        non_empty(self.description.take())
            .or_else(|| non_empty(self.encoded.take()))
            .or_else(|| self.content.drain(..).find_map(|c| text_of(Some(c))))
    }
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    title: Option<TextNode>,
    #[serde(default)]
    link: Vec<AtomLink>,
    updated: Option<String>,
    published: Option<String>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
}

/// Element text regardless of `type="html"` and similar attributes.
#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(default, rename = "$text")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl Entry {
    fn alternate_href(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
            .or_else(|| self.link.first())
            .and_then(|l| l.href.clone())
    }
}

fn text_of(n: Option<TextNode>) -> Option<String> {
    non_empty(n.map(|t| t.value))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// Decode raw feed bytes to UTF-8. A byte order mark wins, then the
/// `encoding` of the XML declaration, then UTF-8.
pub fn decode_feed(bytes: &[u8]) -> Result<String> {
    if let Some((enc, bom)) = detect_encoding(bytes) {
        if bom > 0 || enc.name() != "UTF-8" {
            let text = decode(&bytes[bom..], enc)
                .with_context(|| format!("decoding feed as {}", enc.name()))?;
            return Ok(text.into_owned());
        }
    }

    let mut reader = Reader::from_reader(bytes);
    let declared = loop {
        match reader.read_event() {
            Ok(Event::Decl(d)) => break d.encoder(),
            Ok(Event::Text(_)) => continue,
            _ => break None,
        }
    };
    match declared {
        Some(enc) if enc.name() != "UTF-8" => {
            let text = decode(bytes, enc)
                .with_context(|| format!("decoding feed as {}", enc.name()))?;
            Ok(text.into_owned())
        }
        _ => Ok(std::str::from_utf8(bytes)
            .context("feed is not valid UTF-8")?
            .to_string()),
    }
}

/// Parse RSS 2.0 first; fall back to Atom when RSS yields nothing.
pub fn parse_feed(xml: &str) -> Result<Vec<RawItem>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let rss_result = from_str::<Rss>(&xml_clean);
    let out = match rss_result {
        Ok(rss) if !rss.channel.item.is_empty() => rss
            .channel
            .item
            .into_iter()
            .map(|mut it| RawItem {
                description: it.body(),
                title: it.title,
                link: it.link,
                published: it.pub_date,
                ..RawItem::default()
            })
            .collect(),
        rss_result => match from_str::<Feed>(&xml_clean) {
            Ok(feed) => feed
                .entry
                .into_iter()
                .map(|e| {
                    let link = e.alternate_href();
                    RawItem {
                        title: text_of(e.title),
                        link,
                        published: e.updated.or(e.published),
                        description: text_of(e.summary).or_else(|| text_of(e.content)),
                        ..RawItem::default()
                    }
                })
                .collect(),
            Err(atom_err) => match rss_result {
                // well-formed but empty RSS channel
                Ok(_) => Vec::new(),
                Err(rss_err) => {
                    return Err(rss_err)
                        .context(format!("parsing feed xml (atom attempt: {atom_err})"))
                }
            },
        },
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    Ok(out)
}

enum Mode {
    Inline(String),
    File(PathBuf),
}

/// RSS/Atom source backed by a fixture string or a local file.
pub struct RssSource {
    name: String,
    mode: Mode,
}

impl RssSource {
    pub fn from_fixture(name: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Inline(content.to_string()),
        }
    }

    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            mode: Mode::File(path.into()),
        }
    }
}

#[async_trait]
impl ItemSource for RssSource {
    async fn fetch_items(&self) -> Result<Vec<RawItem>> {
        let items = match &self.mode {
            Mode::Inline(s) => parse_feed(s)?,
            Mode::File(p) => {
                let bytes = tokio::fs::read(p)
                    .await
                    .with_context(|| format!("reading feed file {}", p.display()))?;
                let body = decode_feed(&bytes)
                    .with_context(|| format!("decoding feed file {}", p.display()))?;
                parse_feed(&body)?
            }
        };
        counter!("ingest_raw_items_total").increment(items.len() as u64);
        Ok(items)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// HTML named entities that plain XML does not define.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
