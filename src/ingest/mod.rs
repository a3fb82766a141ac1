// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod translate;
pub mod types;

use crate::config::TriangulateConfig;
use crate::ingest::translate::{enrich_items, Translator};
use crate::ingest::types::{Item, ItemSource, RawItem};
use metrics::{counter, describe_counter};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashSet;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Items kept per stream after ingest.");
        describe_counter!(
            "ingest_dropped_total",
            "Items dropped for missing title or link."
        );
        describe_counter!(
            "ingest_dedup_total",
            "Items removed by (title, link) deduplication."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Source fetch/parse errors."
        );
    });
}

/// Decode entities, strip tags, collapse whitespace, trim.
pub fn clean_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Clean and cap a description; over-long text keeps `max - 3` chars plus `...`.
pub fn clean_description(s: &str, max_chars: usize) -> Option<String> {
    let out = clean_text(s);
    if out.is_empty() {
        return None;
    }
    if out.chars().count() > max_chars {
        let mut cut: String = out.chars().take(max_chars.saturating_sub(3)).collect();
        cut.push_str("...");
        return Some(cut);
    }
    Some(out)
}

/// Turn collaborator items into `Item`s; anything without a title or link is dropped.
/// Returns (items, dropped_count).
pub fn normalize_items(raw: Vec<RawItem>, description_max_chars: usize) -> (Vec<Item>, usize) {
    let mut dropped = 0usize;
    let mut out = Vec::with_capacity(raw.len());
    for r in raw {
        let title = r.title.as_deref().map(clean_text).unwrap_or_default();
        let link = r.link.as_deref().map(clean_text).unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            dropped += 1;
            continue;
        }
        out.push(Item {
            title,
            link,
            published: r.published.as_deref().map(clean_text).unwrap_or_default(),
            description: r
                .description
                .as_deref()
                .and_then(|d| clean_description(d, description_max_chars)),
            title_translated_primary: r
                .title_translated_primary
                .as_deref()
                .map(clean_text)
                .filter(|s| !s.is_empty()),
            title_translated_secondary: r
                .title_translated_secondary
                .as_deref()
                .map(clean_text)
                .filter(|s| !s.is_empty()),
        });
    }
    (out, dropped)
}

/// Keep the first item per `(title, link)`. Returns (kept, removed_count).
pub fn dedup_items(items: Vec<Item>) -> (Vec<Item>, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut keep = Vec::with_capacity(items.len());
    let mut removed = 0usize;
    for it in items {
        let (title, link) = it.key();
        if seen.insert((title.to_string(), link.to_string())) {
            keep.push(it);
        } else {
            removed += 1;
        }
    }
    (keep, removed)
}

/// Normalize, dedup and cap one stream's raw items.
pub fn prepare_stream(raw: Vec<RawItem>, cfg: &TriangulateConfig) -> Vec<Item> {
    ensure_metrics_described();
    let (items, dropped) = normalize_items(raw, cfg.limits.description_max_chars);
    let (mut items, dedup) = dedup_items(items);
    items.truncate(cfg.limits.max_stream_items);

    counter!("ingest_dropped_total").increment(dropped as u64);
    counter!("ingest_dedup_total").increment(dedup as u64);
    counter!("ingest_items_total").increment(items.len() as u64);
    items
}

/// One perspective's ingest result. `errors` holds one line per failing source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutcome {
    pub items: Vec<Item>,
    pub errors: Vec<String>,
}

impl StreamOutcome {
    pub fn ok(items: Vec<Item>) -> Self {
        Self {
            items,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// Error slot text: only when something failed *and* nothing came through.
    pub fn error_slot(&self) -> Option<String> {
        (self.items.is_empty() && !self.errors.is_empty()).then(|| self.errors.join(" | "))
    }
}

/// Fetch every source of one perspective, then normalize, dedup, cap and translate.
/// A failing source is recorded and skipped; it never aborts the others.
pub async fn collect_stream(
    sources: &[Box<dyn ItemSource>],
    translator: &dyn Translator,
    cfg: &TriangulateConfig,
) -> StreamOutcome {
    ensure_metrics_described();

    let mut raw = Vec::new();
    let mut errors = Vec::new();
    for s in sources {
        match s.fetch_items().await {
            Ok(mut v) => raw.append(&mut v),
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, source = s.name(), "source error");
                counter!("ingest_source_errors_total").increment(1);
                errors.push(format!("{}: {:#}", s.name(), e));
            }
        }
    }

    let items = prepare_stream(raw, cfg);
    let items = enrich_items(
        items,
        translator,
        &cfg.output.primary_language,
        &cfg.output.secondary_language,
    )
    .await;

    StreamOutcome { items, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_strips_tags_and_entities() {
        let s = "  <p>Hello,&nbsp;&nbsp;<b>world</b></p>\n\t &amp; more ";
        assert_eq!(clean_text(s), "Hello, world & more");
    }

    #[test]
    fn description_is_truncated_with_ellipsis() {
        let long = "a".repeat(600);
        let out = clean_description(&long, 500).unwrap();
        assert_eq!(out.chars().count(), 500);
        assert!(out.ends_with("..."));
        assert_eq!(clean_description("short", 500).as_deref(), Some("short"));
        assert_eq!(clean_description("<br/>", 500), None);
    }

    #[test]
    fn malformed_items_are_dropped() {
        let raw = vec![
            RawItem::titled("Ok", "https://x.test/1"),
            RawItem {
                title: Some("No link".into()),
                ..RawItem::default()
            },
            RawItem::titled("   ", "https://x.test/2"),
        ];
        let (items, dropped) = normalize_items(raw, 500);
        assert_eq!(items.len(), 1);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn dedup_keeps_first_per_title_and_link() {
        let items = vec![
            Item::new("A", "1").with_description("first"),
            Item::new("A", "1").with_description("second"),
            Item::new("A", "1").with_translations("Alpha", "甲"),
            Item::new("A", "2"),
        ];
        let (kept, removed) = dedup_items(items);
        assert_eq!(kept.len(), 2);
        assert_eq!(removed, 2);
        assert_eq!(kept[0].description.as_deref(), Some("first"));
        assert_eq!(kept[1].key(), ("A", "2"));
    }

    #[test]
    fn error_slot_only_when_empty_and_failed() {
        assert_eq!(
            StreamOutcome::failed("feed: boom").error_slot().as_deref(),
            Some("feed: boom")
        );
        let partial = StreamOutcome {
            items: vec![Item::new("A", "1")],
            errors: vec!["other: boom".into()],
        };
        assert!(partial.error_slot().is_none());
        assert!(StreamOutcome::default().error_slot().is_none());
    }
}
