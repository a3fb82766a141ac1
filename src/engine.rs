// src/engine.rs
//! One triangulation run end to end: collect the three streams, match, rank,
//! classify, narrate, and assemble the output payload.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use crate::analyze::{analyze_streams, Event};
use crate::config::TriangulateConfig;
use crate::ingest::providers::rss::RssSource;
use crate::ingest::translate::Translator;
use crate::ingest::types::{Item, ItemSource};
use crate::ingest::{collect_stream, StreamOutcome};
use crate::perspective::{PerPerspective, Perspective};

/// Sources wired to each perspective.
pub type Feeds = PerPerspective<Vec<Box<dyn ItemSource>>>;

/// Everything a consumer gets from one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub generated_at: String,
    /// Display lists, capped independently of the matching cap.
    pub sources: PerPerspective<Vec<Item>>,
    pub events: Vec<Event>,
    /// Only perspectives that failed and produced nothing.
    #[serde(default)]
    pub errors: BTreeMap<Perspective, String>,
}

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("triangulate_runs_total", "Completed triangulation runs.");
        describe_counter!(
            "triangulate_candidates_total",
            "Candidate events before ranking and dedup."
        );
        describe_counter!("triangulate_events_total", "Events emitted after dedup and cap.");
        describe_histogram!("triangulate_duration_ms", "Matching plus narrative time (ms).");
        describe_gauge!("triangulate_last_run_ts", "Unix time of the last completed run.");
    });
}

/// `%Y-%m-%d %H:%M:%S %Z` in the configured zone.
pub fn generated_at(now: DateTime<Utc>, tz: Tz) -> String {
    now.with_timezone(&tz)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// Assemble a payload from already-collected streams. Never fails.
pub fn build_payload(
    outcomes: PerPerspective<StreamOutcome>,
    cfg: &TriangulateConfig,
    generated_at: String,
) -> Payload {
    ensure_metrics_described();
    let t0 = Instant::now();

    let errors: BTreeMap<Perspective, String> = outcomes
        .iter()
        .filter_map(|(p, o)| o.error_slot().map(|e| (p, e)))
        .collect();

    let streams = outcomes.map(|_, o| o.items);
    let events = analyze_streams(&streams, cfg);
    let display_cap = cfg.limits.max_display_items;
    let sources = streams.map(|_, mut items| {
        items.truncate(display_cap);
        items
    });

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("triangulate_duration_ms").record(ms);
    counter!("triangulate_events_total").increment(events.len() as u64);
    counter!("triangulate_runs_total").increment(1);
    gauge!("triangulate_last_run_ts").set(Utc::now().timestamp() as f64);

    tracing::info!(
        target: "triangulate",
        events = events.len(),
        failed_streams = errors.len(),
        elapsed_ms = ms,
        "triangulation run complete"
    );

    Payload {
        generated_at,
        sources,
        events,
        errors,
    }
}

/// Collect all three perspectives concurrently and build the payload.
pub async fn run_once(
    feeds: &Feeds,
    translator: &dyn Translator,
    cfg: &TriangulateConfig,
) -> Result<Payload> {
    let tz = cfg.output.tz()?;
    let (china, western, middle_east) = tokio::join!(
        collect_stream(&feeds.china, translator, cfg),
        collect_stream(&feeds.western, translator, cfg),
        collect_stream(&feeds.middle_east, translator, cfg),
    );
    let outcomes = PerPerspective::new(china, western, middle_east);
    Ok(build_payload(outcomes, cfg, generated_at(Utc::now(), tz)))
}

/// File-backed RSS/Atom sources from `[[feeds]]`.
pub fn sources_from_config(cfg: &TriangulateConfig) -> Result<Feeds> {
    let mut feeds = Feeds::default();
    for f in &cfg.feeds {
        let p = f.perspective()?;
        feeds
            .get_mut(p)
            .push(Box::new(RssSource::from_file(f.display_name(), &f.path)));
    }
    Ok(feeds)
}

/// Pretty JSON at `path`, creating parent directories.
pub fn write_payload(path: &Path, payload: &Payload) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output dir {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(payload).context("serializing payload")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(target: "triangulate", path = %path.display(), "payload written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_at_uses_configured_zone() {
        let now = Utc.with_ymd_and_hms(2025, 1, 6, 2, 30, 0).unwrap();
        let s = generated_at(now, chrono_tz::Asia::Singapore);
        assert!(s.starts_with("2025-01-06 10:30:00"), "{s}");
    }

    #[test]
    fn failed_empty_stream_gets_error_slot() {
        let outcomes = PerPerspective::new(
            StreamOutcome::ok(vec![Item::new("Tariff talks resume", "c1")]),
            StreamOutcome::ok(vec![Item::new("Tariff talks resume in Geneva", "w1")]),
            StreamOutcome::failed("aljazeera: timeout"),
        );
        let p = build_payload(outcomes, &TriangulateConfig::default(), "t".into());
        assert_eq!(p.errors.len(), 1);
        assert_eq!(
            p.errors.get(&Perspective::MiddleEast).map(String::as_str),
            Some("aljazeera: timeout")
        );
        assert!(!p.events.is_empty());
        assert!(p.sources.middle_east.is_empty());
    }

    #[test]
    fn display_lists_are_capped() {
        let items: Vec<Item> = (0..25)
            .map(|i| Item::new(format!("headline number {i}"), format!("l{i}")))
            .collect();
        let outcomes = PerPerspective::new(
            StreamOutcome::ok(items),
            StreamOutcome::default(),
            StreamOutcome::default(),
        );
        let p = build_payload(outcomes, &TriangulateConfig::default(), "t".into());
        assert_eq!(p.sources.china.len(), 16);
        assert!(p.errors.is_empty());
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/news.json");
        let p = build_payload(
            PerPerspective::default(),
            &TriangulateConfig::default(),
            "t".into(),
        );
        write_payload(&path, &p).unwrap();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(v["generated_at"], "t");
        assert!(v["events"].as_array().unwrap().is_empty());
    }
}
