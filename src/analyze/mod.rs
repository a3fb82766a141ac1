// src/analyze/mod.rs
//! Analysis pipeline: token normalization → affinity → matching → triangulation
//! → classification and narrative.

pub mod affinity;
pub mod classify;
pub mod matcher;
pub mod narrative;
pub mod tokens;
pub mod triangulate;

// Re-export convenient types.
pub use crate::analyze::classify::{classify_event, classify_text, Category};
pub use crate::analyze::matcher::{best_match, Match};
pub use crate::analyze::narrative::{Comparison, Narrative, NarrativeSynthesizer, SlotProfile};
pub use crate::analyze::tokens::{TokenNormalizer, TokenSet};
pub use crate::analyze::triangulate::{
    dedup_key, Alignment, Anchor, Event, TriangulateOptions, Triangulator,
};

use crate::config::TriangulateConfig;
use crate::ingest::types::Item;
use crate::perspective::PerPerspective;

/// Triangulate the streams and classify/narrate every surviving event.
pub fn analyze_streams(streams: &PerPerspective<Vec<Item>>, cfg: &TriangulateConfig) -> Vec<Event> {
    let triangulator = Triangulator::from_config(cfg);
    let synth = NarrativeSynthesizer::new(cfg.narrative.clone());
    let mut events = triangulator.triangulate(streams);
    for e in &mut events {
        synth.annotate(e);
    }
    events
}
