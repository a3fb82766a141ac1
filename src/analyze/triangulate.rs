//! # Triangulator
//! Every item of every stream is tried as a seed. A seed that finds a
//! token-sharing partner in at least one other stream becomes a candidate
//! event; candidates are ranked by `(media_count, score)`, collapsed on a
//! truncated title key, and capped.
//!
//! This is greedy clustering that tolerates the same real event being
//! discovered once per stream. It is not an optimal assignment.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::classify::Category;
use super::matcher::{best_prepared, prepare, Match};
use super::narrative::Narrative;
use super::tokens::TokenNormalizer;
use crate::config::TriangulateConfig;
use crate::ingest::types::Item;
use crate::perspective::{PerPerspective, Perspective};

/// How an event's slots were aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Shared title tokens.
    Lexical,
    /// Same index in each stream (opt-in fallback only).
    Positional,
}

/// The seed an event was discovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub perspective: Perspective,
    pub title: String,
    pub title_primary: String,
    pub title_secondary: String,
}

impl Anchor {
    fn from_seed(perspective: Perspective, item: &Item) -> Self {
        Self {
            perspective,
            title: item.title.clone(),
            title_primary: item.match_title().to_string(),
            title_secondary: item.display_title().to_string(),
        }
    }
}

/// A cross-stream grouping. Only built when `media_count >= 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub anchor: Anchor,
    #[serde(flatten)]
    pub slots: PerPerspective<Option<Item>>,
    pub media_count: usize,
    pub score: u32,
    pub alignment: Alignment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<Narrative>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Event {
    pub fn slot(&self, p: Perspective) -> Option<&Item> {
        self.slots.get(p).as_ref()
    }

    /// Populated slots in perspective order.
    pub fn populated(&self) -> impl Iterator<Item = (Perspective, &Item)> {
        Perspective::ALL
            .into_iter()
            .filter_map(move |p| self.slot(p).map(|it| (p, it)))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TriangulateOptions {
    pub max_events: usize,
    pub dedup_key_chars: usize,
    pub positional_fallback: bool,
}

impl Default for TriangulateOptions {
    fn default() -> Self {
        Self {
            max_events: 10,
            dedup_key_chars: 90,
            positional_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Triangulator {
    normalizer: TokenNormalizer,
    opts: TriangulateOptions,
}

impl Triangulator {
    pub fn new(normalizer: TokenNormalizer, opts: TriangulateOptions) -> Self {
        Self { normalizer, opts }
    }

    pub fn from_config(cfg: &TriangulateConfig) -> Self {
        Self::new(
            TokenNormalizer::new(&cfg.matching.extra_stopwords),
            TriangulateOptions {
                max_events: cfg.limits.max_events,
                dedup_key_chars: cfg.limits.dedup_key_chars,
                positional_fallback: cfg.matching.positional_fallback,
            },
        )
    }

    /// One candidate per qualifying seed, unranked, in seeding order.
    pub fn candidates(&self, streams: &PerPerspective<Vec<Item>>) -> Vec<Event> {
        let prepared = PerPerspective::from_fn(|p| prepare(&self.normalizer, streams.get(p)));

        let mut out = Vec::new();
        for seed_p in Perspective::ALL {
            for seed in prepared.get(seed_p) {
                let mut slots: PerPerspective<Option<Item>> = PerPerspective::default();
                let mut media_count = 0usize;
                let mut score = 0u32;

                for p in Perspective::ALL {
                    let m = if p == seed_p {
                        Some(Match {
                            item: seed.item,
                            score: 1,
                        })
                    } else {
                        best_prepared(&seed.tokens, prepared.get(p))
                    };
                    if let Some(m) = m {
                        *slots.get_mut(p) = Some(m.item.clone());
                        media_count += 1;
                        score += m.score;
                    }
                }

                if media_count < 2 {
                    continue;
                }
                out.push(Event {
                    anchor: Anchor::from_seed(seed_p, seed.item),
                    slots,
                    media_count,
                    score,
                    alignment: Alignment::Lexical,
                    category: None,
                    narrative: None,
                    summary: None,
                });
            }
        }
        out
    }

    /// Ranked, deduplicated, capped events (not yet classified).
    pub fn triangulate(&self, streams: &PerPerspective<Vec<Item>>) -> Vec<Event> {
        let candidates = self.candidates(streams);
        counter!("triangulate_candidates_total").increment(candidates.len() as u64);
        tracing::debug!(
            target: "triangulate",
            candidates = candidates.len(),
            "lexical candidates built"
        );
        let events = self.rank_and_dedup(candidates);
        if events.is_empty() && self.opts.positional_fallback {
            let fallback = self.rank_and_dedup(self.positional(streams));
            tracing::info!(
                target: "triangulate",
                events = fallback.len(),
                "no lexical events; positional fallback used"
            );
            return fallback;
        }
        events
    }

    fn rank_and_dedup(&self, mut events: Vec<Event>) -> Vec<Event> {
        // Vec::sort_by is stable: equal keys keep seeding order.
        events.sort_by(|a, b| (b.media_count, b.score).cmp(&(a.media_count, a.score)));

        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(self.opts.max_events);
        for e in events {
            if out.len() == self.opts.max_events {
                break;
            }
            let key = dedup_key(&e.anchor.title_secondary, self.opts.dedup_key_chars);
            if seen.insert(key) {
                out.push(e);
            }
        }
        out
    }

    fn positional(&self, streams: &PerPerspective<Vec<Item>>) -> Vec<Event> {
        let longest = streams.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        let mut out = Vec::new();
        for i in 0..longest {
            let slots = PerPerspective::from_fn(|p| streams.get(p).get(i).cloned());
            let media_count = slots.iter().filter(|(_, s)| s.is_some()).count();
            if media_count < 2 {
                continue;
            }
            let Some((p, first)) = slots.iter().find_map(|(p, s)| s.as_ref().map(|it| (p, it)))
            else {
                continue;
            };
            let anchor = Anchor::from_seed(p, first);
            out.push(Event {
                anchor,
                slots,
                media_count,
                score: 0,
                alignment: Alignment::Positional,
                category: None,
                narrative: None,
                summary: None,
            });
        }
        out
    }
}

/// Lower-case, whitespace-collapsed prefix of `title`, `chars` characters long.
pub fn dedup_key(title: &str, chars: usize) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .take(chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn it(title: &str, link: &str) -> Item {
        Item::new(title, link)
    }

    fn streams(cn: Vec<Item>, us: Vec<Item>, me: Vec<Item>) -> PerPerspective<Vec<Item>> {
        PerPerspective::new(cn, us, me)
    }

    #[test]
    fn three_way_match_scores_own_plus_overlaps() {
        let s = streams(
            vec![it("Tariff policy trade shift", "cn1").with_translations("Tariff policy trade shift", "关税政策与贸易")],
            vec![it("Tariff policy trade fight", "us1").with_translations("Tariff policy trade fight", "关税政策与贸易")],
            vec![it("Trade tariff policy row", "me1").with_translations("Trade tariff policy row", "关税政策与贸易")],
        );
        let t = Triangulator::default();
        let all = t.candidates(&s);
        assert_eq!(all.len(), 3, "one candidate per seed");
        assert!(all.iter().all(|e| e.media_count == 3 && e.score == 7));

        // Same display title: the three seedings collapse into one event.
        let events = t.triangulate(&s);
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.media_count, 3);
        assert_eq!(e.score, 1 + 3 + 3);
        assert_eq!(e.anchor.perspective, Perspective::China);
        assert_eq!(e.alignment, Alignment::Lexical);
    }

    #[test]
    fn lone_seeds_are_not_events() {
        let s = streams(
            vec![it("Tariff policy", "cn1")],
            vec![it("Football final", "us1")],
            vec![],
        );
        let t = Triangulator::default();
        assert!(t.candidates(&s).is_empty());
        assert!(t.triangulate(&s).is_empty());
    }

    #[test]
    fn absent_slots_stay_none() {
        let s = streams(
            vec![it("Missile strike border", "cn1")],
            vec![it("Border missile strike", "us1")],
            vec![it("Weather outlook", "me1")],
        );
        let events = Triangulator::default().triangulate(&s);
        // Seeded once from each side; titles differ so both survive dedup.
        assert_eq!(events.len(), 2);
        for e in &events {
            assert!(e.slot(Perspective::MiddleEast).is_none());
            assert_eq!(e.populated().count(), 2);
        }
    }

    #[test]
    fn ranking_prefers_media_count_then_score() {
        let s = streams(
            vec![
                it("Rocket launch delayed again", "cn1"),
                it("Tariff policy", "cn2"),
            ],
            vec![
                it("Rocket launch delayed by weather", "us1"),
                it("Tariff policy response", "us2"),
            ],
            vec![it("Tariff policy reaction", "me1")],
        );
        let events = Triangulator::default().triangulate(&s);
        assert_eq!(events[0].media_count, 3);
        assert!(events.iter().all(|e| e.media_count >= 2));
        for w in events.windows(2) {
            assert!((w[0].media_count, w[0].score) >= (w[1].media_count, w[1].score));
        }
    }

    #[test]
    fn dedup_key_normalizes_and_truncates() {
        assert_eq!(dedup_key("  Hello   World ", 90), "hello world");
        assert_eq!(dedup_key("abcdef", 3), "abc");
        assert_eq!(dedup_key("关税政策影响", 2), "关税");
    }

    #[test]
    fn positional_fallback_is_opt_in() {
        let s = streams(
            vec![it("Alpha beta gamma", "cn1")],
            vec![it("Delta epsilon zeta", "us1")],
            vec![],
        );
        assert!(Triangulator::default().triangulate(&s).is_empty());

        let t = Triangulator::new(
            TokenNormalizer::default(),
            TriangulateOptions {
                positional_fallback: true,
                ..TriangulateOptions::default()
            },
        );
        let events = t.triangulate(&s);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].alignment, Alignment::Positional);
        assert_eq!(events[0].score, 0);
        assert_eq!(events[0].media_count, 2);
    }

    #[test]
    fn truncates_to_max_events() {
        let topics = ["alpha", "bravo", "charlie", "delta", "echo"];
        let cn = topics
            .iter()
            .map(|t| it(&format!("{t} summit talks"), &format!("cn-{t}")))
            .collect();
        let us = topics
            .iter()
            .map(|t| it(&format!("{t} summit talks"), &format!("us-{t}")))
            .collect();
        let t = Triangulator::new(
            TokenNormalizer::default(),
            TriangulateOptions {
                max_events: 2,
                ..TriangulateOptions::default()
            },
        );
        assert_eq!(t.triangulate(&streams(cn, us, vec![])).len(), 2);
    }
}
