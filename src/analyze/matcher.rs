//! Best cross-stream candidate for a seed item.

use super::affinity::overlap;
use super::tokens::{TokenNormalizer, TokenSet};
use crate::ingest::types::Item;

/// An accepted association. Only exists with `score > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub item: &'a Item,
    pub score: u32,
}

/// An item paired with its normalized match-title tokens.
#[derive(Debug, Clone)]
pub(crate) struct Prepared<'a> {
    pub item: &'a Item,
    pub tokens: TokenSet,
}

pub(crate) fn prepare<'a>(normalizer: &TokenNormalizer, items: &'a [Item]) -> Vec<Prepared<'a>> {
    items
        .iter()
        .map(|item| Prepared {
            item,
            tokens: normalizer.normalize(item.match_title()),
        })
        .collect()
}

/// Scan over prepared candidates. Strictly greater wins, so ties keep the first seen.
pub(crate) fn best_prepared<'a>(seed: &TokenSet, candidates: &[Prepared<'a>]) -> Option<Match<'a>> {
    let mut best: Option<Match<'a>> = None;
    for c in candidates {
        let s = overlap(seed, &c.tokens);
        if s > best.map_or(0, |m| m.score) {
            best = Some(Match {
                item: c.item,
                score: s,
            });
        }
    }
    best
}

/// Best-scoring candidate for `seed`, or `None` when the stream is empty or nothing
/// shares a token (the `(None, 0)` case).
pub fn best_match<'a>(
    normalizer: &TokenNormalizer,
    seed: &Item,
    candidates: &'a [Item],
) -> Option<Match<'a>> {
    let seed_tokens = normalizer.normalize(seed.match_title());
    if seed_tokens.is_empty() {
        return None;
    }
    best_prepared(&seed_tokens, &prepare(normalizer, candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn it(title: &str, link: &str) -> Item {
        Item::new(title, link)
    }

    #[test]
    fn empty_candidates_give_none() {
        let n = TokenNormalizer::default();
        assert!(best_match(&n, &it("Tariff policy trade", "a"), &[]).is_none());
    }

    #[test]
    fn all_zero_scores_give_none() {
        let n = TokenNormalizer::default();
        let cands = vec![it("Football results", "b"), it("Weather outlook", "c")];
        assert!(best_match(&n, &it("Tariff policy trade", "a"), &cands).is_none());
    }

    #[test]
    fn picks_highest_and_keeps_first_on_tie() {
        let n = TokenNormalizer::default();
        let cands = vec![
            it("Tariff talks stall", "b1"),
            it("Trade tariff dispute", "b2"),
            it("Tariff trade war looms", "b3"),
        ];
        let m = best_match(&n, &it("Tariff trade escalation", "a"), &cands).unwrap();
        assert_eq!(m.item.link, "b2");
        assert_eq!(m.score, 2);
    }

    #[test]
    fn uses_primary_translation_for_matching() {
        let n = TokenNormalizer::default();
        let seed = it("关税政策", "a").with_translations("Tariff policy", "关税政策");
        let cands = vec![it("Tariff policy unveiled", "b")];
        let m = best_match(&n, &seed, &cands).unwrap();
        assert_eq!(m.score, 2);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let n = TokenNormalizer::default();
        let cands = vec![it("Missile strike border", "x"), it("Border strike", "y")];
        let seed = it("Border missile strike", "s");
        let a = best_match(&n, &seed, &cands).map(|m| (m.item.link.clone(), m.score));
        let b = best_match(&n, &seed, &cands).map(|m| (m.item.link.clone(), m.score));
        assert_eq!(a, b);
    }
}
