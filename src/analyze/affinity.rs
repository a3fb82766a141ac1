//! Pairwise title affinity: raw count of shared normalized tokens.
//!
//! Deliberately not normalized by set size. Longer titles sharing several
//! words outrank short titles, and acceptance/ranking downstream read the
//! raw count.

use super::tokens::{TokenNormalizer, TokenSet};

/// Overlap of two prepared token sets. Empty on either side scores 0.
pub fn overlap(a: &TokenSet, b: &TokenSet) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|t| large.contains(*t)).count() as u32
}

/// Normalize both titles and count shared tokens.
pub fn score(normalizer: &TokenNormalizer, a_title: &str, b_title: &str) -> u32 {
    overlap(&normalizer.normalize(a_title), &normalizer.normalize(b_title))
}
