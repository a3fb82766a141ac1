//! Title token normalizer.
//!
//! A title becomes the set of its maximal ASCII letter runs of length >= 3,
//! lower-cased, minus stopwords. Non-Latin titles are expected to arrive
//! already translated; nothing here segments CJK or other scripts.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

/// Ordered so that iteration (and anything derived from it) is deterministic.
pub type TokenSet = BTreeSet<String>;

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]{3,}").expect("word regex"));

/// Function words, outlet self-references and news boilerplate.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    // function words
    "the", "and", "for", "with", "from", "are", "was", "were", "has", "have", "had", "its",
    "into", "over", "after", "about", "amid", "than", "that", "this", "will", "not", "but",
    "who", "what", "why", "how", "out", "off", "more",
    // source self-references
    "china", "chinese", "america", "american", "jazeera", "xinhua", "cnn", "bbc", "people",
    // boilerplate
    "says", "said", "new", "global", "world", "news", "update", "updates", "live", "latest",
    "breaking", "video", "watch", "report", "reports",
];

#[derive(Debug, Clone)]
pub struct TokenNormalizer {
    stopwords: HashSet<String>,
}

impl Default for TokenNormalizer {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl TokenNormalizer {
    /// Default stopwords plus `extra` (case-insensitive).
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut stopwords: HashSet<String> =
            DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect();
        for w in extra {
            let w = w.as_ref().trim().to_ascii_lowercase();
            if !w.is_empty() {
                stopwords.insert(w);
            }
        }
        Self { stopwords }
    }

    pub fn is_stopword(&self, w: &str) -> bool {
        self.stopwords.contains(w)
    }

    pub fn normalize(&self, title: &str) -> TokenSet {
        RE_WORD
            .find_iter(title)
            .map(|m| m.as_str().to_ascii_lowercase())
            .filter(|w| !self.is_stopword(w))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> TokenSet {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn extracts_long_latin_runs_and_drops_stopwords() {
        let n = TokenNormalizer::default();
        let out = n.normalize("US and China agree on Tariff-Policy talks, says Xinhua (live)");
        assert_eq!(out, set(&["agree", "policy", "talks", "tariff"]));
    }

    #[test]
    fn empty_and_whitespace_titles_yield_empty_sets() {
        let n = TokenNormalizer::default();
        assert!(n.normalize("").is_empty());
        assert!(n.normalize("   \t\n").is_empty());
        assert!(n.normalize("中国 经济 新闻").is_empty());
    }

    #[test]
    fn digits_split_runs_and_short_runs_are_ignored() {
        let n = TokenNormalizer::default();
        assert_eq!(n.normalize("G20 on EU AI rules2025"), set(&["rules"]));
    }

    #[test]
    fn extra_stopwords_extend_defaults() {
        let n = TokenNormalizer::new([" Gaza "]);
        assert_eq!(n.normalize("Gaza ceasefire holds"), set(&["ceasefire", "holds"]));
        assert!(n.is_stopword("news"));
    }
}
