use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed positive cue words.
pub const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "positive",
    "success",
    "win",
    "improve",
    "progress",
    "achievement",
];

/// Fixed negative cue words.
pub const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "failure", "loss", "problem", "crisis", "conflict", "attack",
];

/// Endings a lexicon word may carry and still count ("attacks", "losses",
/// "improved", "successful"). Anything else is a different word.
const INFLECTIONS: &[&str] = &[
    "", "s", "es", "ed", "ing", "ning", "ful", "fully", "ment", "ments",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SentimentAnalyzer;

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Returns (positive hits, negative hits). Every occurrence counts.
    pub fn count(&self, text: &str) -> (usize, usize) {
        let mut pos = 0usize;
        let mut neg = 0usize;
        for tok in tokenize(text) {
            if matches_any(POSITIVE_WORDS, &tok) {
                pos += 1;
            } else if matches_any(NEGATIVE_WORDS, &tok) {
                neg += 1;
            }
        }
        (pos, neg)
    }

    /// Strict majority wins; equal counts (including zero) are neutral.
    pub fn label(&self, text: &str) -> SentimentLabel {
        let (pos, neg) = self.count(text);
        match pos.cmp(&neg) {
            std::cmp::Ordering::Greater => SentimentLabel::Positive,
            std::cmp::Ordering::Less => SentimentLabel::Negative,
            std::cmp::Ordering::Equal => SentimentLabel::Neutral,
        }
    }
}

fn matches_any(words: &[&str], tok: &str) -> bool {
    words.iter().any(|w| inflection_of(w, tok))
}

/// `tok` is `word` plus one known ending. A trailing "e" absorbs the "e" of
/// "ed" ("improve" -> "improved").
fn inflection_of(word: &str, tok: &str) -> bool {
    let Some(rest) = tok.strip_prefix(word) else {
        return false;
    };
    if INFLECTIONS.contains(&rest) {
        return true;
    }
    word.ends_with('e') && rest == "d"
}

/// Alphanumeric tokens, lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}
