//! The three editorial perspectives and a small fixed-size container keyed by them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three streams being triangulated.
///
/// Order matters: `ALL` is the seeding order and the tie-break order used
/// throughout the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    /// Chinese state media (natively non-Latin script).
    China,
    /// US / European outlets.
    Western,
    /// Al Jazeera and other Middle East outlets.
    MiddleEast,
}

impl Perspective {
    pub const ALL: [Perspective; 3] = [
        Perspective::China,
        Perspective::Western,
        Perspective::MiddleEast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Perspective::China => "china",
            Perspective::Western => "western",
            Perspective::MiddleEast => "middle_east",
        }
    }

    /// Human-readable label used in narratives.
    pub fn label(self) -> &'static str {
        match self {
            Perspective::China => "China",
            Perspective::Western => "Western",
            Perspective::MiddleEast => "Middle East",
        }
    }

    /// Parse config spellings ("china", "Western", "middle-east", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "china" | "cn" => Some(Perspective::China),
            "western" | "west" | "us" => Some(Perspective::Western),
            "middle_east" | "mideast" | "aljazeera" => Some(Perspective::MiddleEast),
            _ => None,
        }
    }
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per perspective. Serializes as `{ "china": .., "western": .., "middle_east": .. }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPerspective<T> {
    #[serde(default)]
    pub china: T,
    #[serde(default)]
    pub western: T,
    #[serde(default)]
    pub middle_east: T,
}

impl<T> PerPerspective<T> {
    pub fn new(china: T, western: T, middle_east: T) -> Self {
        Self {
            china,
            western,
            middle_east,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Perspective) -> T) -> Self {
        Self {
            china: f(Perspective::China),
            western: f(Perspective::Western),
            middle_east: f(Perspective::MiddleEast),
        }
    }

    pub fn get(&self, p: Perspective) -> &T {
        match p {
            Perspective::China => &self.china,
            Perspective::Western => &self.western,
            Perspective::MiddleEast => &self.middle_east,
        }
    }

    pub fn get_mut(&mut self, p: Perspective) -> &mut T {
        match p {
            Perspective::China => &mut self.china,
            Perspective::Western => &mut self.western,
            Perspective::MiddleEast => &mut self.middle_east,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Perspective, T) -> U) -> PerPerspective<U> {
        PerPerspective {
            china: f(Perspective::China, self.china),
            western: f(Perspective::Western, self.western),
            middle_east: f(Perspective::MiddleEast, self.middle_east),
        }
    }

    /// Iterate in `Perspective::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = (Perspective, &T)> {
        Perspective::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}
