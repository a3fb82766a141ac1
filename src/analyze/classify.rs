//! First-match topical classifier.
//!
//! Buckets are tested in priority order and the first one whose keyword list
//! hits the haystack wins. A title that mentions both tariffs and missiles is
//! `Economic`, never `Conflict`.
//!
//! ASCII keywords match whole lower-case alphanumeric tokens; non-ASCII
//! keywords (the display-language terms) match as substrings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::triangulate::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Economic,
    Conflict,
    ScienceTechnology,
    Diplomatic,
    Social,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Economic => "economic",
            Category::Conflict => "conflict",
            Category::ScienceTechnology => "science_technology",
            Category::Diplomatic => "diplomatic",
            Category::Social => "social",
            Category::General => "general",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Economic => "economic/financial",
            Category::Conflict => "geopolitical conflict",
            Category::ScienceTechnology => "science & technology",
            Category::Diplomatic => "diplomatic/political",
            Category::Social => "social welfare",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct Bucket {
    pub category: Category,
    pub keywords: &'static [&'static str],
}

/// Priority order. `General` is the implicit catch-all and has no bucket.
pub const BUCKETS: &[Bucket] = &[
    Bucket {
        category: Category::Economic,
        keywords: &[
            "tariff", "tariffs", "trade", "economy", "economic", "inflation", "market",
            "markets", "stocks", "fiscal", "rate", "rates", "bank", "banks", "investment",
            "currency", "yuan", "dollar", "gdp", "exports", "imports",
            "关税", "贸易", "经济", "通胀", "市场", "股市", "财政", "利率", "银行", "投资",
            "货币", "汇率",
        ],
    },
    Bucket {
        category: Category::Conflict,
        keywords: &[
            "conflict", "war", "attack", "attacks", "strike", "strikes", "ceasefire",
            "missile", "missiles", "military", "border", "humanitarian", "weapon", "weapons",
            "defense", "defence", "troops", "army", "soldiers", "airstrike", "bombing",
            "冲突", "战争", "袭击", "停火", "导弹", "军事", "边境", "人道", "武器", "防御",
            "军队", "士兵",
        ],
    },
    Bucket {
        category: Category::ScienceTechnology,
        keywords: &[
            "nasa", "space", "astronaut", "astronauts", "satellite", "rocket", "spaceflight",
            "moon", "lunar", "mars", "exploration", "technology", "tech", "innovation", "ai",
            "chip", "chips", "semiconductor", "robot", "quantum",
            "太空", "宇航", "卫星", "火箭", "航天", "月球", "火星", "探索", "科技",
            "创新", "人工智能",
        ],
    },
    Bucket {
        category: Category::Diplomatic,
        keywords: &[
            "diplomacy", "diplomatic", "visit", "talks", "agreement", "treaty", "summit", "un",
            "sanctions", "protest", "protests", "election", "elections", "president",
            "minister", "premier", "parliament", "envoy",
            "外交", "访问", "会谈", "协议", "条约", "峰会", "联合国", "制裁", "抗议", "选举",
            "总统", "总理",
        ],
    },
    Bucket {
        category: Category::Social,
        keywords: &[
            "welfare", "education", "schools", "health", "healthcare", "hospital", "housing",
            "employment", "jobs", "unemployment", "income", "wages", "consumption", "pension",
            "pensions", "population", "poverty",
            "民生", "教育", "医疗", "健康", "住房", "就业", "收入", "消费", "养老", "社保",
            "福利", "人口",
        ],
    },
];

/// Lower-cased token set plus raw text, so both keyword kinds can be tested.
struct Haystack {
    tokens: HashSet<String>,
    raw: String,
}

impl Haystack {
    fn new(text: &str) -> Self {
        let tokens = text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_ascii_lowercase())
            .collect();
        Self {
            tokens,
            raw: text.to_string(),
        }
    }

    fn hits(&self, keyword: &str) -> bool {
        if keyword.is_ascii() {
            self.tokens.contains(&keyword.to_ascii_lowercase())
        } else {
            self.raw.contains(keyword)
        }
    }

    fn matches(&self, bucket: &Bucket) -> bool {
        bucket.keywords.iter().any(|k| self.hits(k))
    }
}

/// First bucket whose keywords occur in `text`, else `General`.
pub fn classify_text(text: &str) -> Category {
    let hay = Haystack::new(text);
    BUCKETS
        .iter()
        .find(|b| hay.matches(b))
        .map(|b| b.category)
        .unwrap_or(Category::General)
}

/// Every matching bucket, in priority order. Empty means general.
pub fn matching_categories(text: &str) -> Vec<Category> {
    let hay = Haystack::new(text);
    BUCKETS
        .iter()
        .filter(|b| hay.matches(b))
        .map(|b| b.category)
        .collect()
}

/// Combined translated titles of the populated slots.
pub fn event_haystack(event: &Event) -> String {
    event
        .populated()
        .flat_map(|(_, it)| it.translated_titles())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn classify_event(event: &Event) -> Category {
    classify_text(&event_haystack(event))
}
