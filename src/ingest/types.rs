// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One news item after ingest. Immutable once built; identity is `(title, link)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub published: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Latin-script translation used for matching (e.g. English).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_translated_primary: Option<String>,
    /// Display-language translation (e.g. Simplified Chinese).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_translated_secondary: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published: String::new(),
            description: None,
            title_translated_primary: None,
            title_translated_secondary: None,
        }
    }

    pub fn with_description(mut self, d: impl Into<String>) -> Self {
        self.description = Some(d.into());
        self
    }

    pub fn with_translations(
        mut self,
        primary: impl Into<String>,
        secondary: impl Into<String>,
    ) -> Self {
        self.title_translated_primary = Some(primary.into());
        self.title_translated_secondary = Some(secondary.into());
        self
    }

    /// Stream identity: two items with the same title and link are one item.
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.link)
    }

    /// Title used for token matching: the primary translation when present.
    pub fn match_title(&self) -> &str {
        non_empty(self.title_translated_primary.as_deref()).unwrap_or(self.title.as_str())
    }

    /// Title shown to readers and used for the dedup key.
    pub fn display_title(&self) -> &str {
        non_empty(self.title_translated_secondary.as_deref())
            .or_else(|| non_empty(self.title_translated_primary.as_deref()))
            .unwrap_or(self.title.as_str())
    }

    /// Both translated forms (or the original title when untranslated).
    pub fn translated_titles(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(2);
        if let Some(p) = non_empty(self.title_translated_primary.as_deref()) {
            out.push(p);
        }
        if let Some(s) = non_empty(self.title_translated_secondary.as_deref()) {
            out.push(s);
        }
        if out.is_empty() {
            out.push(self.title.as_str());
        }
        out
    }

    /// Description if present, else the display title.
    pub fn body_text(&self) -> &str {
        non_empty(self.description.as_deref()).unwrap_or_else(|| self.display_title())
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Item shape as handed over by a feed collaborator; nothing is guaranteed yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub title_translated_primary: Option<String>,
    #[serde(default)]
    pub title_translated_secondary: Option<String>,
}

impl RawItem {
    pub fn titled(title: &str, link: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    async fn fetch_items(&self) -> Result<Vec<RawItem>>;
    fn name(&self) -> &str;
}
