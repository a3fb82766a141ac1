// src/config/triangulate.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::perspective::Perspective;

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/triangulate.toml";

pub const ENV_CONFIG_PATH: &str = "TRIANGULATE_CONFIG_PATH";
pub const ENV_MAX_EVENTS: &str = "TRIANGULATE_MAX_EVENTS";
pub const ENV_OUTPUT_PATH: &str = "TRIANGULATE_OUTPUT_PATH";
pub const ENV_BIND: &str = "TRIANGULATE_BIND";

/// Root of `config/triangulate.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TriangulateConfig {
    pub limits: Limits,
    pub matching: Matching,
    pub narrative: NarrativeCfg,
    pub output: Output,
    pub server: Server,
    pub feeds: Vec<FeedCfg>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Items kept per stream for matching.
    pub max_stream_items: usize,
    /// Items kept per stream in the payload's display lists.
    pub max_display_items: usize,
    pub max_events: usize,
    /// Characters of the normalized anchor title forming the dedup key.
    pub dedup_key_chars: usize,
    pub description_max_chars: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_stream_items: 30,
            max_display_items: 16,
            max_events: 10,
            dedup_key_chars: 90,
            description_max_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Matching {
    /// Index-based alignment when no lexical event exists. Off unless asked for.
    pub positional_fallback: bool,
    pub extra_stopwords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrativeCfg {
    pub detail_min_chars: usize,
    pub top_keywords: usize,
    pub key_sentences: usize,
}

impl Default for NarrativeCfg {
    fn default() -> Self {
        Self {
            detail_min_chars: 50,
            top_keywords: 3,
            key_sentences: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Output {
    pub path: PathBuf,
    /// IANA zone for `generated_at`.
    pub timezone: String,
    pub primary_language: String,
    pub secondary_language: String,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/news.json"),
            timezone: "Asia/Singapore".to_string(),
            primary_language: "en".to_string(),
            secondary_language: "zh-CN".to_string(),
        }
    }
}

impl Output {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("invalid timezone `{}`: {}", self.timezone, e))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Server {
    pub enabled: bool,
    pub bind: String,
    pub refresh_secs: u64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            enabled: false,
            bind: "0.0.0.0:8080".to_string(),
            refresh_secs: 900,
        }
    }
}

/// One feed file feeding one perspective.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedCfg {
    pub perspective: String,
    pub path: PathBuf,
    #[serde(default)]
    pub name: Option<String>,
}

impl FeedCfg {
    pub fn perspective(&self) -> Result<Perspective> {
        Perspective::parse(&self.perspective)
            .ok_or_else(|| anyhow!("unknown perspective `{}`", self.perspective))
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl TriangulateConfig {
    /// Resolve and load config:
    /// 1) $TRIANGULATE_CONFIG_PATH (must exist)
    /// 2) config/triangulate.toml
    /// 3) built-in defaults
    ///
    /// Env overrides are applied afterwards.
    pub fn load() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::from_path(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::from_path(&default)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading triangulate config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing triangulate config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: TriangulateConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_usize_env(std::env::var(ENV_MAX_EVENTS).ok()) {
            self.limits.max_events = n;
        }
        if let Ok(p) = std::env::var(ENV_OUTPUT_PATH) {
            if !p.trim().is_empty() {
                self.output.path = PathBuf::from(p.trim());
            }
        }
        if let Ok(b) = std::env::var(ENV_BIND) {
            if !b.trim().is_empty() {
                self.server.bind = b.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let l = &self.limits;
        for (name, v) in [
            ("max_stream_items", l.max_stream_items),
            ("max_display_items", l.max_display_items),
            ("max_events", l.max_events),
            ("dedup_key_chars", l.dedup_key_chars),
            ("description_max_chars", l.description_max_chars),
        ] {
            if v == 0 {
                bail!("limits.{name} must be >= 1");
            }
        }
        self.output.tz()?;
        for f in &self.feeds {
            f.perspective()?;
        }
        Ok(())
    }
}

fn parse_usize_env(raw: Option<String>) -> Option<usize> {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg = TriangulateConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.limits.max_stream_items, 30);
        assert_eq!(cfg.limits.max_display_items, 16);
        assert_eq!(cfg.limits.max_events, 10);
        assert_eq!(cfg.limits.dedup_key_chars, 90);
        assert!(!cfg.matching.positional_fallback);
        assert!(cfg.feeds.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let toml = r#"
[limits]
max_events = 4

[[feeds]]
perspective = "middle-east"
path = "feeds/aj.xml"
"#;
        let cfg = TriangulateConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.limits.max_events, 4);
        assert_eq!(cfg.limits.max_stream_items, 30);
        assert_eq!(cfg.feeds[0].perspective().unwrap(), Perspective::MiddleEast);
        assert_eq!(cfg.feeds[0].display_name(), "feeds/aj.xml");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(TriangulateConfig::from_toml_str("[limits]\nmax_events = 0").is_err());
        assert!(TriangulateConfig::from_toml_str("[output]\ntimezone = \"Mars/Olympus\"").is_err());
        let bad_feed = "[[feeds]]\nperspective = \"moon\"\npath = \"x.xml\"";
        assert!(TriangulateConfig::from_toml_str(bad_feed).is_err());
    }

    #[test]
    fn usize_env_parsing_ignores_garbage() {
        assert_eq!(parse_usize_env(Some(" 7 ".into())), Some(7));
        assert_eq!(parse_usize_env(Some("0".into())), None);
        assert_eq!(parse_usize_env(Some("ten".into())), None);
        assert_eq!(parse_usize_env(None), None);
    }
}
