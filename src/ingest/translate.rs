// src/ingest/translate.rs
use anyhow::Result;

use crate::ingest::types::Item;

/// External translation collaborator.
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target` (BCP-47-ish code such as "en" or "zh-CN").
    async fn translate(&self, text: &str, target: &str) -> Result<String>;
}

/// Returns the input unchanged. Used when no translation backend is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

#[async_trait::async_trait]
impl Translator for IdentityTranslator {
    async fn translate(&self, text: &str, _target: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Translate into `target`, keeping the original on error or empty output.
pub async fn translate_or_keep(t: &dyn Translator, text: &str, target: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    match t.translate(text, target).await {
        Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
        Ok(_) => text.to_string(),
        Err(e) => {
            tracing::debug!(target: "ingest", error = %e, target_lang = target, "translation failed; keeping original");
            text.to_string()
        }
    }
}

/// Fill missing translated titles. Pre-populated fields are left alone.
pub async fn enrich_items(
    items: Vec<Item>,
    t: &dyn Translator,
    primary: &str,
    secondary: &str,
) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    for mut it in items {
        if it.title_translated_primary.is_none() {
            it.title_translated_primary = Some(translate_or_keep(t, &it.title, primary).await);
        }
        if it.title_translated_secondary.is_none() {
            it.title_translated_secondary = Some(translate_or_keep(t, &it.title, secondary).await);
        }
        out.push(it);
    }
    out
}
