// src/ingest/scheduler.rs
use anyhow::Result;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::TriangulateConfig;
use crate::engine::{run_once, write_payload, Feeds, Payload};
use crate::ingest::translate::Translator;

/// Latest payload shared between the scheduler and the HTTP handlers.
pub type SharedPayload = Arc<RwLock<Option<Payload>>>;

/// Run once, write the file, then publish. A write failure still publishes.
pub async fn refresh_once(
    feeds: &Feeds,
    translator: &dyn Translator,
    cfg: &TriangulateConfig,
    latest: &SharedPayload,
) -> Result<()> {
    let payload = run_once(feeds, translator, cfg).await?;
    let written = write_payload(&cfg.output.path, &payload);
    *latest.write().await = Some(payload);
    written
}

/// Refresh every `server.refresh_secs`. The first tick is skipped; callers
/// run an initial refresh themselves.
pub fn spawn_refresh(
    feeds: Arc<Feeds>,
    translator: Arc<dyn Translator>,
    cfg: Arc<TriangulateConfig>,
    latest: SharedPayload,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let secs = cfg.server.refresh_secs.max(1);
        let mut ticker = tokio::time::interval(Duration::from_secs(secs));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match refresh_once(&feeds, translator.as_ref(), &cfg, &latest).await {
                Ok(()) => tracing::info!(target: "scheduler", "refresh tick"),
                Err(e) => {
                    counter!("scheduler_refresh_errors_total").increment(1);
                    tracing::warn!(target: "scheduler", error = ?e, "refresh failed");
                }
            }
        }
    })
}
