//! News triangulator: binary entrypoint.
//! Runs one triangulation, writes the payload, and optionally keeps serving
//! HTTP with a periodic refresh.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_triangulator::api::AppState;
use news_triangulator::config::TriangulateConfig;
use news_triangulator::engine::sources_from_config;
use news_triangulator::ingest::scheduler::{refresh_once, spawn_refresh, SharedPayload};
use news_triangulator::ingest::translate::{IdentityTranslator, Translator};

/// `RUST_LOG` or `news_triangulator=info,warn`; JSON lines when TRIANGULATE_LOG_JSON=1.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_triangulator=info,warn"));

    let json = std::env::var("TRIANGULATE_LOG_JSON")
        .ok()
        .is_some_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Arc::new(TriangulateConfig::load()?);
    let feeds = Arc::new(sources_from_config(&cfg)?);
    if cfg.feeds.is_empty() {
        tracing::warn!("no [[feeds]] configured; all streams will be empty");
    }
    let translator: Arc<dyn Translator> = Arc::new(IdentityTranslator);
    let latest: SharedPayload = Arc::new(RwLock::new(None));

    refresh_once(&feeds, translator.as_ref(), &cfg, &latest).await?;

    if !cfg.server.enabled {
        return Ok(());
    }

    let _refresh = spawn_refresh(feeds, translator, cfg.clone(), latest.clone());
    let app = news_triangulator::app(AppState::with_latest(cfg.clone(), latest))?;

    let listener = tokio::net::TcpListener::bind(cfg.server.bind.as_str())
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(bind = %cfg.server.bind, "serving");
    axum::serve(listener, app).await.context("http server")?;
    Ok(())
}
