// src/api.rs
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

use crate::config::TriangulateConfig;
use crate::engine::{build_payload, generated_at, Payload};
use crate::ingest::scheduler::SharedPayload;
use crate::ingest::types::RawItem;
use crate::ingest::{prepare_stream, StreamOutcome};
use crate::perspective::PerPerspective;

#[derive(Clone)]
pub struct AppState {
    pub latest: SharedPayload,
    pub config: Arc<TriangulateConfig>,
}

impl AppState {
    pub fn new(config: Arc<TriangulateConfig>) -> Self {
        Self {
            latest: Arc::new(RwLock::new(None)),
            config,
        }
    }

    pub fn with_latest(config: Arc<TriangulateConfig>, latest: SharedPayload) -> Self {
        Self { latest, config }
    }
}

/// `{"china": [..], "western": [..], "middle_east": [..]}`; missing keys are empty.
pub type TriangulateRequest = PerPerspective<Vec<RawItem>>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/news", get(latest_news))
        .route("/triangulate", post(triangulate))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn latest_news(State(state): State<AppState>) -> Response {
    match state.latest.read().await.clone() {
        Some(p) => Json(p).into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "no payload yet").into_response(),
    }
}

/// Triangulate caller-supplied items. No translation call; items carry their
/// own translated titles if they have any.
async fn triangulate(
    State(state): State<AppState>,
    Json(req): Json<TriangulateRequest>,
) -> Result<Json<Payload>, (StatusCode, String)> {
    let cfg = state.config.as_ref();
    let tz = cfg
        .output
        .tz()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")))?;

    let outcomes = req.map(|_, raw| StreamOutcome::ok(prepare_stream(raw, cfg)));
    let payload = build_payload(outcomes, cfg, generated_at(Utc::now(), tz));
    tracing::debug!(target: "api", events = payload.events.len(), "on-demand triangulation");
    Ok(Json(payload))
}
