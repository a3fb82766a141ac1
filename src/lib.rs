// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod engine;
pub mod ingest;
pub mod metrics;
pub mod perspective;
pub mod sentiment;

pub use crate::api::{router, AppState};
pub use crate::config::TriangulateConfig;
pub use crate::engine::{build_payload, run_once, Payload};
pub use crate::perspective::{PerPerspective, Perspective};

use axum::Router;

/// Full HTTP app: API routes plus `/metrics`.
pub fn app(state: AppState) -> anyhow::Result<Router> {
    let handle = crate::metrics::init()?;
    Ok(router(state).merge(crate::metrics::router(handle)))
}
