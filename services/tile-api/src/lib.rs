//! Tile API service library.
//!
//! HTTP server exposing the tile cache-fill path and bulk generation.

pub mod dataset;
pub mod handlers;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tiles/:scale/:col/:row", get(handlers::get_tile))
        .route("/generator", post(handlers::generate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .with_state(state)
}
