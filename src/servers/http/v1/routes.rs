//! HTTP tracker routes for version `v1`.
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::compression::CompressionLayer;

use super::handlers::{announce, scrape};
use crate::core::Tracker;

/// It adds the tracker routes to a router.
///
/// > **NOTICE**: the announce key is a path segment, not a query param, so a
/// tracker URL looks like `http://host:port/{announce_key}/announce`.
#[allow(clippy::needless_pass_by_value)]
pub fn router(tracker: Arc<Tracker>) -> Router {
    Router::new()
        // Announce request
        .route("/:key/announce", get(announce::handle))
        // Scrape request
        .route("/:key/scrape", get(scrape::handle))
        .with_state(tracker)
        .layer(CompressionLayer::new())
}
