//! API routes.
//!
//! The public JSON endpoints carry a CORS layer restricted to the
//! configured frontend origin. The restricted endpoints validate the shared
//! admin secret inside their handlers, so the whole API shares one router.
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use super::handlers;
use crate::config::Configuration;
use crate::core::Tracker;

/// It adds the API routes to a router.
#[allow(clippy::needless_pass_by_value)]
pub fn router(tracker: Arc<Tracker>, config: &Configuration) -> Router {
    Router::new()
        .route("/api/stats", get(handlers::get_stats_handler))
        .route("/api/infohashes", get(handlers::get_info_hashes_handler))
        .route("/api/generate", get(handlers::generate_announce_key_handler))
        .route(
            "/api/torrentfile",
            get(handlers::get_torrent_file_handler).post(handlers::upload_torrent_file_handler),
        )
        .route(
            "/api/infohash",
            axum::routing::post(handlers::add_info_hash_handler).delete(handlers::delete_info_hash_handler),
        )
        .layer(cors_layer(config))
        .with_state(tracker)
}

fn cors_layer(config: &Configuration) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if let Some(origin) = config
        .frontend_hostname
        .as_ref()
        .and_then(|hostname| hostname.parse::<HeaderValue>().ok())
    {
        cors = cors.allow_origin(origin);
    }

    cors
}
