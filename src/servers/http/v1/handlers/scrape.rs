//! Axum [`handler`](axum::handler) for the `scrape` request.
//!
//! The key path segment is routing surface only: scrapes are not attributed
//! to a peer, so the key is not validated.
use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::core::Tracker;
use crate::servers::http::v1::extractors::scrape_request::ExtractRequest;
use crate::servers::http::v1::responses::{self, scrape};

/// It handles the `scrape` request.
pub async fn handle(State(tracker): State<Arc<Tracker>>, ExtractRequest(scrape_request): ExtractRequest) -> Response {
    debug!("http scrape request: {scrape_request:?}");

    match tracker.scrape(&scrape_request.info_hashes).await {
        Ok(scrape_data) => scrape::Bencoded::from(scrape_data).into_response(),
        Err(error) => responses::error::Error::from(error).into_response(),
    }
}
