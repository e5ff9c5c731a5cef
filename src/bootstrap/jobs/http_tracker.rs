//! Job that runs the HTTP server: the tracker endpoints plus the JSON API.
//!
//! The peer address used for the compact endpoints comes from the
//! connection info, so the router is served with
//! `into_make_service_with_connect_info`.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

use crate::config::Configuration;
use crate::core::Tracker;
use crate::servers::{apis, http};

/// Whole-request deadline for every HTTP request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// It starts the HTTP server job.
///
/// # Panics
///
/// Will panic if the server cannot bind to the configured port.
pub async fn start_job(config: &Configuration, tracker: Arc<Tracker>) -> JoinHandle<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.backend_port));

    let router: Router = http::v1::routes::router(tracker.clone())
        .merge(apis::routes::router(tracker, config))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|err| panic!("could not bind HTTP server to {addr}: {err}"));

    info!("HTTP tracker listening on http://{addr}");

    tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("Stopping HTTP tracker..");
            })
            .await
            .expect("HTTP tracker server failed");
    })
}
