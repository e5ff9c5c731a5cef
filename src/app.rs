//! Seedmerit application.
//!
//! The application is a container for the long-running jobs:
//!
//! - The HTTP server (tracker endpoints + JSON API).
//! - The announce key prune job.
//!
//! It also runs the prune once on startup, before serving traffic, so a
//! restarted tracker does not hand out peers attributed to long-dead keys.
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bootstrap::jobs::{http_tracker, key_prune};
use crate::config::Configuration;
use crate::core::Tracker;

/// It starts the application jobs and returns their handles. The jobs stop
/// on `ctrl-c`.
///
/// # Panics
///
/// Will panic if the HTTP server cannot bind to the configured port.
pub async fn start(config: &Configuration, tracker: Arc<Tracker>) -> Vec<JoinHandle<()>> {
    let mut jobs: Vec<JoinHandle<()>> = Vec::new();

    // Prune unused announce keys on startup.
    key_prune::prune(&tracker).await;

    // Start the HTTP server: tracker endpoints and the JSON API.
    jobs.push(http_tracker::start_job(config, tracker.clone()).await);

    // Prune old announce keys and announces on a timer.
    jobs.push(key_prune::start_job(&tracker));

    jobs
}
