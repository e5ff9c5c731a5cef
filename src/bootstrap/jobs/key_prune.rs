//! Job that prunes long-idle announce keys.
//!
//! A key is pruned when it was issued more than [`PRUNE_INTERVAL`] seconds
//! ago and has no announce newer than that. The prune runs once on startup
//! (see [`crate::app::start`]) and then on a seven-day timer.
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::{Tracker, PRUNE_INTERVAL};
use crate::shared::clock;

/// How often the prune job re-runs after startup.
const PRUNE_TIMER: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// It starts the periodic prune job.
#[must_use]
pub fn start_job(tracker: &Arc<Tracker>) -> JoinHandle<()> {
    let weak_tracker = Arc::downgrade(tracker);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_TIMER);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Stopping announce key prune job..");
                    break;
                }
                _ = interval.tick() => {
                    if let Some(tracker) = weak_tracker.upgrade() {
                        prune(&tracker).await;
                    } else {
                        break;
                    }
                }
            }
        }
    })
}

/// It prunes every announce key idle since before the prune interval and
/// unlinks their cached admission flags.
pub async fn prune(tracker: &Tracker) {
    let cutoff = clock::now().saturating_sub(PRUNE_INTERVAL);

    match tracker.prune_announce_keys(cutoff).await {
        Ok(pruned) => info!("Pruned {pruned} idle announce keys"),
        Err(err) => error!("Error pruning idle announce keys: {err}"),
    }
}
