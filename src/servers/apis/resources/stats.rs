//! `Stats` resource: the tracker-wide aggregates shown on the frontend.
use serde::{Deserialize, Serialize};

use crate::core::torrent::SwarmSummary;

/// Tracker-wide statistics: registered torrents, active seeders and active
/// leechers.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub struct Stats {
    pub hashcount: i64,
    pub seeders: i64,
    pub leechers: i64,
}

impl From<&[SwarmSummary]> for Stats {
    fn from(summaries: &[SwarmSummary]) -> Self {
        let mut stats = Stats {
            hashcount: i64::try_from(summaries.len()).unwrap_or(i64::MAX),
            ..Stats::default()
        };

        for summary in summaries {
            stats.seeders += summary.complete;
            stats.leechers += summary.incomplete;
        }

        stats
    }
}
