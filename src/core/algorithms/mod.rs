//! The peering algorithms: the policy family that decides how many peers an
//! announce reply should carry.
//!
//! Every policy receives the parsed announce and read access to the store,
//! and returns a non-negative count. The selector truncates the candidate
//! set to that count. Policies only see recent, non-stopped rows; stopped
//! and stale announces are treated as absent.
//!
//! The active policy is a configuration choice, carried by the tracker as a
//! trait object, so the rest of the system treats it as a pure function of
//! the observable state.
use async_trait::async_trait;
use serde::Deserialize;

use crate::core::announce::Announce;
use crate::core::databases::{error, Database};

/// The floor for peer list sizes handed to clients with poor scores, and the
/// minimum target for `goodSeedCount`. Must be greater than zero.
pub const MINIMUM_PEERS: usize = 5;

/// Ratios above this value are not rewarded any further.
pub const MAX_RATIO: f64 = 2.0;

/// The configured policy. See [`build`].
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Hand out whatever the client asked for.
    Numwant,
    /// Reward clients for the number of torrents in their client.
    Announces,
    /// Reward clients for the number of torrents they seed.
    Seeds,
    /// Reward seeded torrents with an upload bonus, on a smooth curve.
    #[default]
    GoodSeeds,
    /// Scale the reply down for clients that snatch but do not seed.
    Ratio,
}

/// It builds the configured policy.
#[must_use]
pub fn build(algorithm: Algorithm) -> Box<dyn PeeringAlgorithm> {
    match algorithm {
        Algorithm::Numwant => Box::new(Numwant),
        Algorithm::Announces => Box::new(PeersForAnnounces),
        Algorithm::Seeds => Box::new(PeersForSeeds),
        Algorithm::GoodSeeds => Box::new(PeersForGoodSeeds),
        Algorithm::Ratio => Box::new(PeersForRatio),
    }
}

/// A policy computing how many peers to return for one announce.
#[async_trait]
pub trait PeeringAlgorithm: Sync + Send {
    /// The number of peers to include in the reply.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store cannot be queried.
    async fn peers_to_give(&self, database: &dyn Database, announce: &Announce, active_since: u64) -> Result<usize, error::Error>;
}

/// The non-intelligent policy: distribute peers up to the number requested
/// by the client, not including themselves.
pub struct Numwant;

#[async_trait]
impl PeeringAlgorithm for Numwant {
    async fn peers_to_give(&self, _database: &dyn Database, announce: &Announce, _active_since: u64) -> Result<usize, error::Error> {
        Ok(announce.numwant)
    }
}

/// It gives peers to each client as a function of the number of torrents
/// they have in their client.
///
/// A problem with this policy is that freeriders can get around limits by
/// always snatching more torrents. An improvement would count only torrents
/// you are seeding, not torrents you are leeching as well.
pub struct PeersForAnnounces;

#[async_trait]
impl PeeringAlgorithm for PeersForAnnounces {
    async fn peers_to_give(&self, database: &dyn Database, announce: &Announce, active_since: u64) -> Result<usize, error::Error> {
        let torrent_count = usize::try_from(database.count_recent_announces(&announce.key, active_since).await?).unwrap_or(usize::MAX);

        if torrent_count >= announce.numwant {
            Ok(announce.numwant)
        } else {
            // Make sure even new peers get at least one peer.
            Ok(torrent_count + 1)
        }
    }
}

/// It gives peers to each client as a function of the number of torrents
/// they are seeding.
///
/// A problem with this policy is that it does not count partial seeders.
pub struct PeersForSeeds;

#[async_trait]
impl PeeringAlgorithm for PeersForSeeds {
    async fn peers_to_give(&self, database: &dyn Database, announce: &Announce, active_since: u64) -> Result<usize, error::Error> {
        let seed_count = usize::try_from(database.count_recent_seeds(&announce.key, active_since).await?).unwrap_or(usize::MAX);

        if seed_count >= announce.numwant {
            Ok(announce.numwant)
        } else {
            // Make sure peers seeding nothing receive at least one peer.
            Ok(seed_count + 1)
        }
    }
}

/// It gives peers to each client as a function of how many torrents they are
/// seeding and how much data they are uploading. This rewards both fast
/// uplinks and partial seeders who upload.
///
/// Partial seeders who do not upload are not rewarded, intentionally: if no
/// one is uploading, the content is likely either unpopular or very well
/// seeded. In the former case only full seeders should be incentivized, and
/// in the latter case there is nothing to reward.
pub struct PeersForGoodSeeds;

#[async_trait]
impl PeeringAlgorithm for PeersForGoodSeeds {
    async fn peers_to_give(&self, database: &dyn Database, announce: &Announce, active_since: u64) -> Result<usize, error::Error> {
        if announce.numwant == 0 {
            return Ok(0);
        }

        let snapshots = database.recent_transfers(&announce.key, active_since).await?;

        let mut total_count: i64 = 0;
        let mut seeded_count: i64 = 0;
        let mut pos_ratio: i64 = 0;
        for snapshot in &snapshots {
            total_count += 1;
            if snapshot.amount_left == 0 {
                seeded_count += 1;
            }
            if snapshot.downloaded == 0 {
                // The original uploader or a cross-seeder can report upload
                // while reporting no download.
                if snapshot.uploaded > 0 {
                    pos_ratio += 1;
                }
            } else if snapshot.uploaded / snapshot.downloaded >= 1 {
                pos_ratio += 1;
            }
        }

        // The score is a function of seeded torrents, with a bonus for the
        // share of torrents with a positive ratio. Ratio data is noisy
        // because clients reset it on restart, so it is only a bonus.
        let peer_score = if total_count == 0 {
            0
        } else {
            seeded_count * (1 + pos_ratio / total_count)
        };

        let good_seed_count = good_seed_target(&database.swarm_seed_counts(active_since).await?);

        Ok(smooth_function(peer_score, announce.numwant, good_seed_count))
    }
}

/// It scales the reply down for clients whose lifetime behavior shows
/// snatching without seeding.
///
/// `ratio` is the lifetime upload/download quotient of the key, and
/// `seedPercentage` is the share of snatched torrents the key currently
/// seeds. Keys that seed everything they snatched (or never snatched) get
/// the full reply.
pub struct PeersForRatio;

#[async_trait]
impl PeeringAlgorithm for PeersForRatio {
    async fn peers_to_give(&self, database: &dyn Database, announce: &Announce, active_since: u64) -> Result<usize, error::Error> {
        let behavior = database.peer_behavior(&announce.key).await?.unwrap_or_default();
        let seeding = database.count_recent_seeds(&announce.key, active_since).await?;

        #[allow(clippy::cast_precision_loss)]
        let ratio = if behavior.downloaded == 0 {
            0.0
        } else {
            behavior.uploaded as f64 / behavior.downloaded as f64
        };

        #[allow(clippy::cast_precision_loss)]
        let seed_percentage = if behavior.snatched == 0 {
            1.0
        } else {
            seeding as f64 / behavior.snatched as f64
        };

        if seed_percentage >= 1.0 {
            return Ok(announce.numwant);
        }

        #[allow(clippy::cast_precision_loss)]
        let scale_down = (1.0 - seed_percentage) * announce.numwant as f64 * (MAX_RATIO - ratio).max(0.0) / MAX_RATIO;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = announce.numwant.saturating_sub(scale_down.floor() as usize);

        Ok(scaled.clamp(MINIMUM_PEERS.min(announce.numwant), announce.numwant))
    }
}

/// The target score at which a client earns the full `numwant`: one
/// population standard deviation above the mean of the per-peer seed counts,
/// floored at [`MINIMUM_PEERS`] for small swarms.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn good_seed_target(seed_counts: &[u64]) -> usize {
    if seed_counts.is_empty() {
        return MINIMUM_PEERS;
    }

    let n = seed_counts.len() as f64;
    let mean = seed_counts.iter().map(|count| *count as f64).sum::<f64>() / n;
    let variance = seed_counts
        .iter()
        .map(|count| {
            let diff = *count as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / n;

    let target = (mean + variance.sqrt()).round() as usize;

    target.max(MINIMUM_PEERS)
}

/// A mathematical function from x to y which calculates how many peers to
/// return (y) for a requesting client of score (x). `num_wanted` is the
/// number of peers requested by the client (an upper bound on y) and
/// `good_seed_count` is the target score at which `num_wanted` peers should
/// be returned.
///
/// Written out without types, the function is:
///
/// ```text
/// y = minimumPeers + (numWanted - minimumPeers) * tanh(k * x)
/// ```
///
/// where the steepness k is calculated so that y reaches `num_wanted`
/// (within a small delta, rounded up) at x = `good_seed_count`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn smooth_function(x: i64, num_wanted: usize, good_seed_count: usize) -> usize {
    // Below the floor the curve cannot engage; the request is the bound.
    if num_wanted <= MINIMUM_PEERS {
        return num_wanted;
    }

    let y_int = MINIMUM_PEERS as f64;
    // delta must be non-zero to avoid division by zero in the steepness.
    let delta = 0.1;
    let num_wanted_f = num_wanted as f64;

    let k = ((num_wanted_f - y_int - delta) / (num_wanted_f - y_int + delta)).atanh() / good_seed_count as f64;

    // Rounding up makes the upper bound reachable.
    (y_int + (num_wanted_f - y_int) * (k * x as f64).tanh()).ceil() as usize
}
