//! Aggregate swarm data derived from the announces table.
use crate::core::announce::NumberOfBytes;
use crate::shared::bit_torrent::info_hash::InfoHash;

/// Swarm metadata for one tracked torrent, following the BEP 48 field
/// naming. `complete`/`incomplete` only count recent, non-stopped peers;
/// `downloaded` is the all-time snatch counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwarmSummary {
    pub info_hash: InfoHash,
    pub name: String,
    pub downloaded: i64,
    pub complete: i64,
    pub incomplete: i64,
}

/// The most recent non-stopped observation for one (key, torrent) pair, as
/// used by the behavior scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSnapshot {
    pub amount_left: NumberOfBytes,
    pub uploaded: NumberOfBytes,
    pub downloaded: NumberOfBytes,
}

/// Lifetime totals accumulated on a peer (issuance) row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeerBehavior {
    pub snatched: i64,
    pub uploaded: i64,
    pub downloaded: i64,
}
