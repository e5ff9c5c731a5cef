//! `Torrent` resources: the per-info-hash listing and the admin forms.
use serde::{Deserialize, Serialize};

use crate::core::torrent::SwarmSummary;
use crate::shared::bit_torrent::info_hash::InfoHash;

/// One row of the public info-hash listing. The info-hash is serialized as
/// a 40-char hex string.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct ListItem {
    pub name: String,
    pub downloaded: i64,
    pub seeders: i64,
    pub leechers: i64,
    pub info_hash: InfoHash,
}

impl From<&SwarmSummary> for ListItem {
    fn from(summary: &SwarmSummary) -> Self {
        Self {
            name: summary.name.clone(),
            downloaded: summary.downloaded,
            seeders: summary.complete,
            leechers: summary.incomplete,
            info_hash: summary.info_hash,
        }
    }
}

/// The JSON body accepted by `POST /api/infohash`.
#[derive(Deserialize, Debug)]
pub struct AddInfoHashForm {
    pub info_hash: InfoHash,
    pub name: String,
}

/// The JSON body accepted by `DELETE /api/infohash`.
#[derive(Deserialize, Debug)]
pub struct DeleteInfoHashForm {
    pub info_hash: InfoHash,
}

/// The query params accepted by `GET /api/torrentfile`.
#[derive(Deserialize, Debug)]
pub struct TorrentFileParams {
    pub announce_key: String,
    pub info_hash: String,
}
