//! `Scrape` request for the HTTP tracker.
//!
//! The `info_hash` query param can be repeated to restrict the scrape to a
//! set of torrents; with no params the whole registry is scraped. Values
//! that do not decode into a valid info-hash are skipped, matching the
//! loose reading of the scrape convention.
use crate::servers::http::percent_encoding::percent_decode_info_hash;
use crate::servers::http::v1::query::Query;
use crate::shared::bit_torrent::info_hash::InfoHash;

const INFO_HASH: &str = "info_hash";

/// The parsed `scrape` request.
#[derive(Debug, PartialEq, Default)]
pub struct Scrape {
    /// The torrents to scrape. Empty means all of them.
    pub info_hashes: Vec<InfoHash>,
}

impl From<Query> for Scrape {
    fn from(query: Query) -> Self {
        let info_hashes = query
            .get_param_vec(INFO_HASH)
            .unwrap_or_default()
            .iter()
            .filter_map(|raw_param| percent_decode_info_hash(raw_param).ok())
            .collect();

        Self { info_hashes }
    }
}
