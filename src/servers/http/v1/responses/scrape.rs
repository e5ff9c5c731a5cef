//! `Scrape` response for the HTTP tracker [`scrape`](crate::servers::http::v1::requests::scrape::Scrape) request.
//!
//! The response follows [BEP 48. Tracker Protocol Extension: Scrape](https://www.bittorrent.org/beps/bep_0048.html),
//! with the unofficial `name` key carried next to the counters.
use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_bytes::ByteBuf;
use tracing::error;

use crate::core::ScrapeData;
use crate::servers::http::v1::responses;

/// The `files` dictionary entry for one torrent.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct File {
    /// The number of active peers that have completed downloading.
    pub complete: i64,
    /// The number of peers that have ever completed downloading.
    pub downloaded: i64,
    /// The number of active peers that have not completed downloading.
    pub incomplete: i64,
    /// The stored torrent name.
    pub name: String,
}

/// The bencoded `scrape` response: a `files` dictionary keyed by the 20
/// raw info-hash bytes.
#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Bencoded {
    pub files: BTreeMap<ByteBuf, File>,
}

impl Bencoded {
    /// Returns the bencoded representation of the scrape response.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the response cannot be bencoded.
    pub fn body(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }
}

impl From<ScrapeData> for Bencoded {
    fn from(scrape_data: ScrapeData) -> Self {
        let mut files = BTreeMap::new();

        for summary in scrape_data.files {
            files.insert(
                ByteBuf::from(summary.info_hash.bytes().to_vec()),
                File {
                    complete: summary.complete,
                    downloaded: summary.downloaded,
                    incomplete: summary.incomplete,
                    name: summary.name,
                },
            );
        }

        Self { files }
    }
}

impl IntoResponse for Bencoded {
    fn into_response(self) -> Response {
        match self.body() {
            Ok(bytes) => (StatusCode::OK, bytes).into_response(),
            Err(err) => {
                error!("cannot serialize scrape response: {err}");
                responses::error::Error::tracker_error().into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {

    mod scrape_response {
        use crate::core::torrent::SwarmSummary;
        use crate::core::ScrapeData;
        use crate::servers::http::v1::responses::scrape::Bencoded;
        use crate::shared::bit_torrent::info_hash::InfoHash;

        fn sample_scrape_data() -> ScrapeData {
            ScrapeData {
                files: vec![SwarmSummary {
                    info_hash: InfoHash(*b"aaaaaaaaaaaaaaaaaaaa"),
                    name: "test torrent".to_string(),
                    downloaded: 1,
                    complete: 1,
                    incomplete: 0,
                }],
            }
        }

        #[test]
        fn should_be_bencoded() {
            let response = Bencoded::from(sample_scrape_data());

            let bytes = response.body().unwrap();

            // cspell:disable-next-line
            let expected = "d5:filesd20:aaaaaaaaaaaaaaaaaaaad8:completei1e10:downloadedi1e10:incompletei0e4:name12:test torrenteee";

            assert_eq!(String::from_utf8(bytes).unwrap(), expected);
        }

        #[test]
        fn an_empty_scrape_should_be_an_empty_files_dictionary() {
            let response = Bencoded::from(ScrapeData::default());

            assert_eq!(String::from_utf8(response.body().unwrap()).unwrap(), "d5:filesdee");
        }

        #[test]
        fn should_round_trip_through_a_bencode_parser() {
            let response = Bencoded::from(sample_scrape_data());

            let parsed: Bencoded = serde_bencode::from_bytes(&response.body().unwrap()).unwrap();

            assert_eq!(parsed, response);
        }
    }
}
