//! `Announce` response for the HTTP tracker [`announce`](crate::servers::http::v1::requests::announce::Announce) request.
//!
//! The tracker only speaks the compact format:
//!
//! _"To reduce the size of tracker responses and to reduce memory and
//! computational requirements in trackers, trackers may return peers as a
//! packed string rather than as a bencoded list."_
//!
//! Refer to [BEP 23: Tracker Returns Compact Peer Lists](https://www.bittorrent.org/beps/bep_0023.html)
//! for more information.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::core::AnnounceData;
use crate::servers::http::v1::responses;

/// Compact `announce` response.
///
/// ```rust
/// use seedmerit::servers::http::v1::responses::announce::Compact;
///
/// let response = Compact {
///     interval: 111,
///     min_interval: 222,
///     peers: b"iiiipp".to_vec(), // 105.105.105.105:28784
/// };
///
/// let bytes = response.body().unwrap();
///
/// assert_eq!(
///     String::from_utf8(bytes).unwrap(),
///     "d8:intervali111e12:min intervali222e5:peers6:iiiippe"
/// );
/// ```
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Compact {
    /// Seconds the client should wait between regular announces.
    pub interval: u32,
    /// Clients must not reannounce more frequently than this.
    #[serde(rename = "min interval")]
    pub min_interval: u32,
    /// The concatenation of the 6-byte compact endpoints.
    #[serde(with = "serde_bytes")]
    pub peers: Vec<u8>,
}

impl Compact {
    /// Returns the bencoded compact response as a byte vector.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the response cannot be bencoded.
    pub fn body(&self) -> Result<Vec<u8>, serde_bencode::Error> {
        serde_bencode::to_bytes(self)
    }
}

impl From<AnnounceData> for Compact {
    fn from(domain_announce_response: AnnounceData) -> Self {
        let mut peers = Vec::with_capacity(6 * domain_announce_response.peers.len());
        for endpoint in &domain_announce_response.peers {
            peers.extend_from_slice(&endpoint.to_bytes());
        }

        Self {
            interval: domain_announce_response.interval,
            min_interval: domain_announce_response.interval_min,
            peers,
        }
    }
}

impl IntoResponse for Compact {
    fn into_response(self) -> Response {
        match self.body() {
            Ok(bytes) => (StatusCode::OK, bytes).into_response(),
            Err(err) => {
                error!("cannot serialize announce response: {err}");
                responses::error::Error::tracker_error().into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::Compact;
    use crate::core::announce::Endpoint;
    use crate::core::AnnounceData;

    // Some ascii values used in tests:
    //
    // +-----------------+
    // | Dec | Hex | Chr |
    // +-----------------+
    // | 105 | 69  | i   |
    // | 112 | 70  | p   |
    // +-----------------+
    //
    // IP addresses and port numbers are chosen so that their compact bytes
    // are also printable, which makes the asserts readable.

    #[test]
    fn a_compact_announce_response_can_be_bencoded() {
        let response = Compact {
            interval: 111,
            min_interval: 222,
            peers: b"iiiipp".to_vec(),
        };

        let bytes = response.body().unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "d8:intervali111e12:min intervali222e5:peers6:iiiippe"
        );
    }

    #[test]
    fn an_empty_peer_list_should_be_bencoded_as_an_empty_byte_string() {
        let response = Compact {
            interval: 111,
            min_interval: 222,
            peers: Vec::new(),
        };

        let bytes = response.body().unwrap();

        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "d8:intervali111e12:min intervali222e5:peers0:e"
        );
    }

    #[test]
    fn it_should_concatenate_the_compact_endpoints_from_the_announce_data() {
        let announce_data = AnnounceData {
            peers: vec![
                Endpoint::new(Ipv4Addr::new(105, 105, 105, 105), 0x7070),
                Endpoint::new(Ipv4Addr::new(192, 0, 2, 1), 6881),
            ],
            interval: 2700,
            interval_min: 30,
        };

        let response = Compact::from(announce_data);

        assert_eq!(response.peers.len(), 12);
        assert_eq!(&response.peers[..6], b"iiiipp");
        assert_eq!(&response.peers[6..], &[192, 0, 2, 1, 0x1a, 0xe1]);
    }

    #[test]
    fn the_response_should_round_trip_through_a_bencode_parser() {
        let response = Compact {
            interval: 2700,
            min_interval: 30,
            peers: vec![192, 0, 2, 1, 0x1a, 0xe1],
        };

        let parsed: Compact = serde_bencode::from_bytes(&response.body().unwrap()).unwrap();

        assert_eq!(parsed, response);
    }
}
