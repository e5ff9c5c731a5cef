//! `Announce` request for the HTTP tracker.
//!
//! Data structures and logic for parsing the `announce` request.
use std::panic::Location;
use std::str::FromStr;

use thiserror::Error;

use crate::core::announce::{Event, NumberOfBytes};
use crate::servers::http::percent_encoding::percent_decode_info_hash;
use crate::servers::http::v1::query::{ParseQueryError, Query};
use crate::servers::http::v1::responses;
use crate::shared::bit_torrent::info_hash::{ConversionError, InfoHash};

// Query param names
const INFO_HASH: &str = "info_hash";
const PORT: &str = "port";
const DOWNLOADED: &str = "downloaded";
const UPLOADED: &str = "uploaded";
const LEFT: &str = "left";
const EVENT: &str = "event";
const NUMWANT: &str = "numwant";

/// Used when the `numwant` param is missing, unparsable or out of range.
pub const DEFAULT_NUMWANT: usize = 50;

/// The largest accepted `numwant` value.
pub const MAX_NUMWANT: usize = 100;

/// The parsed `announce` request. Fields use the domain types after parsing
/// the query params of the request.
///
/// ```rust
/// use seedmerit::core::announce::Event;
/// use seedmerit::servers::http::v1::requests::announce::Announce;
/// use seedmerit::shared::bit_torrent::info_hash::InfoHash;
///
/// let request = Announce {
///     // Mandatory params
///     info_hash: "3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0".parse::<InfoHash>().unwrap(),
///     port: 17548,
///     uploaded: 1,
///     downloaded: 2,
///     left: 3,
///     // Optional params
///     numwant: 50,
///     event: Event::Started,
/// };
/// ```
///
/// > **NOTICE**: the `peer_id` query param required by BEP 3 is accepted but
/// ignored: announces are attributed by the announce key in the URL path,
/// not by the self-assigned peer id.
///
/// > **NOTICE**: the struct does not contain the `IP` of the peer. The IP is
/// obtained from the connection itself; only the port comes from the query,
/// because clients behind NAT announce a forwarded port.
#[derive(Debug, PartialEq)]
pub struct Announce {
    // Mandatory params
    /// The `InfoHash` of the torrent.
    pub info_hash: InfoHash,
    /// The port the peer is listening on, as announced by the client.
    pub port: u16,
    /// The number of bytes uploaded this session.
    pub uploaded: NumberOfBytes,
    /// The number of bytes downloaded this session.
    pub downloaded: NumberOfBytes,
    /// The number of bytes left to download.
    pub left: NumberOfBytes,

    // Optional params
    /// How many peers the client wants, already defaulted and ranged.
    pub numwant: usize,
    /// The event the peer is reporting; unknown values map to `None`.
    pub event: Event,
}

/// Errors that can occur when parsing the `Announce` request.
///
/// The `info_hash` param is special because it contains binary data (a
/// 20-byte SHA-1 hash) which is not a well-formed UTF-8 string.
#[derive(Error, Debug)]
pub enum ParseAnnounceQueryError {
    /// The request has no query string at all.
    #[error("missing query params for announce request in {location}")]
    MissingParams { location: &'static Location<'static> },
    /// A mandatory param is missing.
    #[error("missing param {param_name} in {location}")]
    MissingParam {
        location: &'static Location<'static>,
        param_name: String,
    },
    /// The param cannot be parsed into the domain type.
    #[error("invalid param value {param_value} for {param_name} in {location}")]
    InvalidParam {
        param_name: String,
        param_value: String,
        location: &'static Location<'static>,
    },
    /// The param value is out of range.
    #[error("param value overflow {param_value} for {param_name} in {location}")]
    NumberOfBytesOverflow {
        param_name: String,
        param_value: String,
        location: &'static Location<'static>,
    },
    /// The `info_hash` is invalid.
    #[error("invalid param value {param_value} for {param_name}: {source}")]
    InvalidInfoHashParam {
        param_name: String,
        param_value: String,
        source: ConversionError,
    },
}

impl From<ParseQueryError> for responses::error::Error {
    fn from(err: ParseQueryError) -> Self {
        tracing::debug!("cannot parse query params: {err}");
        responses::error::Error::parse_announce()
    }
}

impl From<ParseAnnounceQueryError> for responses::error::Error {
    fn from(err: ParseAnnounceQueryError) -> Self {
        tracing::debug!("cannot parse announce request: {err}");
        responses::error::Error::parse_announce()
    }
}

impl TryFrom<Query> for Announce {
    type Error = ParseAnnounceQueryError;

    fn try_from(query: Query) -> Result<Self, Self::Error> {
        Ok(Self {
            info_hash: extract_info_hash(&query)?,
            port: extract_port(&query)?,
            uploaded: extract_number_of_bytes(UPLOADED, &query)?,
            downloaded: extract_number_of_bytes(DOWNLOADED, &query)?,
            left: extract_number_of_bytes(LEFT, &query)?,
            numwant: extract_numwant(&query),
            event: extract_event(&query),
        })
    }
}

// Mandatory params

fn extract_info_hash(query: &Query) -> Result<InfoHash, ParseAnnounceQueryError> {
    match query.get_param(INFO_HASH) {
        Some(raw_param) => {
            Ok(
                percent_decode_info_hash(&raw_param).map_err(|err| ParseAnnounceQueryError::InvalidInfoHashParam {
                    param_name: INFO_HASH.to_owned(),
                    param_value: raw_param.clone(),
                    source: err,
                })?,
            )
        }
        None => Err(ParseAnnounceQueryError::MissingParam {
            location: Location::caller(),
            param_name: INFO_HASH.to_owned(),
        }),
    }
}

fn extract_port(query: &Query) -> Result<u16, ParseAnnounceQueryError> {
    match query.get_param(PORT) {
        Some(raw_param) => {
            let port = u16::from_str(&raw_param).map_err(|_e| ParseAnnounceQueryError::InvalidParam {
                param_name: PORT.to_owned(),
                param_value: raw_param.clone(),
                location: Location::caller(),
            })?;

            if port == 0 {
                return Err(ParseAnnounceQueryError::InvalidParam {
                    param_name: PORT.to_owned(),
                    param_value: raw_param,
                    location: Location::caller(),
                });
            }

            Ok(port)
        }
        None => Err(ParseAnnounceQueryError::MissingParam {
            location: Location::caller(),
            param_name: PORT.to_owned(),
        }),
    }
}

fn extract_number_of_bytes(param_name: &str, query: &Query) -> Result<NumberOfBytes, ParseAnnounceQueryError> {
    match query.get_param(param_name) {
        Some(raw_param) => {
            let number_of_bytes = u64::from_str(&raw_param).map_err(|_e| ParseAnnounceQueryError::InvalidParam {
                param_name: param_name.to_owned(),
                param_value: raw_param.clone(),
                location: Location::caller(),
            })?;

            i64::try_from(number_of_bytes).map_err(|_e| ParseAnnounceQueryError::NumberOfBytesOverflow {
                param_name: param_name.to_owned(),
                param_value: raw_param.clone(),
                location: Location::caller(),
            })
        }
        None => Err(ParseAnnounceQueryError::MissingParam {
            location: Location::caller(),
            param_name: param_name.to_owned(),
        }),
    }
}

// Optional params

fn extract_numwant(query: &Query) -> usize {
    match query.get_param(NUMWANT) {
        Some(raw_param) => match usize::from_str(&raw_param) {
            Ok(numwant) if numwant <= MAX_NUMWANT => numwant,
            _ => DEFAULT_NUMWANT,
        },
        None => DEFAULT_NUMWANT,
    }
}

fn extract_event(query: &Query) -> Event {
    match query.get_param(EVENT) {
        Some(raw_param) => Event::from_param(&raw_param),
        None => Event::None,
    }
}
