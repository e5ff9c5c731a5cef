//! Percent decoding for the binary `info_hash` query param.
//!
//! `BitTorrent` info-hashes are percent encoded like any other URL
//! parameter, but they are encoded from a 20-byte array which is usually not
//! valid UTF-8. General-purpose query parsers expect well-formed UTF-8
//! strings, so the raw param is decoded here explicitly.
//!
//! More information about "Percent Encoding":
//!
//! - <https://datatracker.ietf.org/doc/html/rfc3986#section-2.1>
//! - <https://en.wikipedia.org/wiki/URL_encoding>
use crate::shared::bit_torrent::info_hash::{ConversionError, InfoHash};

/// Percent decodes a percent encoded info-hash.
///
/// For example, given the info-hash `3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0`,
/// its percent encoded representation is
/// `%3B%24U%04%CF%5F%11%BB%DB%E1%20%1C%EAjk%F4Z%EE%1B%C0`.
///
/// ```rust
/// use std::str::FromStr;
/// use seedmerit::servers::http::percent_encoding::percent_decode_info_hash;
/// use seedmerit::shared::bit_torrent::info_hash::InfoHash;
///
/// let info_hash = percent_decode_info_hash("%3B%24U%04%CF%5F%11%BB%DB%E1%20%1C%EAjk%F4Z%EE%1B%C0").unwrap();
///
/// assert_eq!(
///     info_hash,
///     InfoHash::from_str("3b245504cf5f11bbdbe1201cea6a6bf45aee1bc0").unwrap()
/// );
/// ```
///
/// # Errors
///
/// Will return `Err` if the decoded bytes do not represent a valid
/// [`InfoHash`].
pub fn percent_decode_info_hash(raw_info_hash: &str) -> Result<InfoHash, ConversionError> {
    let bytes = percent_encoding::percent_decode_str(raw_info_hash).collect::<Vec<u8>>();
    InfoHash::try_from(bytes)
}
