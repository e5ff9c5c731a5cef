//! Torrent metainfo manipulation for the registry.
//!
//! Uploaded torrent files are stored stripped: the announce URL is blanked
//! and the `private` flag is forced, so the stored file is useless without a
//! per-user announce URL injected back into it. The info-hash is the SHA-1
//! of the re-encoded info dictionary, computed after forcing the flag.
use serde_bencode::value::Value;
use sha1::{Digest, Sha1};
use thiserror::Error;

use crate::shared::bit_torrent::info_hash::InfoHash;

/// A torrent file prepared for the info-hash registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryTorrent {
    pub info_hash: InfoHash,
    pub name: String,
    /// The re-encoded metainfo with the announce URL stripped and the
    /// `private` flag forced.
    pub file: Vec<u8>,
    /// Total content length in bytes, summed over files for multi-file
    /// torrents.
    pub length: i64,
}

/// Errors raised while decoding or re-encoding a torrent metainfo file.
#[derive(Error, Debug)]
pub enum MetainfoError {
    #[error("torrent file is not a bencoded dictionary")]
    NotADictionary,
    #[error("torrent file is missing the {field} field")]
    MissingField { field: &'static str },
    #[error("torrent file has an invalid {field} field")]
    InvalidField { field: &'static str },
    #[error("bencode error: {0}")]
    Bencode(#[from] serde_bencode::Error),
}

/// It decodes an uploaded torrent file, strips the announce URL, forces
/// `info.private = 1` and extracts the fields stored by the registry.
///
/// # Errors
///
/// Will return an error if the file is not a bencoded metainfo dictionary
/// with a well-formed info dictionary.
pub fn strip_for_registry(bytes: &[u8]) -> Result<RegistryTorrent, MetainfoError> {
    let mut root: Value = serde_bencode::from_bytes(bytes)?;

    let Value::Dict(root_dict) = &mut root else {
        return Err(MetainfoError::NotADictionary);
    };

    root_dict.insert(b"announce".to_vec(), Value::Bytes(Vec::new()));

    let Some(info) = root_dict.get_mut("info".as_bytes()) else {
        return Err(MetainfoError::MissingField { field: "info" });
    };
    let Value::Dict(info_dict) = info else {
        return Err(MetainfoError::InvalidField { field: "info" });
    };

    info_dict.insert(b"private".to_vec(), Value::Int(1));

    let name = match info_dict.get("name".as_bytes()) {
        Some(Value::Bytes(name)) => String::from_utf8(name.clone()).map_err(|_| MetainfoError::InvalidField { field: "name" })?,
        Some(_) => return Err(MetainfoError::InvalidField { field: "name" }),
        None => return Err(MetainfoError::MissingField { field: "name" }),
    };

    let length = total_length(info_dict)?;

    let info_bytes = match root_dict.get("info".as_bytes()) {
        Some(info) => serde_bencode::to_bytes(info)?,
        None => return Err(MetainfoError::MissingField { field: "info" }),
    };
    let info_hash = InfoHash(Sha1::digest(&info_bytes).into());

    let file = serde_bencode::to_bytes(&root)?;

    Ok(RegistryTorrent {
        info_hash,
        name,
        file,
        length,
    })
}

/// It injects an announce URL into a stored (stripped) torrent file and
/// re-encodes it.
///
/// # Errors
///
/// Will return an error if the stored bytes are not a bencoded dictionary.
pub fn with_announce_url(bytes: &[u8], announce_url: &str) -> Result<Vec<u8>, MetainfoError> {
    let mut root: Value = serde_bencode::from_bytes(bytes)?;

    let Value::Dict(root_dict) = &mut root else {
        return Err(MetainfoError::NotADictionary);
    };

    root_dict.insert(b"announce".to_vec(), Value::Bytes(announce_url.as_bytes().to_vec()));

    Ok(serde_bencode::to_bytes(&root)?)
}

fn total_length(info_dict: &std::collections::HashMap<Vec<u8>, Value>) -> Result<i64, MetainfoError> {
    if let Some(length) = info_dict.get("length".as_bytes()) {
        return match length {
            Value::Int(length) => Ok(*length),
            _ => Err(MetainfoError::InvalidField { field: "length" }),
        };
    }

    // Multi-file torrents carry a "files" list instead of a top-level length.
    let Some(Value::List(files)) = info_dict.get("files".as_bytes()) else {
        return Err(MetainfoError::MissingField { field: "length" });
    };

    let mut total = 0;
    for file in files {
        let Value::Dict(file_dict) = file else {
            return Err(MetainfoError::InvalidField { field: "files" });
        };
        match file_dict.get("length".as_bytes()) {
            Some(Value::Int(length)) => total += length,
            _ => return Err(MetainfoError::InvalidField { field: "files" }),
        }
    }

    Ok(total)
}
