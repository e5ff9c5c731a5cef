//! Announce keys.
//!
//! An announce key is a per-user secret embedded in the announce URL path
//! (`/{announce_key}/announce`). The tracker uses it to attribute announces
//! across torrents, which is what makes behavior scoring possible.
//!
//! Keys are random 30-char hex strings (15 bytes of entropy). With that key
//! space collisions are negligible, so issuance does not retry on collision;
//! a retry loop would only hide key-space bugs.
use derive_more::Display;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The length, in hex characters, of an announce key.
pub const ANNOUNCE_KEY_LENGTH: usize = 30;

/// A per-user announce key.
///
/// ```rust
/// use seedmerit::core::auth::Key;
/// use std::str::FromStr;
///
/// let key = Key::from_str("21a89e33dd0de2cdd952677044b0f0f0");
/// assert!(key.is_err()); // 32 chars, one too many
///
/// let key = Key::from_str("21a89e33dd0de2cdd952677044b0f0");
/// assert!(key.is_ok());
/// ```
#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Clone, Display, Hash)]
pub struct Key(String);

impl Key {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned when a key cannot be parsed from a string.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("invalid announce key, expected {ANNOUNCE_KEY_LENGTH} hex chars")]
pub struct ParseKeyError;

impl std::str::FromStr for Key {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ANNOUNCE_KEY_LENGTH || !s.bytes().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseKeyError);
        }

        Ok(Self(s.to_string()))
    }
}

/// It generates a new random announce key.
#[must_use]
pub fn generate() -> Key {
    let mut random_bytes = [0u8; ANNOUNCE_KEY_LENGTH / 2];
    thread_rng().fill(&mut random_bytes[..]);

    let mut hex = [0u8; ANNOUNCE_KEY_LENGTH];
    binascii::bin2hex(&random_bytes, &mut hex).expect("destination buffer should hold the hex key");

    Key(std::str::from_utf8(&hex).expect("hex chars should be valid utf-8").to_string())
}
