//! `Error` response for the HTTP tracker.
//!
//! From the [BEP 03. The `BitTorrent` Protocol Specification](https://www.bittorrent.org/beps/bep_0003.html):
//!
//! _"Tracker responses are bencoded dictionaries. If a tracker response has a
//! key failure reason, then that maps to a human readable string which
//! explains why the query failed, and no other keys are required."_
//!
//! > **NOTICE**: error responses are bencoded and always have a `200 OK`
//! status code. The official `BitTorrent` specification does not specify the
//! status code, and clients do not parse the body of non-2xx responses.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

/// `Error` response for the HTTP tracker.
#[derive(Serialize, Debug, PartialEq)]
pub struct Error {
    /// Human readable string which explains why the request failed.
    #[serde(rename = "failure reason")]
    pub failure_reason: String,
}

impl Error {
    /// Returns the bencoded representation of the `Error` struct.
    ///
    /// ```rust
    /// use seedmerit::servers::http::v1::responses::error::Error;
    ///
    /// let err = Error {
    ///    failure_reason: "error message".to_owned(),
    /// };
    ///
    /// assert_eq!(err.write(), "d14:failure reason13:error messagee");
    /// ```
    ///
    /// # Panics
    ///
    /// It would panic if the `Error` struct contained an inappropriate field
    /// type.
    #[must_use]
    pub fn write(&self) -> String {
        serde_bencode::to_string(&self).unwrap()
    }

    /// The reply for any announce that could not be parsed. The details are
    /// only logged; clients get a stable reason string.
    #[must_use]
    pub fn parse_announce() -> Self {
        Self {
            failure_reason: "error parsing announce".to_owned(),
        }
    }

    /// The reply for any internal failure.
    #[must_use]
    pub fn tracker_error() -> Self {
        Self {
            failure_reason: "tracker error".to_owned(),
        }
    }

    /// The reply for an announce key that was never issued, including path
    /// segments that are not even shaped like a key.
    #[must_use]
    pub fn untracked_announce_key() -> Self {
        Self {
            failure_reason: "untracked announce key, generate new announce url".to_owned(),
        }
    }
}

impl From<crate::core::error::Error> for Error {
    fn from(err: crate::core::error::Error) -> Self {
        use crate::core::error::Error as CoreError;

        match err {
            CoreError::InfoHashNotAllowed { .. } => Self {
                failure_reason: "info_hash not in the allowed list".to_owned(),
            },
            CoreError::UntrackedAnnounceKey { .. } => Self {
                failure_reason: "untracked announce key, generate new announce url".to_owned(),
            },
            CoreError::Database { source } => {
                // This is the outermost boundary for store failures: log the
                // cause, reply with a generic reason.
                error!("tracker error: {source}");
                Self::tracker_error()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (StatusCode::OK, self.write()).into_response()
    }
}
