//! Error returned by the core tracker.
//!
//! Error | Context | Description
//! ---|---|---
//! `UntrackedAnnounceKey` | Admission | The announce key in the URL path was never issued (or has been pruned).
//! `InfoHashNotAllowed` | Admission | The allowlist is enabled and the announced info-hash is not registered.
//! `Database` | Persistence | The store failed while serving the request.
use crate::core::auth::Key;
use crate::core::databases;
use crate::shared::bit_torrent::info_hash::InfoHash;

/// Admission or persistence error returned by the core tracker.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("The announce key: {key}, is not tracked")]
    UntrackedAnnounceKey { key: Key },

    #[error("The info-hash: {info_hash}, is not in the allowed list")]
    InfoHashNotAllowed { info_hash: InfoHash },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: databases::error::Error,
    },
}
