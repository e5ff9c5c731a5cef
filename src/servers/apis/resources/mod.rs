//! API resources: the JSON shapes exchanged with clients.
pub mod announce_key;
pub mod stats;
pub mod torrent;
