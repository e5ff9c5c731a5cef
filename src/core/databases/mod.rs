//! The persistence module.
//!
//! Persistence is implemented with one [`Database`] trait backed by the
//! [`Sqlite`](crate::core::databases::sqlite::Sqlite) driver.
//!
//! > **NOTICE**: There are no database migrations. If there are any changes,
//! we will implement them or provide a script to migrate to the new schema.
//!
//! The persistent objects are:
//!
//! - [Peers](#peers)
//! - [Info-hashes](#info-hashes)
//! - [Announces](#announces)
//!
//! # Peers
//!
//! A peer row is an issuance record for one announce key, not a remote host.
//! It accumulates the lifetime behavior totals used by the peering
//! algorithms.
//!
//!  Field          | Sample data                      | Description
//! ---|---|---
//!  `id`           | 1                                | Autoincrement id
//!  `announce_key` | `21a89e33dd0de2cdd952677044b0f0` | 30-hex-char per-user secret
//!  `snatched`     | 3                                | Completed events seen under this key
//!  `downloaded`   | 1244
//!  `uploaded`     | 5500                             | Cumulative deltas, monotonic
//!  `created_time` | 1672419840                       | Unix seconds, set at insert
//!
//! # Info-hashes
//!
//! Field        | Sample data                                | Description
//! ---|---|---
//! `id`         | 1                                          | Autoincrement id
//! `info_hash`  | `c1277613db1d28709b034a017ab2cae4be07ae10` | `BitTorrent` infohash V1 (20 raw bytes)
//! `downloaded` | 20                                         | Swarm-wide completion count
//! `name`       | `ubuntu-22.04.iso`                         | Torrent name
//! `file`       | (blob, optional)                           | Stripped torrent file
//! `length`     | (optional)                                 | Total content length
//!
//! # Announces
//!
//! One row per `(peers_id, info_hash_id)` pair; re-announces upsert it. The
//! `last_announce` column is bumped by an update trigger, and rows whose
//! `event` is `stopped` are invisible to selection and aggregation.
pub mod error;
pub mod sqlite;

use async_trait::async_trait;

use self::error::Error;
use crate::core::announce::{Announce, Endpoint};
use crate::core::auth::Key;
use crate::core::torrent::{PeerBehavior, SwarmSummary, TransferSnapshot};
use crate::shared::bit_torrent::info_hash::InfoHash;

/// It instantiates the database driver and sets up the schema.
///
/// # Errors
///
/// Will return an `Error` if unable to connect to the database or to create
/// the tables.
pub fn setup(db_path: &str) -> Result<Box<dyn Database>, Error> {
    let database = sqlite::Sqlite::new(db_path)?;
    database.create_database_tables()?;
    Ok(Box::new(database))
}

/// The persistence trait. It contains all the methods to interact with the
/// database.
///
/// Queries that look at announce recency take an `active_since` unix-second
/// cutoff computed by the caller; rows older than the cutoff are stale and
/// treated as absent.
#[async_trait]
pub trait Database: Sync + Send {
    /// It generates the database tables. SQL queries are hardcoded in the
    /// trait implementation.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to create the tables.
    fn create_database_tables(&self) -> Result<(), Error>;

    /// It drops the database tables.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to drop the tables.
    fn drop_database_tables(&self) -> Result<(), Error>;

    // Announce keys

    /// It stores a newly issued announce key.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to save, including when the key already
    /// exists.
    async fn insert_announce_key(&self, key: &Key) -> Result<(), Error>;

    /// It checks whether an announce key has been issued.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn announce_key_exists(&self, key: &Key) -> Result<bool, Error>;

    /// It removes every peer row created before `cutoff` whose most recent
    /// announce (if any) is also older than `cutoff`, cascading to the
    /// announces. It returns the removed keys so cache entries can be
    /// unlinked.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to delete.
    async fn prune_announce_keys(&self, cutoff: u64) -> Result<Vec<Key>, Error>;

    // Info-hash registry

    /// It adds an info-hash to the registry (the allowlist).
    ///
    /// # Errors
    ///
    /// Will return [`Error::UniqueViolation`] if the info-hash is already
    /// registered.
    async fn add_info_hash(&self, info_hash: &InfoHash, name: &str) -> Result<(), Error>;

    /// Like [`Database::add_info_hash`] but a conflict with an existing row
    /// does nothing. Used to auto-admit torrents when the allowlist is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to save.
    async fn add_info_hash_if_missing(&self, info_hash: &InfoHash, name: &str) -> Result<(), Error>;

    /// It checks whether the info-hash is registered.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn is_info_hash_allowed(&self, info_hash: &InfoHash) -> Result<bool, Error>;

    /// It removes an info-hash from the registry, cascading to its announces.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to delete.
    async fn remove_info_hash(&self, info_hash: &InfoHash) -> Result<(), Error>;

    /// It registers an info-hash together with its stripped torrent file.
    ///
    /// # Errors
    ///
    /// Will return [`Error::UniqueViolation`] if the info-hash is already
    /// registered.
    async fn insert_torrent_file(&self, info_hash: &InfoHash, name: &str, file: &[u8], length: i64) -> Result<(), Error>;

    /// It loads the stored torrent file for an info-hash, if there is one.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn get_torrent_file(&self, info_hash: &InfoHash) -> Result<Option<Vec<u8>>, Error>;

    // Writer

    /// The `(uploaded, downloaded)` the client reported in its most recent
    /// non-stopped announce for this `(key, info-hash)` pair. `None` if the
    /// client has not announced this torrent (or only stopped it).
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn last_reported_transfer(&self, key: &Key, info_hash: &InfoHash) -> Result<Option<(i64, i64)>, Error>;

    /// It atomically adds the computed deltas to the peer row totals.
    ///
    /// # Errors
    ///
    /// Will return `Error` if the peer row does not exist.
    async fn add_peer_totals(&self, key: &Key, snatched: i64, uploaded: i64, downloaded: i64) -> Result<(), Error>;

    /// It bumps the swarm-wide completion counter for a torrent.
    ///
    /// # Errors
    ///
    /// Will return `Error` if the info-hash row does not exist.
    async fn increment_snatches(&self, info_hash: &InfoHash) -> Result<(), Error>;

    /// It inserts or updates the announce row for the `(key, info-hash)`
    /// pair. A row mutation bumps `last_announce` via the update trigger.
    ///
    /// # Errors
    ///
    /// Will return `Error` if the key or the info-hash is not registered.
    async fn upsert_announce(&self, announce: &Announce) -> Result<(), Error>;

    // Selection & scoring

    /// The candidate peer set for a torrent: the compact endpoint of every
    /// peer other than `exclude` whose announce is recent and not stopped.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn find_candidates(&self, info_hash: &InfoHash, exclude: &Key, active_since: u64) -> Result<Vec<Endpoint>, Error>;

    /// How many torrents this key is currently announcing (recent,
    /// non-stopped rows).
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn count_recent_announces(&self, key: &Key, active_since: u64) -> Result<u64, Error>;

    /// Like [`Database::count_recent_announces`], restricted to rows with
    /// `amount_left = 0` (seeded torrents).
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn count_recent_seeds(&self, key: &Key, active_since: u64) -> Result<u64, Error>;

    /// The per-torrent transfer snapshots for this key (recent, non-stopped
    /// rows), used by the behavior score.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn recent_transfers(&self, key: &Key, active_since: u64) -> Result<Vec<TransferSnapshot>, Error>;

    /// The per-peer seeded-torrent counts across the whole tracker (recent,
    /// non-stopped rows with `amount_left = 0`), one entry per peer.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn swarm_seed_counts(&self, active_since: u64) -> Result<Vec<u64>, Error>;

    /// The lifetime totals of the peer row behind an announce key.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn peer_behavior(&self, key: &Key) -> Result<Option<PeerBehavior>, Error>;

    // Aggregation

    /// The scrape aggregate for one torrent, or `None` if the info-hash is
    /// not registered.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn scrape_torrent(&self, info_hash: &InfoHash, active_since: u64) -> Result<Option<SwarmSummary>, Error>;

    /// The scrape aggregates for every registered torrent, ordered by name.
    ///
    /// # Errors
    ///
    /// Will return `Error` if unable to load.
    async fn scrape_all_torrents(&self, active_since: u64) -> Result<Vec<SwarmSummary>, Error>;
}
