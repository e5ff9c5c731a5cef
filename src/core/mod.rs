//! The core tracker module: the generic tracker logic, independent of the
//! delivery layer.
//!
//! The [`Tracker`] owns the process-wide collaborators (database pool,
//! admission cache, peering algorithm) and has three groups of
//! responsibilities:
//!
//! - **Admission**: announce keys must have been issued, and announced
//!   info-hashes must be registered (or are auto-registered when the
//!   allowlist is disabled). Admission checks are fronted by a best-effort
//!   cache; cache failures fall through to the store and never fail a
//!   request.
//! - **Announce handling**: selecting the candidate peers, asking the
//!   configured [`algorithms::PeeringAlgorithm`] how many to return, and
//!   persisting the announce. The reply is computed strictly against
//!   pre-announce state, so the announcer never appears in their own peer
//!   list.
//! - **Key lifecycle**: issuing announce keys and pruning long-idle ones
//!   together with their announces and cached flags.
//!
//! ```text
//! Delivery layer     Domain layer
//!
//!     HTTP tracker |
//! Tracker REST API |> Core tracker
//! ```
pub mod algorithms;
pub mod announce;
pub mod auth;
pub mod cache;
pub mod databases;
pub mod error;
pub mod torrent;

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::thread_rng;
use tracing::warn;

use self::algorithms::PeeringAlgorithm;
use self::announce::{Announce, Endpoint, Event};
use self::auth::Key;
use self::cache::Cache;
use self::databases::Database;
use self::error::Error;
use self::torrent::SwarmSummary;
use crate::config::Configuration;
use crate::shared::bit_torrent::info_hash::InfoHash;
use crate::shared::clock;

/// Interval in seconds that clients should wait between regular announces.
pub const ANNOUNCE_INTERVAL: u32 = 2700;

/// Clients must not reannounce more frequently than this, in seconds.
pub const MIN_ANNOUNCE_INTERVAL: u32 = 30;

/// Rows whose `last_announce` is older than this are stale: invisible to
/// selection, scoring and aggregation.
pub const STALE_INTERVAL: u64 = 2 * ANNOUNCE_INTERVAL as u64;

/// Announce keys idle for longer than this (since issuance and since their
/// last announce) are pruned. Three months.
pub const PRUNE_INTERVAL: u64 = 3 * 30 * 24 * 60 * 60;

/// The domain layer tracker service.
///
/// Its main responsibility is to handle the `announce` and `scrape`
/// requests, but it's also a container for the tracker's process-wide
/// dependencies: handlers borrow it through an `Arc` and never hold state of
/// their own.
pub struct Tracker {
    /// The database driver.
    pub database: Arc<Box<dyn Database>>,
    cache: Box<dyn Cache>,
    algorithm: Box<dyn PeeringAlgorithm>,
    disable_allowlist: bool,
    admin_secret: Option<String>,
}

/// Structure that holds the data returned by the `announce` request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnounceData {
    /// The list of peers downloading the same torrent. It excludes the peer
    /// that made the request.
    pub peers: Vec<Endpoint>,
    pub interval: u32,
    pub interval_min: u32,
}

/// Structure that holds the data returned by the `scrape` request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrapeData {
    pub files: Vec<SwarmSummary>,
}

impl Tracker {
    /// `Tracker` constructor.
    ///
    /// # Errors
    ///
    /// Will return a `databases::error::Error` if unable to connect to the
    /// database or to set up its schema.
    pub fn new(config: &Configuration) -> Result<Tracker, databases::error::Error> {
        let database = Arc::new(databases::setup(&config.db_path)?);

        Ok(Tracker {
            database,
            cache: Box::new(cache::in_memory::InMemory::new(config.cache_entries)),
            algorithm: algorithms::build(config.algorithm),
            disable_allowlist: config.disable_allowlist,
            admin_secret: config.admin_secret.clone().filter(|secret| !secret.is_empty()),
        })
    }

    /// The shared secret gating the restricted API endpoints. `None` means
    /// they are disabled.
    #[must_use]
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin_secret.as_deref()
    }

    fn stale_cutoff() -> u64 {
        clock::now().saturating_sub(STALE_INTERVAL)
    }

    fn tracked_cache_key(key: &Key) -> String {
        format!("tracked:{key}")
    }

    fn allowed_cache_key(info_hash: &InfoHash) -> String {
        format!("allowed:{info_hash}")
    }

    async fn cached_flag(&self, cache_key: &str) -> Option<bool> {
        match self.cache.get(cache_key).await {
            Ok(flag) => flag,
            Err(err) => {
                // A broken cache degrades to a store query, never an error.
                warn!("admission cache read failed: {err}");
                None
            }
        }
    }

    async fn remember_flag(&self, cache_key: &str, value: bool) {
        if let Err(err) = self.cache.set(cache_key, value).await {
            warn!("admission cache write failed: {err}");
        }
    }

    /// It admits or rejects an announce: the key must have been issued and
    /// the info-hash must be registered. With the allowlist disabled,
    /// unknown info-hashes are registered on the fly instead.
    ///
    /// # Errors
    ///
    /// Will return [`Error::UntrackedAnnounceKey`] or
    /// [`Error::InfoHashNotAllowed`] on rejection, or a database error.
    pub async fn authorize(&self, key: &Key, info_hash: &InfoHash) -> Result<(), Error> {
        let tracked_cache_key = Self::tracked_cache_key(key);

        let tracked = match self.cached_flag(&tracked_cache_key).await {
            Some(flag) => flag,
            None => {
                let flag = self.database.announce_key_exists(key).await?;
                self.remember_flag(&tracked_cache_key, flag).await;
                flag
            }
        };

        if !tracked {
            return Err(Error::UntrackedAnnounceKey { key: key.clone() });
        }

        let allowed_cache_key = Self::allowed_cache_key(info_hash);

        if self.disable_allowlist {
            if self.cached_flag(&allowed_cache_key).await != Some(true) {
                self.database.add_info_hash_if_missing(info_hash, "client added").await?;
                self.remember_flag(&allowed_cache_key, true).await;
            }
            return Ok(());
        }

        let allowed = match self.cached_flag(&allowed_cache_key).await {
            Some(flag) => flag,
            None => {
                let flag = self.database.is_info_hash_allowed(info_hash).await?;
                self.remember_flag(&allowed_cache_key, flag).await;
                flag
            }
        };

        if allowed {
            Ok(())
        } else {
            Err(Error::InfoHashNotAllowed { info_hash: *info_hash })
        }
    }

    /// It handles an announce request: candidate selection, the policy
    /// count, the uniform random truncation, and finally persistence.
    ///
    /// The peer list reflects state strictly before this announce. That is
    /// intentional; the announcer cannot appear in their own peer list
    /// anyway.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store fails while selecting or while
    /// persisting the announce.
    pub async fn announce(&self, announce: &Announce) -> Result<AnnounceData, Error> {
        let active_since = Self::stale_cutoff();

        let mut peers = self.database.find_candidates(&announce.info_hash, &announce.key, active_since).await?;

        let wanted = self.algorithm.peers_to_give(&**self.database, announce, active_since).await?;

        if peers.len() > wanted {
            peers.shuffle(&mut thread_rng());
            peers.truncate(wanted);
        }

        self.persist_announce(announce).await?;

        Ok(AnnounceData {
            peers,
            interval: ANNOUNCE_INTERVAL,
            interval_min: MIN_ANNOUNCE_INTERVAL,
        })
    }

    /// The writer: it folds one announce into the durable state.
    ///
    /// Deltas are computed against the most recent non-stopped row for the
    /// `(key, info-hash)` pair and clamped at zero, so client session resets
    /// contribute nothing rather than negative amounts.
    async fn persist_announce(&self, announce: &Announce) -> Result<(), Error> {
        let (last_uploaded, last_downloaded) = self
            .database
            .last_reported_transfer(&announce.key, &announce.info_hash)
            .await?
            .unwrap_or((0, 0));

        let upload_delta = (announce.uploaded - last_uploaded).max(0);
        let download_delta = (announce.downloaded - last_downloaded).max(0);
        let completed_snatch = i64::from(announce.event == Event::Completed);

        self.database
            .add_peer_totals(&announce.key, completed_snatch, upload_delta, download_delta)
            .await?;

        if announce.event == Event::Completed {
            self.database.increment_snatches(&announce.info_hash).await?;
        }

        self.database.upsert_announce(announce).await?;

        Ok(())
    }

    /// It handles a scrape request. An empty filter scrapes every registered
    /// torrent; otherwise only the requested info-hashes are returned, and
    /// unregistered ones are omitted.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store cannot be queried.
    pub async fn scrape(&self, info_hashes: &[InfoHash]) -> Result<ScrapeData, Error> {
        let active_since = Self::stale_cutoff();

        if info_hashes.is_empty() {
            return Ok(ScrapeData {
                files: self.database.scrape_all_torrents(active_since).await?,
            });
        }

        let mut files = Vec::new();
        for info_hash in info_hashes {
            if let Some(summary) = self.database.scrape_torrent(info_hash, active_since).await? {
                files.push(summary);
            }
        }

        Ok(ScrapeData { files })
    }

    /// The aggregates behind the public JSON surface, one summary per
    /// registered torrent.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store cannot be queried.
    pub async fn torrent_summaries(&self) -> Result<Vec<SwarmSummary>, Error> {
        Ok(self.database.scrape_all_torrents(Self::stale_cutoff()).await?)
    }

    /// It issues a new announce key and stores it.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the key cannot be stored.
    pub async fn generate_announce_key(&self) -> Result<Key, Error> {
        let key = auth::generate();
        self.database.insert_announce_key(&key).await?;
        Ok(key)
    }

    /// It checks whether an announce key has been issued, without touching
    /// the admission cache.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store cannot be queried.
    pub async fn is_issued_key(&self, key: &Key) -> Result<bool, Error> {
        Ok(self.database.announce_key_exists(key).await?)
    }

    /// It registers an info-hash in the allowed list.
    ///
    /// # Errors
    ///
    /// Will return a [`databases::error::Error::UniqueViolation`] wrapped in
    /// [`Error::Database`] if the info-hash is already registered.
    pub async fn register_info_hash(&self, info_hash: &InfoHash, name: &str) -> Result<(), Error> {
        Ok(self.database.add_info_hash(info_hash, name).await?)
    }

    /// It registers an info-hash together with its stripped torrent file.
    ///
    /// # Errors
    ///
    /// Will return a [`databases::error::Error::UniqueViolation`] wrapped in
    /// [`Error::Database`] if the info-hash is already registered.
    pub async fn register_torrent_file(&self, torrent: &crate::shared::bit_torrent::torrent_file::RegistryTorrent) -> Result<(), Error> {
        Ok(self
            .database
            .insert_torrent_file(&torrent.info_hash, &torrent.name, &torrent.file, torrent.length)
            .await?)
    }

    /// It removes an info-hash from the registry, cascading to its announces
    /// and dropping the cached admission flag so the swarm stops being
    /// admitted right away.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store fails.
    pub async fn unregister_info_hash(&self, info_hash: &InfoHash) -> Result<(), Error> {
        self.database.remove_info_hash(info_hash).await?;

        if let Err(err) = self.cache.unlink(&[Self::allowed_cache_key(info_hash)]).await {
            warn!("failed to unlink cached flag for removed info-hash: {err}");
        }

        Ok(())
    }

    /// The stored (stripped) torrent file for an info-hash, if any.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store cannot be queried.
    pub async fn stored_torrent_file(&self, info_hash: &InfoHash) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.database.get_torrent_file(info_hash).await?)
    }

    /// It removes every announce key idle since before `cutoff` (both in
    /// issuance time and last announce), cascading to the announces, and
    /// unlinks the cached admission flags of the removed keys. It returns
    /// how many keys were pruned.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the store fails.
    pub async fn prune_announce_keys(&self, cutoff: u64) -> Result<usize, Error> {
        let keys = self.database.prune_announce_keys(cutoff).await?;

        if !keys.is_empty() {
            let cache_keys: Vec<String> = keys.iter().map(Self::tracked_cache_key).collect();
            if let Err(err) = self.cache.unlink(&cache_keys).await {
                warn!("failed to unlink cached flags for pruned keys: {err}");
            }
        }

        Ok(keys.len())
    }
}
