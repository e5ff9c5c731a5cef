//! The admission cache.
//!
//! A key/value cache fronting the admission checks. It holds two
//! namespaces: `tracked:<announce_key>` (the key has been issued) and
//! `allowed:<info_hash>` (the info-hash is registered).
//!
//! The cache holds derived booleans only and never participates in
//! correctness: a miss and a failure are handled by the same fallback path,
//! a query against the store. Callers must log cache errors and carry on.
pub mod in_memory;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a cache driver. They are advisory: the tracker treats
/// them as misses.
#[derive(Error, Debug)]
pub enum Error {
    #[error("cache unavailable: {reason}")]
    Unavailable { reason: String },
}

/// The admission cache trait.
#[async_trait]
pub trait Cache: Sync + Send {
    /// Looks up a cached flag.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the cache cannot be reached. Callers treat
    /// that as a miss.
    async fn get(&self, key: &str) -> Result<Option<bool>, Error>;

    /// Stores a flag.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the cache cannot be reached.
    async fn set(&self, key: &str, value: bool) -> Result<(), Error>;

    /// Removes entries, used when announce keys are pruned.
    ///
    /// # Errors
    ///
    /// Will return an `Error` if the cache cannot be reached.
    async fn unlink(&self, keys: &[String]) -> Result<(), Error>;
}
