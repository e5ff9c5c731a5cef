//! In-process admission cache driver backed by an LRU map.
use std::num::NonZeroUsize;
use std::sync::Mutex;

use async_trait::async_trait;
use lru::LruCache;

use super::{Cache, Error};

/// Default capacity used when the configured capacity is zero.
const DEFAULT_ENTRIES: usize = 10_000;

pub struct InMemory {
    entries: Mutex<LruCache<String, bool>>,
}

impl InMemory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(DEFAULT_ENTRIES).expect("default capacity is non-zero"));

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LruCache<String, bool>>, Error> {
        self.entries.lock().map_err(|err| Error::Unavailable {
            reason: format!("cache lock poisoned: {err}"),
        })
    }
}

#[async_trait]
impl Cache for InMemory {
    async fn get(&self, key: &str) -> Result<Option<bool>, Error> {
        Ok(self.lock()?.get(key).copied())
    }

    async fn set(&self, key: &str, value: bool) -> Result<(), Error> {
        self.lock()?.put(key.to_string(), value);
        Ok(())
    }

    async fn unlink(&self, keys: &[String]) -> Result<(), Error> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.pop(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemory;
    use crate::core::cache::Cache;

    #[tokio::test]
    async fn it_should_miss_on_unknown_keys() {
        let cache = InMemory::new(4);

        assert_eq!(cache.get("tracked:unknown").await.unwrap(), None);
    }

    #[tokio::test]
    async fn it_should_return_stored_flags() {
        let cache = InMemory::new(4);

        cache.set("tracked:some-key", true).await.unwrap();
        cache.set("allowed:some-hash", false).await.unwrap();

        assert_eq!(cache.get("tracked:some-key").await.unwrap(), Some(true));
        assert_eq!(cache.get("allowed:some-hash").await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn it_should_forget_unlinked_keys() {
        let cache = InMemory::new(4);

        cache.set("tracked:some-key", true).await.unwrap();
        cache.unlink(&["tracked:some-key".to_string()]).await.unwrap();

        assert_eq!(cache.get("tracked:some-key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn it_should_evict_the_least_recently_used_entry_when_full() {
        let cache = InMemory::new(1);

        cache.set("tracked:first", true).await.unwrap();
        cache.set("tracked:second", true).await.unwrap();

        assert_eq!(cache.get("tracked:first").await.unwrap(), None);
        assert_eq!(cache.get("tracked:second").await.unwrap(), Some(true));
    }
}
