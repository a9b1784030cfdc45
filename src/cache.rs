//! Persistent TTL cache for upstream API responses
//!
//! Geocoding and travel-time lookups are cached on disk in a fjall keyspace
//! with postcard-encoded entries. Each entry carries its expiry timestamp;
//! expired entries are dropped on read. The cache handle is owned by the
//! application state and passed to the clients that need it.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::Keyspace;
use rand::RngExt;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task;

use crate::Result;
use crate::error::CareFinderError;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Disk-backed cache with per-entry TTL
pub struct Cache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    let value = store
        .get(key)
        .map_err(|e| CareFinderError::cache(e.to_string()))?;
    Ok(value.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| CareFinderError::cache(e.to_string()))?
        .as_secs())
}

impl Cache {
    /// Open (or create) the cache at the given location. A leading `~` is
    /// expanded to the user's home directory.
    pub fn open(location: &str) -> Result<Self> {
        let path = expand_home(location);
        let db = fjall::Database::builder(&path)
            .open()
            .map_err(|e| CareFinderError::cache(format!("failed to open cache database: {e}")))?;
        let store = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| CareFinderError::cache(e.to_string()))?;
        Ok(Cache { store })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = unix_now()?.saturating_add(ttl.as_secs());
        let entry = StoredEntry { value, expires_at };
        let bytes =
            postcard::to_stdvec(&entry).map_err(|e| CareFinderError::cache(e.to_string()))?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(|e| CareFinderError::cache(e.to_string()))?
            .map_err(|e| CareFinderError::cache(e.to_string()))?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes))
                .await
                .map_err(|e| CareFinderError::cache(e.to_string()))??;

        if let Some(bytes) = maybe_bytes {
            let entry: StoredEntry<T> =
                postcard::from_bytes(&bytes).map_err(|e| CareFinderError::cache(e.to_string()))?;

            if unix_now()? < entry.expires_at {
                tracing::debug!("Key found and still fresh");
                Ok(Some(entry.value))
            } else {
                tracing::debug!("Key found but expired");
                self.remove(key).await?;
                Ok(None)
            }
        } else {
            tracing::debug!("Key not found");
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(|e| CareFinderError::cache(e.to_string()))?
            .map_err(|e| CareFinderError::cache(e.to_string()))?;
        Ok(())
    }
}

/// TTL with ±10% jitter so cached upstream calls don't all expire at once
#[must_use]
pub fn jittered_ttl(hours: u32) -> Duration {
    let jitter: f32 = rand::rng().random_range(0.9..1.1);
    Duration::from_secs((f64::from(hours) * 3600.0 * f64::from(jitter)) as u64)
}

fn expand_home(location: &str) -> PathBuf {
    if let Some(rest) = location.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    Path::new(location).to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jittered_ttl_stays_near_nominal() {
        let nominal = Duration::from_secs(24 * 3600);
        for _ in 0..50 {
            let ttl = jittered_ttl(24);
            assert!(ttl >= nominal.mul_f64(0.89), "ttl too short: {ttl:?}");
            assert!(ttl <= nominal.mul_f64(1.11), "ttl too long: {ttl:?}");
        }
    }

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(expand_home("/tmp/cache"), PathBuf::from("/tmp/cache"));
    }

    #[test]
    fn test_expand_home_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/cache"), home.join("cache"));
        }
    }
}
