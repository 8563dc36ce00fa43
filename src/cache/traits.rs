//! Core traits and types for the caching system.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

/// Values that can live in any cache variant.
///
/// The memory variant keeps the typed value; the durable variant keeps its JSON
/// encoding. Reading a key back as a different type is a miss.
pub trait CacheValue: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

impl<T> CacheValue for T where T: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {}

/// Key/value store with a wall-clock time-to-live fixed at construction.
///
/// All operations absorb their own failures: a broken cache behaves like an
/// empty one and never surfaces an error to the caller.
pub trait TtlCache: Send + Sync {
  /// TTL applied to every entry written through this instance
  fn ttl(&self) -> Duration;

  /// Look up a live entry. Expired, missing or undecodable entries are misses.
  fn get<T: CacheValue>(&self, key: &str) -> Option<T>;

  /// Write an entry, replacing whatever was stored under `key`.
  fn set<T: CacheValue>(&self, key: &str, value: &T);

  fn delete(&self, key: &str);

  /// Remove every entry.
  fn clear(&self);
}

/// Result from a read-through lookup, including where the data came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
    }
  }
}

/// Indicates where data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the remote source
  Network,
  /// Live cache entry
  Cache,
}

/// Current wall-clock time in Unix milliseconds.
pub(crate) fn now_millis() -> i64 {
  Utc::now().timestamp_millis()
}

/// Expiry timestamp (Unix milliseconds) for an entry written now.
pub(crate) fn expiry_from_now(ttl: Duration) -> i64 {
  let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
  now_millis().saturating_add(ttl_ms)
}

/// An entry is expired once the clock reaches its expiry, so a zero TTL
/// expires immediately.
pub(crate) fn is_expired(expires_at: i64) -> bool {
  now_millis() >= expires_at
}
