//! Runtime selection between cache variants.

use std::time::Duration;

use super::memory::MemoryCache;
use super::storage::SqliteCache;
use super::traits::{CacheValue, TtlCache};

/// A cache variant chosen from configuration.
#[derive(Clone)]
pub enum CacheBackend {
  Memory(MemoryCache),
  Sqlite(SqliteCache),
}

impl CacheBackend {
  /// Purge expired entries where the variant supports it.
  pub fn cleanup(&self) -> usize {
    match self {
      CacheBackend::Memory(_) => 0,
      CacheBackend::Sqlite(cache) => cache.cleanup(),
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      CacheBackend::Memory(_) => "memory",
      CacheBackend::Sqlite(_) => "sqlite",
    }
  }
}

impl TtlCache for CacheBackend {
  fn ttl(&self) -> Duration {
    match self {
      CacheBackend::Memory(cache) => cache.ttl(),
      CacheBackend::Sqlite(cache) => cache.ttl(),
    }
  }

  fn get<T: CacheValue>(&self, key: &str) -> Option<T> {
    match self {
      CacheBackend::Memory(cache) => cache.get(key),
      CacheBackend::Sqlite(cache) => cache.get(key),
    }
  }

  fn set<T: CacheValue>(&self, key: &str, value: &T) {
    match self {
      CacheBackend::Memory(cache) => cache.set(key, value),
      CacheBackend::Sqlite(cache) => cache.set(key, value),
    }
  }

  fn delete(&self, key: &str) {
    match self {
      CacheBackend::Memory(cache) => cache.delete(key),
      CacheBackend::Sqlite(cache) => cache.delete(key),
    }
  }

  fn clear(&self) {
    match self {
      CacheBackend::Memory(cache) => cache.clear(),
      CacheBackend::Sqlite(cache) => cache.clear(),
    }
  }
}

impl From<MemoryCache> for CacheBackend {
  fn from(cache: MemoryCache) -> Self {
    CacheBackend::Memory(cache)
  }
}

impl From<SqliteCache> for CacheBackend {
  fn from(cache: SqliteCache) -> Self {
    CacheBackend::Sqlite(cache)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::logging::Logger;
  use tempfile::TempDir;

  #[test]
  fn test_both_variants_share_contract() {
    let dir = TempDir::new().unwrap();
    let logger = Logger::new(16);
    let ttl = Duration::from_secs(60);
    let backends: Vec<CacheBackend> = vec![
      MemoryCache::new(ttl, logger.clone()).into(),
      SqliteCache::open(&dir.path().join("cache.db"), ttl, logger)
        .unwrap()
        .into(),
    ];

    for backend in backends {
      let key = "incidents:page=1:pageSize=25";
      backend.set(key, &vec!["a".to_string(), "b".to_string()]);
      assert_eq!(
        backend.get::<Vec<String>>(key),
        Some(vec!["a".to_string(), "b".to_string()]),
        "{} backend",
        backend.kind()
      );
      assert_eq!(backend.ttl(), ttl);

      backend.delete(key);
      assert_eq!(backend.get::<Vec<String>>(key), None);

      backend.set(key, &1u8);
      backend.clear();
      assert_eq!(backend.get::<u8>(key), None);
      assert_eq!(backend.cleanup(), 0);
    }
  }
}
