//! In-process TTL cache.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::traits::{expiry_from_now, is_expired, CacheValue, TtlCache};
use crate::logging::Logger;

struct MemoryEntry {
  value: Arc<dyn Any + Send + Sync>,
  expires_at: i64,
}

type EntryMap = HashMap<String, MemoryEntry>;

/// Every this many writes, expired entries are swept from the map
const SWEEP_EVERY: usize = 64;

/// Memory-only cache guarded by a reader/writer lock.
///
/// Values are stored typed, so a hit is a clone rather than a decode.
/// Expired entries that are never read again (old detail version stamps) are
/// dropped by a periodic sweep on the write path, so the map holds at most
/// `SWEEP_EVERY` dead entries beyond the live ones.
#[derive(Clone)]
pub struct MemoryCache {
  entries: Arc<RwLock<EntryMap>>,
  writes: Arc<AtomicUsize>,
  ttl: Duration,
  logger: Logger,
}

impl MemoryCache {
  pub fn new(ttl: Duration, logger: Logger) -> Self {
    Self {
      entries: Arc::new(RwLock::new(HashMap::new())),
      writes: Arc::new(AtomicUsize::new(0)),
      ttl,
      logger,
    }
  }

  /// Number of physically stored entries, expired ones included.
  pub fn len(&self) -> usize {
    self.entries.read().map(|m| m.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Drop an expired entry off the read path.
  ///
  /// Runs on the tokio runtime when there is one; otherwise the entry simply
  /// stays until it is overwritten or cleared.
  fn schedule_expiry(&self, key: &str) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
      return;
    };
    let entries = Arc::clone(&self.entries);
    let key = key.to_string();
    handle.spawn(async move {
      if let Ok(mut map) = entries.write() {
        // A fresh write may have landed since the read
        if map.get(&key).is_some_and(|e| is_expired(e.expires_at)) {
          map.remove(&key);
        }
      }
    });
  }
}

impl TtlCache for MemoryCache {
  fn ttl(&self) -> Duration {
    self.ttl
  }

  fn get<T: CacheValue>(&self, key: &str) -> Option<T> {
    let value = {
      let map = match self.entries.read() {
        Ok(map) => map,
        Err(e) => {
          self.logger.warn(format!("Memory cache lock poisoned: {}", e));
          return None;
        }
      };
      let entry = map.get(key)?;
      if is_expired(entry.expires_at) {
        None
      } else {
        Some(Arc::clone(&entry.value))
      }
    };

    let Some(value) = value else {
      self.schedule_expiry(key);
      return None;
    };

    match value.downcast_ref::<T>() {
      Some(v) => Some(v.clone()),
      None => {
        self
          .logger
          .debug(format!("Cache entry {} holds a different type, treating as miss", key));
        None
      }
    }
  }

  fn set<T: CacheValue>(&self, key: &str, value: &T) {
    let entry = MemoryEntry {
      value: Arc::new(value.clone()),
      expires_at: expiry_from_now(self.ttl),
    };
    let sweep = (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0;
    match self.entries.write() {
      Ok(mut map) => {
        map.insert(key.to_string(), entry);
        if sweep {
          map.retain(|_, e| !is_expired(e.expires_at));
        }
      }
      Err(e) => self.logger.warn(format!("Memory cache lock poisoned: {}", e)),
    }
  }

  fn delete(&self, key: &str) {
    if let Ok(mut map) = self.entries.write() {
      map.remove(key);
    }
  }

  fn clear(&self) {
    let old = match self.entries.write() {
      Ok(mut map) => std::mem::take(&mut *map),
      Err(_) => return,
    };
    // Free the old entries outside the lock
    drop(old);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct TestData {
    name: String,
    value: i32,
  }

  fn test_data() -> TestData {
    TestData {
      name: "test".to_string(),
      value: 42,
    }
  }

  fn cache(ttl: Duration) -> MemoryCache {
    MemoryCache::new(ttl, Logger::new(16))
  }

  #[test]
  fn test_set_then_get() {
    let cache = cache(Duration::from_secs(60));
    cache.set("k", &test_data());
    assert_eq!(cache.get::<TestData>("k"), Some(test_data()));
  }

  #[test]
  fn test_missing_key() {
    let cache = cache(Duration::from_secs(60));
    assert_eq!(cache.get::<TestData>("nope"), None);
  }

  #[test]
  fn test_expired_entry_is_miss_while_still_stored() {
    let cache = cache(Duration::ZERO);
    cache.set("k", &test_data());

    assert_eq!(cache.get::<TestData>("k"), None);
    // No runtime here, so nothing removed it
    assert_eq!(cache.len(), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_is_removed_in_background() {
    let cache = cache(Duration::ZERO);
    cache.set("k", &test_data());

    assert_eq!(cache.get::<TestData>("k"), None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(cache.is_empty());
  }

  #[test]
  fn test_write_path_sweeps_unread_expired_entries() {
    let cache = cache(Duration::ZERO);
    for i in 0..SWEEP_EVERY - 1 {
      cache.set(&format!("incident-detail:id=INC-1:version=v{}", i), &i);
    }
    // Never read back, so nothing has removed them yet
    assert_eq!(cache.len(), SWEEP_EVERY - 1);

    cache.set("incident-detail:id=INC-1:version=latest", &0usize);
    assert!(cache.is_empty());
  }

  #[test]
  fn test_sweep_keeps_live_entries() {
    let cache = cache(Duration::from_secs(60));
    for i in 0..SWEEP_EVERY * 2 {
      cache.set(&format!("k{}", i), &i);
    }
    assert_eq!(cache.len(), SWEEP_EVERY * 2);
    assert_eq!(cache.get::<usize>("k0"), Some(0));
  }

  #[test]
  fn test_type_mismatch_is_miss() {
    let cache = cache(Duration::from_secs(60));
    cache.set("k", &test_data());
    assert_eq!(cache.get::<String>("k"), None);
  }

  #[test]
  fn test_set_overwrites() {
    let cache = cache(Duration::from_secs(60));
    cache.set("k", &"first".to_string());
    cache.set("k", &"second".to_string());
    assert_eq!(cache.get::<String>("k"), Some("second".to_string()));
  }

  #[test]
  fn test_delete_and_clear() {
    let cache = cache(Duration::from_secs(60));
    cache.set("a", &1u32);
    cache.set("b", &2u32);

    cache.delete("a");
    assert_eq!(cache.get::<u32>("a"), None);
    assert_eq!(cache.get::<u32>("b"), Some(2));

    cache.clear();
    assert!(cache.is_empty());
  }

  #[test]
  fn test_clear_then_miss() {
    let cache = cache(Duration::from_secs(60));
    let key = "incidents:page=1:pageSize=25";
    cache.set(key, &vec![test_data()]);
    cache.clear();
    assert_eq!(cache.get::<Vec<TestData>>(key), None);
  }

  #[test]
  fn test_concurrent_readers_and_writers() {
    let cache = cache(Duration::from_secs(60));
    let handles: Vec<_> = (0..8)
      .map(|i| {
        let cache = cache.clone();
        std::thread::spawn(move || {
          for j in 0..100u32 {
            let key = format!("k{}", j % 10);
            cache.set(&key, &(i * 1000 + j));
            let _ = cache.get::<u32>(&key);
          }
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }
    assert_eq!(cache.len(), 10);
  }
}
