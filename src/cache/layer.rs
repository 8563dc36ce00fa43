//! Cache layer that orchestrates cache lookups with remote fetching.

use std::future::Future;
use std::sync::Arc;

use super::traits::{CacheResult, CacheValue, TtlCache};

/// Read-through layer over an optional cache.
///
/// A layer without a cache is a plain pass-through: every lookup goes to the
/// fetcher. Failed fetches are returned as-is and never stored.
pub struct CacheLayer<C: TtlCache> {
  cache: Option<Arc<C>>,
}

impl<C: TtlCache> CacheLayer<C> {
  /// Create a new cache layer, or a pass-through one for `None`.
  pub fn new(cache: Option<C>) -> Self {
    Self {
      cache: cache.map(Arc::new),
    }
  }

  pub fn is_enabled(&self) -> bool {
    self.cache.is_some()
  }

  pub fn cache(&self) -> Option<&C> {
    self.cache.as_deref()
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - if live, return immediately
  /// 2. On a miss, fetch from the remote source
  /// 3. On success, populate the cache and return
  /// 4. On failure, return the error without touching the cache
  pub async fn fetch<T, E, F, Fut>(&self, key: &str, fetcher: F) -> Result<CacheResult<T>, E>
  where
    T: CacheValue,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if let Some(cache) = &self.cache {
      if let Some(data) = cache.get::<T>(key) {
        return Ok(CacheResult::from_cache(data));
      }
    }

    let data = fetcher().await?;
    if let Some(cache) = &self.cache {
      cache.set(key, &data);
    }
    Ok(CacheResult::from_network(data))
  }

  /// Remove every entry.
  pub fn clear(&self) {
    if let Some(cache) = &self.cache {
      cache.clear();
    }
  }
}

impl<C: TtlCache> Clone for CacheLayer<C> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, MemoryCache};
  use crate::logging::Logger;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::time::Duration;

  fn layer() -> CacheLayer<MemoryCache> {
    CacheLayer::new(Some(MemoryCache::new(
      Duration::from_secs(60),
      Logger::new(16),
    )))
  }

  #[tokio::test]
  async fn test_second_fetch_is_served_from_cache() {
    let layer = layer();
    let calls = AtomicU32::new(0);
    let key = "incidents:page=1:pageSize=25";

    for expected in [CacheSource::Network, CacheSource::Cache] {
      let result = layer
        .fetch(key, || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok::<_, String>(vec![1, 2, 3])
        })
        .await
        .unwrap();
      assert_eq!(result.data, vec![1, 2, 3]);
      assert_eq!(result.source, expected);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_errors_are_not_cached() {
    let layer = layer();

    let failed = layer
      .fetch("k", || async { Err::<u32, _>("boom".to_string()) })
      .await;
    assert_eq!(failed.unwrap_err(), "boom");

    let retried = layer
      .fetch("k", || async { Ok::<_, String>(7u32) })
      .await
      .unwrap();
    assert_eq!(retried.data, 7);
    assert_eq!(retried.source, CacheSource::Network);
  }

  #[tokio::test]
  async fn test_disabled_layer_always_fetches() {
    let layer: CacheLayer<MemoryCache> = CacheLayer::new(None);
    let calls = AtomicU32::new(0);

    for _ in 0..3 {
      let result = layer
        .fetch("k", || async {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok::<_, String>(1u32)
        })
        .await
        .unwrap();
      assert_eq!(result.source, CacheSource::Network);
    }

    assert!(!layer.is_enabled());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_clear_forces_refetch() {
    let layer = layer();
    layer
      .fetch("k", || async { Ok::<_, String>(1u32) })
      .await
      .unwrap();
    layer.clear();

    let result = layer
      .fetch("k", || async { Ok::<_, String>(2u32) })
      .await
      .unwrap();
    assert_eq!(result.data, 2);
  }
}
