//! Durable TTL cache backed by a single SQLite file.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::traits::{expiry_from_now, is_expired, now_millis, CacheValue, TtlCache};
use crate::logging::Logger;

/// How long to wait for another writer before giving up on a transaction
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Schema for the cache table.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY NOT NULL,
    payload BLOB NOT NULL,
    expires_at INTEGER NOT NULL
);
"#;

/// SQLite-backed cache.
///
/// The file runs in WAL mode, so readers proceed while a writer commits.
/// Reads and writes go through separate connections: a lookup never queues
/// behind a write that is waiting out `BUSY_TIMEOUT` on another process's
/// lock. Several instances (with different TTLs) may share a file.
#[derive(Clone)]
pub struct SqliteCache {
  writer: Arc<Mutex<Connection>>,
  reader: Arc<Mutex<Connection>>,
  path: PathBuf,
  ttl: Duration,
  logger: Logger,
}

impl SqliteCache {
  /// Open (or create) the cache file at `path`.
  pub fn open(path: &Path, ttl: Duration, logger: Logger) -> Result<Self> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let writer = connect(path)?;
    writer
      .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
      .map_err(|e| eyre!("Failed to enable WAL journal: {}", e))?;
    writer
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    // Opened after the journal switch so it attaches in WAL mode
    let reader = connect(path)?;

    Ok(Self {
      writer: Arc::new(Mutex::new(writer)),
      reader: Arc::new(Mutex::new(reader)),
      path: path.to_path_buf(),
      ttl,
      logger,
    })
  }

  /// Open the cache, or log why not and run without one.
  pub fn open_or_disable(path: &Path, ttl: Duration, logger: &Logger) -> Option<Self> {
    match Self::open(path, ttl, logger.clone()) {
      Ok(cache) => Some(cache),
      Err(e) => {
        logger.warn(format!("Cache disabled: {}", e));
        None
      }
    }
  }

  /// Get the default database path ($XDG_CACHE_HOME/inctui/cache.db).
  pub fn default_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
      .ok_or_else(|| eyre!("Could not determine cache directory"))?;

    Ok(cache_dir.join("inctui").join("cache.db"))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Remove every expired entry and return how many were removed.
  ///
  /// Expired keys are collected in a read transaction first and deleted in a
  /// separate write transaction, so the write lock is never held for the scan.
  pub fn cleanup(&self) -> usize {
    match self.try_cleanup() {
      Ok(removed) => {
        if removed > 0 {
          self
            .logger
            .debug(format!("Cache cleanup removed {} expired entries", removed));
        }
        removed
      }
      Err(e) => {
        self.logger.warn(format!("Cache cleanup failed: {}", e));
        0
      }
    }
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self.writer.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>> {
    self.reader.lock().map_err(|e| eyre!("Lock poisoned: {}", e))
  }

  fn read_entry(&self, key: &str) -> Result<Option<(Vec<u8>, i64)>> {
    let mut conn = self.lock_reader()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    let row = tx
      .query_row(
        "SELECT payload, expires_at FROM cache_entries WHERE key = ?1",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;
    tx.commit()?;
    Ok(row)
  }

  fn write_entry(&self, key: &str, payload: &[u8], expires_at: i64) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute(
      "INSERT OR REPLACE INTO cache_entries (key, payload, expires_at) VALUES (?1, ?2, ?3)",
      params![key, payload, expires_at],
    )?;
    tx.commit()?;
    Ok(())
  }

  fn try_delete(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM cache_entries WHERE key = ?1", params![key])?;
    Ok(())
  }

  fn try_clear(&self) -> Result<()> {
    let mut conn = self.lock()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch("DROP TABLE IF EXISTS cache_entries;")?;
    tx.execute_batch(CACHE_SCHEMA)?;
    tx.commit()?;
    Ok(())
  }

  fn try_cleanup(&self) -> Result<usize> {
    let now = now_millis();

    let expired: Vec<String> = {
      let mut conn = self.lock_reader()?;
      let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
      let keys = {
        let mut stmt = tx.prepare("SELECT key, expires_at FROM cache_entries")?;
        let rows = stmt.query_map([], |row| {
          Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        let keys: Vec<String> = rows
          .filter_map(|r| r.ok())
          .filter(|(_, expires_at)| *expires_at <= now)
          .map(|(key, _)| key)
          .collect();
        keys
      };
      tx.commit()?;
      keys
    };

    if expired.is_empty() {
      return Ok(0);
    }

    let mut conn = self.lock()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut removed = 0;
    {
      // Re-check expiry: an entry may have been rewritten between the phases
      let mut stmt = tx.prepare("DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2")?;
      for key in &expired {
        removed += stmt.execute(params![key, now])?;
      }
    }
    tx.commit()?;
    Ok(removed)
  }

  /// Drop an expired entry off the read path, on a blocking worker.
  fn schedule_expiry(&self, key: &str) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
      return;
    };
    let conn = Arc::clone(&self.writer);
    let logger = self.logger.clone();
    let key = key.to_string();
    handle.spawn_blocking(move || {
      let Ok(conn) = conn.lock() else {
        return;
      };
      if let Err(e) = conn.execute(
        "DELETE FROM cache_entries WHERE key = ?1 AND expires_at <= ?2",
        params![key, now_millis()],
      ) {
        logger.debug(format!("Deferred expiry of {} skipped: {}", key, e));
      }
    });
  }
}

fn connect(path: &Path) -> Result<Connection> {
  let conn = Connection::open(path)
    .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
  conn
    .busy_timeout(BUSY_TIMEOUT)
    .map_err(|e| eyre!("Failed to set busy timeout: {}", e))?;
  Ok(conn)
}

impl TtlCache for SqliteCache {
  fn ttl(&self) -> Duration {
    self.ttl
  }

  fn get<T: CacheValue>(&self, key: &str) -> Option<T> {
    let (payload, expires_at) = match self.read_entry(key) {
      Ok(Some(row)) => row,
      Ok(None) => return None,
      Err(e) => {
        self.logger.warn(format!("Cache read of {} failed: {}", key, e));
        return None;
      }
    };

    if is_expired(expires_at) {
      self.schedule_expiry(key);
      return None;
    }

    match serde_json::from_slice(&payload) {
      Ok(value) => Some(value),
      Err(e) => {
        self
          .logger
          .debug(format!("Cache entry {} could not be decoded: {}", key, e));
        None
      }
    }
  }

  fn set<T: CacheValue>(&self, key: &str, value: &T) {
    let payload = match serde_json::to_vec(value) {
      Ok(payload) => payload,
      Err(e) => {
        self
          .logger
          .warn(format!("Failed to serialize cache entry {}: {}", key, e));
        return;
      }
    };

    if let Err(e) = self.write_entry(key, &payload, expiry_from_now(self.ttl)) {
      self
        .logger
        .warn(format!("Cache write of {} skipped: {}", key, e));
    }
  }

  fn delete(&self, key: &str) {
    if let Err(e) = self.try_delete(key) {
      self
        .logger
        .warn(format!("Cache delete of {} skipped: {}", key, e));
    }
  }

  fn clear(&self) {
    if let Err(e) = self.try_clear() {
      self.logger.warn(format!("Cache clear failed: {}", e));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde::{Deserialize, Serialize};
  use tempfile::TempDir;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct TestData {
    name: String,
    value: i32,
  }

  fn test_data(value: i32) -> TestData {
    TestData {
      name: format!("item-{}", value),
      value,
    }
  }

  fn open(dir: &TempDir, ttl: Duration) -> SqliteCache {
    SqliteCache::open(&dir.path().join("cache.db"), ttl, Logger::new(16)).unwrap()
  }

  fn row_count(cache: &SqliteCache) -> i64 {
    let conn = cache.lock().unwrap();
    conn
      .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))
      .unwrap()
  }

  #[test]
  fn test_set_then_get() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::from_secs(60));

    cache.set("k", &test_data(1));
    assert_eq!(cache.get::<TestData>("k"), Some(test_data(1)));
  }

  #[test]
  fn test_expired_entry_is_miss_while_still_stored() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::ZERO);

    cache.set("k", &test_data(1));
    assert_eq!(cache.get::<TestData>("k"), None);
    assert_eq!(row_count(&cache), 1);
  }

  #[tokio::test]
  async fn test_expired_entry_is_removed_in_background() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::ZERO);

    cache.set("k", &test_data(1));
    assert_eq!(cache.get::<TestData>("k"), None);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(row_count(&cache), 0);
  }

  #[test]
  fn test_cleanup_removes_only_expired() {
    let dir = TempDir::new().unwrap();
    let short = open(&dir, Duration::ZERO);
    let long = open(&dir, Duration::from_secs(3600));

    short.set("expired", &test_data(1));
    long.set("live", &test_data(2));

    assert_eq!(long.cleanup(), 1);
    assert_eq!(long.get::<TestData>("live"), Some(test_data(2)));
    assert_eq!(row_count(&long), 1);

    // Nothing left to remove
    assert_eq!(short.cleanup(), 0);
  }

  #[test]
  fn test_visible_to_fresh_instance() {
    let dir = TempDir::new().unwrap();
    {
      let cache = open(&dir, Duration::from_secs(60));
      cache.set("list", &vec![test_data(1), test_data(2)]);
    }

    let reopened = open(&dir, Duration::from_secs(60));
    assert_eq!(
      reopened.get::<Vec<TestData>>("list"),
      Some(vec![test_data(1), test_data(2)])
    );
  }

  #[test]
  fn test_locked_write_is_skipped_and_logged() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cache.db");
    let logger = Logger::new(16);
    let cache = SqliteCache::open(&path, Duration::from_secs(60), logger.clone()).unwrap();
    cache.set("live", &1u32);

    // Another process holds the write lock past the busy timeout
    let other = Connection::open(&path).unwrap();
    other.execute_batch("BEGIN IMMEDIATE;").unwrap();

    cache.set("k", &2u32);

    // Reads are unaffected by the held write lock
    assert_eq!(cache.get::<u32>("live"), Some(1));
    assert_eq!(cache.get::<u32>("k"), None);
    let logged = logger.recent();
    assert!(logged
      .iter()
      .any(|r| r.message.starts_with("Cache write of k skipped")));

    other.execute_batch("ROLLBACK;").unwrap();
    cache.set("k", &3u32);
    assert_eq!(cache.get::<u32>("k"), Some(3));
  }

  #[test]
  fn test_type_mismatch_is_miss() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::from_secs(60));

    cache.set("k", &"not a struct".to_string());
    assert_eq!(cache.get::<TestData>("k"), None);

    // The bad entry is superseded by the next write
    cache.set("k", &test_data(3));
    assert_eq!(cache.get::<TestData>("k"), Some(test_data(3)));
  }

  #[test]
  fn test_clear_recreates_table() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::from_secs(60));
    let key = "incidents:page=1:pageSize=25";

    cache.set(key, &vec![test_data(1)]);
    cache.clear();

    assert_eq!(cache.get::<Vec<TestData>>(key), None);
    cache.set(key, &vec![test_data(2)]);
    assert_eq!(cache.get::<Vec<TestData>>(key), Some(vec![test_data(2)]));
  }

  #[test]
  fn test_delete() {
    let dir = TempDir::new().unwrap();
    let cache = open(&dir, Duration::from_secs(60));

    cache.set("a", &1u32);
    cache.set("b", &2u32);
    cache.delete("a");

    assert_eq!(cache.get::<u32>("a"), None);
    assert_eq!(cache.get::<u32>("b"), Some(2));
  }

  #[test]
  fn test_open_or_disable_degrades() {
    let dir = TempDir::new().unwrap();
    // A regular file where the parent directory should be
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"x").unwrap();

    let logger = Logger::new(16);
    let cache = SqliteCache::open_or_disable(
      &blocker.join("cache.db"),
      Duration::from_secs(60),
      &logger,
    );

    assert!(cache.is_none());
    assert!(logger.recent()[0].message.starts_with("Cache disabled"));
  }

  #[test]
  fn test_deleted_file_behaves_like_clear() {
    let dir = TempDir::new().unwrap();
    {
      let cache = open(&dir, Duration::from_secs(60));
      cache.set("k", &test_data(1));
    }
    std::fs::remove_file(dir.path().join("cache.db")).unwrap();
    let _ = std::fs::remove_file(dir.path().join("cache.db-wal"));
    let _ = std::fs::remove_file(dir.path().join("cache.db-shm"));

    let cache = open(&dir, Duration::from_secs(60));
    assert_eq!(cache.get::<TestData>("k"), None);
  }
}
