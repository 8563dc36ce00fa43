//! TTL caching for remote records.
//!
//! This module provides:
//! - A `TtlCache` contract with one TTL per instance, typed per call site
//! - A memory-only variant (`MemoryCache`) and a durable SQLite variant (`SqliteCache`)
//! - Canonical, order-independent key construction (`CacheKey`)
//! - A read-through `CacheLayer` where a missing cache means "always fetch remote"

mod backend;
mod key;
mod layer;
mod memory;
mod storage;
mod traits;

pub use backend::CacheBackend;
pub use key::CacheKey;
pub use layer::CacheLayer;
pub use memory::MemoryCache;
pub use storage::SqliteCache;
pub use traits::{CacheResult, CacheSource, CacheValue, TtlCache};
