//! Cache Module
//!
//! Provides in-memory, capacity-bounded caches with LRU eviction: an
//! entry-count bound for file metadata and a byte-size bound for file content.

mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::files::FileRecord;

// Re-export public types
pub use entry::{ByteWeigher, CacheEntry, CountWeigher, Weigher};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{ByteLruCache, CountLruCache, LruCache};

// == Public Constants ==
/// Default number of metadata records kept in memory
pub const DEFAULT_METADATA_CAPACITY: usize = 200;

/// Default byte budget for cached file content
pub const DEFAULT_CONTENT_CAPACITY: usize = 256 * 1024 * 1024; // 256 MB

/// Metadata records keyed by stored filename.
pub type MetadataCache = CountLruCache<FileRecord>;

/// Raw file content keyed by stored filename.
pub type ContentCache = ByteLruCache<Bytes>;

/// Process-wide handle to a cache; every operation runs under the write lock.
pub type SharedCache<C> = Arc<RwLock<C>>;

/// Wraps a cache for sharing across request handlers.
pub fn shared<C>(cache: C) -> SharedCache<C> {
    Arc::new(RwLock::new(cache))
}
