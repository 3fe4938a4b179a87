//! Response cache
//!
//! Bounded store for single-entity reads. Eviction is oldest-inserted-first
//! once the population exceeds the configured maximum.

use indexmap::IndexMap;
use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

type CachedValue = Arc<dyn Any + Send + Sync>;

pub const DEFAULT_MAX_CACHE_SIZE: usize = 100;

pub struct ResponseCache {
    max_size: usize,
    entries: Mutex<IndexMap<String, CachedValue>>,
}

impl ResponseCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Cached value for `key`; a value stored under a different type is a miss
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = self.entries.lock();
        entries.get(key)?.downcast_ref::<T>().cloned()
    }

    /// Store `value` and evict the oldest entries beyond the bound
    pub fn insert<T>(&self, key: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut entries = self.entries.lock();
        let key = key.into();

        // Re-inserting moves the key to the back of the eviction order
        entries.shift_remove(&key);
        entries.insert(key, Arc::new(value));

        while entries.len() > self.max_size {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::trace!("Evicted cache entry {}", evicted);
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CACHE_SIZE)
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("max_size", &self.max_size)
            .field("len", &self.len())
            .finish()
    }
}
