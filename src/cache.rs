//! Bounded, thread-safe LRU cache of file contents.
//!
//! Entries live in a `Vec` arena and are linked into a recency list by
//! index, so no node ever holds a pointer to another. A `HashMap` maps each
//! key to its slot. The whole structure sits behind one `Mutex`: `get`
//! reorders the list, so there is no read-only path worth a shared lock.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::CacheError;

/// Null link in the recency list.
const NIL: usize = usize::MAX;

#[derive(Debug)]
struct Entry {
    key: String,
    value: Arc<[u8]>,
    more_recent: usize,
    less_recent: usize,
}

/// Hit/miss/put counters. Observational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
}

struct Inner {
    slots: Vec<Entry>,
    index: HashMap<String, usize>,
    head: usize, // MRU
    tail: usize, // LRU
    capacity: usize,
    stats: CacheStats,
}

impl Inner {
    fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
            head: NIL,
            tail: NIL,
            capacity,
            stats: CacheStats::default(),
        }
    }

    fn get(&mut self, key: &str) -> Option<Arc<[u8]>> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.misses += 1;
            return None;
        };
        self.stats.hits += 1;
        self.promote(idx);
        Some(Arc::clone(&self.slots[idx].value))
    }

    /// Insert or update `key`, returning the key evicted to make room, if any.
    fn put(&mut self, key: String, value: Arc<[u8]>) -> Option<String> {
        self.stats.puts += 1;

        if let Some(&idx) = self.index.get(&key) {
            self.slots[idx].value = value;
            self.promote(idx);
            return None;
        }

        let entry = Entry {
            key: key.clone(),
            value,
            more_recent: NIL,
            less_recent: NIL,
        };

        // At capacity the tail's slot is handed straight to the new entry,
        // so the arena never grows past `capacity`.
        let (idx, evicted) = if self.index.len() >= self.capacity {
            let lru = self.tail;
            self.detach(lru);
            let old = mem::replace(&mut self.slots[lru], entry);
            self.index.remove(&old.key);
            (lru, Some(old.key))
        } else {
            self.slots.push(entry);
            (self.slots.len() - 1, None)
        };

        self.index.insert(key, idx);
        self.attach_front(idx);
        evicted
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
        self.head = NIL;
        self.tail = NIL;
        self.stats = CacheStats::default();
    }

    fn promote(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.detach(idx);
        self.attach_front(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let e = &mut self.slots[idx];
            let links = (e.more_recent, e.less_recent);
            e.more_recent = NIL;
            e.less_recent = NIL;
            links
        };

        if prev != NIL {
            self.slots[prev].less_recent = next;
        } else {
            self.head = next;
        }

        if next != NIL {
            self.slots[next].more_recent = prev;
        } else {
            self.tail = prev;
        }
    }

    fn attach_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let e = &mut self.slots[idx];
            e.more_recent = NIL;
            e.less_recent = old_head;
        }
        if old_head != NIL {
            self.slots[old_head].more_recent = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    /// Walk the list from MRU to LRU.
    fn iter(&self) -> impl Iterator<Item = &Entry> + '_ {
        let mut cur = self.head;
        std::iter::from_fn(move || {
            if cur == NIL {
                return None;
            }
            let e = &self.slots[cur];
            cur = e.less_recent;
            Some(e)
        })
    }
}

/// Thread-safe Least Recently Used (LRU) cache mapping file paths to bytes.
///
/// - O(1) `get`/`put` with strict recency ordering.
/// - Evicts exactly the least recently used key when a new key would push the
///   size past capacity. Updating an existing key never evicts.
/// - Safe for concurrent access via a single `Mutex` over the whole state.
///
/// Values are stored as `Arc<[u8]>`. A hit hands out a shared immutable view,
/// so no caller can mutate what the cache holds.
pub struct BoundedLruCache {
    inner: Mutex<Inner>,
}

impl BoundedLruCache {
    /// Create a new cache with a fixed positive capacity.
    ///
    /// Returns [`CacheError::ZeroCapacity`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::ZeroCapacity);
        }
        Ok(Self {
            inner: Mutex::new(Inner::new(capacity)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Get the bytes stored for `key`, marking it as most recently used.
    ///
    /// Returns `None` on a miss. A miss is counted, not reported as an error.
    pub fn get(&self, key: &str) -> Option<Arc<[u8]>> {
        self.lock().get(key)
    }

    /// Insert or replace the bytes for `key` and move it to the MRU position.
    ///
    /// Inserting a new key into a full cache evicts the LRU key.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Arc<[u8]>>) {
        let value = value.into();
        let size = value.len();
        let evicted = self.lock().put(key.into(), value);

        match evicted {
            Some(evicted) => debug!(size, evicted = %evicted, "cache put evicted LRU entry"),
            None => debug!(size, "cache put"),
        }
    }

    /// Whether `key` is cached. Does not touch recency order or stats.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    /// Current number of entries, never more than [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.lock().index.len()
    }

    /// Returns true if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fixed maximum number of entries, set at construction.
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Current hit/miss/put counters.
    pub fn stats(&self) -> CacheStats {
        self.lock().stats
    }

    /// Returns the current LRU order from most-recent (head) to least-recent (tail).
    ///
    /// Intended for debugging/observability and tests.
    pub fn debug_order(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.key.clone()).collect()
    }

    /// Consistent point-in-time view of the cache, taken under one lock.
    pub fn snapshot(&self) -> CacheSnapshot {
        let inner = self.lock();
        CacheSnapshot {
            capacity: inner.capacity,
            entries: inner
                .iter()
                .map(|e| (e.key.clone(), e.value.len()))
                .collect(),
            stats: inner.stats,
        }
    }

    /// Emit the current [`CacheSnapshot`] at debug level.
    pub fn log_state(&self) {
        let snapshot = self.snapshot();
        debug!("cache state\n{snapshot}");
    }
}

impl fmt::Debug for BoundedLruCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("BoundedLruCache")
            .field("capacity", &inner.capacity)
            .field("len", &inner.index.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

/// Snapshot of cache contents for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub capacity: usize,
    /// `(key, size in bytes)` pairs, MRU first.
    pub entries: Vec<(String, usize)>,
    pub stats: CacheStats,
}

impl fmt::Display for CacheSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
        keys.sort_unstable();

        writeln!(f, "map size {}", self.entries.len())?;
        writeln!(f, "keys in map: [{}]", keys.join(", "))?;
        write!(f, "MRU -> ")?;
        for (key, size) in &self.entries {
            write!(f, "[{key}, {size}] -> ")?;
        }
        writeln!(f, "LRU")?;
        writeln!(f, "hits: {}", self.stats.hits)?;
        writeln!(f, "misses: {}", self.stats.misses)?;
        write!(f, "puts: {}", self.stats.puts)
    }
}
