//! # Second-Chance Eviction Cache
//!
//! Fixed-capacity key/value store with CLOCK replacement.
//!
//! ## Algorithm
//!
//! Slots form a circular array with a moving cursor. Every read hit sets the
//! slot's `referenced` flag. Once the cache is full, `add` scans from the
//! cursor: a referenced slot has its flag cleared and is passed over, and the
//! first unreferenced slot is evicted and reused. Entries that keep getting
//! read survive any number of passes, while entries that are never read again
//! are reclaimed within one full turn of the cursor.
//!
//! ```text
//!            cursor
//!              │
//!   ┌─────┬────▼┬─────┬─────┐
//!   │ A:1 │ B:0 │ C:1 │ D:0 │   add(E) → B evicted, E takes its slot
//!   └─────┴─────┴─────┴─────┘
//! ```
//!
//! ## Concurrency
//!
//! - `get` holds the read lock and flips the flag through an `AtomicBool`,
//!   so lookups proceed in parallel.
//! - `add` holds the write lock for the whole scan, so the index and the slot
//!   array always change together.

use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};

/// One occupied slot.
struct CacheSlot<K, V> {
    key: K,
    value: V,
    /// Set on every read hit, cleared by the eviction scan.
    referenced: AtomicBool,
}

impl<K, V> CacheSlot<K, V> {
    fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            referenced: AtomicBool::new(false),
        }
    }
}

/// Slot array, key index and cursor. Only ever mutated under the write lock.
struct SlotTable<K, V> {
    /// Occupied slots. Grows until capacity, then slots are only replaced.
    slots: Vec<CacheSlot<K, V>>,
    /// Key -> position in `slots`.
    index: HashMap<K, usize>,
    /// Next slot the eviction scan inspects.
    cursor: usize,
}

/// Bounded cache with second-chance (CLOCK) replacement.
///
/// Values are returned by clone, so large values should be wrapped in `Arc`.
/// The cache is internally synchronized and can be shared across threads.
pub struct SecondChanceCache<K, V> {
    capacity: NonZeroUsize,
    table: RwLock<SlotTable<K, V>>,
}

impl<K, V> SecondChanceCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        let cap = capacity.get();
        Self {
            capacity,
            table: RwLock::new(SlotTable {
                slots: Vec::with_capacity(cap),
                index: HashMap::with_capacity(cap),
                cursor: 0,
            }),
        }
    }

    /// Look up `key`, marking the entry as recently used on a hit.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let table = self.table.read();
        let slot = &table.slots[*table.index.get(key)?];
        slot.referenced.store(true, Ordering::Relaxed);
        Some(slot.value.clone())
    }

    /// Insert or overwrite `key`.
    ///
    /// Returns the key that was evicted to make room, if any. Overwriting an
    /// existing key counts as a use and never evicts.
    pub fn add(&self, key: K, value: V) -> Option<K> {
        let mut guard = self.table.write();
        let table = &mut *guard;

        if let Some(&position) = table.index.get(&key) {
            let slot = &mut table.slots[position];
            slot.value = value;
            *slot.referenced.get_mut() = true;
            return None;
        }

        if table.slots.len() < self.capacity.get() {
            table.index.insert(key.clone(), table.slots.len());
            table.slots.push(CacheSlot::new(key, value));
            return None;
        }

        // Full: terminates within two turns since each pass clears every flag.
        loop {
            let position = table.cursor;
            table.cursor = (position + 1) % self.capacity.get();

            let victim = &mut table.slots[position];
            if std::mem::take(victim.referenced.get_mut()) {
                continue;
            }

            let evicted = std::mem::replace(victim, CacheSlot::new(key.clone(), value));
            table.index.remove(&evicted.key);
            table.index.insert(key, position);
            return Some(evicted.key);
        }
    }

    /// Whether `key` is cached. Does not count as a use.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.read().index.contains_key(key)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.table.read().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let table = self.table.read();
        assert!(table.slots.len() <= self.capacity.get());
        assert_eq!(table.slots.len(), table.index.len());
        for (key, &position) in &table.index {
            assert!(table.slots[position].key == *key);
        }
        assert!(table.cursor < self.capacity.get());
    }
}

impl<K, V> fmt::Debug for SecondChanceCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.table.read();
        f.debug_struct("SecondChanceCache")
            .field("len", &table.slots.len())
            .field("capacity", &self.capacity)
            .field("cursor", &table.cursor)
            .finish()
    }
}
