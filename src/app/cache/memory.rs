//! Count-bounded in-memory tier with least-recently-used eviction

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;

#[derive(Debug)]
struct Slot {
    bytes: Bytes,
    tick: u64,
}

/// LRU map from item name to bytes
///
/// Recency is tracked with a monotonically increasing tick; the oldest tick
/// is evicted first.
#[derive(Debug)]
pub struct MemoryTier {
    capacity: usize,
    entries: HashMap<String, Slot>,
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl MemoryTier {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            recency: BTreeMap::new(),
            tick: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Look up an item and mark it most recently used
    pub fn get(&mut self, name: &str) -> Option<Bytes> {
        let tick = self.next_tick();
        let slot = self.entries.get_mut(name)?;
        self.recency.remove(&slot.tick);
        slot.tick = tick;
        self.recency.insert(tick, name.to_string());
        Some(slot.bytes.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Insert or replace an item, evicting the least recently used beyond capacity
    pub fn insert(&mut self, name: &str, bytes: Bytes) {
        if self.capacity == 0 {
            return;
        }
        let tick = self.next_tick();
        if let Some(old) = self.entries.insert(name.to_string(), Slot { bytes, tick }) {
            self.recency.remove(&old.tick);
        }
        self.recency.insert(tick, name.to_string());

        while self.entries.len() > self.capacity {
            match self.recency.pop_first() {
                Some((_, evicted)) => {
                    self.entries.remove(&evicted);
                    tracing::trace!("Evicted {} from memory tier", evicted);
                }
                None => break,
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.remove(name) {
            Some(slot) => {
                self.recency.remove(&slot.tick);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
