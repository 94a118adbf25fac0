//! Entry Store Module
//!
//! Hash index plus an arena-backed recency list, the storage layer
//! behind LRU eviction.
//!
//! A `HashMap` maps each key to a slot index in a `Vec` arena, and the
//! occupied slots form a doubly linked list ordered by recency: head is
//! the most recently used entry, tail the least. Index links with a
//! sentinel value replace pointers, so promotion, removal and eviction
//! are all O(1) without unsafe code. Freed slots are recycled through a
//! free list.
//!
//! The store is agnostic of expiry: it keeps whatever it is given, and
//! the caller decides which entries still count as live.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::CacheEntry;

/// Sentinel index for absent links in the recency list.
const NIL: usize = usize::MAX;

/// One arena slot: a key, its entry, and its recency-list links.
#[derive(Debug)]
struct Slot<V> {
    key: String,
    entry: Option<CacheEntry<V>>,
    prev: usize,
    next: usize,
}

// == Entry Store ==
/// Key-indexed storage with O(1) lookup, promotion and LRU eviction.
#[derive(Debug)]
pub(crate) struct EntryStore<V> {
    /// Key to arena slot index
    index: HashMap<String, usize>,
    /// Slot arena; occupied slots are linked in recency order
    arena: Vec<Slot<V>>,
    /// Most recently used slot
    head: usize,
    /// Least recently used slot
    tail: usize,
    /// Head of the free slot list
    free: usize,
}

impl<V> EntryStore<V> {
    // == Constructor ==
    /// Creates an empty store, pre-sized for `initial_capacity` entries.
    pub(crate) fn new(initial_capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(initial_capacity),
            arena: Vec::with_capacity(initial_capacity),
            head: NIL,
            tail: NIL,
            free: NIL,
        }
    }

    // == Length ==
    /// Returns the number of resident entries.
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Lookup ==
    /// Returns the entry for `key` without touching recency order.
    pub(crate) fn lookup(&self, key: &str) -> Option<&CacheEntry<V>> {
        let idx = *self.index.get(key)?;
        self.arena[idx].entry.as_ref()
    }

    // == Touch ==
    /// Promotes `key` to the most-recently-used position, if present.
    pub(crate) fn touch(&mut self, key: &str) {
        if let Some(&idx) = self.index.get(key) {
            self.move_to_head(idx);
        }
    }

    // == Insert Or Update ==
    /// Inserts `key` at the most-recently-used position, or overwrites
    /// an existing entry's value and timestamp and promotes it.
    ///
    /// Returns the entry previously stored under `key`, if any.
    pub(crate) fn insert_or_update(
        &mut self,
        key: &str,
        value: V,
        now: Instant,
    ) -> Option<CacheEntry<V>> {
        if let Some(&idx) = self.index.get(key) {
            let previous = self.arena[idx].entry.replace(CacheEntry::new(value, now));
            self.move_to_head(idx);
            return previous;
        }

        let idx = self.alloc(key.to_owned(), CacheEntry::new(value, now));
        self.push_head(idx);
        self.index.insert(key.to_owned(), idx);
        None
    }

    // == Remove ==
    /// Removes `key` from both the index and the recency list.
    pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let entry = self.arena[idx].entry.take();
        self.release(idx);
        entry
    }

    // == Evict LRU ==
    /// Removes and returns the least-recently-used entry with its key.
    ///
    /// Returns None when the store is empty.
    pub(crate) fn evict_lru(&mut self) -> Option<(String, CacheEntry<V>)> {
        if self.tail == NIL {
            return None;
        }
        let idx = self.tail;
        self.index.remove(&self.arena[idx].key);
        self.unlink(idx);
        let key = std::mem::take(&mut self.arena[idx].key);
        let entry = self.arena[idx].entry.take();
        self.release(idx);
        entry.map(|entry| (key, entry))
    }

    // == Iterate ==
    /// Iterates resident entries in no particular order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry<V>)> {
        self.index.iter().filter_map(|(key, &idx)| {
            self.arena[idx]
                .entry
                .as_ref()
                .map(|entry| (key.as_str(), entry))
        })
    }

    // == Internal list operations ==

    /// Takes a slot from the free list or grows the arena.
    fn alloc(&mut self, key: String, entry: CacheEntry<V>) -> usize {
        if self.free != NIL {
            let idx = self.free;
            self.free = self.arena[idx].next;
            let slot = &mut self.arena[idx];
            slot.key = key;
            slot.entry = Some(entry);
            slot.prev = NIL;
            slot.next = NIL;
            idx
        } else {
            self.arena.push(Slot {
                key,
                entry: Some(entry),
                prev: NIL,
                next: NIL,
            });
            self.arena.len() - 1
        }
    }

    /// Returns an unlinked, emptied slot to the free list.
    fn release(&mut self, idx: usize) {
        let slot = &mut self.arena[idx];
        slot.key = String::new();
        slot.prev = NIL;
        slot.next = self.free;
        self.free = idx;
    }

    /// Detaches the slot at `idx` from the recency list.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.arena[idx].prev, self.arena[idx].next);

        if prev == NIL {
            self.head = next;
        } else {
            self.arena[prev].next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else {
            self.arena[next].prev = prev;
        }

        self.arena[idx].prev = NIL;
        self.arena[idx].next = NIL;
    }

    /// Links the slot at `idx` in as the new head.
    fn push_head(&mut self, idx: usize) {
        self.arena[idx].prev = NIL;
        self.arena[idx].next = self.head;

        if self.head != NIL {
            self.arena[self.head].prev = idx;
        }
        self.head = idx;

        if self.tail == NIL {
            self.tail = idx;
        }
    }

    /// Moves an already linked slot to the head.
    fn move_to_head(&mut self, idx: usize) {
        if self.head == idx {
            return;
        }
        self.unlink(idx);
        self.push_head(idx);
    }

    // == Test support ==

    /// Key of the least-recently-used entry.
    #[cfg(test)]
    pub(crate) fn lru_key(&self) -> Option<&str> {
        if self.tail == NIL {
            None
        } else {
            Some(self.arena[self.tail].key.as_str())
        }
    }

    /// Asserts that the index and the recency list describe the same
    /// key set and that the list is well formed in both directions.
    #[cfg(test)]
    pub(crate) fn check_consistency(&self) {
        let mut forward = Vec::new();
        let mut idx = self.head;
        let mut prev = NIL;
        while idx != NIL {
            let slot = &self.arena[idx];
            assert_eq!(slot.prev, prev, "broken back link at slot {idx}");
            assert!(slot.entry.is_some(), "linked slot {idx} has no entry");
            assert_eq!(
                self.index.get(&slot.key),
                Some(&idx),
                "slot key {:?} not indexed at {idx}",
                slot.key
            );
            forward.push(idx);
            prev = idx;
            idx = slot.next;
        }
        assert_eq!(self.tail, prev, "tail does not terminate the list");
        assert_eq!(
            forward.len(),
            self.index.len(),
            "index and recency list disagree on entry count"
        );
    }
}
