//! Keyspace: the process-wide key → entry mapping.

use ahash::RandomState;

use crate::arena::Arena;
use crate::htable::{HashEmbed, HashLink, RehashIndex};
use crate::zset::SortedSet;

/// Payload of one keyspace entry. The variant is chosen at creation and never changes
/// for the entry's lifetime; handlers hitting the other variant fail instead of
/// coercing.
#[derive(Debug)]
pub enum StoredValue {
    Bytes(Vec<u8>),
    SortedSet(SortedSet),
}

/// One record of the global mapping.
#[derive(Debug)]
pub struct Entry {
    link: HashLink,
    key: Vec<u8>,
    value: StoredValue,
}

impl Entry {
    #[must_use]
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    #[must_use]
    pub fn value(&self) -> &StoredValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut StoredValue {
        &mut self.value
    }

    #[must_use]
    pub fn into_value(self) -> StoredValue {
        self.value
    }
}

impl HashEmbed for Entry {
    fn hash_link(&self) -> &HashLink {
        &self.link
    }

    fn hash_link_mut(&mut self) -> &mut HashLink {
        &mut self.link
    }
}

/// Owning map from key bytes to [`Entry`], indexed by the progressive-rehash table.
///
/// Entries live for the process lifetime unless removed by a command; removal drops
/// the entry and, transitively, any sorted set it holds.
#[derive(Debug, Default)]
pub struct Keyspace {
    arena: Arena<Entry>,
    index: RehashIndex,
    hasher: RandomState,
}

impl Keyspace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Finds the entry for `key`, if present.
    pub fn lookup(&mut self, key: &[u8]) -> Option<&mut Entry> {
        let hash = self.hash_key(key);
        let id = self
            .index
            .lookup(&mut self.arena, hash, |entry| entry.key.as_slice() == key)?;
        Some(&mut self.arena[id])
    }

    /// Stores a new entry. The caller has established that `key` is absent.
    pub fn insert(&mut self, key: Vec<u8>, value: StoredValue) {
        let hash = self.hash_key(&key);
        let id = self.arena.insert(Entry {
            link: HashLink::new(hash),
            key,
            value,
        });
        self.index.insert(&mut self.arena, id);
    }

    /// Removes and returns the entry for `key`.
    pub fn remove(&mut self, key: &[u8]) -> Option<Entry> {
        let hash = self.hash_key(key);
        let id = self
            .index
            .remove(&mut self.arena, hash, |entry| entry.key.as_slice() == key)?;
        Some(self.arena.remove(id))
    }

    /// Visits every key in index order (not meaningful to clients, but stable within
    /// one call).
    pub fn for_each_key<F: FnMut(&[u8])>(&self, mut visit: F) {
        self.index.for_each(&self.arena, |_, entry| {
            visit(&entry.key);
            true
        });
    }

    fn hash_key(&self, key: &[u8]) -> u64 {
        self.hasher.hash_one(key)
    }
}

/// Mutable state threaded through every command handler.
#[derive(Debug, Default)]
pub struct DispatchState {
    pub keyspace: Keyspace,
}
