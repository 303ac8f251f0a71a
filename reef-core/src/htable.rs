//! Chained hash index with progressive rehash.
//!
//! The index stores only `NodeId` handles; the `(hash, next)` link lives inside the
//! arena record itself, reached through [`HashEmbed`]. A resize keeps both the old and
//! the new slot array live and migrates a bounded number of nodes on every public
//! operation, so no single request pays for the whole rehash.

use tracing::debug;

use crate::arena::{Arena, NodeId};

const INIT_SLOTS: usize = 4;
const MAX_LOAD_FACTOR: usize = 4;
const REHASH_WORK: usize = 256;

/// Intrusive chain link embedded in arena records.
///
/// The hash is computed once when the record is created and never changes; chain
/// membership is managed exclusively by [`RehashIndex`].
#[derive(Debug, Clone)]
pub struct HashLink {
    hash: u64,
    next: Option<NodeId>,
}

impl HashLink {
    #[must_use]
    pub fn new(hash: u64) -> Self {
        Self { hash, next: None }
    }

    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// Access to the [`HashLink`] embedded in a record.
pub trait HashEmbed {
    fn hash_link(&self) -> &HashLink;
    fn hash_link_mut(&mut self) -> &mut HashLink;
}

/// One slot array of chain heads.
#[derive(Debug, Default)]
struct Table {
    slots: Vec<Option<NodeId>>,
    mask: usize,
    size: usize,
}

impl Table {
    fn init(&mut self, slot_count: usize) {
        debug_assert!(slot_count.is_power_of_two());
        self.slots = vec![None; slot_count];
        self.mask = slot_count - 1;
        self.size = 0;
    }

    fn is_allocated(&self) -> bool {
        !self.slots.is_empty()
    }

    fn insert<T: HashEmbed>(&mut self, arena: &mut Arena<T>, id: NodeId) {
        let pos = (arena[id].hash_link().hash() as usize) & self.mask;
        arena[id].hash_link_mut().next = self.slots[pos];
        self.slots[pos] = Some(id);
        self.size += 1;
    }

    /// Finds a matching node, returning `(slot, predecessor, node)` so the caller can
    /// detach without re-walking the chain.
    fn find<T, F>(&self, arena: &Arena<T>, hash: u64, eq: &F) -> Option<(usize, Option<NodeId>, NodeId)>
    where
        T: HashEmbed,
        F: Fn(&T) -> bool,
    {
        if !self.is_allocated() {
            return None;
        }
        let pos = (hash as usize) & self.mask;
        let mut prev = None;
        let mut cursor = self.slots[pos];
        while let Some(id) = cursor {
            let record = &arena[id];
            if record.hash_link().hash() == hash && eq(record) {
                return Some((pos, prev, id));
            }
            prev = Some(id);
            cursor = record.hash_link().next;
        }
        None
    }

    fn detach<T: HashEmbed>(
        &mut self,
        arena: &mut Arena<T>,
        slot: usize,
        prev: Option<NodeId>,
        id: NodeId,
    ) -> NodeId {
        let next = arena[id].hash_link().next;
        match prev {
            None => self.slots[slot] = next,
            Some(prev) => arena[prev].hash_link_mut().next = next,
        }
        arena[id].hash_link_mut().next = None;
        self.size -= 1;
        id
    }

    fn for_each<T, F>(&self, arena: &Arena<T>, visit: &mut F) -> bool
    where
        T: HashEmbed,
        F: FnMut(NodeId, &T) -> bool,
    {
        for slot in &self.slots {
            let mut cursor = *slot;
            while let Some(id) = cursor {
                let record = &arena[id];
                if !visit(id, record) {
                    return false;
                }
                cursor = record.hash_link().next;
            }
        }
        true
    }
}

/// Incrementally resizing hash index over an arena.
///
/// During a resize a node may live in either the `newer` or the `older` table; every
/// read consults both. `older` releases its slot storage as soon as it drains.
#[derive(Debug, Default)]
pub struct RehashIndex {
    newer: Table,
    older: Table,
    migrate_pos: usize,
}

impl RehashIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Live node count across both tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.newer.size + self.older.size
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chains `id` into the index. The record's hash must already be set.
    pub fn insert<T: HashEmbed>(&mut self, arena: &mut Arena<T>, id: NodeId) {
        if !self.newer.is_allocated() {
            self.newer.init(INIT_SLOTS);
        }
        self.newer.insert(arena, id);

        if !self.older.is_allocated() {
            let threshold = (self.newer.mask + 1) * MAX_LOAD_FACTOR;
            if self.newer.size >= threshold {
                self.start_rehash();
            }
        }
        self.advance_rehash(arena);
    }

    /// Returns the node whose stored hash equals `hash` and for which `eq` holds.
    pub fn lookup<T, F>(&mut self, arena: &mut Arena<T>, hash: u64, eq: F) -> Option<NodeId>
    where
        T: HashEmbed,
        F: Fn(&T) -> bool,
    {
        self.advance_rehash(arena);
        self.newer
            .find(arena, hash, &eq)
            .or_else(|| self.older.find(arena, hash, &eq))
            .map(|(_, _, id)| id)
    }

    /// Detaches and returns the matching node, leaving the record in the arena.
    pub fn remove<T, F>(&mut self, arena: &mut Arena<T>, hash: u64, eq: F) -> Option<NodeId>
    where
        T: HashEmbed,
        F: Fn(&T) -> bool,
    {
        self.advance_rehash(arena);
        if let Some((slot, prev, id)) = self.newer.find(arena, hash, &eq) {
            return Some(self.newer.detach(arena, slot, prev, id));
        }
        if let Some((slot, prev, id)) = self.older.find(arena, hash, &eq) {
            return Some(self.older.detach(arena, slot, prev, id));
        }
        None
    }

    /// Visits every live node, `newer` table first; stops early when `visit` returns
    /// false.
    pub fn for_each<T, F>(&self, arena: &Arena<T>, mut visit: F)
    where
        T: HashEmbed,
        F: FnMut(NodeId, &T) -> bool,
    {
        let _ = self.newer.for_each(arena, &mut visit) && self.older.for_each(arena, &mut visit);
    }

    /// Drops both slot arrays. Record destruction is the arena owner's business.
    pub fn clear(&mut self) {
        self.newer = Table::default();
        self.older = Table::default();
        self.migrate_pos = 0;
    }

    fn start_rehash(&mut self) {
        debug!(
            slots = self.newer.mask + 1,
            size = self.newer.size,
            "doubling hash index"
        );
        self.older = std::mem::take(&mut self.newer);
        self.newer.init((self.older.mask + 1) * 2);
        self.migrate_pos = 0;
    }

    /// Migrates up to [`REHASH_WORK`] nodes from `older` into `newer`.
    fn advance_rehash<T: HashEmbed>(&mut self, arena: &mut Arena<T>) {
        let mut moved = 0;
        while self.older.size > 0 && moved < REHASH_WORK {
            match self.older.slots[self.migrate_pos] {
                None => self.migrate_pos += 1,
                Some(head) => {
                    let id = self.older.detach(arena, self.migrate_pos, None, head);
                    self.newer.insert(arena, id);
                    moved += 1;
                }
            }
        }
        if self.older.size == 0 && self.older.is_allocated() {
            self.older = Table::default();
        }
    }
}
