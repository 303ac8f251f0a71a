//! Sorted set: one record set, two indices.
//!
//! Every member is a single [`ZNode`] in the arena, reachable by name through the
//! [`RehashIndex`] and in `(score, name)` order through the [`AvlTree`]. The two
//! indices agree on membership at all times; uniqueness is by name alone, so a score
//! change relinks the tree position and leaves the hash entry untouched.

use ahash::RandomState;

use crate::arena::{Arena, NodeId};
use crate::avl::{AvlEmbed, AvlLinks, AvlTree};
use crate::htable::{HashEmbed, HashLink, RehashIndex};

/// One sorted-set member: tree links, hash link, score, and the member name.
#[derive(Debug)]
pub struct ZNode {
    avl: AvlLinks,
    link: HashLink,
    score: f64,
    name: Box<[u8]>,
}

impl ZNode {
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.name
    }
}

impl AvlEmbed for ZNode {
    fn avl(&self) -> &AvlLinks {
        &self.avl
    }

    fn avl_mut(&mut self) -> &mut AvlLinks {
        &mut self.avl
    }
}

impl HashEmbed for ZNode {
    fn hash_link(&self) -> &HashLink {
        &self.link
    }

    fn hash_link_mut(&mut self) -> &mut HashLink {
        &mut self.link
    }
}

/// Primary ordering: score ascending, member name as the tie-break.
fn zless(a: &ZNode, b: &ZNode) -> bool {
    if a.score != b.score {
        return a.score < b.score;
    }
    a.name < b.name
}

/// Score-and-name indexed member set.
#[derive(Debug, Default)]
pub struct SortedSet {
    arena: Arena<ZNode>,
    tree: AvlTree,
    index: RehashIndex,
    hasher: RandomState,
}

impl SortedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Member count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Read access to a member record behind a handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ZNode {
        &self.arena[id]
    }

    /// Finds a member by name through the hash index.
    pub fn lookup(&mut self, name: &[u8]) -> Option<NodeId> {
        let hash = self.hasher.hash_one(name);
        self.index
            .lookup(&mut self.arena, hash, |record| &*record.name == name)
    }

    /// Inserts a member or updates the score of an existing one.
    ///
    /// Returns `true` iff a new member was created. A matching score is a no-op; a
    /// differing score detaches the node from the tree and relinks it at its new
    /// position, keeping the hash entry as-is.
    pub fn insert(&mut self, name: &[u8], score: f64) -> bool {
        if let Some(id) = self.lookup(name) {
            self.update_score(id, score);
            return false;
        }

        let hash = self.hasher.hash_one(name);
        let id = self.arena.insert(ZNode {
            avl: AvlLinks::leaf(),
            link: HashLink::new(hash),
            score,
            name: name.into(),
        });
        self.index.insert(&mut self.arena, id);
        self.tree.insert(&mut self.arena, id, zless);
        true
    }

    /// Removes a member by name. Returns `true` when one existed.
    pub fn remove(&mut self, name: &[u8]) -> bool {
        let hash = self.hasher.hash_one(name);
        let Some(id) = self
            .index
            .remove(&mut self.arena, hash, |record| &*record.name == name)
        else {
            return false;
        };
        self.tree.remove(&mut self.arena, id);
        self.arena.remove(id);
        true
    }

    /// Least member not less than `(score, name)`.
    #[must_use]
    pub fn seek_ge(&self, score: f64, name: &[u8]) -> Option<NodeId> {
        let mut found = None;
        let mut cursor = self.tree.root();
        while let Some(id) = cursor {
            let record = &self.arena[id];
            let before_key =
                record.score < score || (record.score == score && &*record.name < name);
            cursor = if before_key {
                record.avl().right()
            } else {
                found = Some(id);
                record.avl().left()
            };
        }
        found
    }

    /// Member `delta` order positions away from `id`, or `None` past either end.
    #[must_use]
    pub fn offset_from(&self, id: NodeId, delta: i64) -> Option<NodeId> {
        AvlTree::offset(&self.arena, id, delta)
    }

    /// 1-based order position of a member.
    #[must_use]
    pub fn rank(&self, id: NodeId) -> u64 {
        AvlTree::rank(&self.arena, id)
    }

    /// Drops every member and both indices' storage.
    pub fn clear(&mut self) {
        self.index.clear();
        self.tree = AvlTree::new();
        self.arena.clear();
    }

    fn update_score(&mut self, id: NodeId, score: f64) {
        if self.arena[id].score == score {
            return;
        }
        self.tree.remove(&mut self.arena, id);
        self.arena[id].score = score;
        self.tree.insert(&mut self.arena, id, zless);
    }
}

#[cfg(test)]
mod tests {
    use super::SortedSet;
    use googletest::prelude::*;
    use rstest::rstest;

    fn members_in_order(set: &SortedSet) -> Vec<(Vec<u8>, f64)> {
        let mut out = Vec::new();
        let Some(mut cursor) = set.seek_ge(f64::NEG_INFINITY, b"") else {
            return out;
        };
        loop {
            let node = set.node(cursor);
            out.push((node.name().to_vec(), node.score()));
            match set.offset_from(cursor, 1) {
                Some(next) => cursor = next,
                None => return out,
            }
        }
    }

    #[rstest]
    fn members_are_unique_by_name() {
        let mut set = SortedSet::new();
        assert_that!(set.insert(b"alice", 1.0), eq(true));
        assert_that!(set.insert(b"bob", 2.0), eq(true));
        assert_that!(set.insert(b"alice", 1.5), eq(false));
        assert_that!(set.len(), eq(2));

        let alice = set.lookup(b"alice").expect("member must be findable");
        assert_that!(set.node(alice).score(), eq(1.5));
    }

    #[rstest]
    fn score_update_moves_the_member_in_order() {
        let mut set = SortedSet::new();
        set.insert(b"a", 1.0);
        set.insert(b"b", 2.0);
        set.insert(b"c", 3.0);

        set.insert(b"a", 9.0);
        let order: Vec<Vec<u8>> = members_in_order(&set)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_that!(
            &order,
            eq(&vec![b"b".to_vec(), b"c".to_vec(), b"a".to_vec()])
        );
    }

    #[rstest]
    fn equal_scores_order_by_name() {
        let mut set = SortedSet::new();
        set.insert(b"d", 3.0);
        set.insert(b"c", 2.0);
        set.insert(b"b", 2.0);
        set.insert(b"a", 1.0);

        let order: Vec<Vec<u8>> = members_in_order(&set)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_that!(
            &order,
            eq(&vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec(), b"d".to_vec()])
        );
    }

    #[rstest]
    fn seek_ge_lands_on_the_first_member_at_or_after_the_key() {
        let mut set = SortedSet::new();
        set.insert(b"a", 1.0);
        set.insert(b"b", 2.0);
        set.insert(b"c", 2.0);
        set.insert(b"d", 3.0);

        let hit = set.seek_ge(2.0, b"").expect("seek must find b");
        assert_that!(set.node(hit).name(), eq(b"b".as_slice()));

        let hit = set.seek_ge(2.0, b"b\0").expect("seek must find c");
        assert_that!(set.node(hit).name(), eq(b"c".as_slice()));

        assert_that!(set.seek_ge(3.0, b"e"), eq(None));
    }

    #[rstest]
    fn remove_detaches_from_both_indices() {
        let mut set = SortedSet::new();
        set.insert(b"a", 1.0);
        set.insert(b"b", 2.0);
        assert_that!(set.remove(b"a"), eq(true));
        assert_that!(set.remove(b"a"), eq(false));
        assert_that!(set.len(), eq(1));
        assert_that!(set.lookup(b"a"), eq(None));

        let order = members_in_order(&set);
        assert_that!(order.len(), eq(1));
        assert_that!(&order[0].0, eq(&b"b".to_vec()));
    }

    #[rstest]
    fn clear_resets_the_set_for_reuse() {
        let mut set = SortedSet::new();
        set.insert(b"a", 1.0);
        set.insert(b"b", 2.0);
        set.clear();
        assert_that!(set.is_empty(), eq(true));
        assert_that!(set.lookup(b"a"), eq(None));
        assert_that!(set.seek_ge(0.0, b""), eq(None));

        assert_that!(set.insert(b"a", 3.0), eq(true));
        assert_that!(set.len(), eq(1));
    }

    #[rstest]
    fn rank_is_one_based_over_the_whole_set() {
        let mut set = SortedSet::new();
        set.insert(b"alice", 1.0);
        set.insert(b"bob", 2.0);
        set.insert(b"alice", 1.5);

        let alice = set.lookup(b"alice").expect("alice exists");
        let bob = set.lookup(b"bob").expect("bob exists");
        assert_that!(set.rank(alice), eq(1));
        assert_that!(set.rank(bob), eq(2));
    }
}
