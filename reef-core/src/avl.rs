//! Height-balanced BST with subtree counts.
//!
//! Like the hash index, the tree stores only `NodeId` handles; the structural fields
//! (`parent`/`left`/`right`/`height`/`cnt`) sit inside the arena record behind
//! [`AvlEmbed`]. The subtree counter is what makes rank and offset-by-k logarithmic,
//! which the range-query command depends on.

use crate::arena::{Arena, NodeId};

/// Structural fields embedded in arena records that participate in a tree.
///
/// `height` is 1 for a leaf and 0 for an absent child; `cnt` is the subtree size
/// including the node itself.
#[derive(Debug, Clone)]
pub struct AvlLinks {
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: u32,
    cnt: u32,
}

impl AvlLinks {
    /// Fresh detached leaf.
    #[must_use]
    pub fn leaf() -> Self {
        Self {
            parent: None,
            left: None,
            right: None,
            height: 1,
            cnt: 1,
        }
    }

    /// Left child, if any.
    #[must_use]
    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    /// Right child, if any.
    #[must_use]
    pub fn right(&self) -> Option<NodeId> {
        self.right
    }
}

impl Default for AvlLinks {
    fn default() -> Self {
        Self::leaf()
    }
}

/// Access to the [`AvlLinks`] embedded in a record.
pub trait AvlEmbed {
    fn avl(&self) -> &AvlLinks;
    fn avl_mut(&mut self) -> &mut AvlLinks;
}

/// Tree handle: just the root. All storage lives in the caller's arena.
#[derive(Debug, Default)]
pub struct AvlTree {
    root: Option<NodeId>,
}

impl AvlTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Links a detached record into the tree under the strict-weak-order `less`.
    ///
    /// The record's structural fields are reset; any previous tree position is
    /// forgotten.
    pub fn insert<T, F>(&mut self, arena: &mut Arena<T>, id: NodeId, less: F)
    where
        T: AvlEmbed,
        F: Fn(&T, &T) -> bool,
    {
        *arena[id].avl_mut() = AvlLinks::leaf();

        let mut parent = None;
        let mut go_left = false;
        let mut cursor = self.root;
        while let Some(node) = cursor {
            parent = Some(node);
            go_left = less(&arena[id], &arena[node]);
            cursor = if go_left {
                arena[node].avl().left
            } else {
                arena[node].avl().right
            };
        }

        arena[id].avl_mut().parent = parent;
        if let Some(parent) = parent {
            if go_left {
                arena[parent].avl_mut().left = Some(id);
            } else {
                arena[parent].avl_mut().right = Some(id);
            }
        }
        self.root = Some(Self::rebalance(arena, id));
    }

    /// Unlinks `id` from the tree. The record itself stays in the arena.
    pub fn remove<T: AvlEmbed>(&mut self, arena: &mut Arena<T>, id: NodeId) {
        self.root = Self::delete_node(arena, id);
    }

    /// 1-based in-order position of `id`.
    #[must_use]
    pub fn rank<T: AvlEmbed>(arena: &Arena<T>, id: NodeId) -> u64 {
        let mut rank = u64::from(Self::count(arena, arena[id].avl().left)) + 1;
        let mut node = id;
        while let Some(parent) = arena[node].avl().parent {
            if arena[parent].avl().right == Some(node) {
                rank += u64::from(Self::count(arena, arena[parent].avl().left)) + 1;
            }
            node = parent;
        }
        rank
    }

    /// Node `offset` in-order positions after `start` (before, when negative), or
    /// `None` when the walk leaves the tree.
    ///
    /// Rank arithmetic over subtree counts keeps this O(log n) even for large offsets.
    #[must_use]
    pub fn offset<T: AvlEmbed>(arena: &Arena<T>, start: NodeId, offset: i64) -> Option<NodeId> {
        let mut pos = 0_i64;
        let mut node = start;
        while pos != offset {
            let right = arena[node].avl().right;
            let left = arena[node].avl().left;
            if pos < offset && pos + i64::from(Self::count(arena, right)) >= offset {
                // Target is inside the right subtree.
                node = right?;
                pos += i64::from(Self::count(arena, arena[node].avl().left)) + 1;
            } else if pos > offset && pos - i64::from(Self::count(arena, left)) <= offset {
                node = left?;
                pos -= i64::from(Self::count(arena, arena[node].avl().right)) + 1;
            } else {
                // Neither subtree covers the target; ascend, skipping the subtree we
                // came from.
                let parent = arena[node].avl().parent?;
                if arena[parent].avl().right == Some(node) {
                    pos -= i64::from(Self::count(arena, arena[node].avl().left)) + 1;
                } else {
                    pos += i64::from(Self::count(arena, arena[node].avl().right)) + 1;
                }
                node = parent;
            }
        }
        Some(node)
    }

    fn height<T: AvlEmbed>(arena: &Arena<T>, node: Option<NodeId>) -> u32 {
        node.map_or(0, |id| arena[id].avl().height)
    }

    fn count<T: AvlEmbed>(arena: &Arena<T>, node: Option<NodeId>) -> u32 {
        node.map_or(0, |id| arena[id].avl().cnt)
    }

    fn update<T: AvlEmbed>(arena: &mut Arena<T>, id: NodeId) {
        let left = arena[id].avl().left;
        let right = arena[id].avl().right;
        let height = 1 + Self::height(arena, left).max(Self::height(arena, right));
        let cnt = 1 + Self::count(arena, left) + Self::count(arena, right);
        let links = arena[id].avl_mut();
        links.height = height;
        links.cnt = cnt;
    }

    /// Left rotation around `node`. Leaves the old parent's child pointer untouched;
    /// the rebalance walk patches it.
    fn rot_left<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> NodeId {
        let Some(pivot) = arena[node].avl().right else {
            return node;
        };
        let parent = arena[node].avl().parent;
        let inner = arena[pivot].avl().left;

        arena[node].avl_mut().right = inner;
        if let Some(inner) = inner {
            arena[inner].avl_mut().parent = Some(node);
        }
        arena[pivot].avl_mut().parent = parent;
        arena[pivot].avl_mut().left = Some(node);
        arena[node].avl_mut().parent = Some(pivot);

        Self::update(arena, node);
        Self::update(arena, pivot);
        pivot
    }

    fn rot_right<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> NodeId {
        let Some(pivot) = arena[node].avl().left else {
            return node;
        };
        let parent = arena[node].avl().parent;
        let inner = arena[pivot].avl().right;

        arena[node].avl_mut().left = inner;
        if let Some(inner) = inner {
            arena[inner].avl_mut().parent = Some(node);
        }
        arena[pivot].avl_mut().parent = parent;
        arena[pivot].avl_mut().right = Some(node);
        arena[node].avl_mut().parent = Some(pivot);

        Self::update(arena, node);
        Self::update(arena, pivot);
        pivot
    }

    /// Left-too-tall: collapse an LR case into LL first, then rotate right.
    fn fix_left<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> NodeId {
        let Some(left) = arena[node].avl().left else {
            return node;
        };
        let left_left = arena[left].avl().left;
        let left_right = arena[left].avl().right;
        if Self::height(arena, left_left) < Self::height(arena, left_right) {
            let rotated = Self::rot_left(arena, left);
            arena[node].avl_mut().left = Some(rotated);
        }
        Self::rot_right(arena, node)
    }

    fn fix_right<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> NodeId {
        let Some(right) = arena[node].avl().right else {
            return node;
        };
        let right_right = arena[right].avl().right;
        let right_left = arena[right].avl().left;
        if Self::height(arena, right_right) < Self::height(arena, right_left) {
            let rotated = Self::rot_right(arena, right);
            arena[node].avl_mut().right = Some(rotated);
        }
        Self::rot_left(arena, node)
    }

    /// Walks from `id` to the root, refreshing augmentation and rotating where a
    /// subtree went out of balance. Returns the (possibly new) tree root.
    fn rebalance<T: AvlEmbed>(arena: &mut Arena<T>, start: NodeId) -> NodeId {
        let mut node = start;
        loop {
            Self::update(arena, node);
            let parent = arena[node].avl().parent;
            let left = Self::height(arena, arena[node].avl().left);
            let right = Self::height(arena, arena[node].avl().right);

            let mut subtree = node;
            if left == right + 2 {
                subtree = Self::fix_left(arena, node);
            } else if right == left + 2 {
                subtree = Self::fix_right(arena, node);
            }

            let Some(parent) = parent else {
                return subtree;
            };
            if subtree != node {
                if arena[parent].avl().left == Some(node) {
                    arena[parent].avl_mut().left = Some(subtree);
                } else {
                    arena[parent].avl_mut().right = Some(subtree);
                }
            }
            node = parent;
        }
    }

    /// Unlinks a node with at most one child and rebalances from its parent.
    fn delete_easy<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> Option<NodeId> {
        let links = arena[node].avl().clone();
        let child = links.left.or(links.right);
        if let Some(child) = child {
            arena[child].avl_mut().parent = links.parent;
        }
        let Some(parent) = links.parent else {
            return child;
        };
        if arena[parent].avl().left == Some(node) {
            arena[parent].avl_mut().left = child;
        } else {
            arena[parent].avl_mut().right = child;
        }
        Some(Self::rebalance(arena, parent))
    }

    fn delete_node<T: AvlEmbed>(arena: &mut Arena<T>, node: NodeId) -> Option<NodeId> {
        if arena[node].avl().left.is_none() || arena[node].avl().right.is_none() {
            return Self::delete_easy(arena, node);
        }

        // Two children: detach the in-order successor, then take over the doomed
        // node's position by copying structural fields. Position alone defines
        // identity here; values are never compared.
        let Some(mut victim) = arena[node].avl().right else {
            return Self::delete_easy(arena, node);
        };
        while let Some(left) = arena[victim].avl().left {
            victim = left;
        }
        let root = Self::delete_easy(arena, victim);

        // The easy delete may have touched the doomed node's fields (it is an
        // ancestor of the successor), so read them only now.
        let links = arena[node].avl().clone();
        *arena[victim].avl_mut() = links.clone();
        if let Some(left) = links.left {
            arena[left].avl_mut().parent = Some(victim);
        }
        if let Some(right) = links.right {
            arena[right].avl_mut().parent = Some(victim);
        }
        match links.parent {
            None => Some(victim),
            Some(parent) => {
                if arena[parent].avl().left == Some(node) {
                    arena[parent].avl_mut().left = Some(victim);
                } else {
                    arena[parent].avl_mut().right = Some(victim);
                }
                root
            }
        }
    }
}
