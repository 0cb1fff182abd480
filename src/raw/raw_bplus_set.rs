use core::borrow::Borrow;
use core::fmt;

use alloc::vec::Vec;

use super::arena::Arena;
use super::handle::Handle;
use super::node::{InternalNode, LeafNode, Node, SearchResult};

/// The core B+ tree implementation backing `BPlusSet`.
///
/// Mutations run the recursive overflow/underflow protocol: a leaf accepts
/// one key past its maximum (or drops one below its minimum) and reports the
/// violation upward, and the parent repairs it by splitting the child or by
/// rebalancing it against a sibling. The holder itself only grows the root
/// when the root overflows and collapses it when an erase empties it.
pub(crate) struct RawBPlusSet<K, const N: usize> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<K, N>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Total number of keys in the tree.
    len: usize,
    /// Handle to the leftmost leaf, where forward iteration starts.
    first_leaf: Option<Handle>,
}

/// What an insert did, as reported to the node's parent.
enum InsertStatus {
    /// The key was added.
    Inserted,
    /// An equal key was already present; nothing changed.
    Duplicate,
    /// The key was added and the node now holds one key too many; the
    /// caller must split it.
    Overflowed,
}

/// What an erase did, as reported to the node's parent.
enum EraseStatus<K> {
    /// The key was removed.
    Removed(K),
    /// No equal key was present; nothing changed.
    Missing,
    /// The key was removed and the node dropped below its minimum; the
    /// caller must rebalance it.
    Underflowed(K),
}

impl<K, const N: usize> RawBPlusSet<K, N> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        const { assert!(N >= 1, "`RawBPlusSet` - the branching constant `N` must be at least 1!") }
        Self {
            nodes: Arena::new(),
            root: None,
            len: 0,
            first_leaf: None,
        }
    }

    /// Creates a new tree with node storage reserved for roughly `capacity`
    /// keys in full leaves.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        const { assert!(N >= 1, "`RawBPlusSet` - the branching constant `N` must be at least 1!") }
        Self {
            nodes: Arena::with_capacity(capacity.div_ceil(Node::<K, N>::MAX_KEYS)),
            root: None,
            len: 0,
            first_leaf: None,
        }
    }

    /// Returns the number of keys in the tree.
    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree contains no keys.
    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of keys the reserved node slots can hold in full
    /// leaves.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.capacity().saturating_mul(Node::<K, N>::MAX_KEYS)
    }

    /// Clears all keys from the tree.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
        self.first_leaf = None;
    }

    /// Returns the leftmost leaf, if any.
    pub(crate) fn first_leaf(&self) -> Option<Handle> {
        self.first_leaf
    }

    /// Returns a reference to a node by handle.
    pub(crate) fn node(&self, handle: Handle) -> &Node<K, N> {
        self.nodes.get(handle)
    }

    /// Drains all keys from the tree in ascending order by walking the leaf
    /// chain. This is O(n) as it avoids any rebalancing.
    pub(crate) fn drain_to_vec(&mut self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len);
        let mut current = self.first_leaf;

        while let Some(handle) = current {
            let leaf = self.nodes.get_mut(handle).as_leaf_mut();
            let next = leaf.next();
            keys.extend(leaf.take_keys());
            current = next;
        }

        self.clear();
        keys
    }

    /// Searches for a key and returns its cursor (leaf handle and index in
    /// the leaf) if present.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<(Handle, usize)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root?;

        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    current = internal.child(internal.route(key));
                }
                Node::Leaf(leaf) => {
                    return match leaf.search(key) {
                        SearchResult::Found(index) => Some((current, index)),
                        SearchResult::NotFound(_) => None,
                    };
                }
            }
        }
    }

    /// Returns true if the tree contains the given key.
    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).is_some()
    }

    /// Returns a reference to the stored key equal to the given key.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (leaf, index) = self.search(key)?;
        Some(self.nodes.get(leaf).as_leaf().key(index))
    }

    /// Returns the smallest key in the tree.
    pub(crate) fn first(&self) -> Option<&K> {
        let leaf = self.first_leaf?;
        self.nodes.get(leaf).as_leaf().keys().first()
    }

    /// Returns the largest key in the tree.
    pub(crate) fn last(&self) -> Option<&K> {
        let mut current = self.root?;

        loop {
            match self.nodes.get(current) {
                Node::Internal(internal) => {
                    current = internal.child(internal.child_count() - 1);
                }
                Node::Leaf(leaf) => return leaf.last_key(),
            }
        }
    }
}

impl<K: Clone + Ord, const N: usize> RawBPlusSet<K, N> {
    /// Inserts a key into the tree. Returns false (and keeps the stored key)
    /// if an equal key was already present.
    pub(crate) fn insert(&mut self, key: K) -> bool {
        let Some(root) = self.root else {
            let mut leaf = LeafNode::new();
            leaf.push(key);
            let handle = self.nodes.alloc(Node::Leaf(leaf));
            self.root = Some(handle);
            self.first_leaf = Some(handle);
            self.len = 1;
            return true;
        };

        match self.insert_into(root, key) {
            InsertStatus::Duplicate => false,
            InsertStatus::Inserted => {
                self.len += 1;
                true
            }
            InsertStatus::Overflowed => {
                // Grow the tree by one level: the overfull old root becomes
                // the sole child of a fresh internal root, which splits it.
                let mut new_root = InternalNode::new();
                new_root.set_first_child(root);
                let new_root_handle = self.nodes.alloc(Node::Internal(new_root));
                self.split_child(new_root_handle, 0);
                self.root = Some(new_root_handle);
                self.len += 1;
                true
            }
        }
    }

    /// Recursively inserts under `node`, repairing child overflows on the
    /// way back up.
    fn insert_into(&mut self, node: Handle, key: K) -> InsertStatus {
        if self.nodes.get(node).is_leaf() {
            let leaf = self.nodes.get_mut(node).as_leaf_mut();
            return match leaf.search(&key) {
                SearchResult::Found(_) => InsertStatus::Duplicate,
                SearchResult::NotFound(index) => {
                    leaf.insert(index, key);
                    if leaf.is_overfull() {
                        InsertStatus::Overflowed
                    } else {
                        InsertStatus::Inserted
                    }
                }
            };
        }

        let internal = self.nodes.get(node).as_internal();
        let pos = internal.route(&key);
        let child = internal.child(pos);

        match self.insert_into(child, key) {
            InsertStatus::Overflowed => {
                self.split_child(node, pos);
                if self.nodes.get(node).as_internal().is_overfull() {
                    InsertStatus::Overflowed
                } else {
                    InsertStatus::Inserted
                }
            }
            status => status,
        }
    }

    /// Splits the overfull child at `pos` in two, inserting the separator
    /// and the new right half into the parent at `pos` and `pos + 1`.
    fn split_child(&mut self, parent: Handle, pos: usize) {
        let child = self.nodes.get(parent).as_internal().child(pos);

        let (separator, right_handle) = if self.nodes.get(child).is_leaf() {
            let leaf = self.nodes.get_mut(child).as_leaf_mut();
            let (separator, mut right) = leaf.split();
            let old_next = leaf.next();

            // Splice the new leaf into the chain between `child` and its
            // old right neighbour.
            right.set_prev(Some(child));
            right.set_next(old_next);
            let right_handle = self.nodes.alloc(Node::Leaf(right));

            self.nodes.get_mut(child).as_leaf_mut().set_next(Some(right_handle));
            if let Some(next) = old_next {
                self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(right_handle));
            }

            (separator, right_handle)
        } else {
            let (median, right) = self.nodes.get_mut(child).as_internal_mut().split();
            (median, self.nodes.alloc(Node::Internal(right)))
        };

        self.nodes.get_mut(parent).as_internal_mut().insert_child(pos, separator, right_handle);
    }

    /// Removes a key from the tree, returning the stored key if it was
    /// present.
    pub(crate) fn erase<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let root = self.root?;

        let removed = match self.erase_from(root, key) {
            EraseStatus::Missing => return None,
            EraseStatus::Removed(removed) => removed,
            EraseStatus::Underflowed(removed) => {
                // A root leaf may hold fewer than N keys. A root internal
                // node that lost its last separator has exactly one child
                // left, which becomes the new root one level down.
                let root_node = self.nodes.get(root);
                if !root_node.is_leaf() && root_node.key_count() == 0 {
                    let new_root = root_node.as_internal().child(0);
                    self.nodes.free(root);
                    self.root = Some(new_root);
                }
                removed
            }
        };

        self.len -= 1;
        if self.len == 0 {
            self.clear();
        }
        Some(removed)
    }

    /// Recursively erases under `node`, repairing child underflows on the
    /// way back up.
    fn erase_from<Q>(&mut self, node: Handle, key: &Q) -> EraseStatus<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.nodes.get(node).is_leaf() {
            let leaf = self.nodes.get_mut(node).as_leaf_mut();
            return match leaf.search(key) {
                SearchResult::NotFound(_) => EraseStatus::Missing,
                SearchResult::Found(index) => {
                    let removed = leaf.remove(index);
                    if leaf.is_at_minimum() {
                        EraseStatus::Underflowed(removed)
                    } else {
                        EraseStatus::Removed(removed)
                    }
                }
            };
        }

        let internal = self.nodes.get(node).as_internal();
        let pos = internal.route(key);
        let child = internal.child(pos);

        match self.erase_from(child, key) {
            EraseStatus::Underflowed(removed) => {
                self.rebalance_child(node, pos);
                if self.nodes.get(node).as_internal().is_at_minimum() {
                    EraseStatus::Underflowed(removed)
                } else {
                    EraseStatus::Removed(removed)
                }
            }
            status => status,
        }
    }

    /// Restores the minimum key count of the deficient child at `pos`:
    /// borrow a key from the right sibling, else from the left sibling,
    /// else fuse the child with a neighbour.
    fn rebalance_child(&mut self, parent: Handle, pos: usize) {
        let parent_node = self.nodes.get(parent).as_internal();
        let child_count = parent_node.child_count();
        let child_is_leaf = self.nodes.get(parent_node.child(pos)).is_leaf();

        if pos + 1 < child_count {
            let right = self.nodes.get(parent).as_internal().child(pos + 1);
            if self.nodes.get(right).can_lend() {
                if child_is_leaf {
                    self.leaf_borrow_from_right(parent, pos);
                } else {
                    self.internal_borrow_from_right(parent, pos);
                }
                return;
            }
        }

        if pos > 0 {
            let left = self.nodes.get(parent).as_internal().child(pos - 1);
            if self.nodes.get(left).can_lend() {
                if child_is_leaf {
                    self.leaf_borrow_from_left(parent, pos);
                } else {
                    self.internal_borrow_from_left(parent, pos);
                }
                return;
            }
        }

        // No sibling can lend, so every neighbour holds exactly N keys and
        // the fused node stays within bounds. Prefer the left neighbour.
        if pos > 0 {
            self.fuse_children(parent, pos - 1);
        } else {
            self.fuse_children(parent, pos);
        }
    }

    /// Moves the right sibling's first key to the end of the leaf at `pos`,
    /// refreshing the separator to the right sibling's new first key.
    fn leaf_borrow_from_right(&mut self, parent: Handle, pos: usize) {
        let parent_node = self.nodes.get(parent).as_internal();
        let child = parent_node.child(pos);
        let right = parent_node.child(pos + 1);

        let right_leaf = self.nodes.get_mut(right).as_leaf_mut();
        let moved = right_leaf.pop_front().unwrap();
        let new_separator = right_leaf.key(0).clone();

        self.nodes.get_mut(child).as_leaf_mut().push(moved);
        self.nodes.get_mut(parent).as_internal_mut().replace_key(pos, new_separator);
    }

    /// Moves the left sibling's last key to the front of the leaf at `pos`,
    /// refreshing the separator to the moved key.
    fn leaf_borrow_from_left(&mut self, parent: Handle, pos: usize) {
        let parent_node = self.nodes.get(parent).as_internal();
        let child = parent_node.child(pos);
        let left = parent_node.child(pos - 1);

        let moved = self.nodes.get_mut(left).as_leaf_mut().pop().unwrap();

        let child_leaf = self.nodes.get_mut(child).as_leaf_mut();
        child_leaf.push_front(moved);
        let new_separator = child_leaf.key(0).clone();

        self.nodes.get_mut(parent).as_internal_mut().replace_key(pos - 1, new_separator);
    }

    /// Rotates one key from the right sibling through the parent: the old
    /// separator drops into the node at `pos`, the right sibling's first key
    /// replaces it, and the right sibling's first child moves across.
    fn internal_borrow_from_right(&mut self, parent: Handle, pos: usize) {
        let parent_node = self.nodes.get(parent).as_internal();
        let child = parent_node.child(pos);
        let right = parent_node.child(pos + 1);

        let (right_key, right_child) = self.nodes.get_mut(right).as_internal_mut().pop_front().unwrap();
        let old_separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(pos, right_key);
        self.nodes.get_mut(child).as_internal_mut().push(old_separator, right_child);
    }

    /// Rotates one key from the left sibling through the parent: the old
    /// separator drops into the node at `pos`, the left sibling's last key
    /// replaces it, and the left sibling's last child moves across.
    fn internal_borrow_from_left(&mut self, parent: Handle, pos: usize) {
        let parent_node = self.nodes.get(parent).as_internal();
        let child = parent_node.child(pos);
        let left = parent_node.child(pos - 1);

        let (left_key, left_child) = self.nodes.get_mut(left).as_internal_mut().pop().unwrap();
        let old_separator = self.nodes.get_mut(parent).as_internal_mut().replace_key(pos - 1, left_key);
        self.nodes.get_mut(child).as_internal_mut().push_front(old_separator, left_child);
    }

    /// Fuses the children on both sides of the separator at `sep_index`
    /// into the left one and releases the right one's slot.
    fn fuse_children(&mut self, parent: Handle, sep_index: usize) {
        let (separator, right) = self.nodes.get_mut(parent).as_internal_mut().remove_child(sep_index);
        let left = self.nodes.get(parent).as_internal().child(sep_index);

        match self.nodes.take(right) {
            Node::Leaf(right_leaf) => {
                // Between two leaves the separator was only a routing copy;
                // it is consumed with the fuse.
                let old_next = right_leaf.next();
                self.nodes.get_mut(left).as_leaf_mut().merge_with_right(right_leaf);
                if let Some(next) = old_next {
                    self.nodes.get_mut(next).as_leaf_mut().set_prev(Some(left));
                }
            }
            Node::Internal(right_internal) => {
                self.nodes.get_mut(left).as_internal_mut().merge_with_right(separator, right_internal);
            }
        }
    }
}

impl<K: fmt::Debug, const N: usize> RawBPlusSet<K, N> {
    /// Writes an indented rendering of the tree shape. Diagnostic only; the
    /// output format is not stable.
    pub(crate) fn dump(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "size: {}", self.len)?;
        match self.root {
            Some(root) => self.dump_node(out, root, 0),
            None => writeln!(out, "(empty)"),
        }
    }

    fn dump_node(&self, out: &mut dyn fmt::Write, handle: Handle, depth: usize) -> fmt::Result {
        for _ in 0..depth {
            write!(out, "    ")?;
        }
        match self.nodes.get(handle) {
            Node::Leaf(leaf) => writeln!(out, "leaf {:?}", leaf.keys()),
            Node::Internal(internal) => {
                writeln!(out, "internal {:?}", internal.keys())?;
                for i in 0..internal.child_count() {
                    self.dump_node(out, internal.child(i), depth + 1)?;
                }
                Ok(())
            }
        }
    }
}

impl<K: Clone, const N: usize> Clone for RawBPlusSet<K, N> {
    fn clone(&self) -> Self {
        fn clone_node<K: Clone, const N: usize>(
            old_nodes: &Arena<Node<K, N>>,
            new_nodes: &mut Arena<Node<K, N>>,
            old_handle: Handle,
        ) -> Handle {
            match old_nodes.get(old_handle) {
                Node::Leaf(leaf) => {
                    let mut new_leaf = LeafNode::new();
                    for key in leaf.keys() {
                        new_leaf.push(key.clone());
                    }
                    // prev/next are rebuilt once the whole shape exists.
                    new_nodes.alloc(Node::Leaf(new_leaf))
                }
                Node::Internal(internal) => {
                    let mut new_internal = InternalNode::new();

                    let first = clone_node(old_nodes, new_nodes, internal.child(0));
                    new_internal.set_first_child(first);

                    for i in 0..internal.key_count() {
                        let child = clone_node(old_nodes, new_nodes, internal.child(i + 1));
                        new_internal.push(internal.key(i).clone(), child);
                    }

                    new_nodes.alloc(Node::Internal(new_internal))
                }
            }
        }

        fn find_leaves<K, const N: usize>(nodes: &Arena<Node<K, N>>, root: Handle) -> Vec<Handle> {
            let mut leaves = Vec::new();
            let mut stack = alloc::vec![root];
            while let Some(handle) = stack.pop() {
                match nodes.get(handle) {
                    Node::Leaf(_) => leaves.push(handle),
                    Node::Internal(internal) => {
                        // Push children in reverse order so we visit them
                        // left to right.
                        for i in (0..internal.child_count()).rev() {
                            stack.push(internal.child(i));
                        }
                    }
                }
            }
            leaves
        }

        let Some(root) = self.root else {
            return Self {
                nodes: Arena::new(),
                root: None,
                len: 0,
                first_leaf: None,
            };
        };

        let mut new_nodes = Arena::with_capacity(self.nodes.capacity());
        let new_root = clone_node(&self.nodes, &mut new_nodes, root);

        // Rebuild the leaf chain in visit order.
        let leaves = find_leaves(&new_nodes, new_root);
        for i in 0..leaves.len() {
            let prev = if i > 0 { Some(leaves[i - 1]) } else { None };
            let next = leaves.get(i + 1).copied();
            let leaf = new_nodes.get_mut(leaves[i]).as_leaf_mut();
            leaf.set_prev(prev);
            leaf.set_next(next);
        }

        Self {
            nodes: new_nodes,
            root: Some(new_root),
            len: self.len,
            first_leaf: leaves.first().copied(),
        }
    }
}
