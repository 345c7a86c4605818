use super::arena::Arena;
use super::handle::Handle;
use super::node::Node;

/// The core B-tree implementation backing `BTreeBag`.
///
/// The tree owns every node through the arena; `parent`/`index` fields on the
/// nodes are navigational only. `len` is maintained incrementally and never
/// recomputed by traversal.
#[derive(Clone)]
pub(crate) struct RawBTreeBag<T> {
    /// Arena storing all tree nodes.
    nodes: Arena<Node<T>>,
    /// Handle to the root node, if the tree is non-empty.
    root: Option<Handle>,
    /// Maximum number of keys a node may hold before it must split.
    order: usize,
    /// Minimum key count for any non-root node, `order / 2`.
    min_keys: usize,
    /// Total number of stored keys.
    len: usize,
}

impl<T> RawBTreeBag<T> {
    /// Creates a new, empty tree. Order validation happens at the public
    /// constructor; anything below 3 cannot satisfy the occupancy invariants.
    pub(crate) fn new(order: usize) -> Self {
        debug_assert!(order >= 3, "`RawBTreeBag::new()` - `order` below structural minimum!");
        Self {
            nodes: Arena::new(),
            root: None,
            order,
            min_keys: order / 2,
            len: 0,
        }
    }

    pub(crate) const fn order(&self) -> usize {
        self.order
    }

    pub(crate) const fn min_keys(&self) -> usize {
        self.min_keys
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn root(&self) -> Option<Handle> {
        self.root
    }

    pub(crate) fn node(&self, handle: Handle) -> &Node<T> {
        self.nodes.get(handle)
    }

    /// Drops every node, leaving the tree empty.
    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Decomposes the tree for owning iteration.
    pub(crate) fn into_parts(self) -> (Arena<Node<T>>, Option<Handle>, usize) {
        (self.nodes, self.root, self.len)
    }

    /// Re-establishes `parent`/`index` on the children of `parent` starting
    /// at `from`. Called whenever a child array shifts or gains entries.
    fn refresh_children(&mut self, parent: Handle, from: usize) {
        for index in from..self.nodes.get(parent).child_count() {
            let child = self.nodes.get(parent).child(index);
            let child_node = self.nodes.get_mut(child);
            child_node.set_parent(Some(parent));
            child_node.set_index(index);
        }
    }
}

impl<T: Ord> RawBTreeBag<T> {
    /// Inserts an item, keeping any existing equal keys (multiset).
    pub(crate) fn insert(&mut self, item: T) {
        let Some(root) = self.root else {
            let mut node = Node::new(self.order, None, 0);
            node.push_key(item);
            self.root = Some(self.nodes.alloc(node));
            self.len = 1;
            return;
        };

        let leaf = self.insertion_leaf(root, &item);
        self.insert_and_split(leaf, item);
        self.len += 1;
    }

    /// Descends to the leaf where `item` belongs: at each internal node, the
    /// child before the first key greater than the item (ties go right).
    fn insertion_leaf(&self, mut current: Handle, item: &T) -> Handle {
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return current;
            }
            current = node.child(node.upper_bound(item));
        }
    }

    /// Inserts into a leaf and resolves any resulting overflow by splitting
    /// with median promotion, walking up toward the root.
    fn insert_and_split(&mut self, leaf: Handle, item: T) {
        let node = self.nodes.get_mut(leaf);
        let at = node.upper_bound(&item);
        node.insert_key(at, item);

        let mut current = leaf;
        while self.nodes.get(current).key_count() > self.order {
            let (median, right) = self.split(current);
            let parent = self.nodes.get(current).parent();

            let Some(parent) = parent else {
                // The promotion passed the old root: the left/right pair
                // becomes the new root's two children, the median its sole key.
                let mut root = Node::new(self.order, None, 0);
                root.push_key(median);
                root.push_child(current);
                root.push_child(right);
                let root_handle = self.nodes.alloc(root);
                self.root = Some(root_handle);
                self.refresh_children(root_handle, 0);
                return;
            };

            // The split left half kept this node's slot in the parent, so the
            // promoted key goes right at that position.
            let at = self.nodes.get(current).index();
            let parent_node = self.nodes.get_mut(parent);
            parent_node.insert_key(at, median);
            parent_node.insert_child(at + 1, right);
            self.refresh_children(parent, at + 1);

            current = parent;
        }
    }

    /// Splits an overfull node (`order + 1` keys). The node keeps everything
    /// before the median in place; a fresh right sibling takes everything
    /// after it. Returns the promoted median key and the new right node.
    ///
    /// The median sits at `order / 2 + 1` of the merged sequence for odd
    /// orders; for even orders that position would starve the right half
    /// below `min_keys`, so the balanced midpoint is used (identical for all
    /// odd orders). On a tie at the median between the freshly inserted item
    /// and an existing equal key, the existing key is promoted and the new
    /// item lands in the right half, because insertion placed it after its
    /// equals.
    fn split(&mut self, handle: Handle) -> (T, Handle) {
        let node = self.nodes.get_mut(handle);
        let median = node.key_count() / 2;
        let (median_key, keys, children) = node.split_off(median);
        let parent = node.parent();

        let right = Node::from_parts(keys, children, parent, 0);
        let right_handle = self.nodes.alloc(right);
        self.refresh_children(right_handle, 0);

        (median_key, right_handle)
    }

    /// Returns true if any stored key equals `item`.
    pub(crate) fn contains(&self, item: &T) -> bool {
        let mut current = self.root;
        while let Some(handle) = current {
            let node = self.nodes.get(handle);
            let at = node.lower_bound(item);
            if at < node.key_count() && node.key(at) == item {
                return true;
            }
            if node.is_leaf() {
                return false;
            }
            current = Some(node.child(at));
        }
        false
    }

    /// Returns the smallest stored key, `None` on an empty tree.
    pub(crate) fn min(&self) -> Option<&T> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return node.first_key();
            }
            current = node.child(0);
        }
    }

    /// Returns the largest stored key, `None` on an empty tree.
    pub(crate) fn max(&self) -> Option<&T> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return node.last_key();
            }
            current = node.child(node.child_count() - 1);
        }
    }

    /// Removes the first occurrence (in search order) of a key equal to
    /// `item`. Returns true iff a matching key existed and was removed.
    pub(crate) fn remove(&mut self, item: &T) -> bool {
        let Some(found) = self.removal_node(item) else {
            return false;
        };

        let node = self.nodes.get(found);
        let at = node.lower_bound(item);

        if node.is_leaf() {
            self.nodes.get_mut(found).remove_key(at);
            self.rebalance(found);
        } else {
            // Replace the matched key with its predecessor: the maximum of
            // the left child subtree, which always sits in a leaf.
            let pred_leaf = self.max_leaf(node.child(at));
            let pred = self
                .nodes
                .get_mut(pred_leaf)
                .pop_key()
                .expect("`RawBTreeBag::remove()` - predecessor leaf has no keys!");
            self.nodes.get_mut(found).replace_key(at, pred);
            self.rebalance(pred_leaf);
        }

        self.len -= 1;
        if self.len == 0 {
            // The tree is empty iff the root is absent; a root leaf drained
            // by removal is dropped rather than kept as a zero-key node.
            self.clear();
        }
        true
    }

    /// Finds the first node on the search path holding a key equal to `item`;
    /// unlike a leaf-only search, internal nodes may match.
    fn removal_node(&self, item: &T) -> Option<Handle> {
        let mut current = self.root?;
        loop {
            let node = self.nodes.get(current);
            let at = node.lower_bound(item);
            if at < node.key_count() && node.key(at) == item {
                return Some(current);
            }
            if node.is_leaf() {
                return None;
            }
            current = node.child(at);
        }
    }

    /// Follows last-child pointers down to a leaf.
    fn max_leaf(&self, mut current: Handle) -> Handle {
        loop {
            let node = self.nodes.get(current);
            if node.is_leaf() {
                return current;
            }
            current = node.child(node.child_count() - 1);
        }
    }

    /// Restores minimum occupancy bottom-up after a removal: borrow from the
    /// right sibling, else from the left, else merge; merging can leave the
    /// parent short, so the loop continues there. Stops at the root or once
    /// the node holds enough keys.
    fn rebalance(&mut self, mut handle: Handle) {
        loop {
            if Some(handle) == self.root || self.nodes.get(handle).key_count() >= self.min_keys {
                return;
            }

            let node = self.nodes.get(handle);
            let parent = node.parent().expect("`RawBTreeBag::rebalance()` - non-root node without a parent!");
            let index = node.index();
            let parent_keys = self.nodes.get(parent).key_count();

            if index < parent_keys {
                let right = self.nodes.get(parent).child(index + 1);
                if self.nodes.get(right).key_count() > self.min_keys {
                    self.rotate_left(handle, right);
                    return;
                }
            }

            if index > 0 {
                let left = self.nodes.get(parent).child(index - 1);
                if self.nodes.get(left).key_count() > self.min_keys {
                    self.rotate_right(left, handle);
                    return;
                }
            }

            // Neither sibling can lend; merge through the parent separator,
            // preferring the right sibling.
            let merged_parent = if index < parent_keys {
                let right = self.nodes.get(parent).child(index + 1);
                self.sandwich(handle, right)
            } else {
                let left = self.nodes.get(parent).child(index - 1);
                self.sandwich(left, handle)
            };

            match merged_parent {
                Some(parent) => handle = parent,
                None => return,
            }
        }
    }

    /// Index of the parent key separating a left node from its right sibling:
    /// 0 for the first child, `key_count - 1` past the last separator, else
    /// the node's own index.
    fn separator_index(&self, left: Handle) -> usize {
        let node = self.nodes.get(left);
        let index = node.index();
        if index == 0 {
            return 0;
        }
        let parent = node.parent().expect("`RawBTreeBag::separator_index()` - node without a parent!");
        if index == self.nodes.get(parent).key_count() { index - 1 } else { index }
    }

    /// Borrows one key from the right sibling: the parent separator moves
    /// down into `handle`, the sibling's first key moves up into that parent
    /// slot, and the sibling's leftmost child transplants across.
    fn rotate_left(&mut self, handle: Handle, right: Handle) {
        let separator = self.separator_index(handle);
        let parent = self.nodes.get(handle).parent().expect("`RawBTreeBag::rotate_left()` - node without a parent!");

        let first = self.nodes.get_mut(right).remove_key(0);
        let separator_key = self.nodes.get_mut(parent).replace_key(separator, first);
        self.nodes.get_mut(handle).push_key(separator_key);

        if !self.nodes.get(right).is_leaf() {
            let moved = self.nodes.get_mut(right).remove_child(0);
            self.refresh_children(right, 0);
            self.nodes.get_mut(handle).push_child(moved);
            let last = self.nodes.get(handle).child_count() - 1;
            let moved_node = self.nodes.get_mut(moved);
            moved_node.set_parent(Some(handle));
            moved_node.set_index(last);
        }
    }

    /// Mirror of [`rotate_left`](Self::rotate_left): borrows the left
    /// sibling's last key and child through the parent separator.
    fn rotate_right(&mut self, left: Handle, handle: Handle) {
        let separator = self.separator_index(left);
        let parent = self.nodes.get(left).parent().expect("`RawBTreeBag::rotate_right()` - node without a parent!");

        let last = self
            .nodes
            .get_mut(left)
            .pop_key()
            .expect("`RawBTreeBag::rotate_right()` - lending sibling has no keys!");
        let separator_key = self.nodes.get_mut(parent).replace_key(separator, last);
        self.nodes.get_mut(handle).insert_key(0, separator_key);

        if !self.nodes.get(left).is_leaf() {
            let moved = self.nodes.get_mut(left).pop_child().expect("`RawBTreeBag::rotate_right()` - internal node without children!");
            self.nodes.get_mut(handle).insert_child(0, moved);
            self.refresh_children(handle, 0);
        }
    }

    /// Merges two siblings and their parent separator into one fresh node,
    /// removing the separator key and the redundant child from the parent.
    /// Returns the parent when it may now be short itself, or `None` once the
    /// root collapsed.
    fn sandwich(&mut self, left: Handle, right: Handle) -> Option<Handle> {
        let separator = self.separator_index(left);
        let parent = self.nodes.get(left).parent().expect("`RawBTreeBag::sandwich()` - node without a parent!");

        let separator_key = self.nodes.get_mut(parent).remove_key(separator);
        let right_node = self.nodes.take(right);
        let left_node = self.nodes.take(left);
        let merged = Node::sandwich(self.order, left_node, separator_key, right_node);
        let merged_handle = self.nodes.alloc(merged);
        self.refresh_children(merged_handle, 0);

        let parent_node = self.nodes.get_mut(parent);
        parent_node.set_child(separator, merged_handle);
        parent_node.remove_child(separator + 1);
        self.refresh_children(parent, separator);

        if self.nodes.get(parent).key_count() == 0 && Some(parent) == self.root {
            // The merge drained the root; the merged node takes its place.
            self.nodes.free(parent);
            self.root = Some(merged_handle);
            let merged_node = self.nodes.get_mut(merged_handle);
            merged_node.set_parent(None);
            merged_node.set_index(0);
            return None;
        }

        Some(parent)
    }
}
