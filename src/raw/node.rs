use smallvec::SmallVec;

use super::handle::Handle;

/// Inline capacity for per-node storage; trees with orders above this spill
/// node arrays to the heap.
pub(crate) const INLINE_KEYS: usize = 8;

pub(crate) type KeyStore<T> = SmallVec<[T; INLINE_KEYS]>;
pub(crate) type ChildStore = SmallVec<[Handle; INLINE_KEYS + 1]>;

/// A single B-tree node, leaf or internal.
///
/// A node is a leaf iff its child array is empty; internal nodes carry
/// exactly `keys.len() + 1` children. Keys are sorted ascending and
/// duplicates are allowed. Capacity is reserved for one key beyond the tree
/// order so a split can work on the overfull node in place.
///
/// `parent` and `index` are non-owning navigational back-references: `index`
/// is this node's position in its parent's child array, kept current by the
/// tree whenever a node is re-parented or a sibling array shifts.
#[derive(Clone)]
pub(crate) struct Node<T> {
    keys: KeyStore<T>,
    children: ChildStore,
    parent: Option<Handle>,
    index: usize,
}

impl<T> Node<T> {
    /// Creates a new empty leaf node.
    pub(crate) fn new(order: usize, parent: Option<Handle>, index: usize) -> Self {
        Self {
            keys: KeyStore::with_capacity(order + 1),
            children: ChildStore::new(),
            parent,
            index,
        }
    }

    /// Assembles a node from storage split off an overfull sibling.
    pub(crate) fn from_parts(keys: KeyStore<T>, children: ChildStore, parent: Option<Handle>, index: usize) -> Self {
        Self {
            keys,
            children,
            parent,
            index,
        }
    }

    /// Builds the merge of two siblings around their parent separator key.
    /// Concatenating the child arrays also covers the degenerate sibling that
    /// is down to zero keys and one child.
    pub(crate) fn sandwich(order: usize, mut left: Node<T>, separator: T, mut right: Node<T>) -> Self {
        let mut node = Node::new(order, left.parent, left.index);
        node.keys.append(&mut left.keys);
        node.keys.push(separator);
        node.keys.append(&mut right.keys);
        node.children.append(&mut left.children);
        node.children.append(&mut right.children);
        node
    }

    /// Takes the node apart for owning iteration.
    pub(crate) fn into_parts(self) -> (KeyStore<T>, ChildStore) {
        (self.keys, self.children)
    }

    /// Returns true if this node is a leaf.
    pub(crate) fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of keys in this node.
    pub(crate) fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Returns the number of children in this node.
    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    #[inline]
    pub(crate) fn key(&self, index: usize) -> &T {
        &self.keys[index]
    }

    pub(crate) fn keys(&self) -> &[T] {
        &self.keys
    }

    pub(crate) fn first_key(&self) -> Option<&T> {
        self.keys.first()
    }

    pub(crate) fn last_key(&self) -> Option<&T> {
        self.keys.last()
    }

    #[inline]
    pub(crate) fn child(&self, index: usize) -> Handle {
        self.children[index]
    }

    pub(crate) fn parent(&self) -> Option<Handle> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<Handle>) {
        self.parent = parent;
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    pub(crate) fn insert_key(&mut self, index: usize, key: T) {
        self.keys.insert(index, key);
    }

    pub(crate) fn remove_key(&mut self, index: usize) -> T {
        self.keys.remove(index)
    }

    pub(crate) fn push_key(&mut self, key: T) {
        self.keys.push(key);
    }

    pub(crate) fn pop_key(&mut self) -> Option<T> {
        self.keys.pop()
    }

    /// Swaps in a key at the given position, returning the old one.
    pub(crate) fn replace_key(&mut self, index: usize, key: T) -> T {
        core::mem::replace(&mut self.keys[index], key)
    }

    pub(crate) fn insert_child(&mut self, index: usize, child: Handle) {
        self.children.insert(index, child);
    }

    pub(crate) fn remove_child(&mut self, index: usize) -> Handle {
        self.children.remove(index)
    }

    pub(crate) fn set_child(&mut self, index: usize, child: Handle) {
        self.children[index] = child;
    }

    pub(crate) fn push_child(&mut self, child: Handle) {
        self.children.push(child);
    }

    pub(crate) fn pop_child(&mut self) -> Option<Handle> {
        self.children.pop()
    }
}

impl<T: Ord> Node<T> {
    /// Index of the first key `>=` the probe, `key_count()` if none.
    /// The first match of a duplicated key sits exactly here.
    #[inline]
    pub(crate) fn lower_bound(&self, key: &T) -> usize {
        self.keys.partition_point(|k| k < key)
    }

    /// Index of the first key `>` the probe, `key_count()` if none. Used as
    /// the insertion point, so a new key lands after any equal keys and ties
    /// descend into the right child.
    #[inline]
    pub(crate) fn upper_bound(&self, key: &T) -> usize {
        self.keys.partition_point(|k| k <= key)
    }

    /// Splits the overfull node at the median. The node keeps everything
    /// before the median; the key at the median and the storage for the right
    /// half are handed back for promotion.
    pub(crate) fn split_off(&mut self, median: usize) -> (T, KeyStore<T>, ChildStore) {
        let keys = self.keys.drain(median + 1..).collect();
        let children = if self.is_leaf() {
            ChildStore::new()
        } else {
            self.children.drain(median + 1..).collect()
        };
        let median_key = self.keys.pop().expect("`Node::split_off()` - split of a node with no keys!");
        (median_key, keys, children)
    }
}
