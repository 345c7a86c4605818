//! An order-configurable B-tree multiset.

use core::fmt;
use core::iter::FusedIterator;

use smallvec::SmallVec;

use crate::error::Error;
use crate::raw::{Arena, ChildStore, Handle, KeyStore, Node, RawBTreeBag};

/// The smallest node order a tree can be built with.
///
/// Below this, a node could not hold the two keys a split must distribute, so
/// the occupancy invariants become unsatisfiable.
pub const MIN_ORDER: usize = 3;

/// Inline depth for iterator stacks; trees deeper than this (billions of keys
/// at any practical order) spill to the heap.
const INLINE_DEPTH: usize = 16;

/// An ordered multiset based on a B-tree with a runtime-configurable node
/// order.
///
/// Unlike [`BTreeSet`](std::collections::BTreeSet), inserting an item equal to
/// one already stored never rejects or overwrites it; every copy is kept and
/// counted, and [`remove`](BTreeBag::remove) takes copies out one at a time.
/// The node order (the maximum number of keys per node) is picked when the
/// tree is built, which makes small orders available for stress-testing the
/// split and merge machinery and large orders for fewer, fatter nodes.
///
/// It is a logic error for an item to be modified in such a way that the
/// item's ordering relative to any other item, as determined by the [`Ord`]
/// trait, changes while it is in the bag. This is normally only possible
/// through [`Cell`], [`RefCell`], global state, I/O, or unsafe code. The
/// behavior resulting from such a logic error is not specified, but will be
/// encapsulated to the `BTreeBag` that observed it and not result in undefined
/// behavior.
///
/// [`Cell`]: core::cell::Cell
/// [`RefCell`]: core::cell::RefCell
///
/// # Examples
///
/// ```
/// use btree_bag::BTreeBag;
///
/// let mut primes = BTreeBag::new(4)?;
///
/// primes.insert(5);
/// primes.insert(2);
/// primes.insert(3);
/// primes.insert(5); // kept alongside the first 5
///
/// assert_eq!(primes.len(), 4);
/// assert_eq!(primes.min(), Some(&2));
/// assert_eq!(primes.iter().copied().collect::<Vec<_>>(), [2, 3, 5, 5]);
/// # Ok::<(), btree_bag::Error>(())
/// ```
pub struct BTreeBag<T> {
    raw: RawBTreeBag<T>,
}

/// An iterator over the items of a `BTreeBag`, in ascending order.
///
/// This `struct` is created by the [`iter`] method on [`BTreeBag`]. See its
/// documentation for more.
///
/// [`iter`]: BTreeBag::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, T> {
    raw: &'a RawBTreeBag<T>,
    /// Positions still to visit; the top entry names the next key to yield.
    stack: SmallVec<[(Handle, usize); INLINE_DEPTH]>,
    remaining: usize,
}

/// An iterator over the items of a `BTreeBag` in node-discovery order.
///
/// This `struct` is created by the [`iter_unordered`] method on [`BTreeBag`].
/// See its documentation for more.
///
/// [`iter_unordered`]: BTreeBag::iter_unordered
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct IterUnordered<'a, T> {
    raw: &'a RawBTreeBag<T>,
    /// The node currently being drained and the next key index within it.
    current: Option<(Handle, usize)>,
    /// Discovered but not yet drained nodes.
    pending: SmallVec<[Handle; INLINE_DEPTH]>,
    remaining: usize,
}

/// An owning iterator over the items of a `BTreeBag`, in ascending order.
///
/// This `struct` is created by the [`into_iter`] method on [`BTreeBag`]
/// (provided by the [`IntoIterator`] trait). See its documentation for more.
///
/// [`into_iter`]: BTreeBag#method.into_iter
pub struct IntoIter<T> {
    nodes: Arena<Node<T>>,
    frames: Vec<Frame<T>>,
    remaining: usize,
}

/// One partially consumed node on the owning iterator's descent path. The
/// first child is consumed on the way down, so `children.next()` after
/// yielding `keys` item `i` hands back child `i + 1`.
struct Frame<T> {
    keys: <KeyStore<T> as IntoIterator>::IntoIter,
    children: <ChildStore as IntoIterator>::IntoIter,
}

impl<T> BTreeBag<T> {
    /// Makes a new, empty `BTreeBag` whose nodes hold at most `order` keys.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OrderTooSmall`] if `order` is below [`MIN_ORDER`].
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::{BTreeBag, Error};
    ///
    /// let bag: BTreeBag<i32> = BTreeBag::new(8)?;
    /// assert!(bag.is_empty());
    ///
    /// assert_eq!(BTreeBag::<i32>::new(2).unwrap_err(), Error::OrderTooSmall(2));
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1); no allocation happens until the first insert.
    pub fn new(order: usize) -> Result<BTreeBag<T>, Error> {
        if order < MIN_ORDER {
            return Err(Error::OrderTooSmall(order));
        }
        Ok(BTreeBag {
            raw: RawBTreeBag::new(order),
        })
    }

    /// Returns the node order this bag was built with.
    #[must_use]
    pub const fn order(&self) -> usize {
        self.raw.order()
    }

    /// Returns the minimum key count for non-root nodes, `order / 2`.
    #[must_use]
    pub const fn min_keys(&self) -> usize {
        self.raw.min_keys()
    }

    /// Returns the number of items in the bag, counting every duplicate.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// assert_eq!(bag.len(), 0);
    /// bag.insert(1);
    /// bag.insert(1);
    /// assert_eq!(bag.len(), 2);
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the bag contains no items.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Clears the bag, removing all items.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.insert(1);
    /// bag.clear();
    /// assert!(bag.is_empty());
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Gets an iterator over the items of the bag, in ascending order.
    /// Duplicates appear as many times as they were inserted.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.extend([3, 1, 2, 1]);
    ///
    /// assert_eq!(bag.iter().copied().collect::<Vec<_>>(), [1, 1, 2, 3]);
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; O(n) for a full traversal, with O(1)
    /// amortized per item.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter {
            raw: &self.raw,
            stack: SmallVec::new(),
            remaining: self.raw.len(),
        };
        if let Some(root) = self.raw.root() {
            iter.push_left_spine(root);
        }
        iter
    }

    /// Gets an iterator over the items of the bag with no ordering guarantee.
    ///
    /// Nodes are visited as they are discovered, so items come out grouped by
    /// node rather than globally sorted. Every item is yielded exactly once.
    /// Useful when the whole bag is being drained or inspected and sorted
    /// order is not worth maintaining an in-order descent for.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.extend([5, 3, 8, 1]);
    ///
    /// let mut items: Vec<_> = bag.iter_unordered().copied().collect();
    /// items.sort_unstable();
    /// assert_eq!(items, [1, 3, 5, 8]);
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1) to create the iterator; O(n) for a full traversal.
    pub fn iter_unordered(&self) -> IterUnordered<'_, T> {
        let mut pending = SmallVec::new();
        if let Some(root) = self.raw.root() {
            pending.push(root);
        }
        IterUnordered {
            raw: &self.raw,
            current: None,
            pending,
            remaining: self.raw.len(),
        }
    }
}

impl<T: Ord> BTreeBag<T> {
    /// Adds an item to the bag.
    ///
    /// Items equal to ones already present are always kept; insertion never
    /// fails and never overwrites.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.insert(2);
    /// bag.insert(2);
    /// assert_eq!(bag.len(), 2);
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, item: T) {
        self.raw.insert(item);
    }

    /// Returns `true` if the bag contains an item equal to the given value.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.extend([1, 2, 3]);
    /// assert!(bag.contains(&1));
    /// assert!(!bag.contains(&4));
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn contains(&self, item: &T) -> bool {
        self.raw.contains(item)
    }

    /// Returns a reference to the smallest item in the bag, or `None` if the
    /// bag is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// assert_eq!(bag.min(), None);
    /// bag.insert(2);
    /// bag.insert(1);
    /// assert_eq!(bag.min(), Some(&1));
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn min(&self) -> Option<&T> {
        self.raw.min()
    }

    /// Returns a reference to the largest item in the bag, or `None` if the
    /// bag is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// assert_eq!(bag.max(), None);
    /// bag.insert(1);
    /// bag.insert(2);
    /// assert_eq!(bag.max(), Some(&2));
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn max(&self) -> Option<&T> {
        self.raw.max()
    }

    /// Removes one item equal to the given value from the bag, if any, and
    /// drops it. Returns whether such an item was present.
    ///
    /// When the value is duplicated, exactly one copy is removed per call.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.insert(2);
    /// bag.insert(2);
    ///
    /// assert!(bag.remove(&2));
    /// assert!(bag.contains(&2));
    /// assert!(bag.remove(&2));
    /// assert!(!bag.remove(&2));
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove(&mut self, item: &T) -> bool {
        self.raw.remove(item)
    }
}

impl<T: Clone> Clone for BTreeBag<T> {
    fn clone(&self) -> Self {
        BTreeBag {
            raw: self.raw.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for BTreeBag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Ord> Extend<T> for BTreeBag<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.insert(item);
        }
    }
}

impl<'a, T: 'a + Ord + Copy> Extend<&'a T> for BTreeBag<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for &item in iter {
            self.insert(item);
        }
    }
}

impl<T> IntoIterator for BTreeBag<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    /// Gets an iterator for moving out the `BTreeBag`'s contents in ascending
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use btree_bag::BTreeBag;
    ///
    /// let mut bag = BTreeBag::new(3)?;
    /// bag.extend([4, 2, 3, 1]);
    ///
    /// let v: Vec<_> = bag.into_iter().collect();
    /// assert_eq!(v, [1, 2, 3, 4]);
    /// # Ok::<(), btree_bag::Error>(())
    /// ```
    fn into_iter(self) -> IntoIter<T> {
        let (nodes, root, len) = self.raw.into_parts();
        let mut iter = IntoIter {
            nodes,
            frames: Vec::new(),
            remaining: len,
        };
        if let Some(root) = root {
            iter.push_left_spine(root);
        }
        iter
    }
}

impl<'a, T> IntoIterator for &'a BTreeBag<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> Iter<'a, T> {
    /// Descends along first children from `handle`, recording each node so
    /// its smallest key is yielded first.
    fn push_left_spine(&mut self, mut handle: Handle) {
        loop {
            self.stack.push((handle, 0));
            let node = self.raw.node(handle);
            if node.is_leaf() {
                return;
            }
            handle = node.child(0);
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let (handle, index) = self.stack.pop()?;
        let node = self.raw.node(handle);

        // Everything below child `index` has been yielded. The node re-enters
        // the stack under the spine of the subtree between this key and the
        // next one.
        if index + 1 < node.key_count() {
            self.stack.push((handle, index + 1));
        }
        if !node.is_leaf() {
            self.push_left_spine(node.child(index + 1));
        }

        self.remaining -= 1;
        Some(node.key(index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw,
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}

impl<'a, T> Iterator for IterUnordered<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            if let Some((handle, index)) = self.current {
                let node = self.raw.node(handle);
                if index < node.key_count() {
                    self.current = Some((handle, index + 1));
                    self.remaining -= 1;
                    return Some(node.key(index));
                }
                self.current = None;
            }

            // Discover the next node; its children queue up behind it.
            let handle = self.pending.pop()?;
            let node = self.raw.node(handle);
            for index in 0..node.child_count() {
                self.pending.push(node.child(index));
            }
            self.current = Some((handle, 0));
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterUnordered<'_, T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for IterUnordered<'_, T> {}

impl<T> Clone for IterUnordered<'_, T> {
    fn clone(&self) -> Self {
        IterUnordered {
            raw: self.raw,
            current: self.current,
            pending: self.pending.clone(),
            remaining: self.remaining,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for IterUnordered<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterUnordered").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}

impl<T> IntoIter<T> {
    /// Takes ownership of each node along the leftmost path under `handle`,
    /// opening a frame per node with its first child already consumed.
    fn push_left_spine(&mut self, mut handle: Handle) {
        loop {
            let (keys, children) = self.nodes.take(handle).into_parts();
            let mut frame = Frame {
                keys: keys.into_iter(),
                children: children.into_iter(),
            };
            let first_child = frame.children.next();
            self.frames.push(frame);
            match first_child {
                Some(child) => handle = child,
                None => return,
            }
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        loop {
            let frame = self.frames.last_mut()?;
            let Some(key) = frame.keys.next() else {
                self.frames.pop();
                continue;
            };

            // The subtree between this key and the next one comes next.
            let child = frame.children.next();
            if let Some(child) = child {
                self.push_left_spine(child);
            }

            self.remaining -= 1;
            return Some(key);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<T> FusedIterator for IntoIter<T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter").field("remaining", &self.remaining).finish_non_exhaustive()
    }
}
