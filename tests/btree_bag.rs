use std::collections::BTreeMap;

use btree_bag::{BTreeBag, Error, MIN_ORDER};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// The number of operations to perform in each proptest case.
const TEST_SIZE: usize = 10_000;

/// Generates random values in a range narrow enough to force duplicates.
fn value_strategy() -> impl Strategy<Value = i64> {
    -500i64..500i64
}

/// A sorted-multiset model: value to occurrence count.
#[derive(Default)]
struct Counts(BTreeMap<i64, usize>);

impl Counts {
    fn insert(&mut self, value: i64) {
        *self.0.entry(value).or_insert(0) += 1;
    }

    fn remove(&mut self, value: i64) -> bool {
        match self.0.get_mut(&value) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    self.0.remove(&value);
                }
                true
            }
            None => false,
        }
    }

    fn contains(&self, value: i64) -> bool {
        self.0.contains_key(&value)
    }

    fn len(&self) -> usize {
        self.0.values().sum()
    }

    fn min(&self) -> Option<&i64> {
        self.0.keys().next()
    }

    fn max(&self) -> Option<&i64> {
        self.0.keys().next_back()
    }

    fn items(&self) -> Vec<i64> {
        self.0.iter().flat_map(|(&value, &count)| std::iter::repeat_n(value, count)).collect()
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

#[test]
fn orders_below_the_minimum_are_rejected() {
    assert_eq!(BTreeBag::<i32>::new(0).unwrap_err(), Error::OrderTooSmall(0));
    assert_eq!(BTreeBag::<i32>::new(2).unwrap_err(), Error::OrderTooSmall(2));

    for order in MIN_ORDER..16 {
        let bag = BTreeBag::<i32>::new(order).unwrap();
        assert_eq!(bag.order(), order);
        assert!(bag.is_empty());
    }
}

// ─── Multiset semantics ──────────────────────────────────────────────────────

#[test]
fn duplicates_are_kept_counted_and_iterated() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([7, 3, 7, 7, 1]);

    assert_eq!(bag.len(), 5);
    assert!(bag.contains(&7));
    assert_eq!(bag.iter().copied().collect::<Vec<_>>(), [1, 3, 7, 7, 7]);
}

#[test]
fn remove_takes_one_occurrence_per_call() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([4, 4, 4]);

    assert!(bag.remove(&4));
    assert_eq!(bag.len(), 2);
    assert!(bag.remove(&4));
    assert!(bag.remove(&4));
    assert!(!bag.remove(&4));
    assert!(bag.is_empty());
}

#[test]
fn removal_from_a_small_tree_leaves_a_sorted_walk() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([10, 20, 5, 6, 12, 30, 7, 17]);

    assert!(bag.remove(&6));
    assert_eq!(bag.len(), 7);
    assert_eq!(bag.iter().copied().collect::<Vec<_>>(), [5, 7, 10, 12, 17, 20, 30]);
}

#[test]
fn thousand_key_ascending_build() {
    let mut bag = BTreeBag::new(3).unwrap();
    assert_eq!(bag.min_keys(), 1);
    bag.extend(-200..800);

    assert_eq!(bag.len(), 1000);
    assert!(bag.contains(&0));
    assert!(!bag.contains(&-201));
    assert_eq!(bag.min(), Some(&-200));
    assert_eq!(bag.max(), Some(&799));
}

#[test]
fn queries_on_an_empty_bag() {
    let mut bag: BTreeBag<i32> = BTreeBag::new(4).unwrap();

    assert_eq!(bag.min(), None);
    assert_eq!(bag.max(), None);
    assert!(!bag.contains(&1));
    assert!(!bag.remove(&1));
    assert_eq!(bag.iter().next(), None);
    assert_eq!(bag.iter_unordered().next(), None);
}

#[test]
fn clear_resets_the_bag_for_reuse() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend(0..100);

    bag.clear();
    assert!(bag.is_empty());
    assert_eq!(bag.iter().count(), 0);

    bag.insert(42);
    assert_eq!(bag.len(), 1);
    assert!(bag.contains(&42));
}

#[test]
fn drain_and_refill_cycles() {
    let mut bag = BTreeBag::new(3).unwrap();

    for round in 0..3 {
        for value in 0..50 {
            bag.insert(value * (round + 1));
        }
        for value in 0..50 {
            assert!(bag.remove(&(value * (round + 1))), "round {round}, value {value}");
        }
        assert!(bag.is_empty());
    }
}

// ─── Iterators ───────────────────────────────────────────────────────────────

#[test]
fn iterators_report_exact_sizes() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([5, 1, 3, 1]);

    let mut iter = bag.iter();
    assert_eq!(iter.len(), 4);
    iter.next();
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.size_hint(), (3, Some(3)));

    let mut unordered = bag.iter_unordered();
    assert_eq!(unordered.len(), 4);
    unordered.next();
    assert_eq!(unordered.len(), 3);

    let mut into_iter = bag.into_iter();
    assert_eq!(into_iter.len(), 4);
    into_iter.next();
    assert_eq!(into_iter.len(), 3);
}

#[test]
fn unordered_iteration_yields_the_same_multiset() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([9, 2, 7, 2, 5, 9, 1]);

    let mut unordered: Vec<_> = bag.iter_unordered().copied().collect();
    unordered.sort_unstable();
    assert_eq!(unordered, bag.iter().copied().collect::<Vec<_>>());
}

#[test]
fn into_iter_moves_non_copy_items_out_in_order() {
    let mut bag = BTreeBag::new(3).unwrap();
    for word in ["pear", "apple", "pear", "fig"] {
        bag.insert(word.to_owned());
    }

    let items: Vec<String> = bag.into_iter().collect();
    assert_eq!(items, ["apple", "fig", "pear", "pear"]);
}

#[test]
fn debug_lists_items_in_order() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend([2, 1, 2]);

    assert_eq!(format!("{bag:?}"), "[1, 2, 2]");
}

#[test]
fn clones_are_independent() {
    let mut bag = BTreeBag::new(3).unwrap();
    bag.extend(0..32);

    let mut copy = bag.clone();
    copy.remove(&0);
    copy.insert(99);

    assert_eq!(bag.len(), 32);
    assert!(bag.contains(&0));
    assert!(!bag.contains(&99));
    assert_eq!(copy.len(), 32);
}

// ─── Randomized model tests ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum BagOp {
    Insert(i64),
    Remove(i64),
    Contains(i64),
    Min,
    Max,
}

fn bag_op_strategy() -> impl Strategy<Value = BagOp> {
    prop_oneof![
        5 => value_strategy().prop_map(BagOp::Insert),
        3 => value_strategy().prop_map(BagOp::Remove),
        2 => value_strategy().prop_map(BagOp::Contains),
        1 => Just(BagOp::Min),
        1 => Just(BagOp::Max),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Replays a random operation sequence on both the bag and a counting
    /// model and asserts identical results at every step.
    #[test]
    fn bag_ops_match_counting_model(
        order in MIN_ORDER..65usize,
        ops in proptest::collection::vec(bag_op_strategy(), TEST_SIZE),
    ) {
        let mut bag: BTreeBag<i64> = BTreeBag::new(order).unwrap();
        let mut model = Counts::default();

        for op in &ops {
            match op {
                BagOp::Insert(v) => {
                    bag.insert(*v);
                    model.insert(*v);
                }
                BagOp::Remove(v) => {
                    prop_assert_eq!(bag.remove(v), model.remove(*v), "remove({})", v);
                }
                BagOp::Contains(v) => {
                    prop_assert_eq!(bag.contains(v), model.contains(*v), "contains({})", v);
                }
                BagOp::Min => {
                    prop_assert_eq!(bag.min(), model.min(), "min()");
                }
                BagOp::Max => {
                    prop_assert_eq!(bag.max(), model.max(), "max()");
                }
            }
            prop_assert_eq!(bag.len(), model.len(), "len mismatch after {:?}", op);
            prop_assert_eq!(bag.is_empty(), model.len() == 0, "is_empty mismatch after {:?}", op);
        }
    }

    /// Tests that all three iterators agree with the model after random
    /// insertions, across a spread of node orders.
    #[test]
    fn iterators_match_the_model(
        order in MIN_ORDER..65usize,
        values in proptest::collection::vec(value_strategy(), TEST_SIZE),
    ) {
        let mut bag: BTreeBag<i64> = BTreeBag::new(order).unwrap();
        let mut model = Counts::default();
        for &value in &values {
            bag.insert(value);
            model.insert(value);
        }
        let expected = model.items();

        let ordered: Vec<_> = bag.iter().copied().collect();
        prop_assert_eq!(&ordered, &expected, "iter() mismatch");

        let mut unordered: Vec<_> = bag.iter_unordered().copied().collect();
        unordered.sort_unstable();
        prop_assert_eq!(&unordered, &expected, "iter_unordered() mismatch");

        let owned: Vec<_> = bag.into_iter().collect();
        prop_assert_eq!(&owned, &expected, "into_iter() mismatch");
    }

    /// Builds a bag, removes a random subset, and checks the remainder.
    #[test]
    fn remainder_after_partial_removal_is_exact(
        order in MIN_ORDER..17usize,
        values in proptest::collection::vec(value_strategy(), 1..TEST_SIZE),
        seed in any::<usize>(),
    ) {
        let mut bag: BTreeBag<i64> = BTreeBag::new(order).unwrap();
        let mut model = Counts::default();
        for &value in &values {
            bag.insert(value);
            model.insert(value);
        }

        // Remove roughly half the inserted values, by value.
        for (i, &value) in values.iter().enumerate() {
            if (i ^ seed) % 2 == 0 {
                prop_assert_eq!(bag.remove(&value), model.remove(value));
            }
        }

        prop_assert_eq!(bag.len(), model.len());
        prop_assert_eq!(bag.iter().copied().collect::<Vec<_>>(), model.items());
    }
}
