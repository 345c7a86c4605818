//! An order-configurable B-tree multiset for Rust.
//!
//! This crate provides [`BTreeBag`], a height-balanced multi-way search tree
//! whose node order (the maximum number of keys per node) is chosen at
//! construction time. Unlike the standard library's `BTreeSet`, inserting a
//! key equal to one already present never rejects or overwrites it: the
//! collection is a multiset.
//!
//! # Example
//!
//! ```
//! use btree_bag::BTreeBag;
//!
//! let mut bag = BTreeBag::new(3)?;
//! bag.insert(12);
//! bag.insert(7);
//! bag.insert(12); // duplicates are kept
//!
//! assert_eq!(bag.len(), 3);
//! assert!(bag.contains(&12));
//! assert_eq!(bag.min(), Some(&7));
//! assert_eq!(bag.iter().copied().collect::<Vec<_>>(), [7, 12, 12]);
//!
//! assert!(bag.remove(&12)); // removes one of the two copies
//! assert!(bag.contains(&12));
//! # Ok::<(), btree_bag::Error>(())
//! ```
//!
//! # Features
//!
//! - **Runtime node order** - any order from [`MIN_ORDER`] upward; small
//!   orders are handy for exercising split/merge machinery, large orders for
//!   cache efficiency.
//! - **Multiset semantics** - duplicate keys are stored, counted, and removed
//!   one occurrence at a time.
//! - **Recursion-free iteration** - both iterators drive an explicit stack,
//!   so trees deeper than the call stack traverse fine.
//!
//! # Implementation
//!
//! Nodes live in an arena and refer to each other through niche-optimized
//! handles, including the parent/child back-references that splits, rotations
//! and merges have to rewire. All keys, not just leaf keys, participate in
//! search (a classic B-tree rather than a B+tree).

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]

mod error;
mod raw;

pub mod btree_bag;

pub use btree_bag::{BTreeBag, MIN_ORDER};
pub use error::Error;
