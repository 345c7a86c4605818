use thiserror::Error;

use crate::btree_bag::MIN_ORDER;

/// Errors reported by [`BTreeBag`](crate::BTreeBag) construction.
///
/// Structural conditions such as balance or occupancy are internal invariants
/// and never surface here; an absent key on lookup or removal is a normal
/// negative result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The requested node order is below the structural minimum. No node of a
    /// smaller order could satisfy both the split and minimum-occupancy
    /// invariants.
    #[error("node order must be at least {MIN_ORDER}, got {0}")]
    OrderTooSmall(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_too_small_message_names_the_minimum() {
        let message = Error::OrderTooSmall(2).to_string();
        assert_eq!(message, "node order must be at least 3, got 2");
    }
}
