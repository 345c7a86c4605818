mod arena;
mod handle;
mod node;
mod raw_btree_bag;

pub(crate) use arena::Arena;
pub(crate) use handle::Handle;
pub(crate) use node::{ChildStore, KeyStore, Node};
pub(crate) use raw_btree_bag::RawBTreeBag;
