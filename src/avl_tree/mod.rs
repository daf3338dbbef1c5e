//! Self-balancing binary search tree where the heights of the two child
//! subtrees of any node differ by at most one.

mod iter;
mod node;
mod tree;
mod unite;

pub use self::iter::{IntoIter, Iter};
pub use self::tree::AvlTree;
