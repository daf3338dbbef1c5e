//! An ordered-set container built on an AVL tree, with linear-time structural
//! union of two sets.
//!
//! The container keeps a height-balance invariant across arbitrary insertion
//! and deletion sequences via rotations, so search, insert and remove are all
//! logarithmic. Two sets can additionally be united into a third in time
//! linear in their combined size by merging their ascending sequences and
//! building an almost-complete tree directly, with no rotations.
//!
//! # Examples
//!
//! ```
//! use avl_collections::avl_tree::AvlTree;
//!
//! let mut tree = AvlTree::new();
//! tree.insert(3)?;
//! tree.insert(1)?;
//! tree.insert(2)?;
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.iter().collect::<Vec<_>>(), vec![&1, &2, &3]);
//! # Ok::<(), avl_collections::error::TreeError>(())
//! ```

pub mod arena;
pub mod avl_tree;
pub mod compare;
pub mod error;
