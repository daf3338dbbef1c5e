use crate::arena::NodeArena;
use crate::avl_tree::node::{Link, Node};
use crate::avl_tree::tree::AvlTree;
use crate::compare::Compare;
use std::cmp;
use std::cmp::Ordering;

impl<T, C> AvlTree<T, C>
where
    T: Clone,
    C: Compare<T> + Clone,
{
    /// Unites two trees into one in linear time, cloning the surviving keys
    /// and leaving the inputs untouched. On keys equal under the comparator,
    /// the element from `first` is retained. The result uses `first`'s
    /// comparator.
    ///
    /// The merged ascending sequence is built directly into an
    /// almost-complete binary tree, which satisfies the balance invariant
    /// without any rotation.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let first = AvlTree::from_keys(vec![1, 3, 5]).unwrap();
    /// let second = AvlTree::from_keys(vec![2, 3, 4]).unwrap();
    ///
    /// let union = AvlTree::unite(&first, &second);
    /// assert_eq!(union.len(), 5);
    /// assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    ///
    /// // the inputs are preserved
    /// assert_eq!(first.len(), 3);
    /// assert_eq!(second.len(), 3);
    /// ```
    pub fn unite(first: &AvlTree<T, C>, second: &AvlTree<T, C>) -> AvlTree<T, C> {
        let cmp = first.cmp.clone();
        let mut merged = Vec::with_capacity(first.len() + second.len());

        let mut a = first.iter();
        let mut b = second.iter();
        let (mut next_a, mut next_b) = (a.next(), b.next());
        loop {
            match (next_a, next_b) {
                (Some(x), Some(y)) => match cmp.compare(x, y) {
                    Ordering::Less => {
                        merged.push(x.clone());
                        next_a = a.next();
                    }
                    Ordering::Greater => {
                        merged.push(y.clone());
                        next_b = b.next();
                    }
                    Ordering::Equal => {
                        merged.push(x.clone());
                        next_a = a.next();
                        next_b = b.next();
                    }
                },
                (Some(x), None) => {
                    merged.push(x.clone());
                    next_a = a.next();
                }
                (None, Some(y)) => {
                    merged.push(y.clone());
                    next_b = b.next();
                }
                (None, None) => break,
            }
        }

        from_sorted(merged, cmp)
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Compare<T>,
{
    /// Unites two trees into one in linear time, consuming both inputs and
    /// moving their keys without cloning. On keys equal under the comparator,
    /// the element from `first` is retained and the element from `second` is
    /// dropped. The result uses `first`'s comparator.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let first = AvlTree::from_keys(vec![1, 3, 5]).unwrap();
    /// let second = AvlTree::from_keys(vec![2, 3, 4]).unwrap();
    ///
    /// let union = AvlTree::unite_into(first, second);
    /// assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    /// ```
    pub fn unite_into(first: AvlTree<T, C>, second: AvlTree<T, C>) -> AvlTree<T, C> {
        let AvlTree {
            nodes, root, cmp, ..
        } = first;
        let first_keys = drain_in_order(nodes, root);
        let AvlTree { nodes, root, .. } = second;
        let second_keys = drain_in_order(nodes, root);

        let mut merged = Vec::with_capacity(first_keys.len() + second_keys.len());
        let mut a = first_keys.into_iter();
        let mut b = second_keys.into_iter();
        let (mut next_a, mut next_b) = (a.next(), b.next());
        loop {
            match (next_a.take(), next_b.take()) {
                (Some(x), Some(y)) => match cmp.compare(&x, &y) {
                    Ordering::Less => {
                        merged.push(x);
                        next_a = a.next();
                        next_b = Some(y);
                    }
                    Ordering::Greater => {
                        merged.push(y);
                        next_a = Some(x);
                        next_b = b.next();
                    }
                    Ordering::Equal => {
                        merged.push(x);
                        next_a = a.next();
                        next_b = b.next();
                    }
                },
                (Some(x), None) => {
                    merged.push(x);
                    next_a = a.next();
                }
                (None, Some(y)) => {
                    merged.push(y);
                    next_b = b.next();
                }
                (None, None) => break,
            }
        }

        from_sorted(merged, cmp)
    }
}

// In-order drain that moves every key out of the arena, using an explicit
// stack instead of recursion.
fn drain_in_order<T>(mut nodes: NodeArena<Node<T>>, root: Link) -> Vec<T> {
    let mut keys = Vec::with_capacity(nodes.len());
    let mut stack = Vec::new();
    let mut current = root;
    while current.is_some() || !stack.is_empty() {
        while let Some(id) = current {
            stack.push(id);
            current = nodes[id].left;
        }
        let id = stack.pop().expect("Expected a non-empty stack.");
        current = nodes[id].right;
        keys.push(nodes.free(id).key);
    }
    keys
}

// Builds a tree holding `keys`, which must be ascending under `cmp`, as an
// almost-complete binary tree.
fn from_sorted<T, C>(keys: Vec<T>, cmp: C) -> AvlTree<T, C>
where
    C: Compare<T>,
{
    let len = keys.len();
    let mut nodes = NodeArena::with_capacity(len);
    let mut keys = keys.into_iter();
    let root = build_span(&mut nodes, &mut keys, len);

    let mut tree = AvlTree {
        nodes,
        root,
        min: None,
        max: None,
        cmp,
    };
    tree.min = tree.leftmost(tree.root);
    tree.max = tree.rightmost(tree.root);
    tree
}

// Builds the next `len` keys of the ascending run into an almost-complete
// subtree and returns its root. Recursion depth is bounded by the height of
// the built tree, which is floor(log2 len).
fn build_span<T, I>(nodes: &mut NodeArena<Node<T>>, keys: &mut I, len: usize) -> Link
where
    I: Iterator<Item = T>,
{
    if len == 0 {
        return None;
    }
    let (left_len, right_len) = split_sizes(len);

    let left = build_span(nodes, keys, left_len);
    let key = keys.next().expect("Expected as many keys as declared.");
    let id = nodes.allocate(Node::new(key, None));
    let right = build_span(nodes, keys, right_len);

    nodes[id].left = left;
    nodes[id].right = right;
    if let Some(left_id) = left {
        nodes[left_id].parent = Some(id);
    }
    if let Some(right_id) = right {
        nodes[right_id].parent = Some(id);
    }
    let height = 1 + cmp::max(
        left.map_or(-1, |left_id| nodes[left_id].height),
        right.map_or(-1, |right_id| nodes[right_id].height),
    );
    nodes[id].height = height;

    Some(id)
}

// For an ascending run of `len` keys, the almost-complete shape fills every
// level except possibly the last, which fills left to right: with
// h = floor(log2 len) and leaves = len - 2^h + 1, the left subtree takes the
// 2^(h-1) - 1 keys of its full levels plus min(leaves, 2^(h-1)) of the last.
fn split_sizes(len: usize) -> (usize, usize) {
    if len == 1 {
        return (0, 0);
    }
    let height = len.ilog2();
    let leaves = len - (1usize << height) + 1;
    let half = 1usize << (height - 1);
    let left_len = half - 1 + cmp::min(leaves, half);
    (left_len, len - left_len - 1)
}

#[cfg(test)]
mod tests {
    use super::split_sizes;
    use crate::avl_tree::AvlTree;
    use crate::compare::Compare;
    use std::cmp::Ordering;

    #[test]
    fn test_split_sizes() {
        assert_eq!(split_sizes(1), (0, 0));
        assert_eq!(split_sizes(2), (1, 0));
        assert_eq!(split_sizes(3), (1, 1));
        assert_eq!(split_sizes(4), (2, 1));
        assert_eq!(split_sizes(5), (3, 1));
        assert_eq!(split_sizes(6), (3, 2));
        assert_eq!(split_sizes(7), (3, 3));
        assert_eq!(split_sizes(8), (4, 3));
    }

    #[test]
    fn test_unite() {
        let first = AvlTree::from_keys(vec![1, 3, 5]).unwrap();
        let second = AvlTree::from_keys(vec![2, 3, 4]).unwrap();

        let union = AvlTree::unite(&first, &second);
        assert_eq!(union.len(), 5);
        assert_eq!(union.height(), 2);
        assert_eq!(union.min(), Some(&1));
        assert_eq!(union.max(), Some(&5));
        union.check_invariants();
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_unite_with_self_collapses_duplicates() {
        let tree = AvlTree::from_keys(vec![2, 4, 6]).unwrap();

        let union = AvlTree::unite(&tree, &tree);
        assert_eq!(union.len(), 3);
        union.check_invariants();
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![2, 4, 6]);
    }

    #[test]
    fn test_unite_empty() {
        let empty: AvlTree<u32> = AvlTree::new();
        let tree = AvlTree::from_keys(vec![1, 2]).unwrap();

        let union = AvlTree::unite(&empty, &empty);
        assert!(union.is_empty());
        assert_eq!(union.min(), None);

        let union = AvlTree::unite(&empty, &tree);
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_unite_into() {
        let first = AvlTree::from_keys(vec![1, 3, 5]).unwrap();
        let second = AvlTree::from_keys(vec![2, 3, 4]).unwrap();

        let union = AvlTree::unite_into(first, second);
        assert_eq!(union.len(), 5);
        union.check_invariants();
        assert_eq!(union.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unite_into_moves_without_clone() {
        #[derive(Debug, Eq, Ord, PartialEq, PartialOrd)]
        struct Key(u32);

        let first = AvlTree::from_keys(vec![Key(1), Key(3)]).unwrap();
        let second = AvlTree::from_keys(vec![Key(2), Key(3)]).unwrap();

        let union = AvlTree::unite_into(first, second);
        assert_eq!(
            union.into_iter().collect::<Vec<_>>(),
            vec![Key(1), Key(2), Key(3)],
        );
    }

    #[test]
    fn test_unite_keeps_element_from_first_on_ties() {
        #[derive(Clone, Copy)]
        struct ById;

        impl Compare<(u32, &'static str)> for ById {
            fn compare(&self, lhs: &(u32, &'static str), rhs: &(u32, &'static str)) -> Ordering {
                lhs.0.cmp(&rhs.0)
            }
        }

        let first =
            AvlTree::from_keys_with_comparator(vec![(1, "first"), (2, "first")], ById).unwrap();
        let second =
            AvlTree::from_keys_with_comparator(vec![(2, "second"), (3, "second")], ById).unwrap();

        let union = AvlTree::unite(&first, &second);
        assert_eq!(union.len(), 3);
        assert_eq!(union.get(&(2, "")), Ok(&(2, "first")));

        let union = AvlTree::unite_into(first, second);
        assert_eq!(union.len(), 3);
        assert_eq!(union.get(&(2, "")), Ok(&(2, "first")));
    }

    #[test]
    fn test_unite_large_disjoint_builds_minimal_height() {
        let evens = AvlTree::from_keys((0..100).map(|key| key * 2)).unwrap();
        let odds = AvlTree::from_keys((0..100).map(|key| key * 2 + 1)).unwrap();

        let union = AvlTree::unite(&evens, &odds);
        assert_eq!(union.len(), 200);
        // an almost-complete tree of 200 nodes has height floor(log2 200)
        assert_eq!(union.height(), 7);
        union.check_invariants();

        let keys: Vec<u32> = union.into_iter().collect();
        assert_eq!(keys, (0..200).collect::<Vec<_>>());
    }
}
