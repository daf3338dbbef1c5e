use crate::avl_tree::node::Link;
use crate::avl_tree::tree::AvlTree;
use crate::compare::NaturalOrder;
use std::vec;

impl<T, C> AvlTree<T, C> {
    /// Returns an iterator over the tree. The iterator yields keys in
    /// ascending order under the injected order.
    ///
    /// The cursor is restartable: every call to `iter` begins a fresh
    /// traversal from the smallest key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// tree.insert(3).unwrap();
    ///
    /// let mut iterator = tree.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> Iter<'_, T, C> {
        Iter {
            tree: self,
            current: self.leftmost(self.root),
        }
    }
}

/// An iterator for `AvlTree<T, C>`.
///
/// This iterator traverses the keys of the tree in ascending order and yields
/// immutable references. It descends to the leftmost node and advances by
/// moving to the leftmost descendant of the right child, or by climbing
/// parent links until it arrives from a left child.
pub struct Iter<'a, T, C = NaturalOrder> {
    tree: &'a AvlTree<T, C>,
    current: Link,
}

impl<'a, T, C> Iterator for Iter<'a, T, C> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.successor(id);
        Some(&self.tree.nodes[id].key)
    }
}

/// An owning iterator for `AvlTree<T, C>`.
///
/// This iterator traverses the keys of the tree in ascending order and yields
/// owned keys.
pub struct IntoIter<T> {
    keys: vec::IntoIter<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.keys.next()
    }
}

impl<T, C> IntoIterator for AvlTree<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut order = Vec::with_capacity(self.len());
        let mut current = self.leftmost(self.root);
        while let Some(id) = current {
            order.push(id);
            current = self.successor(id);
        }

        let keys = order
            .into_iter()
            .map(|id| self.nodes.free(id).key)
            .collect::<Vec<_>>();
        IntoIter {
            keys: keys.into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a AvlTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T, C>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use crate::avl_tree::AvlTree;

    #[test]
    fn test_iter() {
        let mut tree = AvlTree::new();
        tree.insert(1).unwrap();
        tree.insert(5).unwrap();
        tree.insert(3).unwrap();

        assert_eq!(tree.iter().collect::<Vec<&u32>>(), vec![&1, &3, &5]);
    }

    #[test]
    fn test_iter_empty() {
        let tree: AvlTree<u32> = AvlTree::new();
        assert_eq!(tree.iter().next(), None);
    }

    #[test]
    fn test_iter_is_restartable() {
        let mut tree = AvlTree::new();
        for key in &[4, 2, 6, 1, 3, 5, 7] {
            tree.insert(*key).unwrap();
        }

        let first: Vec<&u32> = tree.iter().collect();
        let second: Vec<&u32> = tree.iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_iter_is_ascending() {
        let mut tree = AvlTree::new();
        for key in &[8, 3, 10, 1, 6, 14, 4, 7, 13] {
            tree.insert(*key).unwrap();
        }

        let keys: Vec<u32> = tree.iter().cloned().collect();
        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(keys.len(), tree.len());
    }

    #[test]
    fn test_into_iter() {
        let mut tree = AvlTree::new();
        tree.insert(1).unwrap();
        tree.insert(5).unwrap();
        tree.insert(3).unwrap();

        assert_eq!(tree.into_iter().collect::<Vec<u32>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_for_loop_over_reference() {
        let mut tree = AvlTree::new();
        tree.insert(2).unwrap();
        tree.insert(1).unwrap();

        let mut keys = Vec::new();
        for key in &tree {
            keys.push(*key);
        }
        assert_eq!(keys, vec![1, 2]);
    }
}
