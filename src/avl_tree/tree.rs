use crate::arena::{NodeArena, NodeId};
use crate::avl_tree::node::{Link, Node};
use crate::compare::{Compare, NaturalOrder};
use crate::error::TreeError;
use std::cmp;
use std::cmp::Ordering;
use std::mem;

/// An ordered set implemented using an AVL tree.
///
/// An AVL tree is a self-balancing binary search tree that maintains the
/// invariant that the heights of the two child subtrees of any node differ by
/// at most one. Keys are arranged according to a comparator injected at
/// construction; the default comparator delegates to `Ord`.
///
/// # Examples
///
/// ```
/// use avl_collections::avl_tree::AvlTree;
///
/// let mut tree = AvlTree::new();
/// tree.insert(0).unwrap();
/// tree.insert(3).unwrap();
///
/// assert_eq!(tree.len(), 2);
/// assert_eq!(tree.min(), Some(&0));
///
/// assert_eq!(tree.remove(&0), Ok(0));
/// assert!(tree.remove(&1).is_err());
/// ```
pub struct AvlTree<T, C = NaturalOrder> {
    pub(super) nodes: NodeArena<Node<T>>,
    pub(super) root: Link,
    pub(super) min: Link,
    pub(super) max: Link,
    pub(super) cmp: C,
}

impl<T> AvlTree<T>
where
    T: Ord,
{
    /// Constructs a new, empty `AvlTree<T>` ordered by `T`'s `Ord`
    /// implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let tree: AvlTree<u32> = AvlTree::new();
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Constructs an `AvlTree<T>` from a batch of keys. Construction is
    /// atomic: if any key in the batch duplicates an earlier one, the whole
    /// batch is rejected with `TreeError::InvalidArgument` and no tree is
    /// produced.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let tree = AvlTree::from_keys(vec![101010, 137, 42]).unwrap();
    /// assert_eq!(tree.iter().collect::<Vec<_>>(), vec![&42, &137, &101010]);
    /// assert_eq!(tree.height(), 1);
    ///
    /// assert!(AvlTree::from_keys(vec![1, 1]).is_err());
    /// ```
    pub fn from_keys<I>(keys: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_keys_with_comparator(keys, NaturalOrder)
    }
}

impl<T, C> AvlTree<T, C>
where
    C: Compare<T>,
{
    /// Constructs a new, empty `AvlTree<T, C>` ordered by `cmp`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    /// use avl_collections::compare::Compare;
    /// use std::cmp::Ordering;
    ///
    /// struct Descending;
    ///
    /// impl Compare<u32> for Descending {
    ///     fn compare(&self, lhs: &u32, rhs: &u32) -> Ordering {
    ///         rhs.cmp(lhs)
    ///     }
    /// }
    ///
    /// let mut tree = AvlTree::with_comparator(Descending);
    /// tree.insert(1).unwrap();
    /// tree.insert(2).unwrap();
    /// assert_eq!(tree.iter().collect::<Vec<_>>(), vec![&2, &1]);
    /// ```
    pub fn with_comparator(cmp: C) -> Self {
        AvlTree {
            nodes: NodeArena::new(),
            root: None,
            min: None,
            max: None,
            cmp,
        }
    }

    /// Constructs an `AvlTree<T, C>` from a batch of keys, ordered by `cmp`.
    /// Construction is atomic: any duplicate in the batch rejects the whole
    /// batch with `TreeError::InvalidArgument`, releasing everything inserted
    /// so far.
    pub fn from_keys_with_comparator<I>(keys: I, cmp: C) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut tree = Self::with_comparator(cmp);
        for key in keys {
            if tree.insert(key).is_err() {
                return Err(TreeError::InvalidArgument);
            }
        }
        Ok(tree)
    }

    /// Inserts a key into the tree. If the key already exists in the tree,
    /// returns `TreeError::DuplicateKey` and leaves the tree unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    /// use avl_collections::error::TreeError;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.insert(1), Ok(()));
    /// assert!(tree.contains(&1));
    /// assert_eq!(tree.insert(1), Err(TreeError::DuplicateKey));
    /// ```
    pub fn insert(&mut self, key: T) -> Result<(), TreeError> {
        let (parent, slot) = self.locate(&key);
        if slot.is_some() {
            return Err(TreeError::DuplicateKey);
        }

        let id = match parent {
            None => {
                let id = self.nodes.allocate(Node::new(key, None));
                self.root = Some(id);
                id
            }
            Some(parent_id) => {
                let goes_left =
                    self.cmp.compare(&key, &self.nodes[parent_id].key) == Ordering::Less;
                let id = self.nodes.allocate(Node::new(key, parent));
                if goes_left {
                    self.nodes[parent_id].left = Some(id);
                } else {
                    self.nodes[parent_id].right = Some(id);
                }
                id
            }
        };

        self.rebalance_from(Some(id));
        self.min = self.leftmost(self.root);
        self.max = self.rightmost(self.root);
        Ok(())
    }

    /// Removes a key from the tree and returns it. If the key does not exist
    /// in the tree, returns `TreeError::NotFound` and leaves the tree
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    /// use avl_collections::error::TreeError;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.remove(&1), Ok(1));
    /// assert_eq!(tree.remove(&1), Err(TreeError::NotFound));
    /// ```
    pub fn remove(&mut self, key: &T) -> Result<T, TreeError> {
        let (_, slot) = self.locate(key);
        let target = match slot {
            Some(id) => id,
            None => return Err(TreeError::NotFound),
        };

        let left = self.nodes[target].left;
        let right = self.nodes[target].right;

        let removed = if left.is_some() && right.is_some() {
            // The in-order successor's key takes over the target's slot and
            // the successor node, which has at most a right child, is the one
            // physically unlinked.
            let successor = self
                .leftmost(right)
                .expect("Expected a non-empty right subtree.");
            let successor_parent = self.nodes[successor].parent;
            let successor_right = self.nodes[successor].right;
            self.splice(successor, successor_right);
            let successor_key = self.nodes.free(successor).key;
            let removed = mem::replace(&mut self.nodes[target].key, successor_key);
            self.rebalance_from(successor_parent);
            removed
        } else {
            let parent = self.nodes[target].parent;
            self.splice(target, left.or(right));
            let removed = self.nodes.free(target).key;
            self.rebalance_from(parent);
            removed
        };

        if self.root.is_none() {
            self.min = None;
            self.max = None;
        } else {
            self.min = self.leftmost(self.root);
            self.max = self.rightmost(self.root);
        }
        Ok(removed)
    }

    /// Returns a reference to the matching key in the tree, or
    /// `TreeError::NotFound` if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.get(&1), Ok(&1));
    /// assert!(tree.get(&2).is_err());
    /// ```
    pub fn get(&self, key: &T) -> Result<&T, TreeError> {
        match self.locate(key).1 {
            Some(id) => Ok(&self.nodes[id].key),
            None => Err(TreeError::NotFound),
        }
    }

    /// Returns a mutable reference to the matching key in the tree, or
    /// `TreeError::NotFound` if the key is absent.
    ///
    /// The caller must not alter the value's position under the injected
    /// order: doing so breaks the search invariant and subsequent operations
    /// are unspecified. This is useful for keys carrying payload that does
    /// not participate in the comparison.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    /// use avl_collections::compare::Compare;
    /// use std::cmp::Ordering;
    ///
    /// struct ById;
    ///
    /// impl Compare<(u32, &'static str)> for ById {
    ///     fn compare(&self, lhs: &(u32, &'static str), rhs: &(u32, &'static str)) -> Ordering {
    ///         lhs.0.cmp(&rhs.0)
    ///     }
    /// }
    ///
    /// let mut tree = AvlTree::with_comparator(ById);
    /// tree.insert((1, "one")).unwrap();
    ///
    /// tree.get_mut(&(1, "")).unwrap().1 = "uno";
    /// assert_eq!(tree.get(&(1, "")), Ok(&(1, "uno")));
    /// ```
    pub fn get_mut(&mut self, key: &T) -> Result<&mut T, TreeError> {
        match self.locate(key).1 {
            Some(id) => Ok(&mut self.nodes[id].key),
            None => Err(TreeError::NotFound),
        }
    }

    /// Checks if a key exists in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert!(!tree.contains(&0));
    /// assert!(tree.contains(&1));
    /// ```
    pub fn contains(&self, key: &T) -> bool {
        self.locate(key).1.is_some()
    }

    // Walks from the root to the terminal slot for `key`, returning the slot's
    // would-be parent and the matching node, if any.
    fn locate(&self, key: &T) -> (Link, Link) {
        let mut parent = None;
        let mut current = self.root;
        while let Some(id) = current {
            match self.cmp.compare(key, &self.nodes[id].key) {
                Ordering::Less => {
                    parent = current;
                    current = self.nodes[id].left;
                }
                Ordering::Greater => {
                    parent = current;
                    current = self.nodes[id].right;
                }
                Ordering::Equal => break,
            }
        }
        (parent, current)
    }
}

impl<T, C> AvlTree<T, C> {
    /// Returns the number of keys in the tree.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let tree: AvlTree<u32> = AvlTree::new();
    /// assert!(tree.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the height of the tree: the number of edges on the longest
    /// path from the root to a leaf, or -1 if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// assert_eq!(tree.height(), -1);
    /// tree.insert(1).unwrap();
    /// assert_eq!(tree.height(), 0);
    /// tree.insert(2).unwrap();
    /// assert_eq!(tree.height(), 1);
    /// ```
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Clears the tree, removing all keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// tree.insert(2).unwrap();
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.min = None;
        self.max = None;
    }

    /// Returns the minimum key of the tree under the injected order. Returns
    /// `None` if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// tree.insert(3).unwrap();
    /// assert_eq!(tree.min(), Some(&1));
    /// ```
    pub fn min(&self) -> Option<&T> {
        self.min.map(|id| &self.nodes[id].key)
    }

    /// Returns the maximum key of the tree under the injected order. Returns
    /// `None` if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_collections::avl_tree::AvlTree;
    ///
    /// let mut tree = AvlTree::new();
    /// tree.insert(1).unwrap();
    /// tree.insert(3).unwrap();
    /// assert_eq!(tree.max(), Some(&3));
    /// ```
    pub fn max(&self) -> Option<&T> {
        self.max.map(|id| &self.nodes[id].key)
    }

    pub(super) fn leftmost(&self, from: Link) -> Link {
        let mut current = from?;
        while let Some(left) = self.nodes[current].left {
            current = left;
        }
        Some(current)
    }

    pub(super) fn rightmost(&self, from: Link) -> Link {
        let mut current = from?;
        while let Some(right) = self.nodes[current].right {
            current = right;
        }
        Some(current)
    }

    // The in-order successor of `id`: the leftmost node of the right subtree,
    // or the nearest ancestor reached from a left child.
    pub(super) fn successor(&self, id: NodeId) -> Link {
        if self.nodes[id].right.is_some() {
            return self.leftmost(self.nodes[id].right);
        }
        let mut child = id;
        let mut parent = self.nodes[id].parent;
        while let Some(parent_id) = parent {
            if self.nodes[parent_id].left == Some(child) {
                break;
            }
            child = parent_id;
            parent = self.nodes[parent_id].parent;
        }
        parent
    }

    fn height_of(&self, link: Link) -> i32 {
        link.map_or(-1, |id| self.nodes[id].height)
    }

    fn update_height(&mut self, id: NodeId) {
        let height = 1 + cmp::max(
            self.height_of(self.nodes[id].left),
            self.height_of(self.nodes[id].right),
        );
        self.nodes[id].height = height;
    }

    fn balance_factor(&self, link: Link) -> i32 {
        match link {
            None => -1,
            Some(id) => {
                self.height_of(self.nodes[id].left) - self.height_of(self.nodes[id].right)
            }
        }
    }

    // Replaces the subtree rooted at `node` with `child` in the parent's slot
    // (or the tree root), rewiring the parent link of `child`.
    fn splice(&mut self, node: NodeId, child: Link) {
        let parent = self.nodes[node].parent;
        match parent {
            None => self.root = child,
            Some(parent_id) => {
                if self.nodes[parent_id].left == Some(node) {
                    self.nodes[parent_id].left = child;
                } else {
                    self.nodes[parent_id].right = child;
                }
            }
        }
        if let Some(child_id) = child {
            self.nodes[child_id].parent = parent;
        }
    }

    /*
     *
     *          A      |        B
     *        /   \    |      /   \
     *       B    Ar   |    Bl     A
     *     /   \       |         /   \
     *    Bl   Br      |        Br   Ar
     *
     */
    fn rotate_right(&mut self, node: NodeId) {
        let pivot = self.nodes[node]
            .left
            .expect("Expected a left child to rotate right.");
        let pivot_right = self.nodes[pivot].right;
        let parent = self.nodes[node].parent;

        self.nodes[node].left = pivot_right;
        if let Some(id) = pivot_right {
            self.nodes[id].parent = Some(node);
        }

        self.nodes[pivot].right = Some(node);
        self.nodes[node].parent = Some(pivot);

        self.nodes[pivot].parent = parent;
        match parent {
            None => self.root = Some(pivot),
            Some(parent_id) => {
                if self.nodes[parent_id].left == Some(node) {
                    self.nodes[parent_id].left = Some(pivot);
                } else {
                    self.nodes[parent_id].right = Some(pivot);
                }
            }
        }

        // descendants keep their heights; only the two rotated nodes change
        self.update_height(node);
        self.update_height(pivot);
    }

    /*
     *
     *        A        |        B
     *      /   \      |      /   \
     *    Al     B     |     A     Br
     *         /   \   |   /   \
     *        Bl   Br  |  Al   Bl
     *
     */
    fn rotate_left(&mut self, node: NodeId) {
        let pivot = self.nodes[node]
            .right
            .expect("Expected a right child to rotate left.");
        let pivot_left = self.nodes[pivot].left;
        let parent = self.nodes[node].parent;

        self.nodes[node].right = pivot_left;
        if let Some(id) = pivot_left {
            self.nodes[id].parent = Some(node);
        }

        self.nodes[pivot].left = Some(node);
        self.nodes[node].parent = Some(pivot);

        self.nodes[pivot].parent = parent;
        match parent {
            None => self.root = Some(pivot),
            Some(parent_id) => {
                if self.nodes[parent_id].left == Some(node) {
                    self.nodes[parent_id].left = Some(pivot);
                } else {
                    self.nodes[parent_id].right = Some(pivot);
                }
            }
        }

        self.update_height(node);
        self.update_height(pivot);
    }

    // Walks from `start` to the root, recomputing cached heights and
    // restoring the balance invariant wherever a structural change below has
    // violated it. A left-heavy node rebalances as LL when its left child's
    // factor is >= 0 and as LR otherwise; the right-heavy cases mirror with
    // RR when the right child's factor is <= 0 and RL otherwise.
    fn rebalance_from(&mut self, start: Link) {
        let mut current = start;
        while let Some(id) = current {
            self.update_height(id);

            let factor = self.balance_factor(Some(id));
            if factor >= 2 {
                let left = self.nodes[id].left;
                if self.balance_factor(left) >= 0 {
                    self.rotate_right(id);
                } else {
                    let left_id = left.expect("Expected a left child.");
                    self.rotate_left(left_id);
                    self.rotate_right(id);
                }
            } else if factor <= -2 {
                let right = self.nodes[id].right;
                if self.balance_factor(right) <= 0 {
                    self.rotate_left(id);
                } else {
                    let right_id = right.expect("Expected a right child.");
                    self.rotate_right(right_id);
                    self.rotate_left(id);
                }
            }

            current = self.nodes[id].parent;
        }
    }
}

impl<T, C> Clone for AvlTree<T, C>
where
    T: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        let mut clone = AvlTree {
            nodes: NodeArena::with_capacity(self.len()),
            root: None,
            min: None,
            max: None,
            cmp: self.cmp.clone(),
        };

        // copy the structure with an explicit worklist instead of recursing
        let mut pending = Vec::new();
        if let Some(root) = self.root {
            let new_root = clone.nodes.allocate(Node {
                key: self.nodes[root].key.clone(),
                height: self.nodes[root].height,
                parent: None,
                left: None,
                right: None,
            });
            clone.root = Some(new_root);
            pending.push((root, new_root));
        }
        while let Some((source, copy)) = pending.pop() {
            if let Some(left) = self.nodes[source].left {
                let new_left = clone.nodes.allocate(Node {
                    key: self.nodes[left].key.clone(),
                    height: self.nodes[left].height,
                    parent: Some(copy),
                    left: None,
                    right: None,
                });
                clone.nodes[copy].left = Some(new_left);
                pending.push((left, new_left));
            }
            if let Some(right) = self.nodes[source].right {
                let new_right = clone.nodes.allocate(Node {
                    key: self.nodes[right].key.clone(),
                    height: self.nodes[right].height,
                    parent: Some(copy),
                    left: None,
                    right: None,
                });
                clone.nodes[copy].right = Some(new_right);
                pending.push((right, new_right));
            }
        }

        clone.min = clone.leftmost(clone.root);
        clone.max = clone.rightmost(clone.root);
        clone
    }
}

impl<T> Default for AvlTree<T>
where
    T: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl<T, C> AvlTree<T, C>
where
    C: Compare<T>,
{
    pub(crate) fn check_invariants(&self) {
        let mut count = 0;
        let mut prev: Option<&T> = None;
        let mut current = self.leftmost(self.root);
        while let Some(id) = current {
            count += 1;
            let key = &self.nodes[id].key;
            if let Some(prev_key) = prev {
                assert_eq!(self.cmp.compare(prev_key, key), Ordering::Less);
            }
            prev = Some(key);
            current = self.successor(id);
        }
        assert_eq!(count, self.len());

        self.check_subtree(self.root, None);
        assert_eq!(self.min, self.leftmost(self.root));
        assert_eq!(self.max, self.rightmost(self.root));
    }

    fn check_subtree(&self, link: Link, parent: Link) -> i32 {
        match link {
            None => -1,
            Some(id) => {
                assert_eq!(self.nodes[id].parent, parent);
                let left_height = self.check_subtree(self.nodes[id].left, link);
                let right_height = self.check_subtree(self.nodes[id].right, link);
                assert!((left_height - right_height).abs() <= 1);
                let height = 1 + cmp::max(left_height, right_height);
                assert_eq!(self.nodes[id].height, height);
                height
            }
        }
    }
}
