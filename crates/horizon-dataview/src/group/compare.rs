//! Comparers used to place new children in a group.
//!
//! Insertion scans a group's children in order and stops before the first
//! child whose seed sorts after the new one. The order-based comparers below
//! keep a scan position between calls, so they must be reset before each
//! independent scan; [`GroupTree::insert`](super::GroupTree::insert) does
//! that itself.

use std::cmp::Ordering;

use super::tree::{GroupId, GroupTree, Leaves};

/// Comparer consulted while scanning for an insertion point.
pub trait InsertComparer<T> {
    /// Forget any scan position. Called before every independent scan.
    fn reset(&mut self) {}

    /// Compare the new item `a` with an existing seed `b`.
    fn compare(&mut self, a: &T, b: &T) -> Ordering;
}

/// Never orders anything, so insertion appends.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendComparer;

impl<T> InsertComparer<T> for AppendComparer {
    fn compare(&mut self, _a: &T, _b: &T) -> Ordering {
        Ordering::Equal
    }
}

/// Adapts a closure.
pub struct FnComparer<F>(pub F);

impl<T, F> InsertComparer<T> for FnComparer<F>
where
    F: FnMut(&T, &T) -> Ordering,
{
    fn compare(&mut self, a: &T, b: &T) -> Ordering {
        (self.0)(a, b)
    }
}

/// Orders items by their position in a reference list.
///
/// Walks the list forward from where the previous comparison stopped: the
/// first of the two items found sorts first. An item not found in the rest
/// of the list sorts last.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use horizon_dataview::{InsertComparer, ListOrderComparer};
///
/// let order = ["a", "b", "c"];
/// let mut comparer = ListOrderComparer::new(&order);
/// assert_eq!(comparer.compare(&"a", &"c"), Ordering::Less);
/// comparer.reset();
/// assert_eq!(comparer.compare(&"c", &"b"), Ordering::Greater);
/// ```
pub struct ListOrderComparer<'a, T> {
    list: &'a [T],
    index: usize,
    position: Option<usize>,
}

impl<'a, T> ListOrderComparer<'a, T> {
    /// Create a comparer over a reference list.
    pub fn new(list: &'a [T]) -> Self {
        Self {
            list,
            index: 0,
            position: None,
        }
    }

    /// Create a comparer for a new item known to sit at `position` in the
    /// list.
    ///
    /// Existing seeds are matched to list entries in scan order, each entry
    /// used at most once, so an item equal to others still lands at its own
    /// place.
    ///
    /// ```
    /// use std::cmp::Ordering;
    /// use horizon_dataview::{InsertComparer, ListOrderComparer};
    ///
    /// let order = ["a", "b", "a"];
    /// let mut comparer = ListOrderComparer::at_position(&order, 2);
    /// assert_eq!(comparer.compare(&"a", &"a"), Ordering::Greater);
    /// assert_eq!(comparer.compare(&"a", &"b"), Ordering::Greater);
    /// ```
    pub fn at_position(list: &'a [T], position: usize) -> Self {
        Self {
            list,
            index: 0,
            position: Some(position),
        }
    }
}

impl<T: PartialEq> InsertComparer<T> for ListOrderComparer<'_, T> {
    fn reset(&mut self) {
        self.index = 0;
    }

    fn compare(&mut self, a: &T, b: &T) -> Ordering {
        let Some(position) = self.position else {
            if a == b {
                return Ordering::Equal;
            }
            while let Some(candidate) = self.list.get(self.index) {
                if candidate == a {
                    return Ordering::Less;
                }
                if candidate == b {
                    return Ordering::Greater;
                }
                self.index += 1;
            }
            return Ordering::Greater;
        };
        while let Some(candidate) = self.list.get(self.index) {
            if self.index == position {
                return Ordering::Less;
            }
            self.index += 1;
            if candidate == b {
                return Ordering::Greater;
            }
        }
        Ordering::Greater
    }
}

/// Orders items by their leaf order in another group tree.
///
/// Same forward-walking rules as [`ListOrderComparer`], over the leaves of
/// a mirror group instead of a flat list.
pub struct GroupOrderComparer<'a, T> {
    tree: &'a GroupTree<T>,
    group: GroupId,
    leaves: Leaves<'a, T>,
    current: Option<&'a T>,
}

impl<'a, T> GroupOrderComparer<'a, T> {
    /// Create a comparer over the leaves of `group` in `tree`.
    pub fn new(tree: &'a GroupTree<T>, group: GroupId) -> Self {
        let mut leaves = tree.leaves(group);
        let current = leaves.next();
        Self {
            tree,
            group,
            leaves,
            current,
        }
    }
}

impl<T: PartialEq> InsertComparer<T> for GroupOrderComparer<'_, T> {
    fn reset(&mut self) {
        self.leaves = self.tree.leaves(self.group);
        self.current = self.leaves.next();
    }

    fn compare(&mut self, a: &T, b: &T) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        while let Some(candidate) = self.current {
            if candidate == a {
                return Ordering::Less;
            }
            if candidate == b {
                return Ordering::Greater;
            }
            self.current = self.leaves.next();
        }
        Ordering::Greater
    }
}
