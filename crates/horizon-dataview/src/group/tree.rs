//! Arena-backed group node tree.
//!
//! Every group lives in a slot map and is addressed by a [`GroupId`]. A
//! group's children are an ordered mix of leaf items and subgroup handles;
//! the parent link is a plain handle. Each node carries two counters kept
//! in step with every mutation:
//!
//! - `leaf_count`: leaf items anywhere below the node
//! - `full_count`: `leaf_count` plus the number of descendant groups
//!
//! The tree has a single generation counter bumped on every structural
//! change. [`LeafCursor`]s stamp it on creation and refuse to advance once
//! it moves on.

use std::cmp::Ordering;
use std::rc::Rc;

use horizon_dataview_core::logging::targets;
use slotmap::{SlotMap, new_key_type};

use super::compare::InsertComparer;
use crate::description::{GroupDescription, GroupKey};
use crate::error::{CollectionError, Result};
use crate::value::Value;

new_key_type! {
    /// Handle of a group node in a [`GroupTree`].
    pub struct GroupId;
}

/// A child of a group: a leaf item or a subgroup.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupChild<T> {
    /// A leaf item.
    Item(T),
    /// A subgroup.
    Group(GroupId),
}

impl<T> GroupChild<T> {
    /// The item, if this child is a leaf.
    pub fn as_item(&self) -> Option<&T> {
        match self {
            Self::Item(item) => Some(item),
            Self::Group(_) => None,
        }
    }

    /// The subgroup handle, if this child is a group.
    pub fn as_group(&self) -> Option<GroupId> {
        match self {
            Self::Item(_) => None,
            Self::Group(id) => Some(*id),
        }
    }
}

/// Outcome of [`GroupTree::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The item was not a direct child of the group.
    NotFound,
    /// The item was removed. `leaf_index` is its former position among the
    /// root's leaves, when requested.
    Removed { leaf_index: Option<usize> },
}

impl Removal {
    /// Check if an item was removed.
    pub fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}

/// A group node.
#[derive(Debug)]
pub struct GroupNode<T> {
    key: GroupKey<T>,
    parent: Option<GroupId>,
    children: Vec<GroupChild<T>>,
    leaf_count: usize,
    full_count: usize,
    description: Option<Rc<GroupDescription<T>>>,
    last_index: usize,
}

impl<T> GroupNode<T> {
    fn new(key: GroupKey<T>) -> Self {
        Self {
            key,
            parent: None,
            children: Vec::new(),
            leaf_count: 0,
            full_count: 0,
            description: None,
            last_index: 0,
        }
    }

    /// The group's key.
    pub fn key(&self) -> &GroupKey<T> {
        &self.key
    }

    /// The parent group, `None` for the root and detached groups.
    pub fn parent(&self) -> Option<GroupId> {
        self.parent
    }

    /// Direct children in order.
    pub fn children(&self) -> &[GroupChild<T>] {
        &self.children
    }

    /// Number of leaf items below this group.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Number of leaf items plus descendant groups below this group.
    pub fn full_count(&self) -> usize {
        self.full_count
    }

    /// The description dividing this group into subgroups.
    pub fn description(&self) -> Option<&Rc<GroupDescription<T>>> {
        self.description.as_ref()
    }

    /// A bottom-level group holds items directly.
    pub fn is_bottom_level(&self) -> bool {
        self.description.is_none()
    }

    /// Index of the last subgroup matched while loading in group order.
    pub fn last_index(&self) -> usize {
        self.last_index
    }

    /// Number of leading children that are explicit groups.
    pub fn explicit_group_count(&self) -> usize {
        self.description
            .as_ref()
            .map_or(0, |description| description.group_keys().len())
    }
}

/// Arena of group nodes with a designated root.
///
/// # Example
///
/// ```
/// use horizon_dataview::{GroupChild, GroupKey, GroupTree};
///
/// let mut tree = GroupTree::<i64>::new();
/// let root = tree.root();
/// let odd = tree.create_group(GroupKey::from("odd"));
/// tree.add(root, GroupChild::Group(odd));
/// tree.add(odd, GroupChild::Item(1));
/// tree.add(odd, GroupChild::Item(3));
///
/// assert_eq!(tree.node(root).map(|n| n.leaf_count()), Some(2));
/// assert_eq!(tree.node(root).map(|n| n.full_count()), Some(3));
/// assert_eq!(tree.leaf_at(root, 1), Some(&3));
/// ```
#[derive(Debug)]
pub struct GroupTree<T> {
    nodes: SlotMap<GroupId, GroupNode<T>>,
    root: GroupId,
    generation: u64,
}

impl<T> Default for GroupTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> GroupTree<T> {
    /// Create a tree holding only an empty root.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(GroupNode::new(GroupKey::Value(Value::from("Root"))));
        Self {
            nodes,
            root,
            generation: 0,
        }
    }

    /// The root group.
    pub fn root(&self) -> GroupId {
        self.root
    }

    /// Look up a group.
    pub fn node(&self, id: GroupId) -> Option<&GroupNode<T>> {
        self.nodes.get(id)
    }

    /// Number of groups in the arena, root included.
    pub fn group_count(&self) -> usize {
        self.nodes.len()
    }

    /// Structural generation; changes on every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of leaves below the root.
    pub fn leaf_count(&self) -> usize {
        self.nodes.get(self.root).map_or(0, |root| root.leaf_count)
    }

    /// Drop every group and item, keeping an empty root without a description.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = self
            .nodes
            .insert(GroupNode::new(GroupKey::Value(Value::from("Root"))));
        self.generation += 1;
    }

    /// Create a detached group. Attach it with [`add`](Self::add) or
    /// [`insert`](Self::insert).
    pub fn create_group(&mut self, key: GroupKey<T>) -> GroupId {
        self.nodes.insert(GroupNode::new(key))
    }

    /// Set the description dividing a group into subgroups.
    pub fn set_description(&mut self, group: GroupId, description: Option<Rc<GroupDescription<T>>>) {
        if let Some(node) = self.nodes.get_mut(group) {
            node.description = description;
        }
    }

    /// Remember the last matched subgroup index.
    pub fn set_last_index(&mut self, group: GroupId, index: usize) {
        if let Some(node) = self.nodes.get_mut(group) {
            node.last_index = index;
        }
    }

    /// Subgroups of a group, in order.
    pub fn subgroups(&self, group: GroupId) -> impl Iterator<Item = GroupId> + '_ {
        self.children_of(group).iter().filter_map(GroupChild::as_group)
    }

    /// Distance from the root; the root has depth 0.
    pub fn depth(&self, group: GroupId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(group).and_then(|node| node.parent);
        while let Some(id) = current {
            depth += 1;
            current = self.nodes.get(id).and_then(|node| node.parent);
        }
        depth
    }

    /// Append a child.
    pub fn add(&mut self, group: GroupId, child: GroupChild<T>) {
        let index = self.children_of(group).len();
        self.insert_at(group, index, child);
    }

    /// Insert a child at a fixed position, clamped to the child count.
    pub fn insert_at(&mut self, group: GroupId, index: usize, child: GroupChild<T>) {
        let (leaf_delta, full_delta) = match &child {
            GroupChild::Item(_) => (1, 1),
            GroupChild::Group(sub) => match self.nodes.get_mut(*sub) {
                Some(node) => {
                    node.parent = Some(group);
                    (node.leaf_count as isize, node.full_count as isize + 1)
                }
                None => return,
            },
        };
        let Some(node) = self.nodes.get_mut(group) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        self.change_counts(group, leaf_delta, full_delta);
    }

    /// Remove and return the child at `index`. A removed subgroup is
    /// dropped from the arena together with its descendants.
    pub fn remove_child_at(&mut self, group: GroupId, index: usize) -> Option<GroupChild<T>> {
        let node = self.nodes.get_mut(group)?;
        if index >= node.children.len() {
            return None;
        }
        let child = node.children.remove(index);
        let (leaf_delta, full_delta) = match &child {
            GroupChild::Item(_) => (-1, -1),
            GroupChild::Group(sub) => {
                let (leaves, full) = self
                    .nodes
                    .get(*sub)
                    .map_or((0, 0), |node| (node.leaf_count, node.full_count));
                self.drop_subtree(*sub);
                (-(leaves as isize), -(full as isize) - 1)
            }
        };
        self.change_counts(group, leaf_delta, full_delta);
        Some(child)
    }

    /// Leaf at `index` in the leaf order below `group`.
    pub fn leaf_at(&self, group: GroupId, index: usize) -> Option<&T> {
        let node = self.nodes.get(group)?;
        if index >= node.leaf_count {
            return None;
        }
        if node.is_bottom_level()
            && let Some(GroupChild::Item(item)) = node.children.get(index)
        {
            return Some(item);
        }

        let mut index = index;
        for child in &node.children {
            match child {
                GroupChild::Item(item) => {
                    if index == 0 {
                        return Some(item);
                    }
                    index -= 1;
                }
                GroupChild::Group(sub) => {
                    let leaves = self.nodes.get(*sub).map_or(0, |node| node.leaf_count);
                    if index < leaves {
                        return self.leaf_at(*sub, index);
                    }
                    index -= leaves;
                }
            }
        }
        None
    }

    /// Absolute leaf position of the child at `local_index` in `group`,
    /// counted from the root.
    ///
    /// Sums the leaf contributions of everything preceding the child at
    /// each level on the way up.
    pub fn leaf_index_from_item(&self, group: GroupId, local_index: usize) -> usize {
        let mut result = 0;
        let mut current = group;
        let mut stop_at = Some(local_index);
        let mut stop_group = None;

        while let Some(node) = self.nodes.get(current) {
            for (k, child) in node.children.iter().enumerate() {
                if stop_at == Some(k) {
                    break;
                }
                if let (GroupChild::Group(id), Some(stop)) = (child, stop_group)
                    && *id == stop
                {
                    break;
                }
                result += self.leaf_contribution(child);
            }
            match node.parent {
                Some(parent) => {
                    stop_at = None;
                    stop_group = Some(current);
                    current = parent;
                }
                None => break,
            }
        }
        result
    }

    /// Leaves below `group` in order.
    pub fn leaves(&self, group: GroupId) -> Leaves<'_, T> {
        Leaves {
            tree: self,
            stack: vec![(group, 0)],
        }
    }

    /// A detached leaf cursor that fails once the tree changes.
    pub fn leaf_cursor(&self, group: GroupId) -> LeafCursor {
        LeafCursor {
            stack: vec![(group, 0)],
            generation: self.generation,
        }
    }

    fn children_of(&self, group: GroupId) -> &[GroupChild<T>] {
        self.nodes.get(group).map_or(&[], |node| node.children.as_slice())
    }

    fn leaf_contribution(&self, child: &GroupChild<T>) -> usize {
        match child {
            GroupChild::Item(_) => 1,
            GroupChild::Group(sub) => self.nodes.get(*sub).map_or(0, |node| node.leaf_count),
        }
    }

    fn change_counts(&mut self, from: GroupId, leaf_delta: isize, full_delta: isize) {
        let mut current = Some(from);
        while let Some(id) = current {
            let Some(node) = self.nodes.get_mut(id) else {
                break;
            };
            node.leaf_count = node.leaf_count.saturating_add_signed(leaf_delta);
            node.full_count = node.full_count.saturating_add_signed(full_delta);
            current = node.parent;
        }
        self.generation += 1;
    }

    fn drop_subtree(&mut self, group: GroupId) {
        if let Some(node) = self.nodes.remove(group) {
            for child in node.children {
                if let GroupChild::Group(sub) = child {
                    self.drop_subtree(sub);
                }
            }
        }
    }
}

impl<T: PartialEq> GroupTree<T> {
    /// Insert a child at its sorted position.
    ///
    /// Scans the children after the group's explicit subgroups and inserts
    /// before the first child whose seed sorts after `seed`. Children
    /// without a seed (empty groups) are skipped. Returns the local index.
    pub fn insert(
        &mut self,
        group: GroupId,
        child: GroupChild<T>,
        seed: &T,
        comparer: &mut dyn InsertComparer<T>,
    ) -> usize {
        self.insert_bounded(group, child, seed, comparer, 0)
    }

    /// Like [`insert`](Self::insert), leaving the last `reserved_tail`
    /// children out of the scan so the new child lands before them.
    pub fn insert_bounded(
        &mut self,
        group: GroupId,
        child: GroupChild<T>,
        seed: &T,
        comparer: &mut dyn InsertComparer<T>,
        reserved_tail: usize,
    ) -> usize {
        let index = self.find_index(group, seed, comparer, reserved_tail);
        self.insert_at(group, index, child);
        index
    }

    fn find_index(
        &self,
        group: GroupId,
        seed: &T,
        comparer: &mut dyn InsertComparer<T>,
        reserved_tail: usize,
    ) -> usize {
        let Some(node) = self.nodes.get(group) else {
            return 0;
        };
        let low = node.explicit_group_count().min(node.children.len());
        let high = node.children.len().saturating_sub(reserved_tail).max(low);

        comparer.reset();
        for index in low..high {
            let existing = match &node.children[index] {
                GroupChild::Item(item) => Some(item),
                GroupChild::Group(sub) => self.seed_item(*sub),
            };
            let Some(existing) = existing else {
                continue;
            };
            if comparer.compare(seed, existing) == Ordering::Less {
                return index;
            }
        }
        high
    }

    /// Remove the first direct child equal to `item`.
    ///
    /// Emptied subgroups are pruned bottom-up unless they are explicit
    /// groups of their parent.
    pub fn remove(&mut self, group: GroupId, item: &T, want_leaf_index: bool) -> Removal {
        self.remove_occurrence(group, item, 0, want_leaf_index)
    }

    /// Remove the direct child that is the `occurrence`-th (from zero)
    /// child equal to `item`.
    pub fn remove_occurrence(
        &mut self,
        group: GroupId,
        item: &T,
        occurrence: usize,
        want_leaf_index: bool,
    ) -> Removal {
        let Some(local) = self
            .children_of(group)
            .iter()
            .enumerate()
            .filter(|(_, child)| matches!(child, GroupChild::Item(candidate) if candidate == item))
            .nth(occurrence)
            .map(|(local, _)| local)
        else {
            return Removal::NotFound;
        };

        let leaf_index = want_leaf_index.then(|| self.leaf_index_from_item(group, local));
        self.remove_child_at(group, local);
        self.prune(group);
        Removal::Removed { leaf_index }
    }

    /// Position of `item` in the leaf order below `group`.
    pub fn leaf_index_of(&self, group: GroupId, item: &T) -> Option<usize> {
        let node = self.nodes.get(group)?;
        let mut base = 0;
        for child in &node.children {
            match child {
                GroupChild::Item(candidate) => {
                    if candidate == item {
                        return Some(base);
                    }
                    base += 1;
                }
                GroupChild::Group(sub) => {
                    if let Some(index) = self.leaf_index_of(*sub, item) {
                        return Some(base + index);
                    }
                    base += self.nodes.get(*sub).map_or(0, |node| node.leaf_count);
                }
            }
        }
        None
    }

    /// Representative item for ordering a group among its siblings: its
    /// first leaf.
    ///
    /// Empty groups and groups with explicit subgroups have no seed.
    pub fn seed_item(&self, group: GroupId) -> Option<&T> {
        let node = self.nodes.get(group)?;
        if node.leaf_count == 0 || node.explicit_group_count() > 0 {
            return None;
        }
        node.children.iter().find_map(|child| match child {
            GroupChild::Item(item) => Some(item),
            GroupChild::Group(sub) => self.seed_item(*sub),
        })
    }

    fn prune(&mut self, group: GroupId) {
        let mut current = group;
        loop {
            let Some(node) = self.nodes.get(current) else {
                return;
            };
            let Some(parent) = node.parent else {
                return;
            };
            if node.leaf_count > 0 {
                return;
            }
            let Some(parent_node) = self.nodes.get(parent) else {
                return;
            };
            let Some(index) = parent_node
                .children
                .iter()
                .position(|child| *child == GroupChild::Group(current))
            else {
                return;
            };
            if index < parent_node.explicit_group_count() {
                return;
            }
            tracing::trace!(target: targets::GROUP, depth = self.depth(current), "pruning empty group");
            self.remove_child_at(parent, index);
            current = parent;
        }
    }
}

/// Borrowing iterator over the leaves below a group.
pub struct Leaves<'a, T> {
    tree: &'a GroupTree<T>,
    stack: Vec<(GroupId, usize)>,
}

impl<'a, T> Iterator for Leaves<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tree = self.tree;
        next_leaf(tree, &mut self.stack)
    }
}

fn next_leaf<'a, T>(tree: &'a GroupTree<T>, stack: &mut Vec<(GroupId, usize)>) -> Option<&'a T> {
    loop {
        let (group, position) = stack.last_mut()?;
        let Some(child) = tree.nodes.get(*group).and_then(|node| node.children.get(*position)) else {
            stack.pop();
            continue;
        };
        *position += 1;
        match child {
            GroupChild::Item(item) => return Some(item),
            GroupChild::Group(sub) => stack.push((*sub, 0)),
        }
    }
}

/// A leaf enumerator that does not borrow the tree.
///
/// Advancing it after any structural change to the tree fails with
/// [`CollectionError::StaleEnumerator`].
#[derive(Debug, Clone)]
pub struct LeafCursor {
    stack: Vec<(GroupId, usize)>,
    generation: u64,
}

impl LeafCursor {
    /// Advance to the next leaf.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::StaleEnumerator`] if the tree changed since
    /// the cursor was created.
    pub fn next<'a, T>(&mut self, tree: &'a GroupTree<T>) -> Result<Option<&'a T>> {
        if tree.generation != self.generation {
            return Err(CollectionError::StaleEnumerator);
        }
        Ok(next_leaf(tree, &mut self.stack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::compare::{AppendComparer, FnComparer};

    /// Checks both counters of every group against a recount.
    fn assert_counts<T: PartialEq + std::fmt::Debug>(tree: &GroupTree<T>, group: GroupId) -> (usize, usize) {
        let node = tree.node(group).unwrap();
        let mut leaves = 0;
        let mut full = 0;
        for child in node.children() {
            match child {
                GroupChild::Item(_) => {
                    leaves += 1;
                    full += 1;
                }
                GroupChild::Group(sub) => {
                    let (sub_leaves, sub_full) = assert_counts(tree, *sub);
                    leaves += sub_leaves;
                    full += sub_full + 1;
                }
            }
        }
        assert_eq!(node.leaf_count(), leaves, "leaf count of {:?}", node.key());
        assert_eq!(node.full_count(), full, "full count of {:?}", node.key());
        (leaves, full)
    }

    fn two_group_tree() -> (GroupTree<i64>, GroupId, GroupId) {
        let mut tree = GroupTree::new();
        let root = tree.root();
        let small = tree.create_group(GroupKey::from("small"));
        let large = tree.create_group(GroupKey::from("large"));
        tree.add(root, GroupChild::Group(small));
        tree.add(root, GroupChild::Group(large));
        for n in [1, 2, 3] {
            tree.add(small, GroupChild::Item(n));
        }
        for n in [10, 20] {
            tree.add(large, GroupChild::Item(n));
        }
        (tree, small, large)
    }

    #[test]
    fn test_counts_after_add() {
        let (tree, small, _) = two_group_tree();
        assert_counts(&tree, tree.root());
        assert_eq!(tree.node(tree.root()).unwrap().leaf_count(), 5);
        assert_eq!(tree.node(tree.root()).unwrap().full_count(), 7);
        assert_eq!(tree.node(small).unwrap().parent(), Some(tree.root()));
        assert_eq!(tree.depth(small), 1);
    }

    #[test]
    fn test_attach_populated_subgroup() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        let outer = tree.create_group(GroupKey::from("outer"));
        let inner = tree.create_group(GroupKey::from("inner"));
        tree.add(inner, GroupChild::Item(1));
        tree.add(outer, GroupChild::Group(inner));
        tree.add(root, GroupChild::Group(outer));
        assert_counts(&tree, root);
        assert_eq!(tree.node(root).unwrap().full_count(), 3);
    }

    #[test]
    fn test_leaf_enumeration_matches_leaf_at() {
        let (tree, _, _) = two_group_tree();
        let root = tree.root();
        let enumerated: Vec<i64> = tree.leaves(root).copied().collect();
        let indexed: Vec<i64> = (0..tree.leaf_count())
            .map(|i| *tree.leaf_at(root, i).unwrap())
            .collect();
        assert_eq!(enumerated, vec![1, 2, 3, 10, 20]);
        assert_eq!(enumerated, indexed);
        assert_eq!(tree.leaf_at(root, 5), None);
    }

    #[test]
    fn test_leaf_index_of_round_trips() {
        let (tree, _, _) = two_group_tree();
        let root = tree.root();
        for (i, item) in tree.leaves(root).enumerate() {
            assert_eq!(tree.leaf_index_of(root, item), Some(i));
        }
        assert_eq!(tree.leaf_index_of(root, &99), None);
    }

    #[test]
    fn test_leaf_index_from_item() {
        let (tree, small, large) = two_group_tree();
        assert_eq!(tree.leaf_index_from_item(large, 1), 4);
        assert_eq!(tree.leaf_index_from_item(small, 2), 2);
        assert_eq!(tree.leaf_index_from_item(tree.root(), 1), 3);
    }

    #[test]
    fn test_remove_reports_leaf_index() {
        let (mut tree, _, large) = two_group_tree();
        assert_eq!(
            tree.remove(large, &20, true),
            Removal::Removed { leaf_index: Some(4) }
        );
        assert_eq!(tree.remove(large, &20, true), Removal::NotFound);
        assert_counts(&tree, tree.root());
    }

    #[test]
    fn test_remove_last_leaf_prunes_group() {
        let (mut tree, _, large) = two_group_tree();
        let root = tree.root();
        tree.remove(large, &10, false);
        tree.remove(large, &20, false);
        assert!(tree.node(large).is_none());
        assert_eq!(tree.subgroups(root).count(), 1);
        assert_counts(&tree, root);
        assert_eq!(tree.node(root).unwrap().full_count(), 4);
    }

    #[test]
    fn test_prune_cascades() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        let outer = tree.create_group(GroupKey::from("outer"));
        let inner = tree.create_group(GroupKey::from("inner"));
        tree.add(root, GroupChild::Group(outer));
        tree.add(outer, GroupChild::Group(inner));
        tree.add(inner, GroupChild::Item(7));

        tree.remove(inner, &7, false);
        assert!(tree.node(outer).is_none());
        assert!(tree.node(inner).is_none());
        assert_eq!(tree.node(root).unwrap().full_count(), 0);
        assert_eq!(tree.group_count(), 1);
    }

    #[test]
    fn test_explicit_group_survives_empty() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        let description = GroupDescription::by_key(|n: &i64| Value::from(*n))
            .with_group_keys(vec![GroupKey::from("even")]);
        tree.set_description(root, Some(Rc::new(description)));
        let even = tree.create_group(GroupKey::from("even"));
        tree.add(root, GroupChild::Group(even));
        tree.add(even, GroupChild::Item(2));

        tree.remove(even, &2, false);
        let node = tree.node(even).unwrap();
        assert_eq!(node.leaf_count(), 0);
        assert_eq!(tree.node(root).unwrap().full_count(), 1);
    }

    #[test]
    fn test_insert_sorted() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        for n in [1, 5, 9] {
            tree.add(root, GroupChild::Item(n));
        }
        let mut natural = FnComparer(|a: &i64, b: &i64| a.cmp(b));
        assert_eq!(tree.insert(root, GroupChild::Item(6), &6, &mut natural), 2);
        assert_eq!(tree.insert(root, GroupChild::Item(0), &0, &mut natural), 0);
        assert_eq!(tree.insert(root, GroupChild::Item(99), &99, &mut natural), 5);
        let items: Vec<i64> = tree.leaves(root).copied().collect();
        assert_eq!(items, vec![0, 1, 5, 6, 9, 99]);
    }

    #[test]
    fn test_insert_bounded_keeps_tail() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        for n in [1, 5, 0] {
            tree.add(root, GroupChild::Item(n));
        }
        let mut natural = FnComparer(|a: &i64, b: &i64| a.cmp(b));
        let index = tree.insert_bounded(root, GroupChild::Item(7), &7, &mut natural, 1);
        assert_eq!(index, 2);
        let items: Vec<i64> = tree.leaves(root).copied().collect();
        assert_eq!(items, vec![1, 5, 7, 0]);
    }

    #[test]
    fn test_insert_skips_explicit_groups_and_unseeded() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        let description = GroupDescription::by_key(|n: &i64| Value::from(*n))
            .with_group_keys(vec![GroupKey::from("pinned")]);
        tree.set_description(root, Some(Rc::new(description)));
        let pinned = tree.create_group(GroupKey::from("pinned"));
        tree.add(root, GroupChild::Group(pinned));
        tree.add(pinned, GroupChild::Item(100));

        let empty = tree.create_group(GroupKey::from("empty"));
        tree.add(root, GroupChild::Group(empty));

        let mut natural = FnComparer(|a: &i64, b: &i64| a.cmp(b));
        let fresh = tree.create_group(GroupKey::from("fresh"));
        let index = tree.insert(root, GroupChild::Group(fresh), &1, &mut natural);
        assert_eq!(index, 2);
    }

    #[test]
    fn test_insert_with_append_comparer() {
        let mut tree = GroupTree::<i64>::new();
        let root = tree.root();
        tree.add(root, GroupChild::Item(5));
        assert_eq!(tree.insert(root, GroupChild::Item(1), &1, &mut AppendComparer), 1);
    }

    #[test]
    fn test_seed_item() {
        let (tree, small, _) = two_group_tree();
        assert_eq!(tree.seed_item(tree.root()), Some(&1));
        assert_eq!(tree.seed_item(small), Some(&1));

        let mut empty = GroupTree::<i64>::new();
        let root = empty.root();
        assert_eq!(empty.seed_item(root), None);
        let group = empty.create_group(GroupKey::from("g"));
        empty.add(root, GroupChild::Group(group));
        assert_eq!(empty.seed_item(root), None);
    }

    #[test]
    fn test_leaf_cursor_fails_after_mutation() {
        let (mut tree, small, _) = two_group_tree();
        let root = tree.root();
        let mut cursor = tree.leaf_cursor(root);
        assert_eq!(cursor.next(&tree).unwrap(), Some(&1));

        tree.add(small, GroupChild::Item(4));
        assert!(matches!(cursor.next(&tree), Err(CollectionError::StaleEnumerator)));
    }

    #[test]
    fn test_leaf_cursor_runs_to_end() {
        let (tree, _, _) = two_group_tree();
        let mut cursor = tree.leaf_cursor(tree.root());
        let mut seen = Vec::new();
        while let Some(item) = cursor.next(&tree).unwrap() {
            seen.push(*item);
        }
        assert_eq!(seen, vec![1, 2, 3, 10, 20]);
    }

    #[test]
    fn test_clear_resets_root() {
        let (mut tree, _, _) = two_group_tree();
        let before = tree.generation();
        tree.clear();
        assert_eq!(tree.leaf_count(), 0);
        assert_eq!(tree.group_count(), 1);
        assert!(tree.generation() > before);
    }

    #[test]
    fn test_remove_child_at_drops_subtree() {
        let (mut tree, small, _) = two_group_tree();
        let root = tree.root();
        let removed = tree.remove_child_at(root, 0);
        assert_eq!(removed, Some(GroupChild::Group(small)));
        assert!(tree.node(small).is_none());
        assert_counts(&tree, root);
    }
}
