//! Grouping driver.
//!
//! [`GroupRoot`] owns a [`GroupTree`] and the group descriptions, and knows
//! how to route an item to the bottom-level group(s) it belongs to. While
//! loading (inside a refresh) items are appended in the order they arrive,
//! which makes grouping a stable partition of an already sorted sequence.
//! Outside loading, items are placed with an [`InsertComparer`] and every
//! leaf-level change is buffered as a [`CollectionChange`] for the view to
//! forward.

use std::fmt;
use std::rc::Rc;

use horizon_dataview_core::logging::targets;

use super::compare::InsertComparer;
use super::tree::{GroupChild, GroupId, GroupTree, Removal};
use crate::culture::Culture;
use crate::description::{GroupDescription, GroupKey};
use crate::item::ViewItem;
use crate::source::CollectionChange;

/// Chooses the description dividing a non-root group, given its key and
/// level. Returning `None` falls back to the level's description.
pub type GroupBySelector<T> = Rc<dyn Fn(&GroupKey<T>, usize) -> Option<Rc<GroupDescription<T>>>>;

/// Routes items through the group tree.
pub struct GroupRoot<T> {
    tree: GroupTree<T>,
    descriptions: Vec<Rc<GroupDescription<T>>>,
    group_by_selector: Option<GroupBySelector<T>>,
    is_data_in_group_order: bool,
    reserved_tail: usize,
    changes: Vec<CollectionChange<T>>,
}

impl<T: ViewItem> Default for GroupRoot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ViewItem> GroupRoot<T> {
    /// Create an ungrouped root.
    pub fn new() -> Self {
        Self {
            tree: GroupTree::new(),
            descriptions: Vec::new(),
            group_by_selector: None,
            is_data_in_group_order: false,
            reserved_tail: 0,
            changes: Vec::new(),
        }
    }

    /// The underlying tree.
    pub fn tree(&self) -> &GroupTree<T> {
        &self.tree
    }

    /// The group descriptions, outermost first.
    pub fn descriptions(&self) -> &[Rc<GroupDescription<T>>] {
        &self.descriptions
    }

    /// Replace the group descriptions. Takes effect on the next
    /// [`initialize`](Self::initialize).
    pub fn set_descriptions(&mut self, descriptions: Vec<Rc<GroupDescription<T>>>) {
        self.descriptions = descriptions;
    }

    /// Set the per-group description selector.
    pub fn set_group_by_selector(&mut self, selector: Option<GroupBySelector<T>>) {
        self.group_by_selector = selector;
    }

    /// Declare that items arrive already grouped, so loading can resume the
    /// subgroup search where the previous item matched.
    pub fn set_data_in_group_order(&mut self, value: bool) {
        self.is_data_in_group_order = value;
    }

    /// Check if the data is declared to arrive in group order.
    pub fn is_data_in_group_order(&self) -> bool {
        self.is_data_in_group_order
    }

    /// Check if any grouping applies.
    pub fn is_grouping(&self) -> bool {
        !self.descriptions.is_empty() || self.group_by_selector.is_some()
    }

    /// Top-level groups.
    pub fn groups(&self) -> Vec<GroupId> {
        self.tree.subgroups(self.tree.root()).collect()
    }

    /// Reset the tree to an empty root and create every explicit group.
    pub fn initialize(&mut self) {
        self.tree.clear();
        self.reserved_tail = 0;
        self.changes.clear();
        let root = self.tree.root();
        self.initialize_group(root, 0);
        tracing::debug!(
            target: targets::GROUP,
            levels = self.descriptions.len(),
            groups = self.tree.group_count(),
            "initialized group root"
        );
    }

    fn group_description(&self, group: GroupId, level: usize) -> Option<Rc<GroupDescription<T>>> {
        if group != self.tree.root()
            && let Some(selector) = &self.group_by_selector
            && let Some(node) = self.tree.node(group)
            && let Some(description) = selector(node.key(), level)
        {
            return Some(description);
        }
        self.descriptions.get(level).cloned()
    }

    fn initialize_group(&mut self, group: GroupId, level: usize) {
        let description = self.group_description(group, level);
        self.tree.set_description(group, description.clone());
        if let Some(description) = description {
            for key in description.group_keys() {
                let subgroup = self.tree.create_group(key.clone());
                self.initialize_group(subgroup, level + 1);
                self.tree.add(group, GroupChild::Group(subgroup));
            }
        }
        self.tree.set_last_index(group, 0);
    }

    /// Route an item to its bottom-level group(s).
    ///
    /// Returns the number of leaves added; more than one when a list key
    /// places the item in several groups.
    pub fn add_to_subgroups(
        &mut self,
        item: &T,
        loading: bool,
        comparer: &mut dyn InsertComparer<T>,
        culture: &Culture,
    ) -> usize {
        let root = self.tree.root();
        self.add_to_group(root, 0, item, loading, comparer, culture)
    }

    fn add_to_group(
        &mut self,
        group: GroupId,
        level: usize,
        item: &T,
        loading: bool,
        comparer: &mut dyn InsertComparer<T>,
        culture: &Culture,
    ) -> usize {
        let Some(node) = self.tree.node(group) else {
            return 0;
        };
        let Some(description) = node.description().cloned() else {
            self.add_leaf(group, item, loading, comparer);
            return 1;
        };

        let mut added = 0;
        for key in description.group_keys_from_item(item, level, culture) {
            added += self.add_to_subgroup(group, level, &description, key, item, loading, comparer, culture);
        }
        added
    }

    fn add_leaf(&mut self, group: GroupId, item: &T, loading: bool, comparer: &mut dyn InsertComparer<T>) {
        if loading {
            self.tree.add(group, GroupChild::Item(item.clone()));
            return;
        }
        let tail = self.tail_for(group);
        let local = self
            .tree
            .insert_bounded(group, GroupChild::Item(item.clone()), item, comparer, tail);
        let index = self.tree.leaf_index_from_item(group, local);
        self.changes.push(CollectionChange::Added {
            index,
            item: item.clone(),
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn add_to_subgroup(
        &mut self,
        group: GroupId,
        level: usize,
        description: &GroupDescription<T>,
        key: GroupKey<T>,
        item: &T,
        loading: bool,
        comparer: &mut dyn InsertComparer<T>,
        culture: &Culture,
    ) -> usize {
        let Some(node) = self.tree.node(group) else {
            return 0;
        };
        let start = if self.is_data_in_group_order {
            node.last_index()
        } else {
            0
        };

        let matched = node
            .children()
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(index, child)| {
                let subgroup = child.as_group()?;
                let sub_node = self.tree.node(subgroup)?;
                description
                    .keys_match(sub_node.key(), &key, culture)
                    .then_some((index, subgroup))
            });

        if let Some((index, subgroup)) = matched {
            self.tree.set_last_index(group, index);
            return self.add_to_group(subgroup, level + 1, item, loading, comparer, culture);
        }

        let subgroup = self.tree.create_group(key);
        self.initialize_group(subgroup, level + 1);
        if loading {
            self.tree.add(group, GroupChild::Group(subgroup));
            let last = self.tree.node(group).map_or(0, |node| node.children().len() - 1);
            self.tree.set_last_index(group, last);
        } else {
            let tail = self.tail_for(group);
            self.tree
                .insert_bounded(group, GroupChild::Group(subgroup), item, comparer, tail);
        }
        tracing::trace!(target: targets::GROUP, level, loading, "created subgroup");
        self.add_to_group(subgroup, level + 1, item, loading, comparer, culture)
    }

    /// Remove an item from the group(s) its keys lead to.
    ///
    /// Returns `true` when the item was missing from a group it should have
    /// been in, meaning its keys changed since it was added. Callers then
    /// fall back to
    /// [`remove_item_by_exhaustive_search`](Self::remove_item_by_exhaustive_search).
    pub fn remove_from_subgroups(&mut self, item: &T, culture: &Culture) -> bool {
        self.remove_occurrence_from_subgroups(item, 0, culture)
    }

    /// Like [`remove_from_subgroups`](Self::remove_from_subgroups), but
    /// removes the `occurrence`-th (from zero) leaf equal to `item` in each
    /// group, for views holding equal items more than once.
    pub fn remove_occurrence_from_subgroups(&mut self, item: &T, occurrence: usize, culture: &Culture) -> bool {
        let root = self.tree.root();
        self.remove_from_group(root, 0, item, occurrence, culture)
    }

    fn remove_from_group(
        &mut self,
        group: GroupId,
        level: usize,
        item: &T,
        occurrence: usize,
        culture: &Culture,
    ) -> bool {
        let Some(node) = self.tree.node(group) else {
            return true;
        };
        let Some(description) = node.description().cloned() else {
            return !self.remove_leaf(group, item, occurrence);
        };

        let mut missing = false;
        for key in description.group_keys_from_item(item, level, culture) {
            let matched = self.tree.subgroups(group).find(|subgroup| {
                self.tree
                    .node(*subgroup)
                    .is_some_and(|node| description.keys_match(node.key(), &key, culture))
            });
            missing |= match matched {
                Some(subgroup) => self.remove_from_group(subgroup, level + 1, item, occurrence, culture),
                None => true,
            };
        }
        missing
    }

    fn remove_leaf(&mut self, group: GroupId, item: &T, occurrence: usize) -> bool {
        match self.tree.remove_occurrence(group, item, occurrence, true) {
            Removal::Removed { leaf_index } => {
                self.changes.push(CollectionChange::Removed {
                    index: leaf_index.unwrap_or_default(),
                    item: item.clone(),
                });
                true
            }
            Removal::NotFound => false,
        }
    }

    /// Remove every occurrence of an item from every bottom-level group.
    ///
    /// Returns the number of leaves removed.
    pub fn remove_item_by_exhaustive_search(&mut self, item: &T) -> usize {
        let mut bottom = Vec::new();
        self.collect_bottom_groups(self.tree.root(), &mut bottom);

        let mut removed = 0;
        for group in bottom {
            while self.remove_leaf(group, item, 0) {
                removed += 1;
            }
        }
        tracing::debug!(target: targets::GROUP, removed, "exhaustive removal");
        removed
    }

    fn collect_bottom_groups(&self, group: GroupId, into: &mut Vec<GroupId>) {
        let Some(node) = self.tree.node(group) else {
            return;
        };
        if node.children().iter().any(|child| child.as_item().is_some()) {
            into.push(group);
        }
        for subgroup in self.tree.subgroups(group) {
            self.collect_bottom_groups(subgroup, into);
        }
    }

    /// Insert an item directly under the root at a fixed position,
    /// bypassing grouping. Used for the pending add-new item.
    ///
    /// An item placed last stays last: later sorted insertions under the
    /// root land before it.
    pub fn insert_special_item(&mut self, index: usize, item: &T, loading: bool) {
        let root = self.tree.root();
        let child_count = self.tree.node(root).map_or(0, |node| node.children().len());
        let index = index.min(child_count);
        self.tree.insert_at(root, index, GroupChild::Item(item.clone()));
        if index == child_count {
            self.reserved_tail = 1;
        }
        if !loading {
            let leaf_index = self.tree.leaf_index_from_item(root, index);
            self.changes.push(CollectionChange::Added {
                index: leaf_index,
                item: item.clone(),
            });
        }
    }

    /// Remove an item inserted with
    /// [`insert_special_item`](Self::insert_special_item).
    ///
    /// Returns `false` if the item is not a direct child of the root.
    pub fn remove_special_item(&mut self, item: &T, loading: bool) -> bool {
        let root = self.tree.root();
        let Some(index) = self.tree.node(root).and_then(|node| {
            node.children()
                .iter()
                .rposition(|child| child.as_item() == Some(item))
        }) else {
            return false;
        };
        let leaf_index = self.tree.leaf_index_from_item(root, index);
        self.tree.remove_child_at(root, index);
        self.reserved_tail = 0;
        if !loading {
            self.changes.push(CollectionChange::Removed {
                index: leaf_index,
                item: item.clone(),
            });
        }
        true
    }

    /// Drain the buffered leaf-level changes.
    pub fn take_changes(&mut self) -> Vec<CollectionChange<T>> {
        std::mem::take(&mut self.changes)
    }

    fn tail_for(&self, group: GroupId) -> usize {
        if group == self.tree.root() {
            self.reserved_tail
        } else {
            0
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GroupRoot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupRoot")
            .field("levels", &self.descriptions.len())
            .field("groups", &self.tree.group_count())
            .field("leaves", &self.tree.leaf_count())
            .field("has_selector", &self.group_by_selector.is_some())
            .field("is_data_in_group_order", &self.is_data_in_group_order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::compare::{AppendComparer, FnComparer};
    use crate::record;
    use crate::value::Value;

    fn by_country_city() -> Vec<Rc<GroupDescription<Value>>> {
        vec![
            Rc::new(GroupDescription::by_path("country")),
            Rc::new(GroupDescription::by_path("city")),
        ]
    }

    fn people() -> Vec<Value> {
        vec![
            record! { "name" => "Ann", "country" => "NO", "city" => "Oslo" },
            record! { "name" => "Bob", "country" => "SE", "city" => "Lund" },
            record! { "name" => "Cid", "country" => "NO", "city" => "Bergen" },
            record! { "name" => "Dee", "country" => "NO", "city" => "Oslo" },
            record! { "name" => "Eve", "country" => "SE", "city" => "Malmo" },
        ]
    }

    fn loaded(descriptions: Vec<Rc<GroupDescription<Value>>>, items: &[Value]) -> GroupRoot<Value> {
        let mut root = GroupRoot::new();
        root.set_descriptions(descriptions);
        root.initialize();
        let culture = Culture::invariant();
        for item in items {
            root.add_to_subgroups(item, true, &mut AppendComparer, &culture);
        }
        root
    }

    fn text(value: &Value, field: &str) -> String {
        value.field(field).map(Value::to_display_string).unwrap_or_default()
    }

    fn name(value: &Value) -> String {
        text(value, "name")
    }

    #[test]
    fn test_loading_is_stable_partition() {
        let mut root = loaded(by_country_city(), &people());
        assert!(root.take_changes().is_empty());
        let tree = root.tree();
        let names: Vec<String> = tree.leaves(tree.root()).map(name).collect();
        assert_eq!(names, ["Ann", "Dee", "Cid", "Bob", "Eve"]);

        let groups = root.groups();
        assert_eq!(groups.len(), 2);
        let total: usize = groups
            .iter()
            .map(|g| tree.node(*g).unwrap().leaf_count())
            .sum();
        assert_eq!(total, 5);
        let norway = tree.node(groups[0]).unwrap();
        assert_eq!(norway.key(), &GroupKey::from("NO"));
        assert_eq!(tree.subgroups(groups[0]).count(), 2);
    }

    #[test]
    fn test_explicit_groups_created_up_front() {
        let parity = GroupDescription::<i64>::by_key(|n| Value::from(if n % 2 == 0 { "even" } else { "odd" }))
            .with_group_keys(vec!["even".into(), "odd".into()]);
        let mut root = GroupRoot::new();
        root.set_descriptions(vec![Rc::new(parity)]);
        root.initialize();
        let culture = Culture::invariant();
        for n in [1, 3, 5] {
            root.add_to_subgroups(&n, true, &mut AppendComparer, &culture);
        }

        let groups = root.groups();
        assert_eq!(groups.len(), 2);
        let even = root.tree().node(groups[0]).unwrap();
        assert_eq!(even.key(), &GroupKey::from("even"));
        assert_eq!(even.leaf_count(), 0);
        assert_eq!(root.tree().node(groups[1]).unwrap().leaf_count(), 3);
    }

    #[test]
    fn test_list_key_adds_to_each_group() {
        let tags = GroupDescription::<Value>::by_path("tags");
        let item = record! { "tags" => vec![Value::from("a"), Value::from("b")] };
        let mut root = GroupRoot::new();
        root.set_descriptions(vec![Rc::new(tags)]);
        root.initialize();
        let added = root.add_to_subgroups(&item, true, &mut AppendComparer, &Culture::invariant());
        assert_eq!(added, 2);
        assert_eq!(root.tree().leaf_count(), 2);
        assert_eq!(root.groups().len(), 2);
    }

    #[test]
    fn test_incremental_add_reports_leaf_index() {
        let mut root = loaded(by_country_city(), &people());
        let mut by_name = FnComparer(|a: &Value, b: &Value| name(a).cmp(&name(b)));
        let item = record! { "name" => "Bea", "country" => "NO", "city" => "Oslo" };
        root.add_to_subgroups(&item, false, &mut by_name, &Culture::invariant());

        let changes = root.take_changes();
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], CollectionChange::Added { index: 1, item: added } if *added == item));
        let tree = root.tree();
        assert_eq!(tree.leaf_at(tree.root(), 1), Some(&item));
    }

    #[test]
    fn test_incremental_add_creates_sorted_subgroup() {
        let mut root = loaded(vec![Rc::new(GroupDescription::by_path("country"))], &people());
        let mut by_country = FnComparer(|a: &Value, b: &Value| {
            text(a, "country").cmp(&text(b, "country"))
        });
        let item = record! { "name" => "Fay", "country" => "DK", "city" => "Aarhus" };
        root.add_to_subgroups(&item, false, &mut by_country, &Culture::invariant());

        let groups = root.groups();
        assert_eq!(groups.len(), 3);
        assert_eq!(root.tree().node(groups[0]).unwrap().key(), &GroupKey::from("DK"));
        let changes = root.take_changes();
        assert!(matches!(changes.as_slice(), [CollectionChange::Added { index: 0, .. }]));
    }

    #[test]
    fn test_remove_prunes_discovered_group() {
        let mut root = loaded(by_country_city(), &people());
        let culture = Culture::invariant();
        let cid = people()[2].clone();
        assert!(!root.remove_from_subgroups(&cid, &culture));

        let norway = root.groups()[0];
        assert_eq!(root.tree().subgroups(norway).count(), 1);
        let changes = root.take_changes();
        assert!(matches!(changes.as_slice(), [CollectionChange::Removed { index: 2, .. }]));
    }

    #[test]
    fn test_remove_with_changed_key_is_missing() {
        let mut root = loaded(by_country_city(), &people());
        let culture = Culture::invariant();
        let moved = record! { "name" => "Ann", "country" => "SE", "city" => "Oslo" };
        assert!(root.remove_from_subgroups(&moved, &culture));
        assert_eq!(root.tree().leaf_count(), 5);

        let original = people()[0].clone();
        assert_eq!(root.remove_item_by_exhaustive_search(&original), 1);
        assert_eq!(root.tree().leaf_count(), 4);
    }

    #[test]
    fn test_data_in_group_order_resumes_search() {
        let mut root = GroupRoot::<Value>::new();
        root.set_descriptions(vec![Rc::new(GroupDescription::by_path("country"))]);
        root.set_data_in_group_order(true);
        root.initialize();
        let culture = Culture::invariant();
        let sorted = [
            record! { "country" => "NO" },
            record! { "country" => "NO" },
            record! { "country" => "SE" },
        ];
        for item in &sorted {
            root.add_to_subgroups(item, true, &mut AppendComparer, &culture);
        }
        assert_eq!(root.groups().len(), 2);
        assert_eq!(root.tree().node(root.tree().root()).unwrap().last_index(), 1);
    }

    #[test]
    fn test_group_by_selector_overrides_nested_levels() {
        let mut root = GroupRoot::<Value>::new();
        root.set_descriptions(vec![Rc::new(GroupDescription::by_path("country"))]);
        let by_city = Rc::new(GroupDescription::by_path("city"));
        root.set_group_by_selector(Some(Rc::new(move |key: &GroupKey<Value>, _level: usize| {
            (key == &GroupKey::from("NO")).then(|| by_city.clone())
        })));
        root.initialize();
        let culture = Culture::invariant();
        for item in people() {
            root.add_to_subgroups(&item, true, &mut AppendComparer, &culture);
        }

        let groups = root.groups();
        assert_eq!(root.tree().subgroups(groups[0]).count(), 2);
        assert_eq!(root.tree().subgroups(groups[1]).count(), 0);
        assert!(root.tree().node(groups[1]).unwrap().is_bottom_level());
    }

    #[test]
    fn test_special_item_stays_last() {
        let mut root = GroupRoot::<i64>::new();
        root.initialize();
        let culture = Culture::invariant();
        for n in [1, 5] {
            root.add_to_subgroups(&n, true, &mut AppendComparer, &culture);
        }
        root.insert_special_item(2, &0, false);
        let mut natural = FnComparer(|a: &i64, b: &i64| a.cmp(b));
        root.add_to_subgroups(&9, false, &mut natural, &culture);

        let leaves: Vec<i64> = root.tree().leaves(root.tree().root()).copied().collect();
        assert_eq!(leaves, vec![1, 5, 9, 0]);

        assert!(root.remove_special_item(&0, false));
        assert!(!root.remove_special_item(&0, false));
        let changes = root.take_changes();
        assert_eq!(changes.len(), 3);
        assert!(matches!(changes[2], CollectionChange::Removed { index: 3, item: 0 }));
    }
}
