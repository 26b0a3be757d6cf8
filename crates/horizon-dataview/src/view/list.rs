//! The default collection view.
//!
//! [`ListCollectionView`] keeps two structures in step:
//!
//! - `ordered`: the source items that pass the filters, in sort order (or
//!   source order when unsorted), each with its source index
//! - a [`GroupRoot`] whose leaves are the flattened view
//!
//! A refresh rebuilds both: filter, then stable sort, then a stable
//! partition into groups. Between refreshes, source notifications and the
//! view's own edits are applied incrementally. Ties in `ordered` are broken
//! by source index and the tree is placed against `ordered`, so incremental
//! inserts land exactly where a refresh would put them, duplicates included.
//!
//! Source notifications reach the view through a [`DataConnection`], which
//! also keeps the view's own writes from coming back as notifications.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use horizon_dataview_core::logging::{span_names, targets};
use horizon_dataview_core::{PerfSpan, Verdict};
use static_assertions::assert_not_impl_any;

use super::{CollectionView, CurrentChangingArgs, CurrentPosition, EditableCollectionView, ViewSignals};
use crate::connection::{DataConnection, DataSource};
use crate::culture::Culture;
use crate::description::{FilterDescription, GroupDescription, SortComparer, SortDescription};
use crate::error::{CollectionError, Result};
use crate::group::{AppendComparer, GroupBySelector, GroupRoot, GroupTree, ListOrderComparer};
use crate::item::ViewItem;
use crate::options::{NewItemFactory, ViewOptions};
use crate::source::{CollectionChange, ItemSource};

/// View-level filter predicate.
pub type FilterFn<T> = Rc<dyn Fn(&T) -> bool>;

struct NewItem<T> {
    item: T,
    source_index: usize,
}

/// Collection view over an indexable [`ItemSource`].
///
/// Subscribes to the source's change notifications. An owned view queues
/// them until [`process_source_changes`](Self::process_source_changes) or
/// the next mutating call; a view made shared with
/// [`into_shared`](Self::into_shared) applies them as they arrive.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use horizon_dataview::prelude::*;
///
/// let source = Rc::new(ObservableList::new(vec![3i64, 1, 2]));
/// let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());
/// view.set_sort_descriptions(vec![SortDescription::identity(SortDirection::Ascending)])
///     .unwrap();
/// assert_eq!(view.items(), vec![1, 2, 3]);
///
/// source.push(0);
/// view.process_source_changes().unwrap();
/// assert_eq!(view.items(), vec![0, 1, 2, 3]);
/// ```
pub struct ListCollectionView<T: ViewItem> {
    source: Rc<dyn ItemSource<T>>,
    culture: Culture,
    can_sort: bool,
    can_filter: bool,
    can_group: bool,
    new_item_factory: Option<NewItemFactory<T>>,
    filter: Option<FilterFn<T>>,
    filter_descriptions: Vec<FilterDescription<T>>,
    sort_descriptions: Vec<SortDescription<T>>,
    root: GroupRoot<T>,
    ordered: Vec<T>,
    ordered_sources: Vec<usize>,
    current: CurrentPosition,
    current_item: Option<T>,
    defer_level: usize,
    needs_refresh: bool,
    new_item: Option<NewItem<T>>,
    edit_item: Option<T>,
    signals: ViewSignals<T>,
    connection: DataConnection<T>,
}

assert_not_impl_any!(ListCollectionView<String>: Send, Sync);

impl<T: ViewItem> ListCollectionView<T> {
    /// Create a view and load it from the source.
    ///
    /// The cursor starts on the first item, or before the first item when
    /// the view is empty.
    pub fn new(source: Rc<dyn ItemSource<T>>, options: ViewOptions<T>) -> Self {
        let mut root = GroupRoot::new();
        root.set_data_in_group_order(options.is_data_in_group_order);

        let connection = DataConnection::with_source(DataSource::Items(source.clone()));
        let mut view = Self {
            source,
            culture: options.resolved_culture(),
            can_sort: options.can_sort,
            can_filter: options.can_filter,
            can_group: options.can_group,
            new_item_factory: options.new_item_factory,
            filter: None,
            filter_descriptions: Vec::new(),
            sort_descriptions: Vec::new(),
            root,
            ordered: Vec::new(),
            ordered_sources: Vec::new(),
            current: CurrentPosition::BeforeFirst,
            current_item: None,
            defer_level: 0,
            needs_refresh: false,
            new_item: None,
            edit_item: None,
            signals: ViewSignals::default(),
            connection,
        };
        view.load();
        let first = if view.ordered.is_empty() {
            CurrentPosition::BeforeFirst
        } else {
            CurrentPosition::OnItem(0)
        };
        view.set_current(first);
        view
    }

    /// Move the view behind `Rc<RefCell<_>>` so source notifications are
    /// applied as they arrive.
    ///
    /// A notification arriving while the view is borrowed is queued and
    /// applied by the next mutating call.
    pub fn into_shared(self) -> Rc<RefCell<Self>> {
        let shared = Rc::new(RefCell::new(self));
        let weak = Rc::downgrade(&shared);
        shared
            .borrow()
            .connection
            .set_change_handler(Some(Rc::new(move || {
                if let Some(shared) = weak.upgrade()
                    && let Ok(mut view) = shared.try_borrow_mut()
                    && let Err(error) = view.process_source_changes()
                {
                    tracing::warn!(target: targets::VIEW, %error, "applying source change failed");
                }
            })));
        shared
    }

    /// The grouping driver.
    pub fn group_root(&self) -> &GroupRoot<T> {
        &self.root
    }

    /// Set a selector choosing the description for individual groups, and
    /// refresh.
    ///
    /// # Errors
    ///
    /// As for [`set_group_descriptions`](CollectionView::set_group_descriptions).
    pub fn set_group_by_selector(&mut self, selector: Option<GroupBySelector<T>>) -> Result<()> {
        self.verify_shaping("set_group_by_selector", self.can_group)?;
        self.root.set_group_by_selector(selector);
        self.refresh_or_defer()
    }

    /// Whether the source notifies changes and the view listens.
    pub fn events_wired(&self) -> bool {
        self.connection.events_wired()
    }

    /// Apply queued source notifications.
    ///
    /// While refresh is deferred, notifications only mark the view as
    /// needing a refresh.
    ///
    /// # Errors
    ///
    /// [`Veto`](CollectionError::Veto) if a handler canceled the forced
    /// currency change caused by removing the current item. The remaining
    /// changes are still applied.
    pub fn process_source_changes(&mut self) -> Result<()> {
        if !self.connection.has_pending_changes() {
            return Ok(());
        }
        let _perf = PerfSpan::new(span_names::SOURCE_CHANGES);
        let mut first_error = None;
        loop {
            let changes = self.connection.take_pending_changes();
            if changes.is_empty() {
                break;
            }
            if self.defer_level > 0 {
                self.needs_refresh = true;
                break;
            }
            for change in changes {
                // a reload already reflects the rest of the batch
                let reloads = change.is_reset();
                if let Err(error) = self.apply_source_change(change) {
                    first_error.get_or_insert(error);
                }
                if reloads {
                    break;
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn passes_filter(&self, item: &T) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(item))
            && self
                .filter_descriptions
                .iter()
                .all(|description| description.passes(item, &self.culture))
    }

    fn is_shaped(&self) -> bool {
        self.filter.is_some()
            || !self.filter_descriptions.is_empty()
            || !self.sort_descriptions.is_empty()
            || self.root.is_grouping()
    }

    fn load(&mut self) {
        let mut entries: Vec<(usize, T)> = self
            .source
            .snapshot()
            .into_iter()
            .enumerate()
            .filter(|(_, item)| self.passes_filter(item))
            .collect();
        let comparer = SortComparer::new(&self.sort_descriptions, &self.culture);
        if !comparer.is_empty() {
            entries.sort_by(|(_, a), (_, b)| comparer.compare(a, b));
        }

        self.root.initialize();
        for (_, item) in &entries {
            self.root
                .add_to_subgroups(item, true, &mut AppendComparer, &self.culture);
        }
        (self.ordered_sources, self.ordered) = entries.into_iter().unzip();
        self.connection.take_pending_changes();
        self.needs_refresh = false;
    }

    fn leaf(&self, index: usize) -> Option<&T> {
        let tree = self.root.tree();
        tree.leaf_at(tree.root(), index)
    }

    fn leaf_count(&self) -> usize {
        self.root.tree().leaf_count()
    }

    fn is_current(&self, item: &T) -> bool {
        self.current.is_on_item() && self.current_item.as_ref() == Some(item)
    }

    fn in_transaction(&self) -> bool {
        self.new_item.is_some() || self.edit_item.is_some()
    }

    fn verify_not_deferred(&self, operation: &'static str) -> Result<()> {
        if self.defer_level > 0 {
            return Err(CollectionError::invalid_state(operation, "refresh is deferred"));
        }
        Ok(())
    }

    fn verify_shaping(&self, operation: &'static str, allowed: bool) -> Result<()> {
        if !allowed {
            return Err(CollectionError::not_supported(operation));
        }
        if self.in_transaction() {
            return Err(CollectionError::invalid_state(operation, "adding or editing an item"));
        }
        Ok(())
    }

    fn refresh_or_defer(&mut self) -> Result<()> {
        if self.defer_level > 0 {
            self.needs_refresh = true;
            return Ok(());
        }
        self.refresh_internal()
    }

    fn refresh_internal(&mut self) -> Result<()> {
        if self.defer_level > 0 {
            self.needs_refresh = true;
            return Ok(());
        }
        let _perf = PerfSpan::new(span_names::REFRESH);
        let vetoed = self
            .signals
            .current_changing
            .request(&CurrentChangingArgs { is_cancelable: false }, false)
            .err();

        let previous = self.current;
        let previous_item = self.current_item.take();
        self.load();
        tracing::debug!(
            target: targets::VIEW,
            leaves = self.leaf_count(),
            groups = self.root.tree().group_count() - 1,
            "refreshed"
        );
        self.signals.collection_changed.emit(CollectionChange::Reset);

        let position = match (previous, previous_item) {
            _ if self.leaf_count() == 0 => CurrentPosition::BeforeFirst,
            (CurrentPosition::BeforeFirst, _) => CurrentPosition::BeforeFirst,
            (CurrentPosition::AfterLast, _) => CurrentPosition::AfterLast,
            (CurrentPosition::OnItem(_), Some(item)) => self
                .index_of(&item)
                .map_or(CurrentPosition::OnItem(0), CurrentPosition::OnItem),
            (CurrentPosition::OnItem(_), None) => CurrentPosition::OnItem(0),
        };
        self.set_current(position);
        self.signals.current_changed.emit(());

        match vetoed {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn after_transaction(&mut self) -> Result<()> {
        if self.needs_refresh && self.defer_level == 0 && !self.in_transaction() {
            return self.refresh_internal();
        }
        Ok(())
    }

    fn set_current(&mut self, position: CurrentPosition) {
        self.current = position;
        self.current_item = position.index().and_then(|index| self.leaf(index).cloned());
    }

    fn set_current_forced(&mut self, position: CurrentPosition) -> Result<()> {
        let vetoed = self
            .signals
            .current_changing
            .request(&CurrentChangingArgs { is_cancelable: false }, false)
            .err();
        self.set_current(position);
        self.signals.current_changed.emit(());
        match vetoed {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    fn move_to(&mut self, position: CurrentPosition) -> Result<bool> {
        self.verify_not_deferred("move_current_to_position")?;
        let count = self.leaf_count();
        if let CurrentPosition::OnItem(index) = position
            && index >= count
        {
            return Err(CollectionError::PositionOutOfRange {
                position: index,
                count,
            });
        }

        let in_sync = self.current.index().and_then(|index| self.leaf(index)) == self.current_item.as_ref();
        if position != self.current || !in_sync {
            let verdict = self
                .signals
                .current_changing
                .request(&CurrentChangingArgs { is_cancelable: true }, true)?;
            if verdict == Verdict::Cancel {
                tracing::trace!(target: targets::VIEW, "current change canceled");
                return Ok(self.current.is_on_item());
            }
            self.set_current(position);
            self.signals.current_changed.emit(());
        }
        Ok(self.current.is_on_item())
    }

    /// Insert the item found at `source_index` into `ordered` and the tree
    /// if it passes the filters.
    fn insert_into_view(&mut self, item: &T, source_index: usize) {
        if !self.passes_filter(item) {
            return;
        }
        let comparer = SortComparer::new(&self.sort_descriptions, &self.culture);
        let position = self
            .ordered
            .iter()
            .zip(&self.ordered_sources)
            .position(|(existing, &at)| {
                comparer
                    .compare(existing, item)
                    .then(at.cmp(&source_index))
                    == Ordering::Greater
            })
            .unwrap_or(self.ordered.len());
        self.ordered.insert(position, item.clone());
        self.ordered_sources.insert(position, source_index);

        let mut order = ListOrderComparer::at_position(&self.ordered, position);
        self.root
            .add_to_subgroups(item, false, &mut order, &self.culture);
    }

    /// Remove the entry at `position` of `ordered` from the view.
    fn remove_from_view_at(&mut self, position: usize) {
        let occurrence = self.ordered[..position]
            .iter()
            .filter(|existing| **existing == self.ordered[position])
            .count();
        self.ordered_sources.remove(position);
        let item = self.ordered.remove(position);
        if self
            .root
            .remove_occurrence_from_subgroups(&item, occurrence, &self.culture)
        {
            tracing::debug!(target: targets::VIEW, "item keys changed, searching all groups");
            self.root.remove_item_by_exhaustive_search(&item);
        }
    }

    /// Remove the entry that came from `source_index`, if it is in the view.
    fn remove_source_entry(&mut self, source_index: usize) {
        if let Some(position) = self.ordered_sources.iter().position(|&at| at == source_index) {
            self.remove_from_view_at(position);
        }
    }

    fn source_inserted(&mut self, source_index: usize) {
        for at in &mut self.ordered_sources {
            if *at >= source_index {
                *at += 1;
            }
        }
        if let Some(pending) = self.new_item.as_mut()
            && source_index <= pending.source_index
        {
            pending.source_index += 1;
        }
    }

    fn source_removed(&mut self, source_index: usize) {
        for at in &mut self.ordered_sources {
            if *at > source_index {
                *at -= 1;
            }
        }
        if let Some(pending) = self.new_item.as_mut()
            && source_index < pending.source_index
        {
            pending.source_index -= 1;
        }
    }

    /// Where `item` sits in the source, trusting `hint` when it still holds
    /// the item.
    fn locate_in_source(&self, item: &T, hint: usize) -> Option<usize> {
        match self.source.get(hint) {
            Some(at) if at == *item => Some(hint),
            _ => self.connection.index_of(item),
        }
    }

    /// Raise the buffered leaf changes and keep the cursor on its item.
    ///
    /// `follow` is an item the cursor should stay on even though it moved.
    fn publish(&mut self, follow: Option<T>) -> Result<()> {
        let mut lost = false;
        for change in self.root.take_changes() {
            match (&change, self.current) {
                (CollectionChange::Added { index, .. }, CurrentPosition::OnItem(current))
                    if *index <= current =>
                {
                    self.current = CurrentPosition::OnItem(current + 1);
                }
                (CollectionChange::Removed { index, .. }, CurrentPosition::OnItem(current))
                    if *index < current =>
                {
                    self.current = CurrentPosition::OnItem(current - 1);
                }
                (CollectionChange::Removed { index, .. }, CurrentPosition::OnItem(current))
                    if *index == current =>
                {
                    lost = true;
                }
                _ => {}
            }
            self.signals.collection_changed.emit(change);
        }

        if let Some(item) = follow {
            match self.index_of(&item) {
                Some(index) => return self.set_current_forced(CurrentPosition::OnItem(index)),
                None => lost = true,
            }
        }
        if lost {
            let count = self.leaf_count();
            let position = match self.current {
                _ if count == 0 => CurrentPosition::BeforeFirst,
                CurrentPosition::OnItem(index) => CurrentPosition::OnItem(index.min(count - 1)),
                other => other,
            };
            return self.set_current_forced(position);
        }
        Ok(())
    }

    fn apply_source_change(&mut self, change: CollectionChange<T>) -> Result<()> {
        match change {
            CollectionChange::Added { index, item } => {
                self.source_inserted(index);
                self.insert_into_view(&item, index);
                self.publish(None)
            }
            CollectionChange::Removed { index, item } => {
                if let Some(pending) = self.new_item.as_ref()
                    && pending.source_index == index
                {
                    self.new_item = None;
                    self.root.remove_special_item(&item, false);
                    self.source_removed(index);
                    return self.publish(None);
                }
                if self.edit_item.as_ref() == Some(&item) {
                    self.edit_item = None;
                }
                self.remove_source_entry(index);
                self.source_removed(index);
                self.publish(None)
            }
            CollectionChange::Replaced { index, old, new } => {
                let follow = self.is_current(&old).then(|| new.clone());
                if self.edit_item.as_ref() == Some(&old) {
                    self.edit_item = None;
                }
                self.remove_source_entry(index);
                self.insert_into_view(&new, index);
                self.publish(follow)
            }
            CollectionChange::Reset => {
                tracing::debug!(target: targets::VIEW, "source reset");
                self.new_item = None;
                self.edit_item = None;
                self.refresh_internal()
            }
        }
    }
}

impl<T: ViewItem> CollectionView<T> for ListCollectionView<T> {
    fn culture(&self) -> &Culture {
        &self.culture
    }

    fn set_culture(&mut self, culture: Culture) -> Result<()> {
        self.verify_shaping("set_culture", true)?;
        self.culture = culture;
        self.refresh_or_defer()
    }

    fn source(&self) -> &Rc<dyn ItemSource<T>> {
        &self.source
    }

    fn filter(&self) -> Option<&FilterFn<T>> {
        self.filter.as_ref()
    }

    fn set_filter(&mut self, filter: Option<FilterFn<T>>) -> Result<()> {
        self.verify_shaping("set_filter", self.can_filter)?;
        self.filter = filter;
        self.refresh_or_defer()
    }

    fn filter_descriptions(&self) -> &[FilterDescription<T>] {
        &self.filter_descriptions
    }

    fn set_filter_descriptions(&mut self, descriptions: Vec<FilterDescription<T>>) -> Result<()> {
        self.verify_shaping("set_filter_descriptions", self.can_filter)?;
        self.filter_descriptions = descriptions;
        self.refresh_or_defer()
    }

    fn sort_descriptions(&self) -> &[SortDescription<T>] {
        &self.sort_descriptions
    }

    fn set_sort_descriptions(&mut self, descriptions: Vec<SortDescription<T>>) -> Result<()> {
        self.verify_shaping("set_sort_descriptions", self.can_sort)?;
        self.sort_descriptions = descriptions;
        self.refresh_or_defer()
    }

    fn group_descriptions(&self) -> &[Rc<GroupDescription<T>>] {
        self.root.descriptions()
    }

    fn set_group_descriptions(&mut self, descriptions: Vec<GroupDescription<T>>) -> Result<()> {
        self.verify_shaping("set_group_descriptions", self.can_group)?;
        self.root
            .set_descriptions(descriptions.into_iter().map(Rc::new).collect());
        self.refresh_or_defer()
    }

    fn can_sort(&self) -> bool {
        self.can_sort
    }

    fn can_filter(&self) -> bool {
        self.can_filter
    }

    fn can_group(&self) -> bool {
        self.can_group
    }

    fn is_grouping(&self) -> bool {
        self.root.is_grouping()
    }

    fn tree(&self) -> &GroupTree<T> {
        self.root.tree()
    }

    fn count(&self) -> usize {
        self.leaf_count()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.leaf(index)
    }

    fn index_of(&self, item: &T) -> Option<usize> {
        let tree = self.root.tree();
        tree.leaf_index_of(tree.root(), item)
    }

    fn refresh(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(CollectionError::invalid_state("refresh", "adding or editing an item"));
        }
        self.refresh_internal()
    }

    fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    fn begin_defer_refresh(&mut self) {
        self.defer_level += 1;
    }

    fn end_defer_refresh(&mut self) -> Result<()> {
        if self.defer_level == 0 {
            return Err(CollectionError::invalid_state(
                "end_defer_refresh",
                "no deferred scope is open",
            ));
        }
        self.defer_level -= 1;
        if self.defer_level > 0 {
            return Ok(());
        }
        if self.in_transaction() {
            self.needs_refresh = true;
            return Ok(());
        }
        self.refresh_internal()
    }

    fn is_refresh_deferred(&self) -> bool {
        self.defer_level > 0
    }

    fn current_item(&self) -> Option<&T> {
        self.current_item.as_ref()
    }

    fn current_position(&self) -> CurrentPosition {
        self.current
    }

    fn move_current_to_first(&mut self) -> Result<bool> {
        self.process_source_changes()?;
        let count = self.leaf_count();
        self.move_to(CurrentPosition::from_index(0, count))
    }

    fn move_current_to_last(&mut self) -> Result<bool> {
        self.process_source_changes()?;
        let count = self.leaf_count();
        self.move_to(CurrentPosition::from_index(count as isize - 1, count))
    }

    fn move_current_to_next(&mut self) -> Result<bool> {
        self.process_source_changes()?;
        match self.current.next(self.leaf_count()) {
            Some(position) => self.move_to(position),
            None => Ok(false),
        }
    }

    fn move_current_to_previous(&mut self) -> Result<bool> {
        self.process_source_changes()?;
        match self.current.previous(self.leaf_count()) {
            Some(position) => self.move_to(position),
            None => Ok(false),
        }
    }

    fn move_current_to_position(&mut self, position: CurrentPosition) -> Result<bool> {
        self.process_source_changes()?;
        self.move_to(position)
    }

    fn move_current_to(&mut self, item: &T) -> Result<bool> {
        self.process_source_changes()?;
        if self.is_current(item) {
            return Ok(true);
        }
        let position = self
            .index_of(item)
            .map_or(CurrentPosition::BeforeFirst, CurrentPosition::OnItem);
        self.move_to(position)
    }

    fn signals(&self) -> &ViewSignals<T> {
        &self.signals
    }
}

impl<T: ViewItem> EditableCollectionView<T> for ListCollectionView<T> {
    fn can_add_new(&self) -> bool {
        self.edit_item.is_none()
            && self.new_item_factory.is_some()
            && !self.source.is_read_only()
            && !self.source.is_fixed_size()
    }

    fn add_new(&mut self) -> Result<T> {
        self.verify_not_deferred("add_new")?;
        self.process_source_changes()?;
        let Some(factory) = self.new_item_factory.clone().filter(|_| self.can_add_new()) else {
            return Err(CollectionError::not_supported("add_new"));
        };
        self.commit_new()?;

        let item = factory();
        let source_index = self.source.len();
        self.connection
            .write_suppressed(|source| source.insert(source_index, item.clone()))?;
        self.source_inserted(source_index);
        self.new_item = Some(NewItem {
            item: item.clone(),
            source_index,
        });
        self.root.insert_special_item(usize::MAX, &item, false);
        self.publish(None)?;

        if let Some(session) = item.edit_session() {
            session.begin_edit();
        }
        tracing::debug!(target: targets::VIEW, source_index, "added new item");
        let position = self
            .index_of(&item)
            .map_or(CurrentPosition::BeforeFirst, CurrentPosition::OnItem);
        self.move_to(position)?;
        Ok(item)
    }

    fn commit_new(&mut self) -> Result<()> {
        if self.edit_item.is_some() {
            return Err(CollectionError::invalid_state("commit_new", "editing an item"));
        }
        let Some(pending) = self.new_item.as_ref() else {
            return Ok(());
        };
        if let Some(session) = pending.item.edit_session() {
            session.end_edit().map_err(CollectionError::collaborator)?;
        }
        let Some(NewItem { item, source_index }) = self.new_item.take() else {
            return Ok(());
        };

        let follow = self.is_current(&item).then(|| item.clone());
        self.root.remove_special_item(&item, false);
        self.insert_into_view(&item, source_index);
        self.publish(follow)?;
        self.after_transaction()
    }

    fn cancel_new(&mut self) -> Result<()> {
        if self.edit_item.is_some() {
            return Err(CollectionError::invalid_state("cancel_new", "editing an item"));
        }
        let Some(pending) = self.new_item.as_ref() else {
            return Ok(());
        };
        if let Some(index) = self.locate_in_source(&pending.item, pending.source_index) {
            self.connection
                .write_suppressed(|source| source.remove_at(index).map(drop))?;
            self.source_removed(index);
        }
        let Some(NewItem { item, .. }) = self.new_item.take() else {
            return Ok(());
        };
        if let Some(session) = item.edit_session() {
            session.cancel_edit();
        }
        self.root.remove_special_item(&item, false);
        self.publish(None)?;
        self.after_transaction()
    }

    fn current_add_item(&self) -> Option<&T> {
        self.new_item.as_ref().map(|pending| &pending.item)
    }

    fn can_remove(&self) -> bool {
        !self.in_transaction() && !self.source.is_read_only() && !self.source.is_fixed_size()
    }

    fn remove_at(&mut self, index: usize) -> Result<()> {
        self.verify_not_deferred("remove_at")?;
        self.process_source_changes()?;
        let count = self.leaf_count();
        let Some(item) = self.leaf(index).cloned() else {
            return Err(CollectionError::PositionOutOfRange {
                position: index,
                count,
            });
        };
        if index + 1 == count && self.new_item.as_ref().is_some_and(|pending| pending.item == item) {
            return self.cancel_new();
        }
        if self.in_transaction() {
            return Err(CollectionError::invalid_state("remove_at", "adding or editing an item"));
        }
        if !self.can_remove() {
            return Err(CollectionError::not_supported("remove_at"));
        }

        let position = if self.root.is_grouping() {
            self.ordered.iter().position(|existing| *existing == item)
        } else {
            Some(index)
        };
        let source_index = match position.and_then(|position| self.ordered_sources.get(position)) {
            Some(&hint) => self.locate_in_source(&item, hint),
            None => self.connection.index_of(&item),
        }
        .ok_or_else(|| CollectionError::item_not_found("source"))?;
        self.connection
            .write_suppressed(|source| source.remove_at(source_index).map(drop))?;
        self.remove_source_entry(source_index);
        self.source_removed(source_index);
        self.publish(None)
    }

    fn remove(&mut self, item: &T) -> Result<()> {
        self.process_source_changes()?;
        match self.index_of(item) {
            Some(index) => self.remove_at(index),
            None => Ok(()),
        }
    }

    fn edit_item(&mut self, item: &T) -> Result<()> {
        self.verify_not_deferred("edit_item")?;
        if self.new_item.as_ref().is_some_and(|pending| pending.item == *item) {
            return Ok(());
        }
        self.commit_new()?;
        self.commit_edit()?;
        self.edit_item = Some(item.clone());
        if let Some(session) = item.edit_session() {
            session.begin_edit();
        }
        Ok(())
    }

    fn commit_edit(&mut self) -> Result<()> {
        if self.new_item.is_some() {
            return Err(CollectionError::invalid_state("commit_edit", "adding a new item"));
        }
        let Some(item) = self.edit_item.clone() else {
            return Ok(());
        };
        if let Some(session) = item.edit_session() {
            session.end_edit().map_err(CollectionError::collaborator)?;
        }
        self.edit_item = None;

        if self.is_shaped() {
            let follow = self.is_current(&item).then(|| item.clone());
            let source_index = match self.ordered.iter().position(|existing| *existing == item) {
                Some(position) => {
                    let hint = self.ordered_sources[position];
                    self.remove_from_view_at(position);
                    Some(hint)
                }
                None => self.connection.index_of(&item),
            };
            if let Some(source_index) = source_index {
                self.insert_into_view(&item, source_index);
            }
            self.publish(follow)?;
        }
        self.after_transaction()
    }

    fn cancel_edit(&mut self) -> Result<()> {
        if self.new_item.is_some() {
            return Err(CollectionError::invalid_state("cancel_edit", "adding a new item"));
        }
        let Some(item) = self.edit_item.as_ref() else {
            return Ok(());
        };
        let Some(session) = item.edit_session() else {
            return Err(CollectionError::not_supported("cancel_edit"));
        };
        session.cancel_edit();
        self.edit_item = None;
        self.after_transaction()
    }

    fn can_cancel_edit(&self) -> bool {
        self.edit_item
            .as_ref()
            .is_some_and(|item| item.edit_session().is_some())
    }

    fn current_edit_item(&self) -> Option<&T> {
        self.edit_item.as_ref()
    }
}

impl<T: ViewItem + fmt::Debug> fmt::Debug for ListCollectionView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListCollectionView")
            .field("culture", &self.culture)
            .field("count", &self.leaf_count())
            .field("current", &self.current)
            .field("sort_descriptions", &self.sort_descriptions)
            .field("filter_descriptions", &self.filter_descriptions)
            .field("root", &self.root)
            .field("defer_level", &self.defer_level)
            .field("adding_new", &self.new_item.is_some())
            .field("editing", &self.edit_item)
            .finish_non_exhaustive()
    }
}
