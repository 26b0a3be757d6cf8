//! The grid's link to its data.
//!
//! A [`DataConnection`] wraps whatever the grid was given (a bare item
//! source or a collection view) and answers the questions the grid asks
//! about it: how many rows, which item is at a row, can it be edited,
//! sorted, written. It also routes edit transactions to the right place,
//! decided once when the source is attached:
//!
//! - a rich view handles adding, removing and editing itself
//! - items with an edit session are edited through that session
//! - anything else is edited in place with no transaction
//!
//! Reads stay safe from inside the view's own notification handlers: while
//! the view is mutably borrowed, `count` falls back to the count tracked from
//! its notifications and item lookups report nothing.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use horizon_dataview_core::ConnectionId;
use horizon_dataview_core::logging::targets;

use crate::error::{CollectionError, Result};
use crate::item::{PathSegment, PropertyPath, ViewItem};
use crate::source::{CollectionChange, ItemSource, position_in_source};
use crate::view::{CollectionView, EditableCollectionView, SharedView};

type ChangeQueue<T> = Rc<RefCell<VecDeque<CollectionChange<T>>>>;

/// Called after a change notification has been queued.
pub type ChangeHandler = Rc<dyn Fn()>;

/// What a data connection is attached to.
pub enum DataSource<T: ViewItem> {
    /// A plain item source.
    Items(Rc<dyn ItemSource<T>>),
    /// A collection view.
    View(SharedView<T>),
}

impl<T: ViewItem> Clone for DataSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Items(source) => Self::Items(source.clone()),
            Self::View(view) => Self::View(view.clone()),
        }
    }
}

impl<T: ViewItem> fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Items(_) => f.write_str("DataSource::Items"),
            Self::View(_) => f.write_str("DataSource::View"),
        }
    }
}

/// How edit transactions are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStrategy {
    /// The source is an editable view; delegate to it.
    RichView,
    /// Items carry their own edit session.
    EditableItem,
    /// Edits need no transaction.
    Inert,
}

/// Cached shape of the attached items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemShape {
    /// Property names of the items.
    pub property_names: Vec<String>,
    /// Whether the items are primitives.
    pub is_primitive: bool,
}

/// Connects a grid to its data source.
pub struct DataConnection<T: ViewItem> {
    source: Option<DataSource<T>>,
    strategy: EditStrategy,
    shape: RefCell<Option<ItemShape>>,
    shape_dirty: Rc<Cell<bool>>,
    pending: ChangeQueue<T>,
    suppress: Rc<Cell<bool>>,
    subscription: Option<ConnectionId>,
    on_change: Rc<RefCell<Option<ChangeHandler>>>,
    items: Option<Rc<dyn ItemSource<T>>>,
    row_count: Rc<Cell<usize>>,
    committing_edit: bool,
}

impl<T: ViewItem> Default for DataConnection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ViewItem> DataConnection<T> {
    /// Create a detached connection.
    pub fn new() -> Self {
        Self {
            source: None,
            strategy: EditStrategy::Inert,
            shape: RefCell::new(None),
            shape_dirty: Rc::new(Cell::new(false)),
            pending: Rc::new(RefCell::new(VecDeque::new())),
            suppress: Rc::new(Cell::new(false)),
            subscription: None,
            on_change: Rc::new(RefCell::new(None)),
            items: None,
            row_count: Rc::new(Cell::new(0)),
            committing_edit: false,
        }
    }

    /// Create a connection attached to `source`.
    pub fn with_source(source: DataSource<T>) -> Self {
        let mut connection = Self::new();
        connection.attach(source);
        connection
    }

    /// Attach to a source, detaching from the previous one.
    pub fn attach(&mut self, source: DataSource<T>) {
        self.detach();
        self.strategy = match &source {
            DataSource::View(_) => EditStrategy::RichView,
            DataSource::Items(_) if T::supports_edit_session() => EditStrategy::EditableItem,
            DataSource::Items(_) => EditStrategy::Inert,
        };
        let (items, count) = match &source {
            DataSource::Items(items) => (Some(items.clone()), items.len()),
            DataSource::View(view) => match view.try_borrow() {
                Ok(view) => (Some(view.source().clone()), view.count()),
                Err(_) => (None, 0),
            },
        };
        self.items = items;
        self.row_count.set(count);
        self.source = Some(source);
        self.wire();
        tracing::debug!(
            target: targets::CONNECTION,
            strategy = ?self.strategy,
            events_wired = self.events_wired(),
            "attached data source"
        );
    }

    /// Detach from the current source, returning it.
    pub fn detach(&mut self) -> Option<DataSource<T>> {
        self.unwire();
        self.pending.borrow_mut().clear();
        self.shape.borrow_mut().take();
        self.shape_dirty.set(false);
        self.strategy = EditStrategy::Inert;
        self.items = None;
        self.row_count.set(0);
        self.source.take()
    }

    /// The attached source.
    pub fn data_source(&self) -> Option<&DataSource<T>> {
        self.source.as_ref()
    }

    /// The attached view, if the source is one.
    pub fn view(&self) -> Option<&SharedView<T>> {
        match &self.source {
            Some(DataSource::View(view)) => Some(view),
            _ => None,
        }
    }

    /// How edits are carried out.
    pub fn edit_strategy(&self) -> EditStrategy {
        self.strategy
    }

    /// Whether change notifications of the source are being received.
    pub fn events_wired(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether [`end_edit`](Self::end_edit) is committing into a view.
    pub fn committing_edit(&self) -> bool {
        self.committing_edit
    }

    /// Drain the change notifications received since the last call.
    pub fn take_pending_changes(&self) -> Vec<CollectionChange<T>> {
        self.pending.borrow_mut().drain(..).collect()
    }

    /// Whether change notifications are waiting to be taken.
    pub fn has_pending_changes(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Set a handler run after each notification is queued, so an owner can
    /// apply changes as they arrive. Survives re-attaching.
    pub fn set_change_handler(&self, handler: Option<ChangeHandler>) {
        *self.on_change.borrow_mut() = handler;
    }

    fn wire(&mut self) {
        let pending = self.pending.clone();
        let suppress = self.suppress.clone();
        let dirty = self.shape_dirty.clone();
        let row_count = self.row_count.clone();
        let on_change = self.on_change.clone();
        let slot = move |change: &CollectionChange<T>| {
            if suppress.get() {
                return;
            }
            match change {
                CollectionChange::Added { .. } => row_count.set(row_count.get() + 1),
                CollectionChange::Removed { .. } => row_count.set(row_count.get().saturating_sub(1)),
                CollectionChange::Replaced { .. } => {}
                CollectionChange::Reset => dirty.set(true),
            }
            pending.borrow_mut().push_back(change.clone());
            let handler = on_change.borrow().clone();
            if let Some(handler) = handler {
                handler();
            }
        };

        self.subscription = match &self.source {
            Some(DataSource::Items(source)) => source.changes().map(|changes| changes.connect(slot)),
            Some(DataSource::View(view)) => match view.try_borrow() {
                Ok(view) => Some(view.signals().collection_changed.connect(slot)),
                Err(_) => {
                    tracing::warn!(target: targets::CONNECTION, "view is borrowed; not wired");
                    None
                }
            },
            None => None,
        };
    }

    fn unwire(&mut self) {
        let Some(id) = self.subscription.take() else {
            return;
        };
        match &self.source {
            Some(DataSource::Items(source)) => {
                if let Some(changes) = source.changes() {
                    changes.disconnect(id);
                }
            }
            Some(DataSource::View(view)) => match view.try_borrow() {
                Ok(view) => {
                    view.signals().collection_changed.disconnect(id);
                }
                Err(_) => {
                    tracing::warn!(target: targets::CONNECTION, "view is borrowed; slot left connected");
                }
            },
            None => {}
        }
    }

    fn with_suppressed<R>(&self, write: impl FnOnce() -> R) -> R {
        let previous = self.suppress.replace(true);
        let result = write();
        self.suppress.set(previous);
        result
    }

    /// Write to the attached item source without queueing the notifications
    /// the write raises.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](CollectionError::NotSupported) unless attached to a
    /// plain item source; errors of `write`.
    pub fn write_suppressed<R>(&self, write: impl FnOnce(&dyn ItemSource<T>) -> Result<R>) -> Result<R> {
        match &self.source {
            Some(DataSource::Items(source)) => self.with_suppressed(|| write(&**source)),
            _ => Err(CollectionError::not_supported("write_suppressed")),
        }
    }

    /// Number of rows.
    ///
    /// While the view is mutably borrowed this is the count tracked from its
    /// notifications.
    pub fn count(&self) -> usize {
        match &self.source {
            Some(DataSource::Items(source)) => source.len(),
            Some(DataSource::View(view)) => match view.try_borrow() {
                Ok(view) => {
                    let count = view.count();
                    self.row_count.set(count);
                    count
                }
                Err(_) => self.row_count.get(),
            },
            None => 0,
        }
    }

    /// Whether there is at least one row.
    pub fn any(&self) -> bool {
        self.count() > 0
    }

    /// The item at a row. `None` while the view is mutably borrowed.
    pub fn get(&self, index: usize) -> Option<T> {
        match &self.source {
            Some(DataSource::Items(source)) => source.get(index),
            Some(DataSource::View(view)) => match view.try_borrow() {
                Ok(view) => view.get(index).cloned(),
                Err(_) => {
                    tracing::trace!(target: targets::CONNECTION, index, "view is busy; no item");
                    None
                }
            },
            None => None,
        }
    }

    /// Row of an item: the view's leaf index, or the source position.
    /// `None` while the view is mutably borrowed.
    pub fn index_of(&self, item: &T) -> Option<usize> {
        match &self.source {
            Some(DataSource::Items(source)) => position_in_source(&**source, item),
            Some(DataSource::View(view)) => view.try_borrow().ok()?.index_of(item),
            None => None,
        }
    }

    fn underlying_source(&self) -> Option<&Rc<dyn ItemSource<T>>> {
        self.items.as_ref()
    }

    /// Whether the underlying source rejects writes.
    pub fn is_read_only(&self) -> bool {
        self.underlying_source()
            .is_none_or(|source| source.is_read_only())
    }

    /// Whether cells may be edited. True when nothing is attached.
    pub fn allow_edit(&self) -> bool {
        self.underlying_source()
            .is_none_or(|source| !source.is_read_only())
    }

    /// Whether the grid may sort: only through a view that can sort and has
    /// no transaction open.
    pub fn allow_sort(&self) -> bool {
        let Some(Ok(view)) = self.view().map(|view| view.try_borrow()) else {
            return false;
        };
        view.can_sort() && !view.is_adding_new() && !view.is_editing_item()
    }

    /// Whether the items are primitives.
    pub fn data_is_primitive(&self) -> bool {
        T::is_primitive()
    }

    /// The cached item shape, computed on first use and after a reset.
    pub fn shape(&self) -> ItemShape {
        if self.shape_dirty.replace(false) {
            self.shape.borrow_mut().take();
        }
        self.shape
            .borrow_mut()
            .get_or_insert_with(|| self.compute_shape())
            .clone()
    }

    fn compute_shape(&self) -> ItemShape {
        let is_primitive = T::is_primitive();
        let property_names = match (is_primitive, self.get(0)) {
            (false, Some(item)) => item.property_names(),
            _ => Vec::new(),
        };
        tracing::trace!(
            target: targets::CONNECTION,
            properties = property_names.len(),
            is_primitive,
            "computed item shape"
        );
        ItemShape {
            property_names,
            is_primitive,
        }
    }

    /// Property names of the items.
    pub fn property_names(&self) -> Vec<String> {
        self.shape().property_names
    }

    /// Whether the property at `path` is read-only.
    ///
    /// An empty path asks about the items themselves. Unknown properties
    /// are read-only.
    pub fn property_is_read_only(&self, path: &str) -> bool {
        if !self.allow_edit() {
            return true;
        }
        let path = PropertyPath::parse(path);
        if path.is_self() {
            return false;
        }
        if !path.is_valid() {
            return true;
        }
        match path.segments().first() {
            Some(PathSegment::Field(name)) => !self.shape().property_names.contains(name),
            _ => true,
        }
    }

    /// Start editing an item. Returns whether editing started.
    ///
    /// # Errors
    ///
    /// Errors of the view closing a previous transaction.
    pub fn begin_edit(&self, item: &T) -> Result<bool> {
        match self.strategy {
            EditStrategy::RichView => {
                let Some(view) = self.view() else {
                    return Ok(false);
                };
                let mut view = view.try_borrow_mut().map_err(|_| view_busy("begin_edit"))?;
                if view.current_edit_item() == Some(item) {
                    return Ok(true);
                }
                view.edit_item(item)?;
                Ok(view.is_editing_item() || view.is_adding_new())
            }
            EditStrategy::EditableItem => {
                if let Some(session) = item.edit_session() {
                    session.begin_edit();
                }
                Ok(true)
            }
            EditStrategy::Inert => Ok(true),
        }
    }

    /// Commit the edit of an item, or the pending new item of a view.
    ///
    /// # Errors
    ///
    /// The commit error of the view or edit session, unchanged.
    pub fn end_edit(&mut self, item: &T) -> Result<bool> {
        match self.strategy {
            EditStrategy::RichView => {
                let Some(view) = self.view().cloned() else {
                    return Ok(false);
                };
                self.committing_edit = true;
                let result = match view.try_borrow_mut() {
                    Ok(mut view) if view.is_adding_new() => view.commit_new(),
                    Ok(mut view) => view.commit_edit(),
                    Err(_) => Err(view_busy("end_edit")),
                };
                self.committing_edit = false;
                result?;
                Ok(true)
            }
            EditStrategy::EditableItem => {
                if let Some(session) = item.edit_session() {
                    session.end_edit().map_err(CollectionError::collaborator)?;
                }
                Ok(true)
            }
            EditStrategy::Inert => Ok(true),
        }
    }

    /// Cancel the edit of an item. Returns whether a cancel was carried out.
    ///
    /// # Errors
    ///
    /// Errors of the view canceling the edit.
    pub fn cancel_edit(&self, item: &T) -> Result<bool> {
        match self.strategy {
            EditStrategy::RichView => {
                let Some(view) = self.view() else {
                    return Ok(false);
                };
                let mut view = view.try_borrow_mut().map_err(|_| view_busy("cancel_edit"))?;
                if !view.can_cancel_edit() {
                    return Ok(false);
                }
                view.cancel_edit()?;
                Ok(true)
            }
            EditStrategy::EditableItem => {
                if let Some(session) = item.edit_session() {
                    session.cancel_edit();
                }
                Ok(true)
            }
            EditStrategy::Inert => Ok(true),
        }
    }

    /// Add a new item through the view.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](CollectionError::NotSupported) without a view;
    /// errors of the view's `add_new`.
    pub fn add_new(&self) -> Result<T> {
        let view = self
            .view()
            .ok_or_else(|| CollectionError::not_supported("add_new"))?;
        let mut view = view.try_borrow_mut().map_err(|_| view_busy("add_new"))?;
        view.add_new()
    }

    /// Remove an item. Returns the source index it was removed from when
    /// writing to a plain source; the removal itself is not queued as a
    /// pending change.
    ///
    /// # Errors
    ///
    /// [`ItemNotFound`](CollectionError::ItemNotFound) for items missing
    /// from a plain source; source and view write errors.
    pub fn remove(&self, item: &T) -> Result<Option<usize>> {
        match &self.source {
            Some(DataSource::Items(source)) => {
                let index = position_in_source(&**source, item)
                    .ok_or_else(|| CollectionError::item_not_found("source"))?;
                self.with_suppressed(|| source.remove_at(index))?;
                Ok(Some(index))
            }
            Some(DataSource::View(view)) => {
                view.try_borrow_mut().map_err(|_| view_busy("remove"))?.remove(item)?;
                Ok(None)
            }
            None => Err(CollectionError::not_supported("remove")),
        }
    }

    /// Move the view's cursor to an item. Returns whether the cursor is on
    /// an item; always `false` without a view.
    ///
    /// # Errors
    ///
    /// Errors of the view's navigation.
    pub fn move_current_to(&self, item: &T) -> Result<bool> {
        match self.view() {
            Some(view) => view
                .try_borrow_mut()
                .map_err(|_| view_busy("move_current_to"))?
                .move_current_to(item),
            None => Ok(false),
        }
    }
}

fn view_busy(operation: &'static str) -> CollectionError {
    CollectionError::invalid_state(operation, "the view is busy")
}

impl<T: ViewItem> Drop for DataConnection<T> {
    fn drop(&mut self) {
        self.unwire();
    }
}

impl<T: ViewItem> fmt::Debug for DataConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataConnection")
            .field("source", &self.source)
            .field("strategy", &self.strategy)
            .field("events_wired", &self.events_wired())
            .field("pending", &self.pending.borrow().len())
            .field("committing_edit", &self.committing_edit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::source::{ListSource, ObservableList};
    use crate::value::Value;
    use crate::view::{ListCollectionView, create_view};
    use crate::{EditableCollectionView, ViewOptions};

    #[test]
    fn test_strategy_detection() {
        let items: Rc<dyn ItemSource<i64>> = Rc::new(ListSource::new(vec![1, 2]));
        let connection = DataConnection::with_source(DataSource::Items(items.clone()));
        assert_eq!(connection.edit_strategy(), EditStrategy::Inert);

        let view = create_view(items).unwrap();
        let connection = DataConnection::with_source(DataSource::View(view));
        assert_eq!(connection.edit_strategy(), EditStrategy::RichView);
    }

    #[test]
    fn test_wiring_is_symmetric() {
        let list = Rc::new(ObservableList::new(vec![1i64]));
        let mut connection = DataConnection::with_source(DataSource::Items(list.clone()));
        assert!(connection.events_wired());
        assert_eq!(list.changed().connection_count(), 1);

        list.push(2);
        assert_eq!(
            connection.take_pending_changes(),
            vec![CollectionChange::Added { index: 1, item: 2 }]
        );

        connection.detach();
        assert!(!connection.events_wired());
        assert_eq!(list.changed().connection_count(), 0);

        let plain: Rc<dyn ItemSource<i64>> = Rc::new(ListSource::new(vec![1]));
        connection.attach(DataSource::Items(plain));
        assert!(!connection.events_wired());
    }

    #[test]
    fn test_drop_unwires() {
        let list = Rc::new(ObservableList::new(vec![1i64]));
        {
            let _connection = DataConnection::with_source(DataSource::Items(list.clone()));
            assert_eq!(list.changed().connection_count(), 1);
        }
        assert_eq!(list.changed().connection_count(), 0);
    }

    #[test]
    fn test_index_of_and_counts() {
        let items: Rc<dyn ItemSource<i64>> = Rc::new(ListSource::new(vec![5, 6, 5]));
        let connection = DataConnection::with_source(DataSource::Items(items));
        assert_eq!(connection.count(), 3);
        assert!(connection.any());
        assert_eq!(connection.get(1), Some(6));
        assert_eq!(connection.index_of(&5), Some(0));
        assert_eq!(connection.index_of(&9), None);

        let empty = DataConnection::<i64>::new();
        assert!(!empty.any());
        assert!(empty.allow_edit());
        assert!(empty.is_read_only());
    }

    #[test]
    fn test_shape_is_cached_until_reset() {
        let list = Rc::new(ObservableList::new(vec![record! { "name" => "Ann", "age" => 30 }]));
        let connection = DataConnection::with_source(DataSource::Items(list.clone()));
        assert_eq!(connection.property_names(), vec!["age", "name"]);
        assert!(!connection.data_is_primitive());

        list.push(record! { "title" => "x" });
        list.remove_at(0).unwrap();
        assert_eq!(connection.property_names(), vec!["age", "name"]);

        list.reset(vec![record! { "title" => "x" }]);
        assert_eq!(connection.property_names(), vec!["title"]);
        assert!(connection.property_is_read_only("name"));
        assert!(!connection.property_is_read_only("title"));
        assert!(!connection.property_is_read_only(""));
    }

    #[test]
    fn test_read_only_source() {
        let items: Rc<dyn ItemSource<Value>> =
            Rc::new(ListSource::read_only(vec![record! { "name" => "Ann" }]));
        let connection = DataConnection::with_source(DataSource::Items(items));
        assert!(connection.is_read_only());
        assert!(!connection.allow_edit());
        assert!(connection.property_is_read_only("name"));
    }

    #[test]
    fn test_rich_view_edit_routing() {
        let list = Rc::new(ObservableList::new(vec![1i64, 2]));
        let view = ListCollectionView::new(list.clone(), ViewOptions::new().new_item_factory(|| 9)).into_shared();
        let shared: SharedView<i64> = view.clone();
        let mut connection = DataConnection::with_source(DataSource::View(shared));
        assert!(connection.allow_sort());

        assert!(connection.begin_edit(&2).unwrap());
        assert!(!connection.allow_sort());
        assert!(connection.end_edit(&2).unwrap());
        assert!(!connection.committing_edit());
        assert!(connection.allow_sort());

        assert_eq!(connection.add_new().unwrap(), 9);
        assert!(view.borrow().is_adding_new());
        assert!(connection.end_edit(&9).unwrap());
        assert!(!view.borrow().is_adding_new());
        assert_eq!(list.snapshot(), vec![1, 2, 9]);

        connection.remove(&1).unwrap();
        assert_eq!(connection.count(), 2);
        assert_eq!(connection.get(0), Some(2));
        assert!(connection.move_current_to(&9).unwrap());
    }

    #[test]
    fn test_reads_from_inside_view_notifications() {
        let list = Rc::new(ObservableList::new(vec![1i64, 2]));
        let view = create_view(list.clone()).unwrap();
        let connection = Rc::new(DataConnection::with_source(DataSource::View(view.clone())));

        let seen = Rc::new(RefCell::new(Vec::new()));
        let grid = Rc::downgrade(&connection);
        let log = seen.clone();
        view.borrow().signals().collection_changed.connect(move |_: &CollectionChange<i64>| {
            if let Some(connection) = grid.upgrade() {
                log.borrow_mut().push((
                    connection.count(),
                    connection.get(0),
                    connection.index_of(&1),
                    connection.allow_sort(),
                    connection.begin_edit(&1).is_err(),
                ));
            }
        });

        list.push(3);
        assert_eq!(*seen.borrow(), vec![(3, None, None, false, true)]);
        assert!(!connection.is_read_only());

        assert_eq!(connection.count(), 3);
        assert_eq!(connection.get(2), Some(3));
        assert_eq!(connection.index_of(&1), Some(0));
        assert!(connection.allow_sort());
    }

    #[test]
    fn test_change_handler_runs_after_queueing() {
        let list = Rc::new(ObservableList::new(vec![1i64]));
        let connection = Rc::new(DataConnection::with_source(DataSource::Items(list.clone())));
        let drained = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&connection);
        let sink = drained.clone();
        connection.set_change_handler(Some(Rc::new(move || {
            if let Some(connection) = weak.upgrade() {
                sink.borrow_mut().extend(connection.take_pending_changes());
            }
        })));

        list.push(2);
        assert_eq!(*drained.borrow(), vec![CollectionChange::Added { index: 1, item: 2 }]);
        assert!(!connection.has_pending_changes());

        connection
            .write_suppressed(|source| source.insert(0, 0))
            .unwrap();
        assert_eq!(drained.borrow().len(), 1);
        assert_eq!(list.snapshot(), vec![0, 1, 2]);
    }

    #[test]
    fn test_suppressed_write_needs_item_source() {
        let list = Rc::new(ObservableList::new(vec![1i64]));
        let view = create_view(list).unwrap();
        let connection = DataConnection::with_source(DataSource::View(view));
        assert!(matches!(
            connection.write_suppressed(|source| source.remove_at(0)),
            Err(CollectionError::NotSupported { operation: "write_suppressed" })
        ));
    }

    #[test]
    fn test_plain_remove_is_not_queued() {
        let list = Rc::new(ObservableList::new(vec![1i64, 2, 3]));
        let connection = DataConnection::with_source(DataSource::Items(list.clone()));
        assert_eq!(connection.remove(&2).unwrap(), Some(1));
        assert!(connection.take_pending_changes().is_empty());
        assert_eq!(list.snapshot(), vec![1, 3]);
        assert!(matches!(
            connection.remove(&7),
            Err(CollectionError::ItemNotFound { .. })
        ));
        assert!(matches!(connection.add_new(), Err(CollectionError::NotSupported { .. })));
    }
}
