//! Collection views.
//!
//! A collection view presents an [`ItemSource`] as a filtered, sorted and
//! grouped sequence of leaves with a current-item cursor. The presentation
//! layer reads it through [`CollectionView`], edits through
//! [`EditableCollectionView`], and observes it through [`ViewSignals`].
//!
//! [`ListCollectionView`] is the default engine. Sources that bring their
//! own view implement [`CollectionViewFactory`]; [`create_view`] picks one
//! or the other.

mod currency;
mod defer;
mod list;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use horizon_dataview_core::logging::targets;
use horizon_dataview_core::{Signal, VetoSignal};

pub use currency::{CurrentChangingArgs, CurrentPosition};
pub use defer::DeferRefresh;
pub use list::{FilterFn, ListCollectionView};

use crate::culture::Culture;
use crate::description::{FilterDescription, GroupDescription, SortDescription};
use crate::error::Result;
use crate::group::{GroupId, GroupTree};
use crate::item::ViewItem;
use crate::options::ViewOptions;
use crate::source::{CollectionChange, ItemSource};

/// Notifications raised by a view.
pub struct ViewSignals<T> {
    /// Leaf-level changes, with indexes in the flattened leaf order.
    pub collection_changed: Signal<CollectionChange<T>>,
    /// Asked before the current item moves. Cancelable requests may be
    /// vetoed.
    pub current_changing: VetoSignal<CurrentChangingArgs>,
    /// Raised after the current item moved.
    pub current_changed: Signal<()>,
}

impl<T: 'static> Default for ViewSignals<T> {
    fn default() -> Self {
        Self {
            collection_changed: Signal::new(),
            current_changing: VetoSignal::new(),
            current_changed: Signal::new(),
        }
    }
}

impl<T> fmt::Debug for ViewSignals<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSignals").finish_non_exhaustive()
    }
}

/// Read access, shaping and navigation of a collection view.
pub trait CollectionView<T: ViewItem> {
    /// The culture used for text comparison.
    fn culture(&self) -> &Culture;

    /// Replace the culture and refresh.
    ///
    /// # Errors
    ///
    /// Fails like [`refresh`](Self::refresh).
    fn set_culture(&mut self, culture: Culture) -> Result<()>;

    /// The underlying source.
    fn source(&self) -> &Rc<dyn ItemSource<T>>;

    /// The view-level filter predicate.
    fn filter(&self) -> Option<&FilterFn<T>>;

    /// Replace the view-level filter predicate and refresh.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](crate::CollectionError::NotSupported) if the view
    /// cannot filter; otherwise fails like [`refresh`](Self::refresh).
    fn set_filter(&mut self, filter: Option<FilterFn<T>>) -> Result<()>;

    /// Filter descriptions; an item must pass all of them.
    fn filter_descriptions(&self) -> &[FilterDescription<T>];

    /// Replace the filter descriptions and refresh.
    ///
    /// # Errors
    ///
    /// As for [`set_filter`](Self::set_filter).
    fn set_filter_descriptions(&mut self, descriptions: Vec<FilterDescription<T>>) -> Result<()>;

    /// Sort descriptions, most significant first.
    fn sort_descriptions(&self) -> &[SortDescription<T>];

    /// Replace the sort descriptions and refresh.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](crate::CollectionError::NotSupported) if the view
    /// cannot sort; otherwise fails like [`refresh`](Self::refresh).
    fn set_sort_descriptions(&mut self, descriptions: Vec<SortDescription<T>>) -> Result<()>;

    /// Group descriptions, outermost first.
    fn group_descriptions(&self) -> &[Rc<GroupDescription<T>>];

    /// Replace the group descriptions and refresh.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](crate::CollectionError::NotSupported) if the view
    /// cannot group; otherwise fails like [`refresh`](Self::refresh).
    fn set_group_descriptions(&mut self, descriptions: Vec<GroupDescription<T>>) -> Result<()>;

    /// Whether sort descriptions may be set.
    fn can_sort(&self) -> bool;

    /// Whether filters may be set.
    fn can_filter(&self) -> bool;

    /// Whether group descriptions may be set.
    fn can_group(&self) -> bool;

    /// Whether the view is grouped.
    fn is_grouping(&self) -> bool {
        !self.group_descriptions().is_empty()
    }

    /// Number of grouping levels.
    fn grouping_depth(&self) -> usize {
        self.group_descriptions().len()
    }

    /// The property path grouped on at `level`, for path-based descriptions.
    fn grouping_property_name_at_depth(&self, level: usize) -> Option<&str> {
        self.group_descriptions()
            .get(level)
            .and_then(|description| description.property_name())
    }

    /// The group tree backing the view.
    fn tree(&self) -> &GroupTree<T>;

    /// Top-level groups. Empty when not grouping.
    fn groups(&self) -> Vec<GroupId> {
        let tree = self.tree();
        tree.subgroups(tree.root()).collect()
    }

    /// Number of leaves.
    fn count(&self) -> usize;

    /// Check if the view has no leaves.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Leaf at `index`.
    fn get(&self, index: usize) -> Option<&T>;

    /// Leaf index of an item.
    fn index_of(&self, item: &T) -> Option<usize>;

    /// Check if an item is a leaf of the view.
    fn contains(&self, item: &T) -> bool {
        self.index_of(item).is_some()
    }

    /// All leaves in order.
    fn items(&self) -> Vec<T> {
        let tree = self.tree();
        tree.leaves(tree.root()).cloned().collect()
    }

    /// Rebuild the view from its source.
    ///
    /// # Errors
    ///
    /// [`InvalidState`](crate::CollectionError::InvalidState) while adding
    /// or editing an item; [`Veto`](crate::CollectionError::Veto) if a
    /// handler canceled the non-cancelable currency change (the refresh
    /// still happened).
    fn refresh(&mut self) -> Result<()>;

    /// Whether a refresh is pending.
    fn needs_refresh(&self) -> bool;

    /// Enter a deferred refresh scope. Pair with
    /// [`end_defer_refresh`](Self::end_defer_refresh).
    fn begin_defer_refresh(&mut self);

    /// Leave a deferred refresh scope, refreshing when leaving the outermost.
    ///
    /// # Errors
    ///
    /// Fails like [`refresh`](Self::refresh).
    fn end_defer_refresh(&mut self) -> Result<()>;

    /// Whether a deferred refresh scope is active.
    fn is_refresh_deferred(&self) -> bool;

    /// Enter a deferred refresh scope ended by dropping the returned guard.
    fn defer_refresh(&mut self) -> DeferRefresh<'_, T, Self>
    where
        Self: Sized,
    {
        DeferRefresh::new(self)
    }

    /// The current item.
    fn current_item(&self) -> Option<&T>;

    /// The cursor position.
    fn current_position(&self) -> CurrentPosition;

    /// Check if the cursor is before the first item.
    fn is_current_before_first(&self) -> bool {
        self.current_position() == CurrentPosition::BeforeFirst
    }

    /// Check if the cursor is after the last item.
    fn is_current_after_last(&self) -> bool {
        self.current_position() == CurrentPosition::AfterLast
    }

    /// Move the cursor to the first item.
    ///
    /// Every `move_current_*` method returns whether the cursor ends up on an
    /// item. A vetoed move leaves the cursor where it was.
    ///
    /// # Errors
    ///
    /// [`InvalidState`](crate::CollectionError::InvalidState) while refresh
    /// is deferred.
    fn move_current_to_first(&mut self) -> Result<bool>;

    /// Move the cursor to the last item.
    ///
    /// # Errors
    ///
    /// As for [`move_current_to_first`](Self::move_current_to_first).
    fn move_current_to_last(&mut self) -> Result<bool>;

    /// Move the cursor one item forward.
    ///
    /// # Errors
    ///
    /// As for [`move_current_to_first`](Self::move_current_to_first).
    fn move_current_to_next(&mut self) -> Result<bool>;

    /// Move the cursor one item back.
    ///
    /// # Errors
    ///
    /// As for [`move_current_to_first`](Self::move_current_to_first).
    fn move_current_to_previous(&mut self) -> Result<bool>;

    /// Move the cursor to a position.
    ///
    /// # Errors
    ///
    /// [`PositionOutOfRange`](crate::CollectionError::PositionOutOfRange)
    /// for an item index past the end; otherwise as for
    /// [`move_current_to_first`](Self::move_current_to_first).
    fn move_current_to_position(&mut self, position: CurrentPosition) -> Result<bool>;

    /// Move the cursor to an item. An item not in the view moves the cursor
    /// before the first item.
    ///
    /// # Errors
    ///
    /// As for [`move_current_to_first`](Self::move_current_to_first).
    fn move_current_to(&mut self, item: &T) -> Result<bool>;

    /// The view's notifications.
    fn signals(&self) -> &ViewSignals<T>;
}

/// Adding, removing and editing items through a view.
///
/// At most one transaction is open at a time: either a new item being added
/// or an existing item being edited.
pub trait EditableCollectionView<T: ViewItem>: CollectionView<T> {
    /// Whether [`add_new`](Self::add_new) is possible.
    fn can_add_new(&self) -> bool;

    /// Create a new item, append it to the source and show it last until it
    /// is committed or canceled. Commits a pending new item first.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](crate::CollectionError::NotSupported) when
    /// [`can_add_new`](Self::can_add_new) is false; source write failures.
    fn add_new(&mut self) -> Result<T>;

    /// Commit the pending new item, moving it to its sorted and grouped
    /// position (or out of the view if filtered out).
    ///
    /// # Errors
    ///
    /// The item's own commit error, unchanged; the item stays pending.
    fn commit_new(&mut self) -> Result<()>;

    /// Discard the pending new item, removing it from the source.
    ///
    /// # Errors
    ///
    /// Source write failures.
    fn cancel_new(&mut self) -> Result<()>;

    /// Whether a new item is pending.
    fn is_adding_new(&self) -> bool {
        self.current_add_item().is_some()
    }

    /// The pending new item.
    fn current_add_item(&self) -> Option<&T>;

    /// Whether items can be removed.
    fn can_remove(&self) -> bool;

    /// Remove the leaf at `index` from the view and the source.
    ///
    /// # Errors
    ///
    /// [`PositionOutOfRange`](crate::CollectionError::PositionOutOfRange),
    /// [`InvalidState`](crate::CollectionError::InvalidState) during a
    /// transaction, or source write failures.
    fn remove_at(&mut self, index: usize) -> Result<()>;

    /// Remove an item from the view and the source. Items not in the view
    /// are ignored.
    ///
    /// # Errors
    ///
    /// As for [`remove_at`](Self::remove_at).
    fn remove(&mut self, item: &T) -> Result<()>;

    /// Begin editing an item. Commits a pending new item or another edit
    /// first.
    ///
    /// # Errors
    ///
    /// Commit errors of the transaction being closed.
    fn edit_item(&mut self, item: &T) -> Result<()>;

    /// Commit the edit, repositioning the item.
    ///
    /// # Errors
    ///
    /// The item's own commit error, unchanged; the edit stays open.
    fn commit_edit(&mut self) -> Result<()>;

    /// Discard the edit.
    ///
    /// # Errors
    ///
    /// [`NotSupported`](crate::CollectionError::NotSupported) when the item
    /// has no edit session.
    fn cancel_edit(&mut self) -> Result<()>;

    /// Whether the current edit can be canceled.
    fn can_cancel_edit(&self) -> bool;

    /// Whether an item is being edited.
    fn is_editing_item(&self) -> bool {
        self.current_edit_item().is_some()
    }

    /// The item being edited.
    fn current_edit_item(&self) -> Option<&T>;
}

/// A view shared between the grid and the application.
pub type SharedView<T> = Rc<RefCell<dyn EditableCollectionView<T>>>;

/// Builds custom views for a source.
pub trait CollectionViewFactory<T> {
    /// Create a view over `source`.
    ///
    /// # Errors
    ///
    /// Whatever the factory reports. [`create_view`] passes it through.
    fn create_view(&self, source: Rc<dyn ItemSource<T>>) -> Result<SharedView<T>>
    where
        T: ViewItem;
}

/// Create the view for a source: the source's own view if it provides a
/// factory, else a [`ListCollectionView`] with default options.
///
/// # Errors
///
/// Errors of the source's factory, unchanged.
pub fn create_view<T: ViewItem>(source: Rc<dyn ItemSource<T>>) -> Result<SharedView<T>> {
    create_view_with_options(source, ViewOptions::default())
}

/// Like [`create_view`], with options for the default view.
///
/// # Errors
///
/// Errors of the source's factory, unchanged.
pub fn create_view_with_options<T: ViewItem>(
    source: Rc<dyn ItemSource<T>>,
    options: ViewOptions<T>,
) -> Result<SharedView<T>> {
    if let Some(factory) = source.view_factory() {
        tracing::debug!(target: targets::VIEW, "using source-provided view factory");
        return factory.create_view(source.clone());
    }
    let view: SharedView<T> = ListCollectionView::new(source, options).into_shared();
    Ok(view)
}
