//! Deferred refresh scopes.

use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

use horizon_dataview_core::logging::targets;

use super::CollectionView;
use crate::item::ViewItem;

/// Suppresses automatic refreshes of a view while alive.
///
/// Changing descriptions or filters inside the scope only marks the view
/// as needing a refresh. Scopes nest; dropping the outermost one refreshes
/// the view exactly once. A refresh failure on drop is logged, since `Drop`
/// cannot return it; call
/// [`end_defer_refresh`](CollectionView::end_defer_refresh) directly to
/// observe it.
///
/// The scope dereferences to the view, so the view stays usable through it.
///
/// ```
/// use std::rc::Rc;
/// use horizon_dataview::prelude::*;
///
/// let source = Rc::new(ListSource::new(vec!["b".to_string(), "a".to_string()]));
/// let mut view = ListCollectionView::new(source, ViewOptions::new());
/// {
///     let mut scope = view.defer_refresh();
///     scope.set_sort_descriptions(vec![SortDescription::identity(SortDirection::Ascending)]).unwrap();
///     assert!(scope.needs_refresh());
/// }
/// assert_eq!(view.items(), vec!["a".to_string(), "b".to_string()]);
/// ```
pub struct DeferRefresh<'a, T: ViewItem, V: CollectionView<T> + ?Sized> {
    view: &'a mut V,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T: ViewItem, V: CollectionView<T> + ?Sized> DeferRefresh<'a, T, V> {
    /// Enter a deferred scope on a view.
    pub fn new(view: &'a mut V) -> Self {
        view.begin_defer_refresh();
        Self {
            view,
            _item: PhantomData,
        }
    }
}

impl<T: ViewItem, V: CollectionView<T> + ?Sized> Deref for DeferRefresh<'_, T, V> {
    type Target = V;

    fn deref(&self) -> &V {
        self.view
    }
}

impl<T: ViewItem, V: CollectionView<T> + ?Sized> DerefMut for DeferRefresh<'_, T, V> {
    fn deref_mut(&mut self) -> &mut V {
        self.view
    }
}

impl<T: ViewItem, V: CollectionView<T> + ?Sized> Drop for DeferRefresh<'_, T, V> {
    fn drop(&mut self) {
        if let Err(error) = self.view.end_defer_refresh() {
            tracing::warn!(
                target: targets::VIEW,
                %error,
                "refresh at the end of a deferred scope failed"
            );
        }
    }
}
