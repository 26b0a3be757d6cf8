//! Item sources feeding collection views.
//!
//! An [`ItemSource`] is an ordered, indexable collection the view reads
//! from and, when it allows, writes new or removed items back to. Sources
//! that can announce their own changes expose a [`Signal`] of
//! [`CollectionChange`]s; views and data connections subscribe to it.

use std::cell::RefCell;
use std::fmt;

use horizon_dataview_core::Signal;

use crate::error::{CollectionError, Result};
use crate::view::CollectionViewFactory;

/// A change to an ordered collection.
///
/// Raised by change-notifying sources and by views (with indexes in the
/// view's flattened leaf order).
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange<T> {
    /// An item was inserted at `index`.
    Added { index: usize, item: T },
    /// The item previously at `index` was removed.
    Removed { index: usize, item: T },
    /// The item at `index` was replaced.
    Replaced { index: usize, old: T, new: T },
    /// The collection changed too much to describe; re-read everything.
    Reset,
}

impl<T> CollectionChange<T> {
    /// Check if this is a reset notification.
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset)
    }
}

/// Result of asking a source to locate an item natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The item is at this index.
    Found(usize),
    /// The source searched and the item is not present.
    Absent,
    /// The source has no native lookup; callers fall back to a linear scan.
    Unsupported,
}

/// An ordered collection of items.
///
/// Methods take `&self`; writable sources use interior mutability because
/// they are shared between the application, views and data connections.
pub trait ItemSource<T> {
    /// Number of items.
    fn len(&self) -> usize;

    /// Check if the source is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item at `index`.
    fn get(&self, index: usize) -> Option<T>;

    /// All items in order.
    fn snapshot(&self) -> Vec<T>;

    /// Locate an item without a full scan, if the source can.
    fn lookup(&self, item: &T) -> Lookup {
        let _ = item;
        Lookup::Unsupported
    }

    /// Whether writes are rejected.
    fn is_read_only(&self) -> bool {
        true
    }

    /// Whether the number of items is fixed.
    fn is_fixed_size(&self) -> bool {
        false
    }

    /// Insert an item.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::ReadOnlySource`] unless overridden.
    fn insert(&self, index: usize, item: T) -> Result<()> {
        let _ = (index, item);
        Err(CollectionError::ReadOnlySource)
    }

    /// Remove and return the item at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::ReadOnlySource`] unless overridden.
    fn remove_at(&self, index: usize) -> Result<T> {
        let _ = index;
        Err(CollectionError::ReadOnlySource)
    }

    /// Change notifications, if the source raises them.
    fn changes(&self) -> Option<&Signal<CollectionChange<T>>> {
        None
    }

    /// A factory producing a custom view over this source, if it has one.
    fn view_factory(&self) -> Option<&dyn CollectionViewFactory<T>> {
        None
    }
}

/// Find an item's index in a source: native lookup first, then a linear
/// scan returning the first equal item.
pub fn position_in_source<T: PartialEq>(source: &dyn ItemSource<T>, item: &T) -> Option<usize> {
    match source.lookup(item) {
        Lookup::Found(index) => Some(index),
        Lookup::Absent => None,
        Lookup::Unsupported => source.snapshot().iter().position(|candidate| candidate == item),
    }
}

/// A plain list without change notification.
///
/// Views over a `ListSource` only pick up changes on [`refresh`], except for
/// the writes they make themselves.
///
/// [`refresh`]: crate::CollectionView::refresh
pub struct ListSource<T> {
    items: RefCell<Vec<T>>,
    read_only: bool,
}

impl<T: Clone + PartialEq> ListSource<T> {
    /// Create a writable list.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            read_only: false,
        }
    }

    /// Create a list that rejects writes.
    pub fn read_only(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            read_only: true,
        }
    }

    /// Replace an item in place without notification.
    pub fn set(&self, index: usize, item: T) -> Option<T> {
        let mut items = self.items.borrow_mut();
        let slot = items.get_mut(index)?;
        Some(std::mem::replace(slot, item))
    }

    /// Append an item without notification.
    pub fn push(&self, item: T) {
        self.items.borrow_mut().push(item);
    }
}

impl<T: Clone + PartialEq> ItemSource<T> for ListSource<T> {
    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    fn lookup(&self, item: &T) -> Lookup {
        match self.items.borrow().iter().position(|candidate| candidate == item) {
            Some(index) => Lookup::Found(index),
            None => Lookup::Absent,
        }
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn insert(&self, index: usize, item: T) -> Result<()> {
        if self.read_only {
            return Err(CollectionError::ReadOnlySource);
        }
        let mut items = self.items.borrow_mut();
        if index > items.len() {
            return Err(CollectionError::PositionOutOfRange {
                position: index,
                count: items.len(),
            });
        }
        items.insert(index, item);
        Ok(())
    }

    fn remove_at(&self, index: usize) -> Result<T> {
        if self.read_only {
            return Err(CollectionError::ReadOnlySource);
        }
        let mut items = self.items.borrow_mut();
        if index >= items.len() {
            return Err(CollectionError::PositionOutOfRange {
                position: index,
                count: items.len(),
            });
        }
        Ok(items.remove(index))
    }
}

impl<T: fmt::Debug> fmt::Debug for ListSource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSource")
            .field("items", &self.items.borrow())
            .field("read_only", &self.read_only)
            .finish()
    }
}

/// A list that raises [`CollectionChange`] notifications.
///
/// Notifications are emitted after the list has been updated and its
/// internal borrow released, so slots may read the list.
///
/// # Example
///
/// ```
/// use horizon_dataview::{ItemSource, ObservableList};
///
/// let list = ObservableList::new(vec![1i64, 2]);
/// list.push(3);
/// assert_eq!(list.snapshot(), vec![1, 2, 3]);
/// ```
pub struct ObservableList<T> {
    items: RefCell<Vec<T>>,
    changes: Signal<CollectionChange<T>>,
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// Create a list with initial items.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            changes: Signal::new(),
        }
    }

    /// Append an item.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.changes.emit(CollectionChange::Added { index, item });
    }

    /// Remove the first item equal to `item`. Returns whether one was found.
    pub fn remove(&self, item: &T) -> bool {
        let removed = {
            let mut items = self.items.borrow_mut();
            items
                .iter()
                .position(|candidate| candidate == item)
                .map(|index| (index, items.remove(index)))
        };
        match removed {
            Some((index, item)) => {
                self.changes.emit(CollectionChange::Removed { index, item });
                true
            }
            None => false,
        }
    }

    /// Replace the item at `index`, returning the old one.
    pub fn replace(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut items = self.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.changes.emit(CollectionChange::Replaced {
            index,
            old: old.clone(),
            new: item,
        });
        Some(old)
    }

    /// Replace all items, raising a single reset.
    pub fn reset(&self, items: Vec<T>) {
        *self.items.borrow_mut() = items;
        self.changes.emit(CollectionChange::Reset);
    }

    /// Remove all items, raising a single reset.
    pub fn clear(&self) {
        self.reset(Vec::new());
    }

    /// The change signal.
    pub fn changed(&self) -> &Signal<CollectionChange<T>> {
        &self.changes
    }
}

impl<T: Clone + PartialEq + 'static> ItemSource<T> for ObservableList<T> {
    fn len(&self) -> usize {
        self.items.borrow().len()
    }

    fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    fn lookup(&self, item: &T) -> Lookup {
        match self.items.borrow().iter().position(|candidate| candidate == item) {
            Some(index) => Lookup::Found(index),
            None => Lookup::Absent,
        }
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn insert(&self, index: usize, item: T) -> Result<()> {
        {
            let mut items = self.items.borrow_mut();
            if index > items.len() {
                return Err(CollectionError::PositionOutOfRange {
                    position: index,
                    count: items.len(),
                });
            }
            items.insert(index, item.clone());
        }
        self.changes.emit(CollectionChange::Added { index, item });
        Ok(())
    }

    fn remove_at(&self, index: usize) -> Result<T> {
        let item = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return Err(CollectionError::PositionOutOfRange {
                    position: index,
                    count: items.len(),
                });
            }
            items.remove(index)
        };
        self.changes.emit(CollectionChange::Removed {
            index,
            item: item.clone(),
        });
        Ok(item)
    }

    fn changes(&self) -> Option<&Signal<CollectionChange<T>>> {
        Some(&self.changes)
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("items", &self.items.borrow())
            .field("connections", &self.changes.connection_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn record_changes(list: &ObservableList<i64>) -> Rc<RefCell<Vec<CollectionChange<i64>>>> {
        let received = Rc::new(RefCell::new(Vec::new()));
        let received_clone = received.clone();
        list.changed().connect(move |change| {
            received_clone.borrow_mut().push(change.clone());
        });
        received
    }

    #[test]
    fn test_list_source_read_only() {
        let source = ListSource::read_only(vec![1i64, 2]);
        assert!(source.is_read_only());
        assert!(matches!(source.insert(0, 5), Err(CollectionError::ReadOnlySource)));
        assert!(matches!(source.remove_at(0), Err(CollectionError::ReadOnlySource)));
        assert_eq!(source.snapshot(), vec![1, 2]);
    }

    #[test]
    fn test_list_source_writes() {
        let source = ListSource::new(vec![1i64, 2]);
        source.insert(1, 9).unwrap();
        assert_eq!(source.snapshot(), vec![1, 9, 2]);
        assert_eq!(source.remove_at(0).unwrap(), 1);
        assert_eq!(source.lookup(&2), Lookup::Found(1));
        assert_eq!(source.lookup(&7), Lookup::Absent);
        assert!(matches!(
            source.insert(10, 3),
            Err(CollectionError::PositionOutOfRange { position: 10, count: 2 })
        ));
    }

    #[test]
    fn test_observable_list_notifications() {
        let list = ObservableList::new(vec![1i64, 2]);
        let received = record_changes(&list);

        list.push(3);
        assert!(list.remove(&1));
        assert!(!list.remove(&42));
        list.replace(0, 20);
        list.clear();

        assert_eq!(
            *received.borrow(),
            vec![
                CollectionChange::Added { index: 2, item: 3 },
                CollectionChange::Removed { index: 0, item: 1 },
                CollectionChange::Replaced { index: 0, old: 2, new: 20 },
                CollectionChange::Reset,
            ]
        );
        assert!(list.is_empty());
    }

    #[test]
    fn test_observable_list_slot_can_read_list() {
        let list = Rc::new(ObservableList::new(vec![1i64]));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let weak = Rc::downgrade(&list);
        let seen_clone = seen.clone();
        list.changed().connect(move |_| {
            if let Some(list) = weak.upgrade() {
                seen_clone.borrow_mut().push(list.len());
            }
        });

        list.insert(0, 0).unwrap();
        list.remove_at(1).unwrap();
        assert_eq!(*seen.borrow(), vec![2, 1]);
    }

    #[test]
    fn test_position_in_source_falls_back_to_scan() {
        struct ScanOnly(Vec<i64>);

        impl ItemSource<i64> for ScanOnly {
            fn len(&self) -> usize {
                self.0.len()
            }

            fn get(&self, index: usize) -> Option<i64> {
                self.0.get(index).copied()
            }

            fn snapshot(&self) -> Vec<i64> {
                self.0.clone()
            }
        }

        let source = ScanOnly(vec![4, 5, 5]);
        assert_eq!(position_in_source(&source, &5), Some(1));
        assert_eq!(position_in_source(&source, &6), None);
    }
}
