//! Grouping, sorting and filtering collection views for data grids.
//!
//! A data grid never reads its items directly. It reads them through a
//! collection view, which layers presentation state over an item source:
//!
//! - **Descriptions**: sort, group and filter rules, by property path or by
//!   key function
//! - **Group Tree**: an arena of groups whose leaves are the rows the grid
//!   shows, kept in step with the source incrementally
//! - **Currency**: a current-item cursor whose moves can be vetoed
//! - **Editing**: add-new, edit and remove transactions written back to the
//!   source
//! - **Data Connection**: the grid's adapter over either a plain source or a
//!   view
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use horizon_dataview::prelude::*;
//! use horizon_dataview::record;
//!
//! let source = Rc::new(ObservableList::new(vec![
//!     record! { "name" => "Ann", "country" => "NO" },
//!     record! { "name" => "Bob", "country" => "SE" },
//!     record! { "name" => "Cid", "country" => "NO" },
//! ]));
//!
//! let mut view = ListCollectionView::new(source.clone(), ViewOptions::new());
//! {
//!     let mut scope = view.defer_refresh();
//!     scope.set_sort_descriptions(vec![SortDescription::by_path("name", SortDirection::Descending)])?;
//!     scope.set_group_descriptions(vec![GroupDescription::by_path("country")])?;
//! }
//! assert_eq!(view.groups().len(), 2);
//! assert_eq!(view.count(), 3);
//!
//! source.push(record! { "name" => "Dee", "country" => "SE" });
//! view.process_source_changes()?;
//! assert_eq!(view.get(2).and_then(|row| row.field("name")), Some(&Value::from("Dee")));
//! # Ok::<(), horizon_dataview::CollectionError>(())
//! ```

pub mod connection;
mod culture;
pub mod description;
mod error;
pub mod group;
mod item;
mod options;
#[cfg(feature = "settings")]
pub mod settings;
mod source;
mod value;
pub mod view;

pub use connection::{DataConnection, DataSource, EditStrategy, ItemShape};
pub use culture::{Culture, StringComparison};
pub use description::{FilterDescription, GroupDescription, GroupKey, SortComparer, SortDescription, SortDirection};
pub use error::{BoxError, CollectionError, Result};
pub use group::{
    AppendComparer, FnComparer, GroupBySelector, GroupChild, GroupId, GroupNode, GroupOrderComparer, GroupRoot,
    GroupTree, GroupTreeDebug, InsertComparer, LeafCursor, Leaves, ListOrderComparer, Removal,
};
pub use item::{EditableObject, PathSegment, PropertyPath, ViewItem};
pub use options::{NewItemFactory, ViewOptions};
#[cfg(feature = "settings")]
pub use settings::ViewSettings;
pub use source::{CollectionChange, ItemSource, ListSource, Lookup, ObservableList, position_in_source};
pub use value::{Value, ValueKind};
pub use view::{
    CollectionView, CollectionViewFactory, CurrentChangingArgs, CurrentPosition, DeferRefresh, EditableCollectionView,
    FilterFn, ListCollectionView, SharedView, ViewSignals, create_view, create_view_with_options,
};

pub use horizon_dataview_core::logging;
pub use horizon_dataview_core::{
    ConnectionGuard, ConnectionId, PerfSpan, Signal, TreeFormatOptions, TreeStyle, Verdict, VetoError, VetoSignal,
};

/// The types most programs need.
pub mod prelude {
    pub use crate::{
        CollectionChange, CollectionError, CollectionView, CurrentPosition, Culture, DataConnection, DataSource,
        EditableCollectionView, FilterDescription, GroupDescription, GroupKey, ItemSource, ListCollectionView,
        ListSource, ObservableList, SortDescription, SortDirection, Value, Verdict, ViewItem, ViewOptions,
    };
}
