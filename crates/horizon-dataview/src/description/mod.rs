//! Sort, group and filter descriptions.
//!
//! Descriptions are immutable once handed to a view. Changing how a view is
//! shaped means replacing its descriptions, which triggers (or, inside a
//! deferred refresh scope, schedules) a refresh.

mod filter;
mod group;
mod sort;

pub use filter::FilterDescription;
pub use group::{GroupDescription, GroupKey};
pub use sort::{SortComparer, SortDescription, SortDirection};
