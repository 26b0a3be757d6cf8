//! Group node tree and grouping driver.
//!
//! [`GroupTree`] is the storage: an arena of group nodes with leaf and full
//! counts kept in step with every mutation. [`GroupRoot`] decides which
//! group an item belongs to. The comparers in this module place new
//! children during incremental maintenance.

mod compare;
mod debug;
mod root;
mod tree;

pub use compare::{AppendComparer, FnComparer, GroupOrderComparer, InsertComparer, ListOrderComparer};
pub use debug::GroupTreeDebug;
pub use root::{GroupBySelector, GroupRoot};
pub use tree::{GroupChild, GroupId, GroupNode, GroupTree, LeafCursor, Leaves, Removal};
