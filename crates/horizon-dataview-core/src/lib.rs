//! Core primitives for Horizon DataView.
//!
//! This crate provides the building blocks the collection view engine is
//! wired together with:
//!
//! - **Signal/Slot System**: Single-threaded change notification
//! - **Veto Negotiation**: Two-phase requests that handlers may cancel
//! - **Logging**: Tracing targets, perf spans and tree formatting options
//!
//! # Veto Example
//!
//! ```
//! use horizon_dataview_core::{Verdict, VetoError, VetoSignal};
//!
//! let changing = VetoSignal::<()>::new();
//! changing.connect(|_| Verdict::Cancel);
//!
//! assert_eq!(changing.request(&(), true), Ok(Verdict::Cancel));
//! assert_eq!(changing.request(&(), false), Err(VetoError::NotCancelable));
//! ```

mod error;
pub mod logging;
pub mod signal;

pub use error::VetoError;
pub use logging::{PerfSpan, TreeFormatOptions, TreeStyle};
pub use signal::{ConnectionGuard, ConnectionId, Signal, Verdict, VetoSignal};

// Signals are bound to the thread that created them.
static_assertions::assert_not_impl_any!(Signal<()>: Send, Sync);
static_assertions::assert_not_impl_any!(VetoSignal<()>: Send, Sync);
