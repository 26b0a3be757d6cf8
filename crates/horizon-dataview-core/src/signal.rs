//! Signal/slot notification for Horizon DataView.
//!
//! Views, sources and connections announce state changes through signals.
//! Everything in a view graph lives on one thread, so signals here are
//! single-threaded: slots are plain `Fn` closures stored in a slot map and
//! invoked synchronously, in connection order, from [`Signal::emit`].
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - Broadcast notification to every connected slot
//! - [`VetoSignal<Args>`] - Two-phase request whose handlers may cancel
//! - [`ConnectionId`] - Identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Reentrancy
//!
//! The connection table is snapshotted before slots run, so a slot may
//! connect or disconnect (itself included) while an emission is in flight.
//! Slots connected during an emission are first called on the next one.
//!
//! # Example
//!
//! ```
//! use horizon_dataview_core::Signal;
//!
//! let count_changed = Signal::<usize>::new();
//! let id = count_changed.connect(|count| println!("count is now {count}"));
//! count_changed.emit(3);
//! count_changed.disconnect(id);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};

use crate::error::VetoError;
use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`]
    /// or [`VetoSignal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Rc<dyn Fn(&Args)>;

/// A single-threaded signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments.
pub struct Signal<Args> {
    connections: RefCell<SlotMap<ConnectionId, Slot<Args>>>,
    blocked: Cell<bool>,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: RefCell::new(SlotMap::with_key()),
            blocked: Cell::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + 'static,
    {
        self.connections.borrow_mut().insert(Rc::new(slot))
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.borrow_mut().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.borrow_mut().clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.borrow().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Slot<Args>> = self.connections.borrow().values().cloned().collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in slots {
            slot(&args);
        }
    }

    /// Connect a slot that disconnects automatically when the guard is dropped.
    ///
    /// The guard only holds a weak reference, so dropping the signal first is fine.
    pub fn connect_scoped<F>(self: &Rc<Self>, slot: F) -> ConnectionGuard
    where
        F: Fn(&Args) + 'static,
    {
        let id = self.connect(slot);
        let weak: Weak<Self> = Rc::downgrade(self);
        ConnectionGuard {
            disconnect: Some(Box::new(move || {
                if let Some(signal) = weak.upgrade() {
                    signal.disconnect(id);
                }
            })),
        }
    }
}

/// Outcome a [`VetoSignal`] handler returns for a proposed change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verdict {
    /// Let the change go ahead.
    #[default]
    Proceed,
    /// Ask for the change to be abandoned.
    Cancel,
}

type VetoHandler<Args> = Rc<dyn Fn(&Args) -> Verdict>;

/// A two-phase signal: handlers are asked before a change happens and may
/// cancel it.
///
/// Requests are either cancelable or not. A [`Verdict::Cancel`] on a
/// cancelable request aborts the change; on a non-cancelable request it is a
/// usage error reported as [`VetoError::NotCancelable`]. Every handler is
/// consulted on every request, even after one of them has canceled.
pub struct VetoSignal<Args> {
    handlers: RefCell<SlotMap<ConnectionId, VetoHandler<Args>>>,
    blocked: Cell<bool>,
}

impl<Args: 'static> Default for VetoSignal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> VetoSignal<Args> {
    /// Create a new veto signal with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(SlotMap::with_key()),
            blocked: Cell::new(false),
        }
    }

    /// Connect a handler.
    pub fn connect<F>(&self, handler: F) -> ConnectionId
    where
        F: Fn(&Args) -> Verdict + 'static,
    {
        self.handlers.borrow_mut().insert(Rc::new(handler))
    }

    /// Disconnect a handler by its connection ID.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.handlers.borrow_mut().remove(id).is_some()
    }

    /// Disconnect all handlers.
    pub fn disconnect_all(&self) {
        self.handlers.borrow_mut().clear();
    }

    /// Get the number of connected handlers.
    pub fn connection_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Block requests temporarily. A blocked signal always answers
    /// [`Verdict::Proceed`].
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.set(blocked);
    }

    /// Check if the signal is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.get()
    }

    /// Ask every handler whether the change may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`VetoError::NotCancelable`] if a handler cancels a request
    /// that was raised with `cancelable == false`.
    #[tracing::instrument(skip_all, level = "trace")]
    pub fn request(&self, args: &Args, cancelable: bool) -> Result<Verdict, VetoError> {
        if self.is_blocked() {
            return Ok(Verdict::Proceed);
        }

        let handlers: Vec<VetoHandler<Args>> = self.handlers.borrow().values().cloned().collect();
        let mut verdict = Verdict::Proceed;
        for handler in handlers {
            if handler(args) == Verdict::Cancel {
                verdict = Verdict::Cancel;
            }
        }

        match (verdict, cancelable) {
            (Verdict::Cancel, false) => {
                tracing::warn!(
                    target: targets::SIGNAL,
                    "handler canceled a non-cancelable request"
                );
                Err(VetoError::NotCancelable)
            }
            (Verdict::Cancel, true) => {
                tracing::trace!(target: targets::SIGNAL, "request canceled");
                Ok(Verdict::Cancel)
            }
            (Verdict::Proceed, _) => Ok(Verdict::Proceed),
        }
    }
}

/// A connection guard that disconnects its slot when dropped.
///
/// Created via [`Signal::connect_scoped`].
///
/// # Example
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use horizon_dataview_core::Signal;
///
/// let signal = Rc::new(Signal::<i32>::new());
/// let total = Rc::new(Cell::new(0));
/// {
///     let total = total.clone();
///     let _guard = signal.connect_scoped(move |&n| total.set(total.get() + n));
///     signal.emit(42);
/// }
/// signal.emit(43);
/// assert_eq!(total.get(), 42);
/// ```
pub struct ConnectionGuard {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl ConnectionGuard {
    /// Keep the connection alive for the rest of the signal's lifetime.
    pub fn forget(mut self) {
        self.disconnect = None;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("armed", &self.disconnect.is_some())
            .finish()
    }
}
