//! Error types for Horizon DataView core primitives.

use std::fmt;

/// Veto negotiation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoError {
    /// A handler canceled a request that was raised as non-cancelable.
    NotCancelable,
}

impl fmt::Display for VetoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotCancelable => {
                write!(f, "Cannot cancel a change that was announced as non-cancelable")
            }
        }
    }
}

impl std::error::Error for VetoError {}
