//! Error types for collection views.

use horizon_dataview_core::VetoError;

/// Boxed error returned by collaborators such as edit sessions and view
/// factories. Passed through to callers unchanged.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Result type alias for collection view operations.
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Errors that can occur while operating a collection view.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// A handler canceled a non-cancelable currency change.
    #[error(transparent)]
    Veto(#[from] VetoError),

    /// A leaf cursor was advanced after the group tree changed.
    #[error("Group tree was modified; leaf enumeration cannot continue")]
    StaleEnumerator,

    /// The operation is not supported by this view or source.
    #[error("'{operation}' is not supported")]
    NotSupported { operation: &'static str },

    /// The operation is not allowed in the view's current state.
    #[error("'{operation}' is not allowed while {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// A position was outside the allowed range.
    #[error("Position {position} is out of range for a view of {count} items")]
    PositionOutOfRange { position: usize, count: usize },

    /// The source rejected a write.
    #[error("The item source is read-only")]
    ReadOnlySource,

    /// The item is not part of the view or source.
    #[error("Item not found in {location}")]
    ItemNotFound { location: &'static str },

    /// An error raised by a collaborator (edit session, view factory).
    #[error(transparent)]
    Collaborator(BoxError),

    /// Declarative view settings failed to parse.
    #[error("Invalid view settings: {message}")]
    Settings { message: String },
}

impl CollectionError {
    /// Create a not-supported error.
    pub fn not_supported(operation: &'static str) -> Self {
        Self::NotSupported { operation }
    }

    /// Create an invalid-state error.
    pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Create an item-not-found error.
    pub fn item_not_found(location: &'static str) -> Self {
        Self::ItemNotFound { location }
    }

    /// Wrap a collaborator error.
    pub fn collaborator(error: BoxError) -> Self {
        Self::Collaborator(error)
    }

    /// Create a settings error.
    pub fn settings(message: impl Into<String>) -> Self {
        Self::Settings {
            message: message.into(),
        }
    }

    /// Check if this error came from a veto of a non-cancelable change.
    pub fn is_veto(&self) -> bool {
        matches!(self, Self::Veto(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Rejected;

    impl std::fmt::Display for Rejected {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "rejected by validation")
        }
    }

    impl std::error::Error for Rejected {}

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CollectionError::not_supported("sort").to_string(),
            "'sort' is not supported"
        );
        assert_eq!(
            CollectionError::invalid_state("refresh", "adding a new item").to_string(),
            "'refresh' is not allowed while adding a new item"
        );
        assert_eq!(
            CollectionError::PositionOutOfRange { position: 9, count: 3 }.to_string(),
            "Position 9 is out of range for a view of 3 items"
        );
    }

    #[test]
    fn test_veto_conversion() {
        let err: CollectionError = VetoError::NotCancelable.into();
        assert!(err.is_veto());
    }

    #[test]
    fn test_collaborator_is_transparent() {
        let err = CollectionError::collaborator(Box::new(Rejected));
        assert_eq!(err.to_string(), "rejected by validation");
    }
}
