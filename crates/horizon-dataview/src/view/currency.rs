//! Current-item cursor positions.

/// Where the current-item cursor is, relative to the flattened leaf order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CurrentPosition {
    /// Before the first item. The initial state of an empty view.
    #[default]
    BeforeFirst,
    /// On the item at this leaf index.
    OnItem(usize),
    /// After the last item.
    AfterLast,
}

impl CurrentPosition {
    /// Convert a signed index where `-1` is before the first item and
    /// `count` is after the last.
    pub fn from_index(index: isize, count: usize) -> Self {
        match usize::try_from(index) {
            Err(_) => Self::BeforeFirst,
            Ok(index) if index >= count => Self::AfterLast,
            Ok(index) => Self::OnItem(index),
        }
    }

    /// The signed index form of this position.
    pub fn to_index(self, count: usize) -> isize {
        match self {
            Self::BeforeFirst => -1,
            Self::OnItem(index) => index as isize,
            Self::AfterLast => count as isize,
        }
    }

    /// The leaf index, if the cursor is on an item.
    pub fn index(self) -> Option<usize> {
        match self {
            Self::OnItem(index) => Some(index),
            _ => None,
        }
    }

    /// Check if the cursor is on an item.
    pub fn is_on_item(self) -> bool {
        matches!(self, Self::OnItem(_))
    }

    /// The position one step forward, or `None` when already after the last
    /// item.
    pub fn next(self, count: usize) -> Option<Self> {
        match self {
            Self::AfterLast => None,
            position => Some(Self::from_index(position.to_index(count) + 1, count)),
        }
    }

    /// The position one step back, or `None` when already before the first
    /// item.
    pub fn previous(self, count: usize) -> Option<Self> {
        match self {
            Self::BeforeFirst => None,
            position => Some(Self::from_index(position.to_index(count) - 1, count)),
        }
    }
}

/// Arguments of the current-item changing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentChangingArgs {
    /// Whether handlers may cancel the change.
    pub is_cancelable: bool,
}
