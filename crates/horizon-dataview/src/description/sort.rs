//! Sort descriptions.

use std::cell::OnceCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use horizon_dataview_core::logging::targets;

use crate::culture::Culture;
use crate::group::InsertComparer;
use crate::item::{PropertyPath, ViewItem};
use crate::value::{Value, ValueKind};

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "settings", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "settings", serde(rename_all = "snake_case"))]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

type KeyFn<T> = Rc<dyn Fn(&T) -> Value>;
type CompareFn<T> = Rc<dyn Fn(&T, &T) -> Ordering>;

enum SortKey<T> {
    Path(PropertyPath),
    Key(KeyFn<T>),
    Identity,
    Comparer(CompareFn<T>),
}

impl<T> Clone for SortKey<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(path.clone()),
            Self::Key(key) => Self::Key(key.clone()),
            Self::Identity => Self::Identity,
            Self::Comparer(comparer) => Self::Comparer(comparer.clone()),
        }
    }
}

/// How key values are compared, decided from the first non-null key seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyComparer {
    /// Keys of different kinds order by kind; text collates by culture.
    Ordered,
    /// Keys of this kind have no order; every pair compares equal.
    NoOp,
}

impl KeyComparer {
    fn for_kind(kind: ValueKind) -> Self {
        if kind.is_ordered() { Self::Ordered } else { Self::NoOp }
    }
}

// Position of a kind when keys of different kinds meet.
fn kind_rank(kind: ValueKind) -> u8 {
    match kind {
        ValueKind::None => 0,
        ValueKind::Bool => 1,
        ValueKind::Number => 2,
        ValueKind::Text => 3,
        ValueKind::DateTime => 4,
        ValueKind::List => 5,
        ValueKind::Record => 6,
    }
}

/// One level of sorting.
///
/// The key is either a property path (for dynamic items), a key function,
/// the item itself, or a full custom comparer. For key-based descriptions
/// `None` sorts before every value, and the comparer is picked once from the
/// kind of the first non-null key and then reused, including by descriptions
/// derived with [`switch_direction`](Self::switch_direction).
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use horizon_dataview::{Culture, SortDescription, SortDirection};
///
/// let by_value = SortDescription::<String>::identity(SortDirection::Ascending);
/// let culture = Culture::invariant();
/// assert_eq!(by_value.compare(&"a".into(), &"b".into(), &culture), Ordering::Less);
/// assert_eq!(
///     by_value.switch_direction().compare(&"a".into(), &"b".into(), &culture),
///     Ordering::Greater
/// );
/// ```
pub struct SortDescription<T> {
    key: SortKey<T>,
    direction: SortDirection,
    resolved: Rc<OnceCell<KeyComparer>>,
}

impl<T> Clone for SortDescription<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            direction: self.direction,
            resolved: self.resolved.clone(),
        }
    }
}

impl<T: ViewItem> SortDescription<T> {
    fn with_key(key: SortKey<T>, direction: SortDirection) -> Self {
        Self {
            key,
            direction,
            resolved: Rc::new(OnceCell::new()),
        }
    }

    /// Sort by a property path such as `"name"` or `"address.city"`.
    pub fn by_path(path: &str, direction: SortDirection) -> Self {
        Self::with_key(SortKey::Path(PropertyPath::parse(path)), direction)
    }

    /// Sort by a key function.
    pub fn by_key<F>(key: F, direction: SortDirection) -> Self
    where
        F: Fn(&T) -> Value + 'static,
    {
        Self::with_key(SortKey::Key(Rc::new(key)), direction)
    }

    /// Sort by the items' own values.
    pub fn identity(direction: SortDirection) -> Self {
        Self::with_key(SortKey::Identity, direction)
    }

    /// Sort with a custom comparer. The direction still applies.
    pub fn by_comparer<F>(comparer: F, direction: SortDirection) -> Self
    where
        F: Fn(&T, &T) -> Ordering + 'static,
    {
        Self::with_key(SortKey::Comparer(Rc::new(comparer)), direction)
    }

    /// The sort direction.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// The property path, for path-based descriptions.
    pub fn property_path(&self) -> Option<&str> {
        match &self.key {
            SortKey::Path(path) => Some(path.as_str()),
            _ => None,
        }
    }

    /// Whether this description uses a custom comparer.
    pub fn has_custom_comparer(&self) -> bool {
        matches!(self.key, SortKey::Comparer(_))
    }

    /// A description with the opposite direction sharing this one's
    /// resolved comparer.
    pub fn switch_direction(&self) -> Self {
        Self {
            key: self.key.clone(),
            direction: self.direction.reversed(),
            resolved: self.resolved.clone(),
        }
    }

    /// The sort key of an item. Custom comparers have no key.
    pub fn key_of(&self, item: &T) -> Value {
        match &self.key {
            SortKey::Path(path) => path.resolve(item),
            SortKey::Key(key) => key(item),
            SortKey::Identity => item.to_value(),
            SortKey::Comparer(_) => Value::None,
        }
    }

    /// Compare two items.
    pub fn compare(&self, a: &T, b: &T, culture: &Culture) -> Ordering {
        let ordering = match &self.key {
            SortKey::Comparer(comparer) => comparer(a, b),
            _ => self.compare_keys(&self.key_of(a), &self.key_of(b), culture),
        };
        self.direction.apply(ordering)
    }

    fn compare_keys(&self, a: &Value, b: &Value, culture: &Culture) -> Ordering {
        match (a.is_none(), b.is_none()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        let comparer = *self.resolved.get_or_init(|| {
            let comparer = KeyComparer::for_kind(a.kind());
            if comparer == KeyComparer::NoOp {
                tracing::warn!(
                    target: targets::DESCRIPTION,
                    kind = ?a.kind(),
                    path = self.property_path().unwrap_or(""),
                    "sort key has no natural order; items keep their relative order"
                );
            }
            comparer
        });

        match comparer {
            KeyComparer::Ordered => kind_rank(a.kind())
                .cmp(&kind_rank(b.kind()))
                .then_with(|| match (a.as_str(), b.as_str()) {
                    (Some(a), Some(b)) => culture.compare(a, b),
                    _ => a.natural_cmp(b).unwrap_or(Ordering::Equal),
                }),
            KeyComparer::NoOp => Ordering::Equal,
        }
    }
}

impl<T> fmt::Debug for SortDescription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match &self.key {
            SortKey::Path(path) => format!("path({})", path.as_str()),
            SortKey::Key(_) => "key(fn)".to_string(),
            SortKey::Identity => "identity".to_string(),
            SortKey::Comparer(_) => "comparer(fn)".to_string(),
        };
        f.debug_struct("SortDescription")
            .field("key", &key)
            .field("direction", &self.direction)
            .field("resolved", &self.resolved.get())
            .finish()
    }
}

/// Chains sort descriptions: ties on one level fall through to the next.
pub struct SortComparer<'a, T> {
    descriptions: &'a [SortDescription<T>],
    culture: &'a Culture,
}

impl<'a, T: ViewItem> SortComparer<'a, T> {
    /// Create a comparer over the given descriptions.
    pub fn new(descriptions: &'a [SortDescription<T>], culture: &'a Culture) -> Self {
        Self {
            descriptions,
            culture,
        }
    }

    /// Whether there is anything to sort by.
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Compare two items across all levels.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.descriptions
            .iter()
            .map(|description| description.compare(a, b, self.culture))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Stable sort of a slice.
    pub fn sort(&self, items: &mut [T]) {
        if !self.is_empty() {
            items.sort_by(|a, b| self.compare(a, b));
        }
    }
}

impl<T: ViewItem> InsertComparer<T> for SortComparer<'_, T> {
    fn compare(&mut self, a: &T, b: &T) -> Ordering {
        SortComparer::compare(self, a, b)
    }
}
