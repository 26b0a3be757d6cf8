//! Filter descriptions.

use std::fmt;
use std::rc::Rc;

use crate::culture::Culture;
use crate::item::{PropertyPath, ViewItem};
use crate::value::Value;

type KeyFn<T> = Rc<dyn Fn(&T) -> Value>;
type MatchFn = Rc<dyn Fn(&Value, &Value, &Culture) -> bool>;

enum FilterSource<T> {
    Path(PropertyPath),
    Key(KeyFn<T>),
}

impl<T> Clone for FilterSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(path.clone()),
            Self::Key(key) => Self::Key(key.clone()),
        }
    }
}

/// A filter over one key.
///
/// An item passes when its key matches **any** of the conditions. By
/// default a condition matches when the key's text contains the
/// condition's text, ignoring case. A description without conditions lets
/// everything through.
///
/// # Example
///
/// ```
/// use horizon_dataview::{Culture, FilterDescription, Value};
///
/// let smiths = FilterDescription::<String>::by_key(|name| Value::from(name.as_str()))
///     .with_conditions(vec![Value::from("Smith")]);
///
/// let culture = Culture::invariant();
/// assert!(smiths.passes(&"John Smith".to_string(), &culture));
/// assert!(!smiths.passes(&"Jane Doe".to_string(), &culture));
/// ```
pub struct FilterDescription<T> {
    source: FilterSource<T>,
    conditions: Vec<Value>,
    matcher: Option<MatchFn>,
}

impl<T> Clone for FilterDescription<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            conditions: self.conditions.clone(),
            matcher: self.matcher.clone(),
        }
    }
}

impl<T: ViewItem> FilterDescription<T> {
    fn with_source(source: FilterSource<T>) -> Self {
        Self {
            source,
            conditions: Vec::new(),
            matcher: None,
        }
    }

    /// Filter on a property path.
    pub fn by_path(path: &str) -> Self {
        Self::with_source(FilterSource::Path(PropertyPath::parse(path)))
    }

    /// Filter on a key function.
    pub fn by_key<F>(key: F) -> Self
    where
        F: Fn(&T) -> Value + 'static,
    {
        Self::with_source(FilterSource::Key(Rc::new(key)))
    }

    /// Set the conditions.
    pub fn with_conditions(mut self, conditions: Vec<Value>) -> Self {
        self.conditions = conditions;
        self
    }

    /// Replace the default substring match. The closure receives the item's
    /// key and one condition.
    pub fn with_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Value, &Value, &Culture) -> bool + 'static,
    {
        self.matcher = Some(Rc::new(matcher));
        self
    }

    /// The conditions.
    pub fn conditions(&self) -> &[Value] {
        &self.conditions
    }

    /// The property path, for path-based descriptions.
    pub fn property_path(&self) -> Option<&str> {
        match &self.source {
            FilterSource::Path(path) => Some(path.as_str()),
            FilterSource::Key(_) => None,
        }
    }

    /// Check if an item passes this filter.
    pub fn passes(&self, item: &T, culture: &Culture) -> bool {
        if self.conditions.is_empty() {
            return true;
        }
        let key = match &self.source {
            FilterSource::Path(path) => path.resolve(item),
            FilterSource::Key(key) => key(item),
        };
        self.conditions.iter().any(|condition| match &self.matcher {
            Some(matcher) => matcher(&key, condition, culture),
            None => culture.contains_ignore_case(
                &key.to_display_string(),
                &condition.to_display_string(),
            ),
        })
    }
}

impl<T> fmt::Debug for FilterDescription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            FilterSource::Path(path) => format!("path({})", path.as_str()),
            FilterSource::Key(_) => "key(fn)".to_string(),
        };
        f.debug_struct("FilterDescription")
            .field("source", &source)
            .field("conditions", &self.conditions)
            .field("custom_matcher", &self.matcher.is_some())
            .finish()
    }
}
