//! Group descriptions.

use std::fmt;
use std::rc::Rc;

use crate::culture::{Culture, StringComparison};
use crate::item::{PropertyPath, ViewItem};
use crate::value::Value;

/// The key identifying a group.
///
/// Keys are usually values resolved from the items. An item whose key
/// resolves to `None` becomes its own group key.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey<T> {
    /// A resolved value.
    Value(Value),
    /// The item itself.
    Item(T),
}

impl<T: ViewItem> GroupKey<T> {
    /// The key as a value. Item keys use the item's own value.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Item(item) => item.to_value(),
        }
    }

    /// The key rendered for display.
    pub fn display(&self) -> String {
        self.to_value().to_display_string()
    }
}

impl<T> From<Value> for GroupKey<T> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<T> From<&str> for GroupKey<T> {
    fn from(name: &str) -> Self {
        Self::Value(Value::from(name))
    }
}

type KeyFn<T> = Rc<dyn Fn(&T) -> Value>;
type ConverterFn = Rc<dyn Fn(Value, usize, &Culture) -> Value>;

enum GroupSource<T> {
    Path(PropertyPath),
    Key(KeyFn<T>),
}

impl<T> Clone for GroupSource<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Path(path) => Self::Path(path.clone()),
            Self::Key(key) => Self::Key(key.clone()),
        }
    }
}

/// One level of grouping.
///
/// Resolves a key for every item. A key that resolves to a
/// [`Value::List`] puts the item into one group per element. Explicit
/// [`group_keys`](Self::group_keys) are created up front, kept in the given
/// order before any discovered groups, and never pruned when empty.
///
/// # Example
///
/// ```
/// use horizon_dataview::{Culture, GroupDescription, GroupKey, Value};
///
/// let parity = GroupDescription::<i64>::by_key(|n| Value::from(if n % 2 == 0 { "even" } else { "odd" }))
///     .with_group_keys(vec!["even".into(), "odd".into()]);
///
/// let culture = Culture::invariant();
/// assert_eq!(parity.group_key_from_item(&3, 0, &culture), GroupKey::Value(Value::from("odd")));
/// assert_eq!(parity.group_keys().len(), 2);
/// ```
pub struct GroupDescription<T> {
    source: GroupSource<T>,
    converter: Option<ConverterFn>,
    group_keys: Vec<GroupKey<T>>,
    string_comparison: StringComparison,
}

impl<T: Clone> Clone for GroupDescription<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            converter: self.converter.clone(),
            group_keys: self.group_keys.clone(),
            string_comparison: self.string_comparison,
        }
    }
}

impl<T> GroupDescription<T> {
    /// The explicit groups.
    pub fn group_keys(&self) -> &[GroupKey<T>] {
        &self.group_keys
    }

    /// How text keys are matched.
    pub fn string_comparison(&self) -> StringComparison {
        self.string_comparison
    }

    /// The property path, for path-based descriptions.
    pub fn property_name(&self) -> Option<&str> {
        match &self.source {
            GroupSource::Path(path) => Some(path.as_str()),
            GroupSource::Key(_) => None,
        }
    }
}

impl<T: ViewItem> GroupDescription<T> {
    fn with_source(source: GroupSource<T>) -> Self {
        Self {
            source,
            converter: None,
            group_keys: Vec::new(),
            string_comparison: StringComparison::default(),
        }
    }

    /// Group by a property path.
    pub fn by_path(path: &str) -> Self {
        Self::with_source(GroupSource::Path(PropertyPath::parse(path)))
    }

    /// Group by a key function.
    pub fn by_key<F>(key: F) -> Self
    where
        F: Fn(&T) -> Value + 'static,
    {
        Self::with_source(GroupSource::Key(Rc::new(key)))
    }

    /// Post-process resolved keys, given the grouping level and culture.
    pub fn with_converter<F>(mut self, converter: F) -> Self
    where
        F: Fn(Value, usize, &Culture) -> Value + 'static,
    {
        self.converter = Some(Rc::new(converter));
        self
    }

    /// Declare explicit groups.
    pub fn with_group_keys(mut self, keys: Vec<GroupKey<T>>) -> Self {
        self.group_keys = keys;
        self
    }

    /// Set how text keys are matched.
    pub fn with_string_comparison(mut self, comparison: StringComparison) -> Self {
        self.string_comparison = comparison;
        self
    }

    /// Resolve the raw key value for an item, after conversion.
    pub fn key_value(&self, item: &T, level: usize, culture: &Culture) -> Value {
        let value = match &self.source {
            GroupSource::Path(path) => path.resolve(item),
            GroupSource::Key(key) => key(item),
        };
        match &self.converter {
            Some(converter) => converter(value, level, culture),
            None => value,
        }
    }

    /// The key of the group an item belongs to.
    ///
    /// A `None` key makes the item its own key. A list key is returned as
    /// is; [`group_keys_from_item`](Self::group_keys_from_item) splits it.
    pub fn group_key_from_item(&self, item: &T, level: usize, culture: &Culture) -> GroupKey<T> {
        match self.key_value(item, level, culture) {
            Value::None => GroupKey::Item(item.clone()),
            value => GroupKey::Value(value),
        }
    }

    /// Every group an item belongs to at this level.
    pub fn group_keys_from_item(&self, item: &T, level: usize, culture: &Culture) -> Vec<GroupKey<T>> {
        match self.group_key_from_item(item, level, culture) {
            GroupKey::Value(Value::List(values)) => values
                .into_iter()
                .map(|value| match value {
                    Value::None => GroupKey::Item(item.clone()),
                    value => GroupKey::Value(value),
                })
                .collect(),
            key => vec![key],
        }
    }

    /// Check if a group's key matches an item's key.
    ///
    /// Text keys compare with the configured string comparison; anything
    /// else compares by equality.
    pub fn keys_match(&self, group_key: &GroupKey<T>, item_key: &GroupKey<T>, culture: &Culture) -> bool {
        match (group_key, item_key) {
            (GroupKey::Value(Value::Text(a)), GroupKey::Value(Value::Text(b))) => {
                culture.equals(a, b, self.string_comparison)
            }
            (a, b) => a == b,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for GroupDescription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            GroupSource::Path(path) => format!("path({})", path.as_str()),
            GroupSource::Key(_) => "key(fn)".to_string(),
        };
        f.debug_struct("GroupDescription")
            .field("source", &source)
            .field("converter", &self.converter.is_some())
            .field("group_keys", &self.group_keys)
            .field("string_comparison", &self.string_comparison)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_group_key_by_path() {
        let description = GroupDescription::<Value>::by_path("country");
        let item = record! { "country" => "NO" };
        assert_eq!(
            description.group_key_from_item(&item, 0, &Culture::invariant()),
            GroupKey::Value(Value::from("NO"))
        );
        assert_eq!(description.property_name(), Some("country"));
    }

    #[test]
    fn test_none_key_uses_item() {
        let description = GroupDescription::<Value>::by_path("missing");
        let item = record! { "country" => "NO" };
        assert_eq!(
            description.group_key_from_item(&item, 0, &Culture::invariant()),
            GroupKey::Item(item.clone())
        );
    }

    #[test]
    fn test_list_key_splits() {
        let description = GroupDescription::<Value>::by_path("tags");
        let item = record! { "tags" => vec![Value::from("a"), Value::from("b")] };
        let keys = description.group_keys_from_item(&item, 0, &Culture::invariant());
        assert_eq!(keys, vec![GroupKey::from("a"), GroupKey::from("b")]);
    }

    #[test]
    fn test_converter_sees_level() {
        let description = GroupDescription::<i64>::by_key(|n| Value::from(*n))
            .with_converter(|value, level, _| {
                let n = value.as_int().unwrap_or_default();
                Value::from(n / 10 + level as i64 * 100)
            });
        let culture = Culture::invariant();
        assert_eq!(description.key_value(&42, 0, &culture), Value::Int(4));
        assert_eq!(description.key_value(&42, 1, &culture), Value::Int(104));
    }

    #[test]
    fn test_keys_match_string_comparison() {
        let culture = Culture::invariant();
        let ordinal = GroupDescription::<Value>::by_path("city");
        assert!(!ordinal.keys_match(&"Oslo".into(), &"oslo".into(), &culture));

        let relaxed = GroupDescription::<Value>::by_path("city")
            .with_string_comparison(StringComparison::OrdinalIgnoreCase);
        assert!(relaxed.keys_match(&"Oslo".into(), &"oslo".into(), &culture));
        assert!(relaxed.keys_match(
            &GroupKey::Value(Value::Int(1)),
            &GroupKey::Value(Value::Int(1)),
            &culture
        ));
        assert!(!relaxed.keys_match(
            &GroupKey::Value(Value::Int(1)),
            &GroupKey::Value(Value::from("1")),
            &culture
        ));
    }

    #[test]
    fn test_group_key_display() {
        let key: GroupKey<String> = GroupKey::Item("solo".into());
        assert_eq!(key.display(), "solo");
        assert_eq!(GroupKey::<String>::from("x").to_value(), Value::from("x"));
    }
}
