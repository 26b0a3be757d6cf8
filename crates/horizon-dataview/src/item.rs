//! Items shown by a collection view.
//!
//! A view never inspects items directly. Everything it needs (property
//! values for path-based descriptions, a value for the item as a whole, and
//! an optional edit session) goes through the [`ViewItem`] trait.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::error::BoxError;
use crate::value::Value;

/// An item that can be shown in a collection view.
///
/// Items are cloned into the view's internal structures and compared with
/// `PartialEq`. Types that need reference identity (mutable records shared
/// with the application) are usually `Rc`-backed and compare by pointer.
pub trait ViewItem: Clone + PartialEq + 'static {
    /// Resolve a single property by name.
    fn property(&self, name: &str) -> Option<Value> {
        let _ = name;
        None
    }

    /// The item as a whole, used by identity sort and group keys.
    fn to_value(&self) -> Value;

    /// Names of the item's properties.
    fn property_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether the item type is a primitive (text, number, boolean, date).
    fn is_primitive() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// Whether items of this type support edit sessions.
    ///
    /// Inspected once when a data connection attaches.
    fn supports_edit_session() -> bool
    where
        Self: Sized,
    {
        false
    }

    /// The item's edit session, if it has one.
    fn edit_session(&self) -> Option<&dyn EditableObject> {
        None
    }
}

/// Transactional editing of a single item.
///
/// Implementors use interior mutability; items are shared between the
/// source, the view and the grid.
pub trait EditableObject {
    /// Start an edit session.
    fn begin_edit(&self);

    /// Commit the pending edit.
    ///
    /// # Errors
    ///
    /// Validation failures are returned unchanged to the caller of the
    /// view or connection operation that committed.
    fn end_edit(&self) -> Result<(), BoxError>;

    /// Discard the pending edit.
    fn cancel_edit(&self);
}

/// One step of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named property or record field.
    Field(String),
    /// A list element.
    Index(usize),
}

/// A parsed property path such as `"address.city"` or `"tags[0]"`.
///
/// The empty path and `"."` address the item itself. Paths that fail to
/// parse resolve to [`Value::None`] rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    source: String,
    segments: Option<Vec<PathSegment>>,
}

impl PropertyPath {
    /// Parse a path.
    pub fn parse(path: &str) -> Self {
        Self {
            source: path.to_string(),
            segments: parse_segments(path),
        }
    }

    /// The original path text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check if this path addresses the item itself.
    pub fn is_self(&self) -> bool {
        matches!(&self.segments, Some(segments) if segments.is_empty())
    }

    /// Check if the path parsed.
    pub fn is_valid(&self) -> bool {
        self.segments.is_some()
    }

    /// The parsed segments.
    pub fn segments(&self) -> &[PathSegment] {
        self.segments.as_deref().unwrap_or_default()
    }

    /// Resolve this path against an item.
    pub fn resolve<T: ViewItem>(&self, item: &T) -> Value {
        let Some(segments) = &self.segments else {
            return Value::None;
        };
        let mut rest = segments.iter();
        let mut current = match rest.next() {
            None => return item.to_value(),
            Some(PathSegment::Field(name)) => match item.property(name) {
                Some(value) => value,
                None => return Value::None,
            },
            Some(PathSegment::Index(index)) => match item.to_value().element(*index) {
                Some(value) => value.clone(),
                None => return Value::None,
            },
        };
        for segment in rest {
            let next = match segment {
                PathSegment::Field(name) => current.field(name),
                PathSegment::Index(index) => current.element(*index),
            };
            current = match next {
                Some(value) => value.clone(),
                None => return Value::None,
            };
        }
        current
    }
}

fn parse_segments(path: &str) -> Option<Vec<PathSegment>> {
    let path = path.trim();
    if path.is_empty() || path == "." {
        return Some(Vec::new());
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut indexes) = match part.find('[') {
            Some(open) => (&part[..open], &part[open..]),
            None => (part, ""),
        };
        if name.is_empty() && indexes.is_empty() {
            return None;
        }
        if !name.is_empty() {
            segments.push(PathSegment::Field(name.to_string()));
        }
        while !indexes.is_empty() {
            let close = indexes.find(']')?;
            let index = indexes.get(1..close)?.trim().parse().ok()?;
            segments.push(PathSegment::Index(index));
            indexes = &indexes[close + 1..];
            if !indexes.is_empty() && !indexes.starts_with('[') {
                return None;
            }
        }
    }
    Some(segments)
}

impl ViewItem for Value {
    fn property(&self, name: &str) -> Option<Value> {
        self.field(name).cloned()
    }

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn property_names(&self) -> Vec<String> {
        match self {
            Value::Record(fields) => fields.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }
}

impl ViewItem for String {
    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn is_primitive() -> bool {
        true
    }
}

impl ViewItem for &'static str {
    fn to_value(&self) -> Value {
        Value::from(*self)
    }

    fn is_primitive() -> bool {
        true
    }
}

macro_rules! primitive_view_item {
    ($($ty:ty),*) => {
        $(
            impl ViewItem for $ty {
                fn to_value(&self) -> Value {
                    Value::from(*self)
                }

                fn is_primitive() -> bool {
                    true
                }
            }
        )*
    };
}

primitive_view_item!(i32, i64, u32, f32, f64, bool, chrono::NaiveDateTime);

impl ViewItem for BTreeMap<String, Value> {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn to_value(&self) -> Value {
        Value::Record(self.clone())
    }

    fn property_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }
}

impl ViewItem for HashMap<String, Value> {
    fn property(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }

    fn to_value(&self) -> Value {
        Value::Record(self.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.keys().cloned().collect();
        names.sort();
        names
    }
}

impl<T: ViewItem> ViewItem for Rc<T> {
    fn property(&self, name: &str) -> Option<Value> {
        (**self).property(name)
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn property_names(&self) -> Vec<String> {
        (**self).property_names()
    }

    fn is_primitive() -> bool {
        T::is_primitive()
    }

    fn supports_edit_session() -> bool {
        T::supports_edit_session()
    }

    fn edit_session(&self) -> Option<&dyn EditableObject> {
        (**self).edit_session()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn test_parse_simple_path() {
        let path = PropertyPath::parse("name");
        assert!(path.is_valid());
        assert_eq!(path.segments(), &[PathSegment::Field("name".into())]);
    }

    #[test]
    fn test_parse_nested_and_indexed_path() {
        let path = PropertyPath::parse("address.lines[1].text");
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("address".into()),
                PathSegment::Field("lines".into()),
                PathSegment::Index(1),
                PathSegment::Field("text".into()),
            ]
        );
    }

    #[test]
    fn test_parse_self_path() {
        assert!(PropertyPath::parse("").is_self());
        assert!(PropertyPath::parse(".").is_self());
        assert!(!PropertyPath::parse("name").is_self());
    }

    #[test]
    fn test_parse_invalid_paths() {
        assert!(!PropertyPath::parse("a..b").is_valid());
        assert!(!PropertyPath::parse("tags[x]").is_valid());
        assert!(!PropertyPath::parse("tags[0").is_valid());
        assert!(!PropertyPath::parse("tags[0]x").is_valid());
    }

    #[test]
    fn test_resolve_record_paths() {
        let person = record! {
            "name" => "Ada",
            "address" => record! { "city" => "London" },
            "tags" => vec![Value::from("math"), Value::from("engines")],
        };

        assert_eq!(PropertyPath::parse("name").resolve(&person), Value::from("Ada"));
        assert_eq!(
            PropertyPath::parse("address.city").resolve(&person),
            Value::from("London")
        );
        assert_eq!(PropertyPath::parse("tags[1]").resolve(&person), Value::from("engines"));
        assert_eq!(PropertyPath::parse("tags[5]").resolve(&person), Value::None);
        assert_eq!(PropertyPath::parse("missing.city").resolve(&person), Value::None);
        assert_eq!(PropertyPath::parse("bad[").resolve(&person), Value::None);
    }

    #[test]
    fn test_resolve_self_path_uses_item_value() {
        let item = String::from("b");
        assert_eq!(PropertyPath::parse("").resolve(&item), Value::from("b"));
    }

    #[test]
    fn test_primitive_items() {
        assert!(<i64 as ViewItem>::is_primitive());
        assert!(<String as ViewItem>::is_primitive());
        assert!(!<Value as ViewItem>::is_primitive());
        assert_eq!(7i64.to_value(), Value::Int(7));
    }

    #[test]
    fn test_hash_map_item() {
        let mut map = HashMap::new();
        map.insert("b".to_string(), Value::from(2));
        map.insert("a".to_string(), Value::from(1));
        assert_eq!(map.property("a"), Some(Value::Int(1)));
        assert_eq!(map.property_names(), vec!["a".to_string(), "b".to_string()]);
    }
}
