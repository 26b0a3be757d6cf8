//! Dynamic property values.
//!
//! Sort, group and filter descriptions that address items by property path
//! work on [`Value`], the dynamically typed result of resolving a path
//! against an item. Statically typed key functions also produce a `Value` so
//! the same comparers and key matching apply to both.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// A dynamically typed property value.
///
/// # Example
///
/// ```
/// use horizon_dataview::Value;
///
/// let value = Value::from("Oslo");
/// assert_eq!(value.as_str(), Some("Oslo"));
/// assert!(Value::None.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// No value (null).
    #[default]
    None,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Date and time without a time zone.
    DateTime(NaiveDateTime),
    /// A list of values. Used as a group key, each element names a group.
    List(Vec<Value>),
    /// A record of named values, addressable with nested property paths.
    Record(BTreeMap<String, Value>),
}

/// The kind of a [`Value`], used to pick a comparer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::None`].
    None,
    /// [`Value::Bool`].
    Bool,
    /// [`Value::Int`] or [`Value::Float`].
    Number,
    /// [`Value::Text`].
    Text,
    /// [`Value::DateTime`].
    DateTime,
    /// [`Value::List`].
    List,
    /// [`Value::Record`].
    Record,
}

impl ValueKind {
    /// Whether values of this kind have a natural total order.
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Bool | Self::Number | Self::Text | Self::DateTime)
    }
}

impl Value {
    /// Get the kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) | Value::Float(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::List(_) => ValueKind::List,
            Value::Record(_) => ValueKind::Record,
        }
    }

    /// Check if this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Check if this holds a value.
    pub fn is_some(&self) -> bool {
        !self.is_none()
    }

    /// Get the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get a float, converting integers.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(n) => Some(*n),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Get the boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the date-time, if this is a date-time value.
    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Get the elements, if this is a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a named field of a record value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Look up an element of a list value.
    pub fn element(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }

    /// Compare two values of the same ordered kind.
    ///
    /// Integers and floats compare numerically with each other. Text compares
    /// ordinally here; culture-aware text comparison lives in [`crate::Culture`].
    /// Returns `None` when the kinds differ or are not ordered.
    pub fn natural_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (a, b) if a.kind() == ValueKind::Number && b.kind() == ValueKind::Number => {
                let (a, b) = (a.as_float()?, b.as_float()?);
                Some(a.total_cmp(&b))
            }
            _ => None,
        }
    }

    /// Render this value the way filters and debug output see it.
    ///
    /// `None` renders as the empty string.
    pub fn to_display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Value::Record(fields)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Build a [`Value::Record`] from `name => value` pairs.
///
/// ```
/// use horizon_dataview::{record, Value};
///
/// let person = record! { "name" => "Ada", "age" => 36 };
/// assert_eq!(person.field("age"), Some(&Value::Int(36)));
/// ```
#[macro_export]
macro_rules! record {
    ($($name:expr => $value:expr),* $(,)?) => {{
        let mut fields = ::std::collections::BTreeMap::new();
        $( fields.insert(::std::string::String::from($name), $crate::Value::from($value)); )*
        $crate::Value::Record(fields)
    }};
}
