//! Values accepted by the SQL compiler.
//!
//! [`Value`] is the tagged form of everything that can appear on the right-hand
//! side of a condition or in a row of mutation data. [`ConditionMap`] is the
//! ordered key/value container used both for WHERE trees and for INSERT/UPDATE
//! data: iteration order is insertion order, and re-inserting a key replaces the
//! value in place.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use std::fmt;

/// A value rendered into SQL text by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Rendered as the bare token `null`.
    Null,
    Bool(bool),
    Number(Number),
    /// Rendered single-quoted. Embedded quotes are **not** escaped.
    Text(String),
    /// Raw SQL, emitted verbatim (e.g. `NOW()`).
    ///
    /// Callers are responsible for the safety of literal text.
    Literal(String),
    Array(Vec<Value>),
    /// A nested tree: an `OR` group or an operator map (`{">=": 1, "<": 5}`).
    Map(ConditionMap),
}

impl Value {
    /// Wrap raw SQL text so it is emitted without quoting.
    pub fn literal(sql: impl Into<String>) -> Self {
        Value::Literal(sql.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_map(&self) -> Option<&ConditionMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Render the value as a SQL scalar.
    ///
    /// Text is wrapped in single quotes; every other value uses its natural
    /// string form (`1`, `true`, `null`, literal text).
    pub fn render(&self) -> String {
        match self {
            Value::Text(text) => format!("'{text}'"),
            other => other.natural(),
        }
    }

    /// The plain string form, with no quoting applied to text.
    ///
    /// Arrays join their elements with `,`; maps use their JSON form.
    pub fn natural(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(text) | Value::Literal(text) => text.clone(),
            Value::Array(items) => items
                .iter()
                .map(Value::natural)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => self.json(),
        }
    }

    /// JSON text of the value; literals stay verbatim.
    ///
    /// Used for `IN (...)` lists, where string elements are double-quoted.
    pub fn json(&self) -> String {
        match self {
            Value::Literal(sql) => sql.clone(),
            other => serde_json::to_string(other).unwrap_or_else(|_| other.natural()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::Text(text) | Value::Literal(text) => serializer.serialize_str(text),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Number(Number::from(v))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    /// Non-finite floats have no SQL spelling and become `Null`.
    fn from(v: f64) -> Self {
        Number::from_f64(v).map_or(Value::Null, Value::Number)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::from(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<uuid::Uuid> for Value {
    fn from(v: uuid::Uuid) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<chrono::NaiveDate> for Value {
    fn from(v: chrono::NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<chrono::NaiveDateTime> for Value {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Value::Text(v.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Value
where
    Tz::Offset: fmt::Display,
{
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Value::Text(v.to_rfc3339())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(v: [T; N]) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<ConditionMap> for Value {
    fn from(v: ConditionMap) -> Self {
        Value::Map(v)
    }
}

impl From<serde_json::Value> for Value {
    /// Objects keep their key order (serde_json is built with `preserve_order`).
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// An ordered mapping from keys to [`Value`]s.
///
/// Used as the WHERE tree (`{"id": 1, "OR": {...}}`) and as row data for
/// INSERT/UPDATE.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionMap {
    entries: Vec<(String, Value)>,
}

/// Column data for INSERT and UPDATE statements.
pub type Data = ConditionMap;

impl ConditionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Builder-style [`ConditionMap::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    /// Add every entry of `other` whose key is not already present.
    ///
    /// Where both sides hold a map under the same key, the two maps are
    /// merged the same way, at any depth. Other present values (arrays
    /// included) are kept as they are.
    pub fn merge_missing(&mut self, other: &ConditionMap) {
        for (key, value) in other.iter() {
            match self.entries.iter_mut().find(|(k, _)| k == key) {
                Some((_, Value::Map(mine))) => {
                    if let Value::Map(theirs) = value {
                        mine.merge_missing(theirs);
                    }
                }
                Some(_) => {}
                None => self.entries.push((key.to_string(), value.clone())),
            }
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ConditionMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ConditionMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ConditionMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ConditionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Build a [`ConditionMap`] from `key => value` pairs, in order.
///
/// ```ignore
/// use steplix::map;
///
/// let filter = map! {
///     "id" => 1,
///     "OR" => map! { "active" => 1, "banned" => 0 },
/// };
/// ```
#[macro_export]
macro_rules! map {
    () => {
        $crate::ConditionMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::ConditionMap::new();
        $( map.insert($key, $value); )+
        map
    }};
}
