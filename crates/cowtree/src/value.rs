//! Immutable value trees
//!
//! [`Value`] is the universe a draft can wrap: scalars, an opaque byte leaf,
//! and two shareable container kinds. Containers sit behind [`Arc`], so
//! cloning a value never copies a subtree and two values can be compared for
//! reference identity with [`Value::ptr_eq`].

use crate::path::{DraftPath, Key};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Insertion-ordered record contents
pub type Record = IndexMap<String, Value>;

/// Ordered sequence contents
pub type Sequence = Vec<Value>;

/// Largest integer an `f64` represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Shape category of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Number`]
    Number,
    /// [`Value::String`]
    String,
    /// [`Value::Bytes`]
    Bytes,
    /// [`Value::Record`]
    Record,
    /// [`Value::Sequence`]
    Sequence,
}

impl ValueKind {
    /// Whether values of this kind can be wrapped in a draft
    #[inline]
    #[must_use]
    pub const fn is_draftable(self) -> bool {
        matches!(self, Self::Record | Self::Sequence)
    }

    /// Lowercase name for messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Record => "record",
            Self::Sequence => "sequence",
        }
    }
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable tree value
///
/// # Invariants
/// - Containers are never mutated once wrapped in an `Arc`
/// - `clone()` is O(1) and shares every container by reference
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / null
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Number (IEEE 754 double)
    Number(f64),
    /// Text
    String(Arc<str>),
    /// Opaque binary leaf, never drafted
    Bytes(Arc<[u8]>),
    /// Plain record
    Record(Arc<Record>),
    /// Ordered sequence
    Sequence(Arc<Sequence>),
}

impl Value {
    /// Build a record from key/value pairs
    pub fn record<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Record(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build a sequence from items
    pub fn sequence<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::Sequence(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an opaque byte leaf
    #[must_use]
    pub fn bytes(data: &[u8]) -> Self {
        Self::Bytes(Arc::from(data))
    }

    /// Shape category
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Record(_) => ValueKind::Record,
            Self::Sequence(_) => ValueKind::Sequence,
        }
    }

    /// Whether this value can be wrapped in a draft
    #[inline]
    #[must_use]
    pub const fn is_draftable(&self) -> bool {
        self.kind().is_draftable()
    }

    /// Identity comparison used for write suppression and lazy wrapping
    ///
    /// Numbers follow `SameValue` (`+0` and `-0` differ, `NaN` equals
    /// itself). Bytes and containers compare by reference.
    #[must_use]
    pub fn same_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Self::String(a), Self::String(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }

    /// Reference identity for values that have one (bytes and containers)
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bytes(a), Self::Bytes(b)) => Arc::ptr_eq(a, b),
            (Self::Record(a), Self::Record(b)) => Arc::ptr_eq(a, b),
            (Self::Sequence(a), Self::Sequence(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Read an entry, applying host key coercion
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Self::Record(record) => record.get(&key.as_field()),
            Self::Sequence(items) => key.as_index().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Whether an own entry exists under `key`
    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Follow a path from this value
    #[must_use]
    pub fn pointer(&self, path: &DraftPath) -> Option<&Value> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Number of entries (0 for non-containers)
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Record(record) => record.len(),
            Self::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    /// Whether the value has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Own keys in iteration order (insertion order for records)
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Self::Record(record) => record.keys().map(Key::from).collect(),
            Self::Sequence(items) => (0..items.len()).map(Key::Index).collect(),
            _ => Vec::new(),
        }
    }

    /// Text, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    /// Number, if this is a number
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean, if this is a bool
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Record contents, if this is a record
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(record) => Some(record.as_ref()),
            _ => None,
        }
    }

    /// Sequence items, if this is a sequence
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Whether this is null
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Deep structural equality
///
/// `NaN` equals `NaN`; records compare as maps regardless of key order.
/// Bytes compare by content here, unlike [`Value::same_value`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Record(a), Self::Record(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(Arc::new(items))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Self::Record(Arc::new(record))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::from(s),
            serde_json::Value::Array(items) => {
                Self::Sequence(Arc::new(items.into_iter().map(Self::from).collect()))
            }
            serde_json::Value::Object(map) => Self::Record(Arc::new(
                map.into_iter().map(|(k, v)| (k, Self::from(v))).collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => integral(*n).map_or_else(
                || serde_json::Number::from_f64(*n).map_or(Self::Null, Self::Number),
                |i| Self::Number(i.into()),
            ),
            Value::String(s) => Self::String(s.to_string()),
            Value::Bytes(data) => Self::Array(data.iter().map(|b| Self::from(*b)).collect()),
            Value::Sequence(items) => Self::Array(items.iter().map(Self::from).collect()),
            Value::Record(record) => Self::Object(
                record
                    .iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

/// Integral numbers within the exact range serialize as integers.
#[allow(clippy::cast_possible_truncation)]
fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER).then_some(n as i64)
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None if n.is_finite() => serializer.serialize_f64(*n),
                None => serializer.serialize_unit(),
            },
            Self::String(s) => serializer.serialize_str(s),
            Self::Bytes(data) => {
                let mut seq = serializer.serialize_seq(Some(data.len()))?;
                for b in data.iter() {
                    seq.serialize_element(b)?;
                }
                seq.end()
            }
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Record(record) => {
                let mut map = serializer.serialize_map(Some(record.len()))?;
                for (k, v) in record.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::Value::from(self))
    }
}
