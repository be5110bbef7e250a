//! Tag values: opaque scalars attached to a target under an authority.
//!
//! The registry never interprets values. A tag registered without an explicit
//! value holds `Int(1)`, the conventional "truthy" marker.

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// A stored tag value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Default for TagValue {
    fn default() -> Self {
        TagValue::Int(1)
    }
}

impl TagValue {
    /// Encode a plain-old-data value as raw bytes.
    ///
    /// The type must implement `zerocopy::IntoBytes + Immutable`.
    /// Use `#[derive(IntoBytes, Immutable)]` on your type.
    pub fn pod<T: IntoBytes + Immutable>(value: &T) -> Self {
        TagValue::Bytes(value.as_bytes().to_vec())
    }

    /// Decode a plain-old-data value previously stored with [`TagValue::pod`].
    ///
    /// Returns `None` if this is not a `Bytes` value or the length does not
    /// match `T`'s layout.
    pub fn read_pod<T: FromBytes>(&self) -> Option<T> {
        match self {
            TagValue::Bytes(bytes) => T::read_from_bytes(bytes).ok(),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness: `false`, `0`, `0.0`, `""`, `"0"` and empty bytes are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            TagValue::Bool(b) => *b,
            TagValue::Int(i) => *i != 0,
            TagValue::Float(f) => *f != 0.0,
            TagValue::Str(s) => !s.is_empty() && s != "0",
            TagValue::Bytes(b) => !b.is_empty(),
        }
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Bool(b) => write!(f, "{b}"),
            TagValue::Int(i) => write!(f, "{i}"),
            TagValue::Float(x) => write!(f, "{x}"),
            TagValue::Str(s) => f.write_str(s),
            TagValue::Bytes(b) => write!(f, "{b:02x?}"),
        }
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(value.into())
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        TagValue::Int(value.into())
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(value: Vec<u8>) -> Self {
        TagValue::Bytes(value)
    }
}
