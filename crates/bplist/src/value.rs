//! [`Value`]: the dynamic value held by every node of a property list tree.
//!
//! A tree is built from the two composite kinds, [`Array`] and
//! [`Dictionary`], nesting further values. Trees are acyclic and every node
//! exclusively owns its children; cloning a value deep-copies it.

use std::fmt;

use indexmap::IndexMap;

use crate::error::{BplistError, Result};

/// Unix timestamp of the platform epoch, 2001-01-01T00:00:00Z.
pub const PLATFORM_EPOCH_UNIX_SECONDS: f64 = 978_307_200.0;

/// Ordered sequence of values.
pub type Array = Vec<Value>;

/// String-keyed map of values.
///
/// Iteration follows insertion order; equality ignores order.
pub type Dictionary = IndexMap<String, Value>;

/// A point in time, in seconds relative to the platform epoch.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Date(pub f64);

impl Date {
    /// Seconds since 2001-01-01T00:00:00Z.
    #[inline]
    pub fn seconds(self) -> f64 {
        self.0
    }

    pub fn from_unix_seconds(unix: f64) -> Self {
        Date(unix - PLATFORM_EPOCH_UNIX_SECONDS)
    }

    pub fn to_unix_seconds(self) -> f64 {
        self.0 + PLATFORM_EPOCH_UNIX_SECONDS
    }
}

/// Discriminant of a [`Value`], used in type errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Integer,
    Real,
    Date,
    Data,
    String,
    Array,
    Dictionary,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Date => "date",
            ValueKind::Data => "data",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Dictionary => "dictionary",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically typed property list value.
///
/// Exactly one variant is active. Typed extraction never coerces: asking a
/// [`Value::Real`] for an integer fails with [`BplistError::TypeMismatch`].
///
/// # Example
///
/// ```
/// use bplist::{Dictionary, Value};
///
/// let mut dict = Dictionary::new();
/// dict.insert("$name".into(), Value::from("Test"));
/// dict.insert("$channel".into(), Value::from(3));
/// let value = Value::from(dict);
///
/// assert_eq!(value.get_key("$channel").unwrap().as_int(), Ok(3));
/// assert!(value.get_key("$name").unwrap().as_int().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    /// Every signed integer width normalizes to 64 bits.
    Integer(i64),
    /// Single- and double-precision reals both land here.
    Real(f64),
    Date(Date),
    /// Opaque byte blob.
    Data(Vec<u8>),
    /// Text; ASCII on the wire.
    String(String),
    Array(Array),
    Dictionary(Dictionary),
}

/// A concrete type that a [`Value`] variant holds.
///
/// Drives the generic accessors [`Value::is`], [`Value::get`] and
/// [`Value::into_inner`].
pub trait ValueType: Sized {
    const KIND: ValueKind;

    fn from_ref(value: &Value) -> Option<&Self>;

    fn from_value(value: Value) -> std::result::Result<Self, Value>;
}

macro_rules! value_type {
    ($ty:ty, $variant:ident) => {
        impl ValueType for $ty {
            const KIND: ValueKind = ValueKind::$variant;

            #[inline]
            fn from_ref(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            #[inline]
            fn from_value(value: Value) -> std::result::Result<Self, Value> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

value_type!(bool, Bool);
value_type!(i64, Integer);
value_type!(f64, Real);
value_type!(Date, Date);
value_type!(Vec<u8>, Data);
value_type!(String, String);
value_type!(Array, Array);
value_type!(Dictionary, Dictionary);

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Date(_) => ValueKind::Date,
            Value::Data(_) => ValueKind::Data,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    /// True iff the active variant holds a `T`.
    #[inline]
    pub fn is<T: ValueType>(&self) -> bool {
        T::from_ref(self).is_some()
    }

    /// Borrows the held `T`.
    pub fn get<T: ValueType>(&self) -> Result<&T> {
        T::from_ref(self).ok_or_else(|| self.mismatch(T::KIND))
    }

    /// Moves the held `T` out of the value.
    pub fn into_inner<T: ValueType>(self) -> Result<T> {
        T::from_value(self).map_err(|other| other.mismatch(T::KIND))
    }

    fn mismatch(&self, expected: ValueKind) -> BplistError {
        BplistError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        self.get::<bool>().copied()
    }

    pub fn as_int(&self) -> Result<i64> {
        self.get::<i64>().copied()
    }

    pub fn as_real(&self) -> Result<f64> {
        self.get::<f64>().copied()
    }

    pub fn as_date(&self) -> Result<Date> {
        self.get::<Date>().copied()
    }

    pub fn as_data(&self) -> Result<&[u8]> {
        self.get::<Vec<u8>>().map(Vec::as_slice)
    }

    pub fn as_str(&self) -> Result<&str> {
        self.get::<String>().map(String::as_str)
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        self.get::<Array>().map(Vec::as_slice)
    }

    pub fn as_dictionary(&self) -> Result<&Dictionary> {
        self.get::<Dictionary>()
    }

    /// Looks up `key` when this value is a dictionary.
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dictionary(dict) => dict.get(key),
            _ => None,
        }
    }

    /// Looks up `index` when this value is an array.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }
}

macro_rules! from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<Date> for Value {
    fn from(v: Date) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Data(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Data(v.to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<Dictionary> for Value {
    fn from(v: Dictionary) -> Self {
        Value::Dictionary(v)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Dictionary(iter.into_iter().collect())
    }
}
