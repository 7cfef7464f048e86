//! Dynamic value representation for OpenFOAM dictionary entries.
//!
//! [`Value`] is the closed set of things a keyword can map to. Values are
//! produced by the parsers in [`grammar`](crate::grammar), rendered back by the
//! [`Serializer`](crate::ser::Serializer), and handed out by
//! [`Document`](crate::Document) as independent copies.
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::Value;
//!
//! let scheme: Value = "Gauss linear".parse().unwrap();
//! assert_eq!(scheme, Value::Tuple(vec![Value::from("Gauss"), Value::from("linear")]));
//!
//! let count: Value = "42".parse().unwrap();
//! assert_eq!(count.as_i64(), Some(42));
//! ```

use crate::dimensions::{DimensionSet, Dimensioned};
use crate::error::{Error, Result};
use crate::field::{Field, NumericArray};
use crate::map::Dict;
use crate::ser::format_float;
use crate::tensor::Tensor;
use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A value stored under a keyword path.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    /// Entry written as `key;` with no data
    #[default]
    Empty,
    Number(Number),
    Switch(bool),
    /// Raw token or quoted string, quotes preserved verbatim
    Text(String),
    DimensionSet(DimensionSet),
    Dimensioned(Dimensioned),
    Field(Field),
    /// Homogeneous numeric array read as standalone data
    Array(NumericArray),
    /// Faces-like list of 3- or 4-index groups
    Faces(Vec<Vec<i64>>),
    List(Vec<ListItem>),
    Dict(Dict),
    /// Two or more consecutive values with no separator
    Tuple(Vec<Value>),
}

/// Represents an integer or floating point number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(_) => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{i}"),
            Number::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Integer(i64::from(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Integer(value)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

/// One element of a generic list.
#[derive(Clone, Debug, PartialEq)]
pub enum ListItem {
    Value(Value),
    Entry(KeywordEntry),
}

/// A `keyword value;` pair appearing inside a list, e.g. `(a 1; b {c d;})`.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordEntry {
    pub keyword: Value,
    pub value: Value,
}

impl KeywordEntry {
    #[must_use]
    pub fn new(keyword: impl Into<Value>, value: impl Into<Value>) -> Self {
        KeywordEntry {
            keyword: keyword.into(),
            value: value.into(),
        }
    }
}

impl ListItem {
    #[must_use]
    pub const fn as_value(&self) -> Option<&Value> {
        match self {
            ListItem::Value(v) => Some(v),
            ListItem::Entry(_) => None,
        }
    }
}

impl From<Value> for ListItem {
    fn from(value: Value) -> Self {
        ListItem::Value(value)
    }
}

impl From<KeywordEntry> for ListItem {
    fn from(entry: KeywordEntry) -> Self {
        ListItem::Entry(entry)
    }
}

impl Value {
    /// Short name of the variant, used in type mismatch errors.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Number(_) => "number",
            Value::Switch(_) => "switch",
            Value::Text(_) => "text",
            Value::DimensionSet(_) => "dimension set",
            Value::Dimensioned(_) => "dimensioned",
            Value::Field(_) => "field",
            Value::Array(_) => "array",
            Value::Faces(_) => "faces",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
            Value::Tuple(_) => "tuple",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Switch(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the raw text of a token or quoted string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Text with surrounding double quotes removed.
    #[must_use]
    pub fn as_unquoted_str(&self) -> Option<&str> {
        self.as_str().map(|s| {
            s.strip_prefix('"')
                .and_then(|inner| inner.strip_suffix('"'))
                .unwrap_or(s)
        })
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ListItem]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_field(&self) -> Option<&Field> {
        match self {
            Value::Field(f) => Some(f),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_array(&self) -> Option<&NumericArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dimension_set(&self) -> Option<&DimensionSet> {
        match self {
            Value::DimensionSet(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_dimensioned(&self) -> Option<&Dimensioned> {
        match self {
            Value::Dimensioned(d) => Some(d),
            _ => None,
        }
    }

    /// Structural equality that treats NaN as equal to NaN inside numeric payloads.
    #[must_use]
    pub fn nan_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(Number::Float(a)), Value::Number(Number::Float(b))) => {
                a == b || (a.is_nan() && b.is_nan())
            }
            (Value::Field(a), Value::Field(b)) => a.nan_eq(b),
            (Value::Array(a), Value::Array(b)) => a.nan_eq(b),
            (Value::Dimensioned(a), Value::Dimensioned(b)) => {
                a.name == b.name && a.dimensions == b.dimensions && a.value.nan_eq(&b.value)
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.nan_eq(y))
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|pair| match pair {
                        (ListItem::Value(x), ListItem::Value(y)) => x.nan_eq(y),
                        (ListItem::Entry(x), ListItem::Entry(y)) => {
                            x.keyword.nan_eq(&y.keyword) && x.value.nan_eq(&y.value)
                        }
                        _ => false,
                    })
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.nan_eq(vb))
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = crate::ser::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl FromStr for Value {
    type Err = Error;

    /// Parses data syntax: one value, or a tuple of consecutive values.
    fn from_str(s: &str) -> Result<Self> {
        crate::parse_data(s.as_bytes())
    }
}

impl Serialize for ListItem {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ListItem::Value(v) => v.serialize(serializer),
            ListItem::Entry(entry) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&entry.keyword)?;
                seq.serialize_element(&entry.value)?;
                seq.end()
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Empty => serializer.serialize_unit(),
            Value::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Value::Number(Number::Float(x)) => serializer.serialize_f64(*x),
            Value::Switch(b) => serializer.serialize_bool(*b),
            Value::Text(s) => serializer.serialize_str(s),
            Value::DimensionSet(d) => d.serialize(serializer),
            Value::Dimensioned(d) => d.serialize(serializer),
            Value::Field(field) => field.serialize(serializer),
            Value::Array(array) => array.serialize(serializer),
            Value::Faces(faces) => faces.serialize(serializer),
            Value::List(items) => items.serialize(serializer),
            Value::Tuple(items) => items.serialize(serializer),
            Value::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (k, v) in dict.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a value representable in an OpenFOAM dictionary")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Self::Value, E> {
                Ok(Value::Switch(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Self::Value, E> {
                Ok(match i64::try_from(value) {
                    Ok(i) => Value::Number(Number::Integer(i)),
                    Err(_) => Value::Number(Number::Float(value as f64)),
                })
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Self::Value, E> {
                Ok(Value::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E> {
                Ok(Value::Text(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Self::Value, E> {
                Ok(Value::Text(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Value::Empty)
            }

            fn visit_none<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(Value::Empty)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::new();
                while let Some(elem) = seq.next_element::<Value>()? {
                    items.push(ListItem::Value(elem));
                }
                Ok(Value::List(items))
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut dict = Dict::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    dict.insert(key, value);
                }
                Ok(Value::Dict(dict))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

impl TryFrom<Value> for i64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| Error::type_mismatch("value", "integer", value.type_name()))
    }
}

impl TryFrom<Value> for f64 {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match &value {
            Value::Number(n) => Ok(n.as_f64()),
            Value::Field(Field::Uniform(Tensor::Scalar(x))) => Ok(*x),
            Value::Dimensioned(d) => d.to_f64(),
            _ => Err(Error::type_mismatch("value", "number", value.type_name())),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_mismatch("value", "switch", value.type_name()))
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(Error::type_mismatch("value", "text", other.type_name())),
        }
    }
}

impl TryFrom<Value> for DimensionSet {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::DimensionSet(d) => Ok(d),
            other => Err(Error::type_mismatch("value", "dimension set", other.type_name())),
        }
    }
}

impl TryFrom<Value> for Dict {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Dict(d) => Ok(d),
            other => Err(Error::type_mismatch("value", "dictionary", other.type_name())),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Switch(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(Number::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(Number::Integer(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(Number::Integer(i64::from(value)))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(Number::Float(value))
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<DimensionSet> for Value {
    fn from(value: DimensionSet) -> Self {
        Value::DimensionSet(value)
    }
}

impl From<Dimensioned> for Value {
    fn from(value: Dimensioned) -> Self {
        Value::Dimensioned(value)
    }
}

impl From<Tensor> for Value {
    fn from(value: Tensor) -> Self {
        Value::Field(Field::Uniform(value))
    }
}

impl From<Field> for Value {
    fn from(value: Field) -> Self {
        Value::Field(value)
    }
}

impl From<NumericArray> for Value {
    fn from(value: NumericArray) -> Self {
        Value::Array(value)
    }
}

impl From<Dict> for Value {
    fn from(value: Dict) -> Self {
        Value::Dict(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::List(value.into_iter().map(|v| ListItem::Value(v.into())).collect())
    }
}
