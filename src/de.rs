//! Deserialization of [`Value`]s into Rust types.
//!
//! This bridges parsed dictionaries to `#[derive(Deserialize)]` structs:
//!
//! - dictionaries deserialize as maps or structs
//! - lists, tuples, arrays and faces deserialize as sequences
//! - text deserializes as a string with its surrounding quotes removed
//! - a uniform field deserializes as its tensor: a number, or a sequence of
//!   components
//! - a dimension set deserializes as a sequence of seven numbers
//! - an empty entry (`key;`) deserializes as unit or `None`
//!
//! Enums are read from a bare word (unit variants) or from a one-entry
//! dictionary whose key names the variant.
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::{from_slice, from_value, Value};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! #[serde(rename_all = "camelCase")]
//! struct Solver {
//!     solver: String,
//!     tolerance: f64,
//!     rel_tol: f64,
//! }
//!
//! let file = from_slice(b"solver PCG; tolerance 1e-06; relTol 0.05;").unwrap();
//! let solver: Solver = from_value(&Value::Dict(file.entries)).unwrap();
//! assert_eq!(solver.solver, "PCG");
//! assert_eq!(solver.rel_tol, 0.05);
//! ```

use crate::dimensions::Dimensioned;
use crate::error::{Error, Result};
use crate::field::{Field, NumericArray};
use crate::map::Dict;
use crate::tensor::Tensor;
use crate::value::{ListItem, Number, Value};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::forward_to_deserialize_any;

/// Deserializes a `T` from a copy of `value`.
///
/// # Errors
///
/// Returns an error if the value's shape does not match `T`.
pub fn from_value<T>(value: &Value) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(ValueDeserializer::new(value.clone()))
}

fn unquote(text: String) -> String {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text[1..text.len() - 1].to_string()
    } else {
        text
    }
}

fn float(x: f64) -> Value {
    Value::Number(Number::Float(x))
}

fn tensor_value(tensor: &Tensor) -> Value {
    match tensor {
        Tensor::Scalar(x) => float(*x),
        _ => Value::Tuple(tensor.components().iter().copied().map(float).collect()),
    }
}

fn array_values(array: &NumericArray) -> Vec<Value> {
    if array.data().is_float() {
        array.iter().map(|t| tensor_value(&t)).collect()
    } else {
        (0..array.len())
            .filter_map(|i| array.data().get_f64(i))
            .map(|x| {
                #[allow(clippy::cast_possible_truncation)]
                let label = x as i64;
                Value::Number(Number::Integer(label))
            })
            .collect()
    }
}

fn dimensioned_dict(dimensioned: Dimensioned) -> Dict {
    let mut dict = Dict::with_capacity(3);
    if let Some(name) = dimensioned.name {
        dict.insert("name", Value::Text(name));
    }
    dict.insert(
        "dimensions",
        Value::Tuple(dimensioned.dimensions.to_array().into_iter().map(float).collect()),
    );
    dict.insert("value", tensor_value(&dimensioned.value));
    dict
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(values: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: values.into_iter(),
        }
    }

    fn from_items(items: Vec<ListItem>) -> Self {
        let values = items
            .into_iter()
            .map(|item| match item {
                ListItem::Value(value) => value,
                ListItem::Entry(entry) => Value::Tuple(vec![entry.keyword, entry.value]),
            })
            .collect();
        SeqDeserializer::new(values)
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: std::vec::IntoIter<(String, Value)>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(dict: Dict) -> Self {
        MapDeserializer {
            iter: dict.into_iter().collect::<Vec<_>>().into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(key.into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<Value>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(IntoDeserializer::<'de, Error>::into_deserializer(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<Value>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(Value::Empty) | None => Ok(()),
            Some(other) => Err(Error::custom(format!(
                "expected unit variant, found {}",
                other.type_name()
            ))),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ValueDeserializer::new(value)),
            None => Err(Error::custom("expected newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(value) => de::Deserializer::deserialize_seq(ValueDeserializer::new(value), visitor),
            None => Err(Error::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(Value::Dict(dict)) => visitor.visit_map(MapDeserializer::new(dict)),
            _ => Err(Error::custom("expected struct variant")),
        }
    }
}

struct ValueDeserializer {
    value: Value,
}

impl ValueDeserializer {
    fn new(value: Value) -> Self {
        ValueDeserializer { value }
    }
}

impl<'de> de::Deserializer<'de> for ValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Empty => visitor.visit_unit(),
            Value::Switch(b) => visitor.visit_bool(b),
            Value::Number(Number::Integer(i)) => visitor.visit_i64(i),
            Value::Number(Number::Float(x)) => visitor.visit_f64(x),
            Value::Text(s) => visitor.visit_string(unquote(s)),
            Value::DimensionSet(dims) => visitor.visit_seq(SeqDeserializer::new(
                dims.to_array().into_iter().map(float).collect(),
            )),
            Value::Dimensioned(dimensioned) => {
                visitor.visit_map(MapDeserializer::new(dimensioned_dict(dimensioned)))
            }
            Value::Field(Field::Uniform(Tensor::Scalar(x))) => visitor.visit_f64(x),
            Value::Field(Field::Uniform(tensor)) => visitor.visit_seq(SeqDeserializer::new(
                tensor.components().iter().copied().map(float).collect(),
            )),
            Value::Field(Field::NonUniform(array)) | Value::Array(array) => {
                visitor.visit_seq(SeqDeserializer::new(array_values(&array)))
            }
            Value::Faces(faces) => visitor.visit_seq(SeqDeserializer::new(
                faces
                    .into_iter()
                    .map(|face| {
                        Value::Tuple(face.into_iter().map(|i| Value::Number(Number::Integer(i))).collect())
                    })
                    .collect(),
            )),
            Value::List(items) => visitor.visit_seq(SeqDeserializer::from_items(items)),
            Value::Tuple(values) => visitor.visit_seq(SeqDeserializer::new(values)),
            Value::Dict(dict) => visitor.visit_map(MapDeserializer::new(dict)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Empty => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    /// A lone number is accepted where a sequence is expected, so `1e-06` and
    /// `(1e-06)` both fit a `Vec<f64>`.
    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            value @ Value::Number(_) => visitor.visit_seq(SeqDeserializer::new(vec![value])),
            value => de::Deserializer::deserialize_any(ValueDeserializer::new(value), visitor),
        }
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Text(variant) => visitor.visit_enum(EnumDeserializer {
                variant: unquote(variant),
                value: None,
            }),
            Value::Dict(dict) if dict.len() == 1 => {
                let Some((variant, value)) = dict.into_iter().next() else {
                    return Err(Error::custom("expected enum variant"));
                };
                visitor.visit_enum(EnumDeserializer {
                    variant,
                    value: Some(value),
                })
            }
            other => Err(Error::custom(format!(
                "expected enum, found {}",
                other.type_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple
        tuple_struct map struct identifier ignored_any
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimensions::DimensionSet;
    use serde::Deserialize;
    use std::collections::BTreeMap;

    fn dict(text: &[u8]) -> Value {
        Value::Dict(crate::located::parse_file(text).unwrap().entries)
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "camelCase")]
    enum Scheme {
        #[serde(rename = "Euler")]
        Euler,
        SteadyState,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "camelCase")]
    struct Patch {
        #[serde(rename = "type")]
        kind: String,
        value: Option<[f64; 3]>,
    }

    #[test]
    fn test_struct_from_dict() {
        let value = dict(b"type fixedValue; value uniform (1 0 0);");
        let patch: Patch = from_value(&value).unwrap();
        assert_eq!(
            patch,
            Patch {
                kind: "fixedValue".to_string(),
                value: Some([1.0, 0.0, 0.0]),
            }
        );
    }

    #[test]
    fn test_missing_optional_member() {
        let value = dict(b"type zeroGradient;");
        let patch: Patch = from_value(&value).unwrap();
        assert_eq!(patch.value, None);
    }

    #[test]
    fn test_unit_enum_from_word() {
        let scheme: Scheme = from_value(&Value::from("steadyState")).unwrap();
        assert_eq!(scheme, Scheme::SteadyState);
        let scheme: Scheme = from_value(&Value::from("Euler")).unwrap();
        assert_eq!(scheme, Scheme::Euler);
        assert!(from_value::<Scheme>(&Value::from("SteadyState")).is_err());
    }

    #[test]
    fn test_quotes_removed() {
        let text: String = from_value(&Value::from("\"constant\"")).unwrap();
        assert_eq!(text, "constant");
    }

    #[test]
    fn test_dimension_set_as_sequence() {
        let dims = Value::DimensionSet(DimensionSet::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]));
        let values: Vec<f64> = from_value(&dims).unwrap();
        assert_eq!(values, vec![0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_nonuniform_vectors() {
        let field = Value::Field(Field::NonUniform(NumericArray::vectors(&[
            [1.0, 2.0, 3.0],
            [4.0, 5.0, 6.0],
        ])));
        let values: Vec<[f64; 3]> = from_value(&field).unwrap();
        assert_eq!(values, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_label_array() {
        let array = Value::Array(NumericArray::labels(vec![3, 1, 2]));
        let values: Vec<i64> = from_value(&array).unwrap();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn test_dimensioned_as_map() {
        let value = crate::parse_data(b"nu [0 2 -1 0 0 0 0] 1e-05").unwrap();
        let map: BTreeMap<String, Value> = from_value(&value).unwrap();
        assert_eq!(map.get("name"), Some(&Value::from("nu")));
        assert_eq!(map.get("value"), Some(&Value::from(1e-05)));
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let result: Result<i64> = from_value(&Value::from("word"));
        assert!(result.is_err());
    }
}
