//! Homogeneous numeric arrays and uniform/nonuniform fields.

use crate::error::{Error, Result};
use crate::tensor::{Tensor, TensorKind};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// Flat element storage of a [`NumericArray`].
///
/// ASCII integer lists decode to `I64`, binary integer lists to `I32`. Floats are
/// `F64` unless they came from (or are meant for) a single-precision binary payload.
#[derive(Clone, Debug, PartialEq)]
pub enum NumericData {
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl NumericData {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            NumericData::I32(v) => v.len(),
            NumericData::I64(v) => v.len(),
            NumericData::F32(v) => v.len(),
            NumericData::F64(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, NumericData::F32(_) | NumericData::F64(_))
    }

    /// Size in bytes of one item in a binary payload.
    #[must_use]
    pub const fn item_size(&self) -> usize {
        match self {
            NumericData::I32(_) | NumericData::F32(_) => 4,
            NumericData::I64(_) | NumericData::F64(_) => 8,
        }
    }

    #[must_use]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        match self {
            NumericData::I32(v) => v.get(index).map(|&x| f64::from(x)),
            NumericData::I64(v) => v.get(index).map(|&x| x as f64),
            NumericData::F32(v) => v.get(index).map(|&x| f64::from(x)),
            NumericData::F64(v) => v.get(index).copied(),
        }
    }

    #[must_use]
    pub fn to_f64(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.get_f64(i)).collect()
    }
}

/// A numeric array of shape `(n,)`, `(n,3)`, `(n,6)` or `(n,9)`.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericArray {
    kind: TensorKind,
    data: NumericData,
}

impl NumericArray {
    /// Wraps flat `data` as elements of `kind`.
    ///
    /// # Errors
    ///
    /// Fails if the flat length is not a multiple of the element size.
    pub fn new(kind: TensorKind, data: NumericData) -> Result<Self> {
        if data.len() % kind.components() != 0 {
            return Err(Error::invalid_value(format!(
                "{} values do not form whole {kind} elements",
                data.len()
            )));
        }
        Ok(NumericArray { kind, data })
    }

    #[must_use]
    pub fn scalars(values: Vec<f64>) -> Self {
        NumericArray {
            kind: TensorKind::Scalar,
            data: NumericData::F64(values),
        }
    }

    #[must_use]
    pub fn labels(values: Vec<i64>) -> Self {
        NumericArray {
            kind: TensorKind::Scalar,
            data: NumericData::I64(values),
        }
    }

    #[must_use]
    pub fn vectors(values: &[[f64; 3]]) -> Self {
        NumericArray {
            kind: TensorKind::Vector,
            data: NumericData::F64(values.iter().flatten().copied().collect()),
        }
    }

    /// Packs tensors of a single kind into a float64 array.
    ///
    /// # Errors
    ///
    /// Fails when the tensors do not all share one kind.
    pub fn from_tensors(tensors: &[Tensor]) -> Result<Self> {
        let kind = tensors.first().map_or(TensorKind::Scalar, Tensor::kind);
        if tensors.iter().any(|t| t.kind() != kind) {
            return Err(Error::invalid_value("tensors of mixed kinds"));
        }
        let flat = tensors.iter().flat_map(|t| t.components().to_vec()).collect();
        Ok(NumericArray {
            kind,
            data: NumericData::F64(flat),
        })
    }

    #[inline]
    #[must_use]
    pub const fn kind(&self) -> TensorKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn data(&self) -> &NumericData {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> NumericData {
        self.data
    }

    /// Number of elements (rows), not flat values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.kind.components()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element `index` as a tensor of this array's kind.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Tensor> {
        let n = self.kind.components();
        let row: Option<Vec<f64>> = (index * n..(index + 1) * n)
            .map(|i| self.data.get_f64(i))
            .collect();
        row.and_then(|values| Tensor::from_components(&values))
    }

    pub fn iter(&self) -> impl Iterator<Item = Tensor> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Converts to float64 storage, keeping the shape.
    #[must_use]
    pub fn to_f64(&self) -> NumericArray {
        NumericArray {
            kind: self.kind,
            data: NumericData::F64(self.data.to_f64()),
        }
    }

    /// Numeric equality that ignores storage width and treats NaN as equal to NaN.
    #[must_use]
    pub fn nan_eq(&self, other: &NumericArray) -> bool {
        self.kind == other.kind
            && self.data.len() == other.data.len()
            && (0..self.data.len()).all(|i| {
                match (self.data.get_f64(i), other.data.get_f64(i)) {
                    (Some(a), Some(b)) => a == b || (a.is_nan() && b.is_nan()),
                    _ => false,
                }
            })
    }
}

impl Serialize for NumericArray {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        match (&self.kind, &self.data) {
            (TensorKind::Scalar, NumericData::I32(v)) => {
                for x in v {
                    seq.serialize_element(x)?;
                }
            }
            (TensorKind::Scalar, NumericData::I64(v)) => {
                for x in v {
                    seq.serialize_element(x)?;
                }
            }
            _ => {
                for element in self.iter() {
                    seq.serialize_element(&element)?;
                }
            }
        }
        seq.end()
    }
}

/// Field data: one value for every location, or one value per location.
#[derive(Clone, Debug, PartialEq)]
pub enum Field {
    Uniform(Tensor),
    NonUniform(NumericArray),
}

impl Field {
    #[must_use]
    pub fn kind(&self) -> TensorKind {
        match self {
            Field::Uniform(t) => t.kind(),
            Field::NonUniform(a) => a.kind(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_uniform(&self) -> bool {
        matches!(self, Field::Uniform(_))
    }

    #[must_use]
    pub const fn as_uniform(&self) -> Option<&Tensor> {
        match self {
            Field::Uniform(t) => Some(t),
            Field::NonUniform(_) => None,
        }
    }

    #[must_use]
    pub const fn as_nonuniform(&self) -> Option<&NumericArray> {
        match self {
            Field::NonUniform(a) => Some(a),
            Field::Uniform(_) => None,
        }
    }

    /// NaN-aware equality.
    #[must_use]
    pub fn nan_eq(&self, other: &Field) -> bool {
        match (self, other) {
            (Field::Uniform(a), Field::Uniform(b)) => a.nan_eq(b),
            (Field::NonUniform(a), Field::NonUniform(b)) => a.nan_eq(b),
            _ => false,
        }
    }
}

impl From<Tensor> for Field {
    fn from(value: Tensor) -> Self {
        Field::Uniform(value)
    }
}

impl From<NumericArray> for Field {
    fn from(value: NumericArray) -> Self {
        Field::NonUniform(value)
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Field::Uniform(t) => t.serialize(serializer),
            Field::NonUniform(a) => a.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_partial_elements() {
        let data = NumericData::F64(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(NumericArray::new(TensorKind::Vector, data).is_err());
    }

    #[test]
    fn test_rows_as_tensors() {
        let array = NumericArray::vectors(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(array.len(), 2);
        assert_eq!(array.get(1), Some(Tensor::Vector([4.0, 5.0, 6.0])));
        assert_eq!(array.get(2), None);
        assert_eq!(array.iter().count(), 2);
    }

    #[test]
    fn test_nan_eq_across_widths() {
        let wide = NumericArray::scalars(vec![1.5, f64::NAN]);
        let narrow = NumericArray::new(TensorKind::Scalar, NumericData::F32(vec![1.5, f32::NAN])).unwrap();
        assert!(wide.nan_eq(&narrow));
        assert_ne!(wide, narrow);
    }

    #[test]
    fn test_from_tensors_requires_single_kind() {
        let mixed = [Tensor::Scalar(1.0), Tensor::Vector([0.0; 3])];
        assert!(NumericArray::from_tensors(&mixed).is_err());
        let array = NumericArray::from_tensors(&[Tensor::Vector([1.0; 3])]).unwrap();
        assert_eq!(array.kind(), TensorKind::Vector);
    }

    #[test]
    fn test_field_kind() {
        assert_eq!(Field::Uniform(Tensor::Vector([1.0, 0.0, 0.0])).kind(), TensorKind::Vector);
        assert!(!Field::NonUniform(NumericArray::scalars(vec![1.0])).is_uniform());
    }
}
