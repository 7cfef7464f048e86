//! Tensor values: scalars and 3, 6 or 9 component vectors.

use crate::error::{Error, Result};
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

/// Element shape of a tensor or field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TensorKind {
    Scalar,
    Vector,
    SymmTensor,
    Tensor,
}

impl TensorKind {
    /// All kinds in the order they are tried when a shape must be guessed.
    pub const ALL: [TensorKind; 4] = [
        TensorKind::Scalar,
        TensorKind::Vector,
        TensorKind::SymmTensor,
        TensorKind::Tensor,
    ];

    /// Number of components per element.
    #[inline]
    #[must_use]
    pub const fn components(self) -> usize {
        match self {
            TensorKind::Scalar => 1,
            TensorKind::Vector => 3,
            TensorKind::SymmTensor => 6,
            TensorKind::Tensor => 9,
        }
    }

    #[must_use]
    pub const fn from_components(n: usize) -> Option<Self> {
        match n {
            1 => Some(TensorKind::Scalar),
            3 => Some(TensorKind::Vector),
            6 => Some(TensorKind::SymmTensor),
            9 => Some(TensorKind::Tensor),
            _ => None,
        }
    }

    /// The name used inside `List<...>` tags.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            TensorKind::Scalar => "scalar",
            TensorKind::Vector => "vector",
            TensorKind::SymmTensor => "symmTensor",
            TensorKind::Tensor => "tensor",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        TensorKind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The volume field class for this element shape, e.g. `volVectorField`.
    #[must_use]
    pub const fn field_class(self) -> &'static str {
        match self {
            TensorKind::Scalar => "volScalarField",
            TensorKind::Vector => "volVectorField",
            TensorKind::SymmTensor => "volSymmTensorField",
            TensorKind::Tensor => "volTensorField",
        }
    }
}

impl fmt::Display for TensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scalar or a fixed-size vector/tensor literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Tensor {
    Scalar(f64),
    Vector([f64; 3]),
    SymmTensor([f64; 6]),
    Tensor([f64; 9]),
}

impl Tensor {
    #[must_use]
    pub const fn kind(&self) -> TensorKind {
        match self {
            Tensor::Scalar(_) => TensorKind::Scalar,
            Tensor::Vector(_) => TensorKind::Vector,
            Tensor::SymmTensor(_) => TensorKind::SymmTensor,
            Tensor::Tensor(_) => TensorKind::Tensor,
        }
    }

    /// Flat component slice; a scalar has one component.
    #[must_use]
    pub fn components(&self) -> &[f64] {
        match self {
            Tensor::Scalar(v) => std::slice::from_ref(v),
            Tensor::Vector(v) => v,
            Tensor::SymmTensor(v) => v,
            Tensor::Tensor(v) => v,
        }
    }

    /// Builds a tensor from 1, 3, 6 or 9 components.
    #[must_use]
    pub fn from_components(values: &[f64]) -> Option<Self> {
        match values.len() {
            1 => Some(Tensor::Scalar(values[0])),
            3 => values.try_into().ok().map(Tensor::Vector),
            6 => values.try_into().ok().map(Tensor::SymmTensor),
            9 => values.try_into().ok().map(Tensor::Tensor),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Tensor::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Tensor {
        let mapped: Vec<f64> = self.components().iter().map(|&c| f(c)).collect();
        Tensor::from_components(&mapped).unwrap_or(Tensor::Scalar(f64::NAN))
    }

    /// Combines two tensors component-wise, broadcasting scalars.
    pub fn zip_with(&self, other: &Tensor, f: impl Fn(f64, f64) -> f64) -> Result<Tensor> {
        match (self, other) {
            (Tensor::Scalar(a), _) => Ok(other.map(|b| f(*a, b))),
            (_, Tensor::Scalar(b)) => Ok(self.map(|a| f(a, *b))),
            _ if self.kind() == other.kind() => {
                let combined: Vec<f64> = self
                    .components()
                    .iter()
                    .zip(other.components())
                    .map(|(&a, &b)| f(a, b))
                    .collect();
                Tensor::from_components(&combined)
                    .ok_or_else(|| Error::invalid_value("tensor shape mismatch"))
            }
            _ => Err(Error::invalid_value(format!(
                "cannot combine {} with {}",
                self.kind(),
                other.kind()
            ))),
        }
    }

    /// Equality treating NaN components as equal to each other.
    #[must_use]
    pub fn nan_eq(&self, other: &Tensor) -> bool {
        self.kind() == other.kind()
            && self
                .components()
                .iter()
                .zip(other.components())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

impl From<f64> for Tensor {
    fn from(value: f64) -> Self {
        Tensor::Scalar(value)
    }
}

impl From<[f64; 3]> for Tensor {
    fn from(value: [f64; 3]) -> Self {
        Tensor::Vector(value)
    }
}

impl From<[f64; 6]> for Tensor {
    fn from(value: [f64; 6]) -> Self {
        Tensor::SymmTensor(value)
    }
}

impl From<[f64; 9]> for Tensor {
    fn from(value: [f64; 9]) -> Self {
        Tensor::Tensor(value)
    }
}

impl Serialize for Tensor {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Tensor::Scalar(v) => serializer.serialize_f64(*v),
            _ => {
                let components = self.components();
                let mut seq = serializer.serialize_seq(Some(components.len()))?;
                for c in components {
                    seq.serialize_element(c)?;
                }
                seq.end()
            }
        }
    }
}
