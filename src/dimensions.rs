//! Physical dimension sets and dimensioned quantities.
//!
//! A [`DimensionSet`] holds the exponents of the seven base units, written on
//! disk as `[mass length time temperature moles current luminousIntensity]`.
//! Addition and subtraction require identical dimensions; multiplication and
//! division add and subtract exponents:
//!
//! ```rust
//! use foamdict::DimensionSet;
//!
//! let velocity = DimensionSet::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0]);
//! let time = DimensionSet::new([0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
//! assert_eq!((velocity * time).to_string(), "DimensionSet(length=1)");
//! assert!((velocity + time).is_err());
//! ```

use crate::error::{Error, Result};
use crate::ser::format_compact;
use crate::tensor::Tensor;
use serde::Serialize;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

const NAMES: [&str; 7] = [
    "mass",
    "length",
    "time",
    "temperature",
    "moles",
    "current",
    "luminous_intensity",
];

/// Exponents over the seven SI base quantities.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionSet {
    pub mass: f64,
    pub length: f64,
    pub time: f64,
    pub temperature: f64,
    pub moles: f64,
    pub current: f64,
    pub luminous_intensity: f64,
}

impl DimensionSet {
    #[must_use]
    pub const fn new(c: [f64; 7]) -> Self {
        DimensionSet {
            mass: c[0],
            length: c[1],
            time: c[2],
            temperature: c[3],
            moles: c[4],
            current: c[5],
            luminous_intensity: c[6],
        }
    }

    /// Builds a set from up to seven leading components; the rest are zero.
    #[must_use]
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        if values.len() > 7 {
            return None;
        }
        let mut c = [0.0; 7];
        c[..values.len()].copy_from_slice(values);
        Some(DimensionSet::new(c))
    }

    #[must_use]
    pub const fn dimensionless() -> Self {
        DimensionSet::new([0.0; 7])
    }

    #[must_use]
    pub const fn to_array(&self) -> [f64; 7] {
        [
            self.mass,
            self.length,
            self.time,
            self.temperature,
            self.moles,
            self.current,
            self.luminous_intensity,
        ]
    }

    /// Returns `true` if every exponent is zero.
    #[must_use]
    pub fn is_dimensionless(&self) -> bool {
        self.to_array().iter().all(|&c| c == 0.0)
    }

    #[must_use]
    pub fn pow(&self, exponent: f64) -> Self {
        DimensionSet::new(self.to_array().map(|c| c * exponent))
    }

    fn zip(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let (a, b) = (self.to_array(), other.to_array());
        DimensionSet::new(std::array::from_fn(|i| f(a[i], b[i])))
    }

    fn require_same(self, other: Self, op: char) -> Result<Self> {
        if self == other {
            Ok(self)
        } else {
            Err(Error::invalid_value(format!(
                "cannot apply '{op}' to quantities of dimensions {self} and {other}"
            )))
        }
    }
}

impl fmt::Display for DimensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = NAMES
            .iter()
            .zip(self.to_array())
            .filter(|(_, c)| *c != 0.0)
            .map(|(name, c)| format!("{name}={}", format_compact(c)))
            .collect();
        write!(f, "DimensionSet({})", parts.join(", "))
    }
}

impl Add for DimensionSet {
    type Output = Result<DimensionSet>;

    fn add(self, other: Self) -> Self::Output {
        self.require_same(other, '+')
    }
}

impl Sub for DimensionSet {
    type Output = Result<DimensionSet>;

    fn sub(self, other: Self) -> Self::Output {
        self.require_same(other, '-')
    }
}

impl Mul for DimensionSet {
    type Output = DimensionSet;

    fn mul(self, other: Self) -> Self::Output {
        self.zip(other, |a, b| a + b)
    }
}

impl Div for DimensionSet {
    type Output = DimensionSet;

    fn div(self, other: Self) -> Self::Output {
        self.zip(other, |a, b| a - b)
    }
}

/// A tensor value tagged with physical dimensions and an optional name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dimensioned {
    pub value: Tensor,
    pub dimensions: DimensionSet,
    pub name: Option<String>,
}

impl Dimensioned {
    #[must_use]
    pub fn new(value: impl Into<Tensor>, dimensions: DimensionSet, name: Option<String>) -> Self {
        Dimensioned {
            value: value.into(),
            dimensions,
            name,
        }
    }

    fn combined_name(&self, other: &Dimensioned, glyph: char) -> Option<String> {
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => Some(format!("{a}{glyph}{b}")),
            _ => None,
        }
    }

    /// Raises the value and the dimensions to `exponent`.
    #[must_use]
    pub fn pow(&self, exponent: f64) -> Dimensioned {
        Dimensioned {
            value: self.value.map(|c| c.powf(exponent)),
            dimensions: self.dimensions.pow(exponent),
            name: self
                .name
                .as_ref()
                .map(|name| format!("pow({name},{})", format_compact(exponent))),
        }
    }

    /// Converts a dimensionless scalar quantity to a plain float.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the quantity has dimensions or is not a scalar.
    pub fn to_f64(&self) -> Result<f64> {
        if !self.dimensions.is_dimensionless() {
            return Err(Error::invalid_value(format!(
                "cannot convert quantity with dimensions {} to a number",
                self.dimensions
            )));
        }
        self.value
            .as_scalar()
            .ok_or_else(|| Error::invalid_value("cannot convert a non-scalar quantity to a number"))
    }
}

impl Add for Dimensioned {
    type Output = Result<Dimensioned>;

    fn add(self, other: Self) -> Self::Output {
        Ok(Dimensioned {
            value: self.value.zip_with(&other.value, |a, b| a + b)?,
            dimensions: (self.dimensions + other.dimensions)?,
            name: self.combined_name(&other, '+'),
        })
    }
}

impl Sub for Dimensioned {
    type Output = Result<Dimensioned>;

    fn sub(self, other: Self) -> Self::Output {
        Ok(Dimensioned {
            value: self.value.zip_with(&other.value, |a, b| a - b)?,
            dimensions: (self.dimensions - other.dimensions)?,
            name: self.combined_name(&other, '-'),
        })
    }
}

impl Mul for Dimensioned {
    type Output = Result<Dimensioned>;

    fn mul(self, other: Self) -> Self::Output {
        Ok(Dimensioned {
            value: self.value.zip_with(&other.value, |a, b| a * b)?,
            dimensions: self.dimensions * other.dimensions,
            name: self.combined_name(&other, '*'),
        })
    }
}

impl Div for Dimensioned {
    type Output = Result<Dimensioned>;

    fn div(self, other: Self) -> Self::Output {
        Ok(Dimensioned {
            value: self.value.zip_with(&other.value, |a, b| a / b)?,
            dimensions: self.dimensions / other.dimensions,
            name: self.combined_name(&other, '/'),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn velocity() -> DimensionSet {
        DimensionSet::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0])
    }

    #[test]
    fn test_display_omits_zero_components() {
        let g = DimensionSet::new([1.0, 1.0, -2.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(g.to_string(), "DimensionSet(mass=1, length=1, time=-2)");
        assert_eq!(DimensionSet::dimensionless().to_string(), "DimensionSet()");
    }

    #[test]
    fn test_from_slice_pads_with_zeros() {
        let set = DimensionSet::from_slice(&[0.0, 2.0, -1.0]).unwrap();
        assert_eq!(set.time, -1.0);
        assert_eq!(set.luminous_intensity, 0.0);
        assert!(DimensionSet::from_slice(&[0.0; 8]).is_none());
    }

    #[test]
    fn test_add_requires_equal_dimensions() {
        assert_eq!((velocity() + velocity()).unwrap(), velocity());
        assert!((velocity() - DimensionSet::dimensionless()).is_err());
    }

    #[test]
    fn test_mul_div_pow() {
        let area = DimensionSet::new([0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(velocity() * velocity() / area, DimensionSet::new([0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(area.pow(0.5).length, 1.0);
    }

    #[test]
    fn test_dimensionless_truthiness() {
        assert!(DimensionSet::dimensionless().is_dimensionless());
        assert!(!velocity().is_dimensionless());
    }

    #[test]
    fn test_dimensioned_names_combine_only_when_both_named() {
        let a = Dimensioned::new(2.0, velocity(), Some("a".to_string()));
        let b = Dimensioned::new(3.0, velocity(), Some("b".to_string()));
        let unnamed = Dimensioned::new(1.0, velocity(), None);

        let sum = (a.clone() + b.clone()).unwrap();
        assert_eq!(sum.name.as_deref(), Some("a+b"));
        assert_eq!(sum.value, Tensor::Scalar(5.0));

        let product = (a.clone() * b).unwrap();
        assert_eq!(product.name.as_deref(), Some("a*b"));
        assert_eq!(product.dimensions, velocity() * velocity());

        assert_eq!((a.clone() - unnamed).unwrap().name, None);
        assert_eq!(a.pow(2.0).name.as_deref(), Some("pow(a,2)"));
    }

    #[test]
    fn test_dimensioned_add_with_different_dimensions_fails() {
        let a = Dimensioned::new(1.0, velocity(), None);
        let b = Dimensioned::new(1.0, DimensionSet::dimensionless(), None);
        assert!((a + b).is_err());
    }

    #[test]
    fn test_to_f64_requires_dimensionless() {
        let plain = Dimensioned::new(0.5, DimensionSet::dimensionless(), None);
        assert_eq!(plain.to_f64().unwrap(), 0.5);
        let nu = Dimensioned::new(1e-5, velocity(), Some("nu".to_string()));
        assert!(nu.to_f64().is_err());
    }
}
