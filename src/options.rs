//! Configuration options for serialization.
//!
//! - [`FoamOptions`]: main configuration struct
//! - [`Format`]: ASCII or packed binary numeric payloads
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::{serialize_standalone, Format, FoamOptions, NumericArray, Value};
//!
//! let points = Value::Array(NumericArray::vectors(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]));
//!
//! let ascii = serialize_standalone(&points, &FoamOptions::new()).unwrap();
//! assert_eq!(ascii, b"2((0.0 0.0 0.0) (1.0 0.0 0.0))");
//!
//! let binary = serialize_standalone(&points, &FoamOptions::new().with_format(Format::Binary)).unwrap();
//! assert_eq!(binary.len(), "2(".len() + 2 * 3 * 8 + ")".len());
//! ```

use crate::error::{Error, Result};
use crate::map::Dict;
use crate::value::Value;
use std::fmt;
use std::str::FromStr;

/// Encoding of numeric list payloads, as named by the header's `format` entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Ascii,
    Binary,
}

impl Format {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Format::Ascii => "ascii",
            Format::Binary => "binary",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Format::Binary)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ascii" => Ok(Format::Ascii),
            "binary" => Ok(Format::Binary),
            other => Err(Error::invalid_value(format!("unknown format '{other}'"))),
        }
    }
}

/// Configuration options for serialization.
///
/// Documents derive their options from the `FoamFile` header; free functions
/// take them explicitly.
///
/// # Examples
///
/// ```rust
/// use foamdict::{FoamOptions, Format};
///
/// let options = FoamOptions::new()
///     .with_format(Format::Binary)
///     .with_class("volVectorField")
///     .with_indent(2);
/// assert!(options.format.is_binary());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct FoamOptions {
    pub format: Format,
    /// Header class, consulted when deciding between uniform and nonuniform fields
    pub class: Option<String>,
    /// Spaces per nesting level for entries written by a document
    pub indent: usize,
}

impl Default for FoamOptions {
    fn default() -> Self {
        FoamOptions {
            format: Format::Ascii,
            class: None,
            indent: 4,
        }
    }
}

impl FoamOptions {
    /// Creates default options (ascii, no class, 4-space indent).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Reads `format` and `class` out of a `FoamFile` header dictionary.
    ///
    /// Unknown formats fall back to ascii.
    #[must_use]
    pub fn from_header(header: Option<&Dict>) -> Self {
        let mut options = FoamOptions::new();
        if let Some(header) = header {
            if let Some(format) = header.get("format").and_then(Value::as_unquoted_str) {
                options.format = format.parse().unwrap_or_default();
            }
            options.class = header
                .get("class")
                .and_then(Value::as_unquoted_str)
                .map(str::to_string);
        }
        options
    }

    /// Returns `true` if the header class names a scalar field.
    #[must_use]
    pub fn is_scalar_class(&self) -> bool {
        self.class.as_deref().is_some_and(|c| c.contains("Scalar"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!("binary".parse::<Format>().unwrap(), Format::Binary);
        assert!("hex".parse::<Format>().is_err());
        assert_eq!(Format::Ascii.to_string(), "ascii");
    }

    #[test]
    fn test_from_header() {
        let mut header = Dict::new();
        header.insert("format", Value::from("binary"));
        header.insert("class", Value::from("volScalarField"));
        let options = FoamOptions::from_header(Some(&header));
        assert_eq!(options.format, Format::Binary);
        assert!(options.is_scalar_class());
        assert_eq!(options.indent, 4);
    }

    #[test]
    fn test_from_missing_header() {
        assert_eq!(FoamOptions::from_header(None), FoamOptions::default());
    }
}
