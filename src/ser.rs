//! OpenFOAM serialization.
//!
//! This module provides the [`Serializer`] that renders [`Value`]s back into
//! dictionary syntax. It is the inverse of the grammar: anything the parser
//! produces re-parses to an equal value.
//!
//! ## Overview
//!
//! - **Path-aware normalization**: under `internalField` and boundary `value`
//!   entries, plain numbers and numeric lists are written as fields; under
//!   `dimensions`, a short numeric list is written as a dimension set
//! - **Compact components**: tensor, field and dimension components drop the
//!   decimal point when integral, so `uniform (1 0 0)` stays byte-identical
//! - **Binary payloads**: with [`Format::Binary`], nonuniform fields and
//!   standalone arrays are written as raw native-endian bytes
//!
//! ## Usage
//!
//! ```rust
//! use foamdict::{FoamOptions, KeywordPath, Serializer, Value};
//!
//! let mut serializer = Serializer::new(FoamOptions::new());
//! serializer
//!     .serialize_entry(&Value::from(vec![1.0, 0.0, 0.0]), &KeywordPath::from("internalField"))
//!     .unwrap();
//! assert_eq!(serializer.into_inner(), b"internalField uniform (1 0 0);");
//! ```

use crate::dimensions::{DimensionSet, Dimensioned};
use crate::error::{Error, Result};
use crate::field::{Field, NumericArray, NumericData};
use crate::map::{Dict, FileDict};
use crate::options::{FoamOptions, Format};
use crate::path::KeywordPath;
use crate::scan::scan_token;
use crate::tensor::Tensor;
use crate::value::{ListItem, Number, Value};
use std::borrow::Cow;
use std::fmt::Debug;

/// Renders a float so that it re-parses as a float.
///
/// Non-finite values are spelled `nan`, `inf` and `-inf`.
#[must_use]
pub fn format_float(x: f64) -> String {
    float_repr(x, false)
}

/// Renders a tensor or field component: integral values print without a
/// decimal point.
#[must_use]
pub fn format_compact(x: f64) -> String {
    float_repr(x, true)
}

fn float_repr<T: Copy + Debug + Into<f64>>(x: T, compact: bool) -> String {
    let wide: f64 = x.into();
    if wide.is_nan() {
        "nan".to_string()
    } else if wide.is_infinite() {
        String::from(if wide > 0.0 { "inf" } else { "-inf" })
    } else if compact && wide.fract() == 0.0 && wide.abs() < 1e15 {
        #[allow(clippy::cast_possible_truncation)]
        let integral = wide as i64;
        integral.to_string()
    } else {
        format!("{x:?}")
    }
}

/// Returns `true` for `internalField` and `boundaryField/<patch>/<value-like>`.
#[must_use]
pub fn is_field_path(path: &KeywordPath) -> bool {
    match path.segments() {
        [name] => name == "internalField",
        [root, _, name] => {
            root == "boundaryField"
                && (name == "value"
                    || name == "gradient"
                    || name.ends_with("Value")
                    || name.ends_with("Gradient"))
        }
        _ => false,
    }
}

fn is_dimensions_path(path: &KeywordPath) -> bool {
    matches!(path.segments(), [name] if name == "dimensions")
}

fn plain_numbers(items: &[ListItem]) -> Option<Vec<f64>> {
    items
        .iter()
        .map(|item| match item {
            ListItem::Value(Value::Number(n)) => Some(n.as_f64()),
            _ => None,
        })
        .collect()
}

fn shaped_numbers(items: &[ListItem]) -> Option<NumericArray> {
    let tensors: Option<Vec<Tensor>> = items
        .iter()
        .map(|item| match item {
            ListItem::Value(Value::List(inner)) => {
                let values = plain_numbers(inner)?;
                if matches!(values.len(), 3 | 6 | 9) {
                    Tensor::from_components(&values)
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect();
    NumericArray::from_tensors(&tensors?).ok()
}

/// Rewrites plain numbers and lists into the typed form their position implies.
///
/// Values that need no rewriting are borrowed unchanged.
#[must_use]
pub fn normalize<'v>(value: &'v Value, path: &KeywordPath, options: &FoamOptions) -> Cow<'v, Value> {
    if is_dimensions_path(path) {
        if let Value::List(items) = value {
            if let Some(dims) = plain_numbers(items).and_then(|n| DimensionSet::from_slice(&n)) {
                return Cow::Owned(Value::DimensionSet(dims));
            }
        }
        return Cow::Borrowed(value);
    }
    if !is_field_path(path) {
        return Cow::Borrowed(value);
    }

    let field = match value {
        Value::Number(n) => Field::Uniform(Tensor::Scalar(n.as_f64())),
        Value::List(items) => {
            if let Some(values) = plain_numbers(items) {
                match Tensor::from_components(&values) {
                    Some(tensor) if values.len() > 1 && !options.is_scalar_class() => {
                        Field::Uniform(tensor)
                    }
                    _ => Field::NonUniform(NumericArray::scalars(values)),
                }
            } else if let Some(array) = shaped_numbers(items) {
                Field::NonUniform(array)
            } else {
                return Cow::Borrowed(value);
            }
        }
        Value::Array(array) if array.data().is_float() => Field::NonUniform(array.clone()),
        Value::Array(array) => Field::NonUniform(array.to_f64()),
        _ => return Cow::Borrowed(value),
    };
    Cow::Owned(Value::Field(field))
}

fn is_quoted(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

fn is_single_token(s: &str) -> bool {
    matches!(scan_token(s.as_bytes(), 0), Ok((_, end)) if end == s.len())
}

/// The OpenFOAM serializer.
///
/// Output is bytes rather than a string because binary payloads are embedded
/// verbatim.
pub struct Serializer {
    output: Vec<u8>,
    options: FoamOptions,
    standalone: bool,
}

impl Serializer {
    pub fn new(options: FoamOptions) -> Self {
        Serializer {
            output: Vec::with_capacity(256),
            options,
            standalone: false,
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.output
    }

    #[must_use]
    pub fn options(&self) -> &FoamOptions {
        &self.options
    }

    #[inline]
    fn push(&mut self, s: &str) {
        self.output.extend_from_slice(s.as_bytes());
    }

    fn write_indent(&mut self, depth: usize) {
        let width = depth * self.options.indent;
        self.output.extend(std::iter::repeat(b' ').take(width));
    }

    fn write_text(&mut self, s: &str) {
        if is_quoted(s) || is_single_token(s) {
            self.push(s);
            return;
        }
        self.output.push(b'"');
        for ch in s.chars() {
            match ch {
                '"' => self.push("\\\""),
                '\\' => self.push("\\\\"),
                _ => {
                    let mut buf = [0u8; 4];
                    self.push(ch.encode_utf8(&mut buf));
                }
            }
        }
        self.output.push(b'"');
    }

    fn write_tensor(&mut self, tensor: &Tensor) {
        match tensor {
            Tensor::Scalar(x) => self.push(&format_compact(*x)),
            other => {
                self.output.push(b'(');
                for (i, x) in other.components().iter().enumerate() {
                    if i > 0 {
                        self.output.push(b' ');
                    }
                    self.push(&format_compact(*x));
                }
                self.output.push(b')');
            }
        }
    }

    fn write_dimension_set(&mut self, dims: &DimensionSet) {
        self.output.push(b'[');
        for (i, x) in dims.to_array().iter().enumerate() {
            if i > 0 {
                self.output.push(b' ');
            }
            self.push(&format_compact(*x));
        }
        self.output.push(b']');
    }

    fn write_dimensioned(&mut self, dimensioned: &Dimensioned) {
        if let Some(name) = &dimensioned.name {
            self.write_text(name);
            self.output.push(b' ');
        }
        self.write_dimension_set(&dimensioned.dimensions);
        self.output.push(b' ');
        self.write_tensor(&dimensioned.value);
    }

    fn write_number_at(&mut self, data: &NumericData, index: usize, compact: bool) {
        let rendered = match data {
            NumericData::I32(v) => v[index].to_string(),
            NumericData::I64(v) => v[index].to_string(),
            NumericData::F32(v) => float_repr(v[index], compact),
            NumericData::F64(v) => float_repr(v[index], compact),
        };
        self.push(&rendered);
    }

    /// `N(a b c)` or `N((a b c) (d e f))`.
    fn write_ascii_array(&mut self, array: &NumericArray, compact: bool) {
        let components = array.kind().components();
        self.push(&array.len().to_string());
        self.output.push(b'(');
        for row in 0..array.len() {
            if row > 0 {
                self.output.push(b' ');
            }
            if components > 1 {
                self.output.push(b'(');
            }
            for c in 0..components {
                if c > 0 {
                    self.output.push(b' ');
                }
                self.write_number_at(array.data(), row * components + c, compact);
            }
            if components > 1 {
                self.output.push(b')');
            }
        }
        self.output.push(b')');
    }

    /// `N(` raw bytes `)`. Integers are packed as int32 when `labels` is set and
    /// widened to float64 otherwise.
    fn write_binary_array(&mut self, array: &NumericArray, labels: bool) -> Result<()> {
        self.push(&array.len().to_string());
        self.output.push(b'(');
        match array.data() {
            NumericData::F64(values) => {
                for x in values {
                    self.output.extend_from_slice(&x.to_ne_bytes());
                }
            }
            NumericData::F32(values) => {
                for x in values {
                    self.output.extend_from_slice(&x.to_ne_bytes());
                }
            }
            NumericData::I32(values) => {
                for &x in values {
                    if labels {
                        self.output.extend_from_slice(&x.to_ne_bytes());
                    } else {
                        self.output.extend_from_slice(&f64::from(x).to_ne_bytes());
                    }
                }
            }
            NumericData::I64(values) => {
                for &x in values {
                    if labels {
                        let narrow = i32::try_from(x).map_err(|_| {
                            Error::invalid_value(format!("label {x} does not fit in a binary int32"))
                        })?;
                        self.output.extend_from_slice(&narrow.to_ne_bytes());
                    } else {
                        #[allow(clippy::cast_precision_loss)]
                        let wide = x as f64;
                        self.output.extend_from_slice(&wide.to_ne_bytes());
                    }
                }
            }
        }
        self.output.push(b')');
        Ok(())
    }

    fn write_field(&mut self, field: &Field) -> Result<()> {
        match field {
            Field::Uniform(tensor) => {
                self.push("uniform ");
                self.write_tensor(tensor);
            }
            Field::NonUniform(array) => {
                self.push("nonuniform List<");
                self.push(array.kind().name());
                self.push("> ");
                if self.options.format == Format::Binary {
                    self.write_binary_array(array, false)?;
                } else {
                    self.write_ascii_array(array, true);
                }
            }
        }
        Ok(())
    }

    fn write_faces(&mut self, faces: &[Vec<i64>]) {
        self.push(&faces.len().to_string());
        self.output.push(b'(');
        for (i, face) in faces.iter().enumerate() {
            if i > 0 {
                self.output.push(b' ');
            }
            self.push(&face.len().to_string());
            self.output.push(b'(');
            let indices: Vec<String> = face.iter().map(i64::to_string).collect();
            self.push(&indices.join(" "));
            self.output.push(b')');
        }
        self.output.push(b')');
    }

    fn write_list(&mut self, items: &[ListItem]) -> Result<()> {
        self.output.push(b'(');
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push(b' ');
            }
            match item {
                ListItem::Value(value) => self.write(value, None)?,
                ListItem::Entry(entry) => {
                    self.write(&entry.keyword, None)?;
                    self.output.push(b' ');
                    self.write(&entry.value, None)?;
                    if !entry.value.is_dict() {
                        self.output.push(b';');
                    }
                }
            }
        }
        self.output.push(b')');
        Ok(())
    }

    fn write_inline_dict(&mut self, dict: &Dict, path: Option<&KeywordPath>) -> Result<()> {
        self.output.push(b'{');
        for (i, (key, value)) in dict.iter().enumerate() {
            if i > 0 {
                self.output.push(b' ');
            }
            let child = path.map(|p| p.child(key.as_str()));
            self.write_entry(key, value, child.as_ref())?;
        }
        self.output.push(b'}');
        Ok(())
    }

    fn write_entry(&mut self, key: &str, value: &Value, path: Option<&KeywordPath>) -> Result<()> {
        self.push(key);
        match value {
            Value::Empty => self.output.push(b';'),
            Value::Dict(_) => {
                self.output.push(b' ');
                self.write(value, path)?;
            }
            _ => {
                self.output.push(b' ');
                self.write(value, path)?;
                self.output.push(if key.starts_with('#') { b'\n' } else { b';' });
            }
        }
        Ok(())
    }

    /// Writes `value`, normalized for `path` when one is given.
    fn write(&mut self, value: &Value, path: Option<&KeywordPath>) -> Result<()> {
        let value = match path {
            Some(path) => normalize(value, path, &self.options),
            None => Cow::Borrowed(value),
        };
        match value.as_ref() {
            Value::Empty => {}
            Value::Number(Number::Integer(i)) => self.push(&i.to_string()),
            Value::Number(Number::Float(x)) => self.push(&format_float(*x)),
            Value::Switch(b) => self.push(if *b { "yes" } else { "no" }),
            Value::Text(s) => self.write_text(s),
            Value::DimensionSet(dims) => self.write_dimension_set(dims),
            Value::Dimensioned(dimensioned) => self.write_dimensioned(dimensioned),
            Value::Field(field) => self.write_field(field)?,
            Value::Array(array) => {
                if self.standalone && self.options.format == Format::Binary {
                    self.write_binary_array(array, true)?;
                } else {
                    self.write_ascii_array(array, false);
                }
            }
            Value::Faces(faces) => self.write_faces(faces),
            Value::List(items) => self.write_list(items)?,
            Value::Dict(dict) => self.write_inline_dict(dict, path)?,
            Value::Tuple(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        self.output.push(b' ');
                    }
                    self.write(v, None)?;
                }
            }
        }
        Ok(())
    }

    /// Renders `value` as data in the position named by `path`.
    ///
    /// # Errors
    ///
    /// Fails when an integer array cannot be packed as binary int32.
    pub fn serialize(&mut self, value: &Value, path: &KeywordPath) -> Result<()> {
        self.write(value, Some(path))
    }

    /// Renders a single entry: `key value;`, `key;`, `key {...}` or a
    /// `#directive value` line. The keyword is the last segment of `path`.
    ///
    /// # Errors
    ///
    /// Fails for the root path, which has no keyword.
    pub fn serialize_entry(&mut self, value: &Value, path: &KeywordPath) -> Result<()> {
        let key = path
            .last()
            .ok_or_else(|| Error::invalid_value("an entry needs a keyword"))?;
        self.write_entry(key, value, Some(path))
    }

    /// Renders un-keyed top-level data.
    ///
    /// # Errors
    ///
    /// Fails when an integer array cannot be packed as binary int32.
    pub fn serialize_standalone(&mut self, value: &Value) -> Result<()> {
        self.standalone = true;
        let result = self.write(value, None);
        self.standalone = false;
        result
    }

    /// Writes dictionary entries one per line, nested dictionaries as indented
    /// brace blocks.
    fn write_block(&mut self, dict: &Dict, path: &KeywordPath, depth: usize) -> Result<()> {
        for (key, value) in dict.iter() {
            let child = path.child(key.as_str());
            self.write_indent(depth);
            if let Value::Dict(sub) = value {
                self.push(key);
                self.output.push(b'\n');
                self.write_indent(depth);
                self.push("{\n");
                self.write_block(sub, &child, depth + 1)?;
                self.write_indent(depth);
                self.push("}\n");
                if depth == 0 {
                    self.output.push(b'\n');
                }
            } else {
                self.write_entry(key, value, Some(&child))?;
                if !key.starts_with('#') {
                    self.output.push(b'\n');
                }
            }
        }
        Ok(())
    }

    /// Renders a whole file.
    ///
    /// # Errors
    ///
    /// Fails when an integer array cannot be packed as binary int32.
    pub fn serialize_file(&mut self, file: &FileDict) -> Result<()> {
        self.write_block(&file.entries, &KeywordPath::root(), 0)?;
        if let Some(standalone) = &file.standalone {
            self.serialize_standalone(standalone)?;
            self.output.push(b'\n');
        }
        Ok(())
    }
}

/// The header written into new files.
#[must_use]
pub fn default_header(class: &str) -> Dict {
    let mut header = Dict::new();
    header.insert("version", Value::from(2.0));
    header.insert("format", Value::from("ascii"));
    header.insert("class", Value::from(class));
    header
}

/// The `vol*Field` class implied by an `internalField` value, if any.
#[must_use]
pub fn infer_field_class(internal_field: &Value) -> Option<&'static str> {
    let options = FoamOptions::new();
    match normalize(internal_field, &KeywordPath::from("internalField"), &options).as_ref() {
        Value::Field(field) => Some(field.kind().field_class()),
        _ => None,
    }
}

/// Serializes standalone data with the given options.
///
/// # Errors
///
/// Fails when an integer array cannot be packed as binary int32.
pub fn serialize_standalone(value: &Value, options: &FoamOptions) -> Result<Vec<u8>> {
    let mut serializer = Serializer::new(options.clone());
    serializer.serialize_standalone(value)?;
    Ok(serializer.into_inner())
}

/// Serializes a whole file.
///
/// With `ensure_header` set and no `FoamFile` entry present, a default header
/// is synthesized first; its class is inferred from `internalField`. Format and
/// class otherwise come from the file's own header.
///
/// # Errors
///
/// Fails when an integer array cannot be packed as binary int32.
pub fn to_vec(file: &FileDict, ensure_header: bool) -> Result<Vec<u8>> {
    let with_header;
    let file = if ensure_header && file.header().is_none() {
        let class = file
            .get("internalField")
            .and_then(infer_field_class)
            .unwrap_or("dictionary");
        let mut entries = Dict::with_capacity(file.entries.len() + 1);
        entries.insert("FoamFile", Value::Dict(default_header(class)));
        for (key, value) in file.entries.iter() {
            entries.insert(key.clone(), value.clone());
        }
        with_header = FileDict {
            entries,
            standalone: file.standalone.clone(),
        };
        &with_header
    } else {
        file
    };

    let options = FoamOptions::from_header(file.header());
    let mut serializer = Serializer::new(options);
    serializer.serialize_file(file)?;
    Ok(serializer.into_inner())
}

/// Renders a value in data position with default options.
///
/// # Errors
///
/// Fails when the rendering is not valid UTF-8, which cannot happen for
/// ASCII output.
pub fn to_string(value: &Value) -> Result<String> {
    let mut serializer = Serializer::new(FoamOptions::new());
    serializer.write(value, None)?;
    String::from_utf8(serializer.into_inner()).map_err(Error::custom)
}
