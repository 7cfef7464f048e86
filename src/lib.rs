//! # foamdict
//!
//! Reading and in-place editing of OpenFOAM dictionary and field files.
//!
//! ## What is an OpenFOAM dictionary?
//!
//! OpenFOAM stores case settings, boundary conditions and field data in a
//! brace-delimited keyword/value text format with optional binary payloads.
//! See [`syntax`] for the accepted grammar.
//!
//! ## Key Features
//!
//! - **Format-preserving edits**: changing one entry rewrites only that entry's
//!   bytes; comments, blank lines and formatting elsewhere stay untouched
//! - **Typed values**: dimension sets, dimensioned quantities, tensors, uniform
//!   and nonuniform fields, faces lists and packed numeric arrays
//! - **Binary payloads**: native-endian `i32`/`f32`/`f64` lists in files whose
//!   header says `format binary`
//! - **Transparent gzip** for `.gz` files
//! - **Serde**: values serialize to any serde format and deserialize into user
//!   types with [`from_value`]
//!
//! ## Quick Start
//!
//! ### Parsing text
//!
//! ```rust
//! use foamdict::{from_slice, parse_data, DimensionSet, Value};
//!
//! let file = from_slice(b"application simpleFoam;\nendTime 2000;\n").unwrap();
//! assert_eq!(file.get("application"), Some(&Value::from("simpleFoam")));
//!
//! let dims = parse_data(b"[1 1 -2 0 0 0 0]").unwrap();
//! assert_eq!(
//!     dims,
//!     Value::DimensionSet(DimensionSet::new([1.0, 1.0, -2.0, 0.0, 0.0, 0.0, 0.0]))
//! );
//! ```
//!
//! ### Editing a file
//!
//! ```rust
//! use foamdict::{Document, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("fvSchemes");
//! std::fs::write(&path, "// schemes\nddtSchemes\n{\n    default Euler;\n}\n").unwrap();
//!
//! let doc = Document::open(&path);
//! doc.set(["ddtSchemes", "default"], "steadyState").unwrap();
//!
//! let text = std::fs::read_to_string(&path).unwrap();
//! assert_eq!(text, "// schemes\nddtSchemes\n{\n    default steadyState;\n}\n");
//! ```
//!
//! ### Building values
//!
//! ```rust
//! use foamdict::{foam, to_vec, FileDict, Value};
//!
//! let mut file = FileDict::new();
//! file.entries.insert("solvers", foam!({ "p": { "solver": "PCG" } }));
//! let bytes = to_vec(&file, false).unwrap();
//! assert_eq!(bytes, b"solvers\n{\n    p\n    {\n        solver PCG;\n    }\n}\n\n");
//! ```

pub mod de;
pub mod dimensions;
pub mod document;
pub mod error;
pub mod field;
pub mod grammar;
pub mod index;
pub mod io;
pub mod located;
pub mod macros;
pub mod map;
pub mod options;
pub mod parsed;
pub mod path;
pub mod scan;
pub mod ser;
pub mod syntax;
pub mod tensor;
pub mod value;

pub use de::from_value;
pub use dimensions::{DimensionSet, Dimensioned};
pub use document::{Document, EditSession, SubDict};
pub use error::{Error, Result};
pub use field::{Field, NumericArray, NumericData};
pub use index::{ParseIndex, ParsedEntry, Slot};
pub use located::parse_located;
pub use map::{Dict, FileDict};
pub use options::{FoamOptions, Format};
pub use parsed::ParsedDocument;
pub use path::{resolve_within, KeywordPath};
pub use ser::{serialize_standalone, to_vec, Serializer};
pub use tensor::{Tensor, TensorKind};
pub use value::{KeywordEntry, ListItem, Number, Value};

use grammar::Parser;

/// Parses data syntax: one value, or a tuple of consecutive values.
///
/// # Examples
///
/// ```rust
/// use foamdict::{parse_data, Field, Tensor, Value};
///
/// let value = parse_data(b"uniform (1 0 0)").unwrap();
/// assert_eq!(value, Value::Field(Field::Uniform(Tensor::Vector([1.0, 0.0, 0.0]))));
/// ```
///
/// # Errors
///
/// Returns a parse error if the whole input is not valid data.
pub fn parse_data(input: &[u8]) -> Result<Value> {
    let parser = Parser::new(input);
    parser.complete(|pos| parser.data(pos))
}

/// Parses un-keyed top-level data, such as the body of `polyMesh/points`.
///
/// `format` selects how numeric list payloads are decoded.
///
/// # Examples
///
/// ```rust
/// use foamdict::{parse_standalone, Format, Value};
///
/// let value = parse_standalone(b"3(4 5 6)", Format::Ascii).unwrap();
/// let array = value.as_array().unwrap();
/// assert_eq!(array.len(), 3);
/// ```
///
/// # Errors
///
/// Returns a parse error if the whole input is not valid standalone data.
pub fn parse_standalone(input: &[u8], format: Format) -> Result<Value> {
    let parser = Parser::new(input).with_format(format);
    parser.complete(|pos| parser.standalone(pos))
}

/// Parses a whole file into a tree.
///
/// # Examples
///
/// ```rust
/// use foamdict::{from_slice, Value};
///
/// let file = from_slice(b"FoamFile { class dictionary; }\nflag;\n").unwrap();
/// assert_eq!(file.header().and_then(|h| h.get("class")), Some(&Value::from("dictionary")));
/// assert_eq!(file.get("flag"), Some(&Value::Empty));
/// ```
///
/// # Errors
///
/// Returns a syntax error when the input does not parse, or a semantic error for
/// a duplicate keyword or a second standalone block.
pub fn from_slice(input: &[u8]) -> Result<FileDict> {
    located::parse_file(input)
}
