//! The OpenFOAM dictionary format as read and written by this crate.
//!
//! This module holds no code; it documents the accepted syntax.
//!
//! # Files
//!
//! A file is a sequence of keyword entries, optionally interrupted by one block
//! of un-keyed ("standalone") data, as in `polyMesh/points`:
//!
//! ```text
//! FoamFile
//! {
//!     version     2.0;
//!     format      ascii;
//!     class       volVectorField;
//!     location    "0";
//!     object      U;
//! }
//!
//! dimensions      [0 1 -1 0 0 0 0];
//! internalField   uniform (0 0 0);
//!
//! boundaryField
//! {
//!     inlet
//!     {
//!         type    fixedValue;
//!         value   uniform (1 0 0);
//!     }
//!     #include "walls"
//! }
//! ```
//!
//! The `FoamFile` header is an ordinary sub-dictionary. Its `format` entry
//! switches numeric lists after it to binary decoding, and its `class` entry
//! decides whether a short list under `internalField` is written as a uniform
//! tensor or a nonuniform scalar list.
//!
//! # Whitespace and comments
//!
//! Spaces, tabs, newlines, `// line comments` and `/* block comments */` may
//! appear between any two tokens. An unterminated block comment is an error.
//!
//! # Entries
//!
//! | Form | Meaning |
//! |------|---------|
//! | `key value;` | a keyword mapped to data |
//! | `key v1 v2 v3;` | a keyword mapped to a tuple |
//! | `key;` | a keyword with no data |
//! | `key { ... }` | a sub-dictionary |
//! | `#directive args` | a directive, ended by the newline; may repeat |
//!
//! Keys are unique within one scope, except directives. A numeric token is not
//! a valid keyword.
//!
//! # Data
//!
//! Each data item is tried in this order; the first that matches wins:
//!
//! | Production | Example |
//! |------------|---------|
//! | Field | `uniform 1`, `uniform (1 0 0)`, `nonuniform List<scalar> 2(1 2)` |
//! | List | `(a b c)`, `3(1 2 3)`, `2{0}`, `(inlet { type patch; })` |
//! | Dimensioned | `nu [0 2 -1 0 0 0 0] 1e-05` |
//! | Dimension set | `[0 1 -1 0 0 0 0]`, `[0 2 -1]` |
//! | Number | `42`, `-1.5e-3`, `nan`, `-inf` |
//! | Switch | `yes`, `no`, `on`, `off`, `true`, `false` |
//! | Token | `simpleFoam`, `"quoted string"`, `$var`, `Gauss linear` (as a tuple) |
//!
//! Dimension sets have at most seven exponents, in the order mass, length,
//! time, temperature, moles, current, luminous intensity. Missing trailing
//! exponents are zero.
//!
//! A tensor is a bare number (scalar) or 3, 6 or 9 parenthesized components
//! (vector, symmetric tensor, tensor). After `uniform`, any other component
//! count of nine or fewer is an error rather than a plain list.
//!
//! # Numeric lists
//!
//! In ASCII files a numeric list is `N(...)` with `N` elements, each a number
//! or a parenthesized tensor of the declared kind. The count prefix is
//! optional; `N{x}` repeats one value.
//!
//! In binary files the parentheses enclose `N` elements of raw native-endian
//! `i32`, `f32` or `f64` values with no separators. The element type is not
//! recorded in the file: integers are tried before floats, and `f64` before
//! `f32`.
//!
//! # Faces
//!
//! Mesh face lists are `N(3(a b c) 4(a b c d) ...)`: each face is a counted
//! group of three or four point labels.
//!
//! # Serialized output
//!
//! Written entries follow the layout OpenFOAM itself produces:
//!
//! - scalars use the shortest representation that reads back exactly
//! - a dictionary opens its brace on the line after its keyword
//! - nested entries are indented four spaces per level
//! - a top-level dictionary is followed by a blank line
//!
//! Text that would not read back as one token is quoted; text that is already
//! quoted is kept as is.
