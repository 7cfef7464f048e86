//! Error types for parsing, serializing and editing OpenFOAM files.
//!
//! Parse errors carry the byte offset at which the grammar gave up together with
//! the 1-based line and column derived from it, plus a rendered context line with
//! a caret under the offending byte:
//!
//! ```text
//! parsing failed on line 3, column 9:
//! solver  PCG
//!         ^
//! Expected: ';'
//! ```
//!
//! ## Error Categories
//!
//! - **Syntax**: no grammar alternative matched
//! - **Semantic**: structurally valid input that is logically invalid (a tensor
//!   with 4 components, a duplicate keyword, a second standalone data block)
//! - **Lookup**: missing keywords, duplicate insertions, typed accessor mismatches
//! - **I/O**: missing or unreadable files, paths escaping a case root
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::{parse_data, Error};
//!
//! let err = parse_data(b"(1 2").unwrap_err();
//! assert!(matches!(err, Error::Syntax { line: 1, .. }));
//! ```

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Represents all possible errors raised by this crate.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// The backing file does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No grammar alternative matched
    #[error("parsing failed on line {line}, column {col}:\n{context}\nExpected: {expected}")]
    Syntax {
        offset: usize,
        line: usize,
        col: usize,
        expected: String,
        context: String,
    },

    /// Structurally valid input that is logically invalid
    #[error("invalid content on line {line}, column {col}:\n{context}\n{msg}")]
    Semantic {
        offset: usize,
        line: usize,
        col: usize,
        msg: String,
        context: String,
    },

    /// Keyword path absent
    #[error("keyword not found: {0}")]
    NotFound(String),

    /// A non-directive keyword was added twice in the same scope
    #[error("duplicate keyword: {0}")]
    DuplicateKey(String),

    /// Typed accessor used against an incompatible stored value
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    /// A derived path escapes its containment root
    #[error("path {} escapes root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    /// Splice range outside the current buffer
    #[error("byte range {start}..{end} out of bounds for buffer of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },

    /// Value unsuitable for the requested operation or position
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

/// Line, column and caret context for a byte offset.
struct Location {
    line: usize,
    col: usize,
    context: String,
}

const CONTEXT_RADIUS: usize = 60;

fn locate(input: &[u8], offset: usize) -> Location {
    let offset = offset.min(input.len());
    let before = &input[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |nl| nl + 1);
    let col = offset - line_start + 1;

    let line_end = input[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(input.len(), |i| offset + i);
    let window_start = line_start.max(offset.saturating_sub(CONTEXT_RADIUS));
    let window_end = line_end.min(offset + CONTEXT_RADIUS);
    let text: String = String::from_utf8_lossy(&input[window_start..window_end])
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let caret = " ".repeat(offset - window_start);

    Location {
        line,
        col,
        context: format!("{text}\n{caret}^"),
    }
}

impl Error {
    /// Creates a syntax error for `offset` in `input`, computing line, column and
    /// the caret context.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use foamdict::Error;
    ///
    /// let err = Error::syntax_at(b"a 1;\nb ;", 7, "value");
    /// assert!(err.to_string().contains("line 2, column 3"));
    /// ```
    pub fn syntax_at(input: &[u8], offset: usize, expected: impl Into<String>) -> Self {
        let loc = locate(input, offset);
        Error::Syntax {
            offset,
            line: loc.line,
            col: loc.col,
            expected: expected.into(),
            context: loc.context,
        }
    }

    /// Creates a semantic error for `offset` in `input`.
    pub fn semantic_at(input: &[u8], offset: usize, msg: impl Into<String>) -> Self {
        let loc = locate(input, offset);
        Error::Semantic {
            offset,
            line: loc.line,
            col: loc.col,
            msg: msg.into(),
            context: loc.context,
        }
    }

    /// Creates a type mismatch error for a typed accessor.
    pub fn type_mismatch(path: impl fmt::Display, expected: &str, found: &str) -> Self {
        Error::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn not_found(path: impl fmt::Display) -> Self {
        Error::NotFound(path.to_string())
    }

    pub fn duplicate_key(path: impl fmt::Display) -> Self {
        Error::DuplicateKey(path.to_string())
    }

    pub fn invalid_value<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidValue(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for file reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Byte offset of a parse error, if this is one.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax { offset, .. } | Error::Semantic { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Returns `true` for syntax and semantic parse failures.
    #[must_use]
    pub const fn is_parse_error(&self) -> bool {
        matches!(self, Error::Syntax { .. } | Error::Semantic { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_column_first_line() {
        let err = Error::syntax_at(b"abc def", 4, "';'");
        match err {
            Error::Syntax { line, col, .. } => {
                assert_eq!(line, 1);
                assert_eq!(col, 5);
            }
            _ => panic!("expected syntax error"),
        }
    }

    #[test]
    fn test_line_and_column_after_newlines() {
        let input = b"a 1;\n\nbad";
        let err = Error::semantic_at(input, 6, "duplicate");
        match err {
            Error::Semantic { line, col, .. } => {
                assert_eq!(line, 3);
                assert_eq!(col, 1);
            }
            _ => panic!("expected semantic error"),
        }
    }

    #[test]
    fn test_context_has_caret_under_offset() {
        let err = Error::syntax_at(b"solver  PCG\nnext", 8, "';'");
        let message = err.to_string();
        assert!(message.contains("solver  PCG\n        ^"));
        assert!(message.ends_with("Expected: ';'"));
    }

    #[test]
    fn test_offset_past_end_is_clamped() {
        let err = Error::syntax_at(b"abc", 10, "end of file");
        assert_eq!(err.offset(), Some(10));
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
