//! The document façade: a lazily parsed, cached, editable view of one file.
//!
//! A [`Document`] reads and parses its file on first access and caches the
//! result. Outside an edit session every access re-reads the file and reuses
//! the cached parse when the bytes are unchanged. Mutations go through an edit
//! session; the buffer is written back once, when the outermost session
//! closes, and only if something changed.
//!
//! ## Examples
//!
//! ```rust
//! use foamdict::{Document, Value};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let doc = Document::open(dir.path().join("controlDict"));
//!
//! {
//!     let session = doc.edit().unwrap();
//!     session.set("application", "simpleFoam").unwrap();
//!     session.set(["solvers", "p", "solver"], "GAMG").unwrap();
//! } // written here
//!
//! assert_eq!(doc.get("application").unwrap(), Value::from("simpleFoam"));
//! assert_eq!(doc.keys().unwrap(), vec!["application", "solvers"]);
//! assert!(doc.contains("FoamFile").unwrap());
//! ```

use crate::dimensions::DimensionSet;
use crate::error::{Error, Result};
use crate::field::Field;
use crate::io;
use crate::map::{Dict, FileDict};
use crate::options::{FoamOptions, Format};
use crate::parsed::ParsedDocument;
use crate::path::{resolve_within, KeywordPath};
use crate::ser::{default_header, is_field_path, normalize};
use crate::value::Value;
use log::{debug, warn};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    parsed: Option<ParsedDocument>,
    exists: bool,
    depth: usize,
}

/// An OpenFOAM dictionary or field file.
///
/// Paths are anything convertible into a [`KeywordPath`]: a single keyword,
/// an array of keywords, or `()` for the standalone data block.
#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    indent: usize,
    state: Mutex<State>,
}

impl Document {
    /// Opens `path` lazily; nothing is read until first access.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Document {
            path: path.into(),
            indent: FoamOptions::default().indent,
            state: Mutex::new(State::default()),
        }
    }

    /// Opens `relative` inside `root`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutsideRoot`] if `relative` escapes `root`.
    pub fn open_in(root: impl AsRef<Path>, relative: impl AsRef<Path>) -> Result<Self> {
        resolve_within(root.as_ref(), relative.as_ref()).map(Document::open)
    }

    /// Spaces per nesting level for inserted entries.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Brings the cache up to date with the file on disk.
    ///
    /// Inside a session the cache is authoritative and the file is not read.
    fn load(&self, state: &mut State) -> Result<()> {
        if state.depth > 0 && state.parsed.is_some() {
            return Ok(());
        }
        match io::read(&self.path) {
            Ok(bytes) => {
                state.exists = true;
                let cached = state.parsed.as_ref().is_some_and(|p| p.contents() == bytes);
                if cached {
                    debug!("reusing cached parse of {}", self.path.display());
                } else {
                    debug!("parsing {}", self.path.display());
                    state.parsed = Some(ParsedDocument::parse(bytes)?.with_indent(self.indent));
                }
            }
            Err(Error::FileNotFound(_)) => {
                state.exists = false;
                state.parsed = Some(ParsedDocument::empty().with_indent(self.indent));
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn read_with<T>(&self, f: impl FnOnce(&ParsedDocument) -> T) -> Result<T> {
        let mut state = self.lock();
        self.load(&mut state)?;
        if state.depth == 0 && !state.exists {
            return Err(Error::FileNotFound(self.path.clone()));
        }
        match &state.parsed {
            Some(parsed) => Ok(f(parsed)),
            None => Err(Error::FileNotFound(self.path.clone())),
        }
    }

    fn write_with<T>(&self, f: impl FnOnce(&mut ParsedDocument) -> Result<T>) -> Result<T> {
        self.begin_edit()?;
        let result = {
            let mut state = self.lock();
            let indent = self.indent;
            let parsed = state
                .parsed
                .get_or_insert_with(|| ParsedDocument::empty().with_indent(indent));
            f(parsed)
        };
        let closed = self.end_edit();
        let value = result?;
        closed?;
        Ok(value)
    }

    /// Opens an edit session, returning a guard that closes it on drop.
    ///
    /// Sessions nest; the file is written when the outermost one closes.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn edit(&self) -> Result<EditSession<'_>> {
        self.begin_edit()?;
        Ok(EditSession {
            document: self,
            open: true,
        })
    }

    /// Opens an edit session without a guard. Pair with [`end_edit`](Self::end_edit).
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn begin_edit(&self) -> Result<()> {
        let mut state = self.lock();
        if state.depth == 0 {
            self.load(&mut state)?;
        }
        state.depth += 1;
        Ok(())
    }

    /// Closes an edit session, writing the file if this was the outermost one
    /// and something changed.
    ///
    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn end_edit(&self) -> Result<()> {
        let mut state = self.lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth > 0 {
            return Ok(());
        }
        let Some(parsed) = state.parsed.as_mut().filter(|p| p.is_modified()) else {
            return Ok(());
        };
        io::write(&self.path, parsed.contents())?;
        parsed.mark_saved();
        debug!("wrote {} ({} bytes)", self.path.display(), parsed.contents().len());
        state.exists = true;
        Ok(())
    }

    /// Writes the default header into a document that has no entries yet.
    fn ensure_header(&self, parsed: &mut ParsedDocument, path: &KeywordPath) -> Result<()> {
        let writes_header = path.segments().first().is_some_and(|s| s == "FoamFile");
        if writes_header || !parsed.index().is_empty() {
            return Ok(());
        }
        let mut header = default_header("dictionary");
        if let Some(dir) = self.path.parent().and_then(Path::file_name) {
            header.insert("location", Value::from(format!("\"{}\"", dir.to_string_lossy())));
        }
        if let Some(name) = self.path.file_name() {
            let name = name.to_string_lossy();
            let object = name.strip_suffix(".gz").unwrap_or(&name);
            header.insert("object", Value::from(object));
        }
        parsed.put(&KeywordPath::from("FoamFile"), &Value::Dict(header))
    }

    /// Upgrades a `dictionary` class to the field class implied by `value`.
    fn hint_field_class(parsed: &mut ParsedDocument, path: &KeywordPath, value: &Value) -> Result<()> {
        if !is_field_path(path) || parsed.options().class.as_deref() != Some("dictionary") {
            return Ok(());
        }
        if let Value::Field(field) = normalize(value, path, &FoamOptions::new()).as_ref() {
            parsed.put(
                &KeywordPath::from(["FoamFile", "class"]),
                &Value::from(field.kind().field_class()),
            )?;
        }
        Ok(())
    }

    /// The value at `path`; a sub-dictionary is returned as [`Value::Dict`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing path and
    /// [`Error::FileNotFound`] if the file does not exist.
    pub fn get(&self, path: impl Into<KeywordPath>) -> Result<Value> {
        let path = path.into();
        self.read_with(|parsed| parsed.get(&path))?
            .ok_or_else(|| Error::not_found(&path))
    }

    /// Every value at `path`; several only for directives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is stored at `path`.
    pub fn get_all(&self, path: impl Into<KeywordPath>) -> Result<Vec<Value>> {
        let path = path.into();
        let values = self.read_with(|parsed| parsed.get_all(&path))?;
        if values.is_empty() {
            return Err(Error::not_found(&path));
        }
        Ok(values)
    }

    /// Sets `path` to `value`, replacing any existing entry in place.
    ///
    /// # Errors
    ///
    /// Fails if a parent is not a dictionary or the write fails.
    pub fn set(&self, path: impl Into<KeywordPath>, value: impl Into<Value>) -> Result<()> {
        let path = path.into();
        let value = value.into();
        self.write_with(|parsed| {
            self.ensure_header(parsed, &path)?;
            Self::hint_field_class(parsed, &path, &value)?;
            parsed.put(&path, &value)
        })
    }

    /// Adds an entry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a non-directive path already exists.
    pub fn add(&self, path: impl Into<KeywordPath>, value: impl Into<Value>) -> Result<()> {
        let path = path.into();
        let value = value.into();
        self.write_with(|parsed| {
            if !path.is_directive() && parsed.contains(&path) {
                return Err(Error::duplicate_key(&path));
            }
            self.ensure_header(parsed, &path)?;
            Self::hint_field_class(parsed, &path, &value)?;
            parsed.add(&path, &value)
        })
    }

    /// Removes every entry at `path` and everything below it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is stored at `path`.
    pub fn remove(&self, path: impl Into<KeywordPath>) -> Result<()> {
        let path = path.into();
        self.write_with(|parsed| parsed.remove(&path))
    }

    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn contains(&self, path: impl Into<KeywordPath>) -> Result<bool> {
        let path = path.into();
        self.read_with(|parsed| parsed.contains(&path))
    }

    fn child_keys(&self, prefix: &KeywordPath, with_header: bool) -> Result<Vec<String>> {
        self.read_with(|parsed| {
            parsed
                .index()
                .children(prefix)
                .filter(|key| with_header || !prefix.is_empty() || *key != "FoamFile")
                .map(str::to_string)
                .collect()
        })
    }

    /// Top-level keywords, excluding the `FoamFile` header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.child_keys(&KeywordPath::root(), false)
    }

    /// Top-level keywords including `FoamFile`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn keys_with_header(&self) -> Result<Vec<String>> {
        self.child_keys(&KeywordPath::root(), true)
    }

    /// Number of top-level keywords, excluding the header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn len(&self) -> Result<usize> {
        self.keys().map(|keys| keys.len())
    }

    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    /// A view scoped to the sub-dictionary at `path`.
    pub fn sub_dict(&self, path: impl Into<KeywordPath>) -> SubDict<'_> {
        SubDict {
            document: self,
            prefix: path.into(),
        }
    }

    /// The whole file as a tree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn as_tree(&self) -> Result<FileDict> {
        self.read_with(ParsedDocument::as_tree)
    }

    /// Removes every entry except the header.
    ///
    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn clear(&self) -> Result<()> {
        self.write_with(|parsed| {
            let keys: Vec<String> = parsed
                .index()
                .children(&KeywordPath::root())
                .filter(|key| *key != "FoamFile")
                .map(str::to_string)
                .collect();
            for key in keys {
                parsed.remove(&KeywordPath::from(key))?;
            }
            if parsed.contains(&KeywordPath::root()) {
                parsed.remove(&KeywordPath::root())?;
            }
            Ok(())
        })
    }

    /// Sets several entries in one session.
    ///
    /// # Errors
    ///
    /// Stops at the first failing entry; earlier entries are still written.
    pub fn update<K, V>(&self, entries: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<KeywordPath>,
        V: Into<Value>,
    {
        let session = self.edit()?;
        for (path, value) in entries {
            session.set(path, value)?;
        }
        session.finish()
    }

    /// The `dimensions` entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the entry is not a dimension set.
    pub fn dimensions(&self) -> Result<DimensionSet> {
        match self.get("dimensions")? {
            Value::DimensionSet(dims) => Ok(dims),
            other => Err(Error::type_mismatch("dimensions", "dimension set", other.type_name())),
        }
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_dimensions(&self, dimensions: impl Into<Value>) -> Result<()> {
        self.set("dimensions", dimensions)
    }

    /// The `internalField` entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the entry is not a field.
    pub fn internal_field(&self) -> Result<Field> {
        match self.get("internalField")? {
            Value::Field(field) => Ok(field),
            other => Err(Error::type_mismatch("internalField", "field", other.type_name())),
        }
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_internal_field(&self, value: impl Into<Value>) -> Result<()> {
        self.set("internalField", value)
    }

    /// A view of `boundaryField`.
    pub fn boundary_field(&self) -> SubDict<'_> {
        self.sub_dict("boundaryField")
    }

    fn header_text(&self, key: &str) -> Result<String> {
        let value = self.get(["FoamFile", key])?;
        value
            .as_unquoted_str()
            .map(str::to_string)
            .ok_or_else(|| Error::type_mismatch(format!("FoamFile/{key}"), "text", value.type_name()))
    }

    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the header version is not a number.
    pub fn version(&self) -> Result<f64> {
        let value = self.get(["FoamFile", "version"])?;
        value
            .as_f64()
            .ok_or_else(|| Error::type_mismatch("FoamFile/version", "number", value.type_name()))
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_version(&self, version: f64) -> Result<()> {
        self.set(["FoamFile", "version"], version)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a format other than ascii or binary.
    pub fn format(&self) -> Result<Format> {
        self.header_text("format")?.parse()
    }

    /// Changes the header format. Existing payloads are not re-encoded; entries
    /// written afterwards use the new format.
    ///
    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_format(&self, format: Format) -> Result<()> {
        self.set(["FoamFile", "format"], format.as_str())
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the header has no class.
    pub fn class(&self) -> Result<String> {
        self.header_text("class")
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_class(&self, class: &str) -> Result<()> {
        self.set(["FoamFile", "class"], class)
    }

    /// The header location, without its quotes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the header has no location.
    pub fn location(&self) -> Result<String> {
        self.header_text("location")
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_location(&self, location: &str) -> Result<()> {
        self.set(["FoamFile", "location"], format!("\"{location}\""))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the header has no object name.
    pub fn object(&self) -> Result<String> {
        self.header_text("object")
    }

    /// # Errors
    ///
    /// Fails if the write fails.
    pub fn set_object(&self, object: &str) -> Result<()> {
        self.set(["FoamFile", "object"], object)
    }
}

/// Guard for an open edit session.
///
/// Dereferences to the [`Document`], so edits can be made through the guard.
/// Dropping it closes the session; a failed write is then only logged, so use
/// [`finish`](Self::finish) to observe it.
#[must_use = "the session closes as soon as the guard is dropped"]
pub struct EditSession<'a> {
    document: &'a Document,
    open: bool,
}

impl EditSession<'_> {
    /// Closes the session and reports whether the write succeeded.
    ///
    /// # Errors
    ///
    /// Fails if writing the file fails.
    pub fn finish(mut self) -> Result<()> {
        self.open = false;
        self.document.end_edit()
    }
}

impl Deref for EditSession<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.document
    }
}

impl Drop for EditSession<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.document.end_edit() {
                warn!("failed to write {}: {err}", self.document.path.display());
            }
        }
    }
}

/// A view of one sub-dictionary of a [`Document`].
///
/// Paths given to its methods are relative to the view's prefix.
#[derive(Clone, Debug)]
pub struct SubDict<'a> {
    document: &'a Document,
    prefix: KeywordPath,
}

impl<'a> SubDict<'a> {
    #[must_use]
    pub fn path(&self) -> &KeywordPath {
        &self.prefix
    }

    fn full(&self, path: impl Into<KeywordPath>) -> KeywordPath {
        self.prefix.join(&path.into())
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for a missing path.
    pub fn get(&self, path: impl Into<KeywordPath>) -> Result<Value> {
        self.document.get(self.full(path))
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is stored at `path`.
    pub fn get_all(&self, path: impl Into<KeywordPath>) -> Result<Vec<Value>> {
        self.document.get_all(self.full(path))
    }

    /// # Errors
    ///
    /// Fails if a parent is not a dictionary or the write fails.
    pub fn set(&self, path: impl Into<KeywordPath>, value: impl Into<Value>) -> Result<()> {
        self.document.set(self.full(path), value)
    }

    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a non-directive path already exists.
    pub fn add(&self, path: impl Into<KeywordPath>, value: impl Into<Value>) -> Result<()> {
        self.document.add(self.full(path), value)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is stored at `path`.
    pub fn remove(&self, path: impl Into<KeywordPath>) -> Result<()> {
        self.document.remove(self.full(path))
    }

    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn contains(&self, path: impl Into<KeywordPath>) -> Result<bool> {
        self.document.contains(self.full(path))
    }

    /// Direct child keywords, in file order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.document.child_keys(&self.prefix, true)
    }

    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn len(&self) -> Result<usize> {
        self.keys().map(|keys| keys.len())
    }

    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the file does not exist.
    pub fn is_empty(&self) -> Result<bool> {
        self.len().map(|n| n == 0)
    }

    #[must_use]
    pub fn sub_dict(&self, path: impl Into<KeywordPath>) -> SubDict<'a> {
        SubDict {
            document: self.document,
            prefix: self.full(path),
        }
    }

    /// The sub-dictionary's contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the prefix holds a value rather than
    /// a dictionary.
    pub fn to_dict(&self) -> Result<Dict> {
        match self.document.get(self.prefix.clone())? {
            Value::Dict(dict) => Ok(dict),
            other => Err(Error::type_mismatch(&self.prefix, "dictionary", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn test_missing_file_reads_fail() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::open(dir.path().join("missing"));
        assert!(matches!(doc.get("a"), Err(Error::FileNotFound(_))));
        assert!(matches!(doc.keys(), Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_first_write_adds_header() {
        let dir = tempfile::tempdir().unwrap();
        let case = dir.path().join("0");
        std::fs::create_dir(&case).unwrap();
        let doc = Document::open(case.join("U.gz"));
        doc.set("internalField", vec![0, 0, 0]).unwrap();

        assert_eq!(doc.class().unwrap(), "volVectorField");
        assert_eq!(doc.object().unwrap(), "U");
        assert_eq!(doc.location().unwrap(), "0");
        assert_eq!(doc.format().unwrap(), Format::Ascii);
        assert_eq!(doc.version().unwrap(), 2.0);
        assert_eq!(
            doc.internal_field().unwrap(),
            Field::Uniform(Tensor::Vector([0.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn test_session_writes_once_at_close() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict");
        std::fs::write(&path, "a 1;\n").unwrap();
        let doc = Document::open(&path);
        {
            let session = doc.edit().unwrap();
            session.set("a", 2).unwrap();
            {
                let inner = session.edit().unwrap();
                inner.set("b", 3).unwrap();
            }
            assert_eq!(std::fs::read_to_string(&path).unwrap(), "a 1;\n");
            assert_eq!(session.get("b").unwrap(), Value::from(3));
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a 2;\n\nb 3;\n");
    }

    #[test]
    fn test_external_change_invalidates_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict");
        std::fs::write(&path, "a 1;\n").unwrap();
        let doc = Document::open(&path);
        assert_eq!(doc.get("a").unwrap(), Value::from(1));
        std::fs::write(&path, "a 5;\n").unwrap();
        assert_eq!(doc.get("a").unwrap(), Value::from(5));
    }

    #[test]
    fn test_open_in_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Document::open_in(dir.path(), "../elsewhere"),
            Err(Error::OutsideRoot { .. })
        ));
        let doc = Document::open_in(dir.path(), "system/controlDict").unwrap();
        assert_eq!(doc.path(), dir.path().join("system/controlDict"));
    }

    #[test]
    fn test_dimensions_type_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p");
        std::fs::write(&path, "dimensions uniform;\n").unwrap();
        let doc = Document::open(&path);
        assert!(matches!(doc.dimensions(), Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_sub_dict_view() {
        let dir = tempfile::tempdir().unwrap();
        let doc = Document::open(dir.path().join("U"));
        let inlet = doc.boundary_field().sub_dict("inlet");
        inlet.set("type", "fixedValue").unwrap();
        inlet.set("value", vec![1.0, 0.0, 0.0]).unwrap();
        assert_eq!(inlet.keys().unwrap(), vec!["type", "value"]);
        assert_eq!(
            doc.get(["boundaryField", "inlet", "value"]).unwrap(),
            Value::Field(Field::Uniform(Tensor::Vector([1.0, 0.0, 0.0])))
        );
        assert_eq!(inlet.to_dict().unwrap().len(), 2);
        inlet.remove("value").unwrap();
        assert!(!inlet.contains("value").unwrap());
    }
}
