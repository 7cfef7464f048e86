//! A parsed buffer that can be edited in place.
//!
//! [`ParsedDocument`] owns the file bytes together with their [`ParseIndex`].
//! Edits never re-parse: each one serializes the affected entry, splices the
//! bytes into the buffer and rebases the recorded spans. Text outside the edited
//! entry, including comments and blank lines, is left exactly as it was.

use crate::error::{Error, Result};
use crate::index::{ParseIndex, Slot};
use crate::located::parse_located;
use crate::map::{Dict, FileDict};
use crate::options::FoamOptions;
use crate::path::KeywordPath;
use crate::ser::{normalize, serialize_standalone, Serializer};
use crate::value::Value;
use log::trace;
use std::ops::Range;

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&c| matches!(c, b' ' | b'\t' | b'\r'))
}

/// File contents plus their located parse index.
#[derive(Clone, Debug)]
pub struct ParsedDocument {
    contents: Vec<u8>,
    index: ParseIndex,
    indent: usize,
    modified: bool,
}

impl Default for ParsedDocument {
    fn default() -> Self {
        ParsedDocument {
            contents: Vec::new(),
            index: ParseIndex::new(),
            indent: FoamOptions::default().indent,
            modified: false,
        }
    }
}

impl ParsedDocument {
    /// Parses `contents`.
    ///
    /// # Errors
    ///
    /// Propagates parse errors.
    pub fn parse(contents: Vec<u8>) -> Result<Self> {
        let index = parse_located(&contents)?;
        Ok(ParsedDocument {
            contents,
            index,
            ..Self::default()
        })
    }

    /// An empty document.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Spaces per nesting level used for inserted entries.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    #[must_use]
    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    #[must_use]
    pub fn index(&self) -> &ParseIndex {
        &self.index
    }

    /// Returns `true` if any splice happened since the last [`mark_saved`](Self::mark_saved).
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// The `FoamFile` header as a dictionary.
    #[must_use]
    pub fn header(&self) -> Option<Dict> {
        let path = KeywordPath::from("FoamFile");
        self.index
            .get_one(&path)
            .filter(|entry| entry.is_sub_dict())
            .map(|_| self.index.subtree(&path))
    }

    /// Serialization options implied by the header.
    #[must_use]
    pub fn options(&self) -> FoamOptions {
        FoamOptions::from_header(self.header().as_ref()).with_indent(self.indent)
    }

    /// Replaces `start..end` with `bytes` and rebases every span.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfBounds`] for an invalid range; the buffer is then
    /// left untouched.
    pub fn splice(&mut self, start: usize, end: usize, bytes: &[u8]) -> Result<()> {
        let len = self.contents.len();
        if start > end || end > len {
            return Err(Error::OutOfBounds { start, end, len });
        }

        let mut buffer = Vec::with_capacity(len - (end - start) + bytes.len());
        buffer.extend_from_slice(&self.contents[..start]);
        buffer.extend_from_slice(bytes);
        buffer.extend_from_slice(&self.contents[end..]);
        self.contents = buffer;

        #[allow(clippy::cast_possible_wrap)]
        let delta = bytes.len() as isize - (end - start) as isize;
        self.index.rebase(start, end, delta);
        self.modified = true;
        trace!("spliced {start}..{end} with {} bytes", bytes.len());
        Ok(())
    }

    /// Value at `path`; a sub-dictionary is collapsed into [`Value::Dict`].
    #[must_use]
    pub fn get(&self, path: &KeywordPath) -> Option<Value> {
        let entry = self.index.get_one(path)?;
        Some(match &entry.slot {
            Slot::Data(value) => value.clone(),
            Slot::SubDict => Value::Dict(self.index.subtree(path)),
        })
    }

    /// Every value stored at `path`, in file order.
    #[must_use]
    pub fn get_all(&self, path: &KeywordPath) -> Vec<Value> {
        self.index
            .get_all(path)
            .map(|entry| match &entry.slot {
                Slot::Data(value) => value.clone(),
                Slot::SubDict => Value::Dict(self.index.subtree(path)),
            })
            .collect()
    }

    #[must_use]
    pub fn contains(&self, path: &KeywordPath) -> bool {
        self.index.contains(path)
    }

    /// Byte range of the first entry at `path`.
    #[must_use]
    pub fn entry_location(&self, path: &KeywordPath) -> Option<Range<usize>> {
        self.index.get_one(path).map(|entry| entry.span())
    }

    #[must_use]
    pub fn as_tree(&self) -> FileDict {
        self.index.to_file_dict()
    }

    fn indentation(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent)
    }

    /// Text of the entry itself, without surrounding whitespace.
    fn entry_text(&self, path: &KeywordPath, value: &Value) -> Result<Vec<u8>> {
        if path.is_empty() {
            return serialize_standalone(value, &self.options());
        }
        if value.is_dict() {
            let key = path.last().unwrap_or_default();
            let indent = self.indentation(path.len() - 1);
            return Ok(format!("{key}\n{indent}{{\n{indent}}}").into_bytes());
        }
        let mut serializer = Serializer::new(self.options());
        serializer.serialize_entry(value, path)?;
        Ok(serializer.into_inner())
    }

    /// The slot recorded for a written value, in the form a re-parse would give.
    fn slot_for(&self, path: &KeywordPath, value: &Value) -> Slot {
        if value.is_dict() {
            Slot::SubDict
        } else {
            Slot::Data(normalize(value, path, &self.options()).into_owned())
        }
    }

    fn ensure_parent(&mut self, path: &KeywordPath) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.is_empty()) else {
            return Ok(());
        };
        match self.index.get_one(&parent) {
            Some(entry) if entry.is_sub_dict() => Ok(()),
            Some(entry) => Err(Error::type_mismatch(
                &parent,
                "dictionary",
                entry.value().map_or("dictionary", Value::type_name),
            )),
            None => self.insert_new(&parent, &Value::Dict(Dict::new())),
        }
    }

    /// Where a new entry at `path` goes, and the text surrounding it.
    fn insertion_point(&self, path: &KeywordPath, text: &[u8]) -> Result<(usize, String, String)> {
        let newline_after = !text.ends_with(b"\n");
        if path.len() <= 1 {
            let before = if self.contents.is_empty() || self.contents.ends_with(b"\n\n") {
                ""
            } else if self.contents.ends_with(b"\n") {
                "\n"
            } else {
                "\n\n"
            };
            let after = if newline_after { "\n" } else { "" };
            return Ok((self.contents.len(), before.to_string(), after.to_string()));
        }

        let parent = path.parent().unwrap_or_default();
        let span = self
            .index
            .get_one(&parent)
            .filter(|entry| entry.is_sub_dict())
            .map(|entry| entry.span())
            .ok_or_else(|| Error::not_found(&parent))?;
        let brace = self.contents[span.clone()]
            .iter()
            .rposition(|&c| c == b'}')
            .map(|i| span.start + i)
            .ok_or_else(|| Error::invalid_value(format!("'{parent}' has no closing brace")))?;
        let line_start = self.contents[span.start..brace]
            .iter()
            .rposition(|&c| c == b'\n')
            .map(|i| span.start + i + 1);

        let depth = path.len();
        match line_start {
            Some(line_start) if is_blank(&self.contents[line_start..brace]) => {
                let after = if newline_after { "\n" } else { "" };
                Ok((line_start, self.indentation(depth - 1), after.to_string()))
            }
            _ => {
                let before = format!("\n{}", self.indentation(depth - 1));
                let after = format!(
                    "{}{}",
                    if newline_after { "\n" } else { "" },
                    self.indentation(depth - 2)
                );
                Ok((brace, before, after))
            }
        }
    }

    fn insert_new(&mut self, path: &KeywordPath, value: &Value) -> Result<()> {
        self.ensure_parent(path)?;
        let text = self.entry_text(path, value)?;
        let (at, before, after) = self.insertion_point(path, &text)?;

        let mut bytes = Vec::with_capacity(before.len() + text.len() + after.len());
        bytes.extend_from_slice(before.as_bytes());
        bytes.extend_from_slice(&text);
        bytes.extend_from_slice(after.as_bytes());
        self.splice(at, at, &bytes)?;

        let start = at + before.len();
        let slot = self.slot_for(path, value);
        self.index.add(path.clone(), slot, start..start + text.len())?;
        self.add_children(path, value)
    }

    fn add_children(&mut self, path: &KeywordPath, value: &Value) -> Result<()> {
        if let Value::Dict(dict) = value {
            for (key, child) in dict.iter() {
                self.insert_new(&path.child(key.as_str()), child)?;
            }
        }
        Ok(())
    }

    /// Removes `start..end`, taking the whole line with it when nothing else
    /// is on that line.
    fn delete_span(&mut self, start: usize, end: usize) -> Result<()> {
        let line_start = self.contents[..start]
            .iter()
            .rposition(|&c| c == b'\n')
            .map_or(0, |i| i + 1);
        let (rest_end, line_end) = if end > start && self.contents[end - 1] == b'\n' {
            (end, end)
        } else {
            match self.contents[end..].iter().position(|&c| c == b'\n') {
                Some(i) => (end + i, end + i + 1),
                None => (self.contents.len(), self.contents.len()),
            }
        };

        if is_blank(&self.contents[line_start..start]) && is_blank(&self.contents[end..rest_end]) {
            self.splice(line_start, line_end, b"")
        } else {
            self.splice(start, end, b"")
        }
    }

    /// Sets `path` to `value`.
    ///
    /// An existing entry is rewritten within its own byte range; further
    /// duplicates of a directive are removed. A new entry is inserted at the end
    /// of its parent. Missing parent dictionaries are created.
    ///
    /// # Errors
    ///
    /// Fails if a parent exists but is not a dictionary, or if the value cannot
    /// be serialized.
    pub fn put(&mut self, path: &KeywordPath, value: &Value) -> Result<()> {
        let spans: Vec<Range<usize>> = self.index.get_all(path).map(|e| e.span()).collect();
        let Some((_, extra)) = spans.split_first() else {
            return self.insert_new(path, value);
        };

        // later duplicates collapse to empty spans and are dropped below
        for span in extra.iter().rev() {
            self.delete_span(span.start, span.end)?;
        }
        self.index.remove_descendants(path);

        let first = self
            .entry_location(path)
            .ok_or_else(|| Error::not_found(path))?;
        let text = self.entry_text(path, value)?;
        self.splice(first.start, first.end, &text)?;
        let slot = self.slot_for(path, value);
        self.index
            .insert_or_replace(path.clone(), slot, first.start..first.start + text.len());
        self.add_children(path, value)
    }

    /// Adds another entry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a non-directive path already exists.
    pub fn add(&mut self, path: &KeywordPath, value: &Value) -> Result<()> {
        if !path.is_directive() && self.index.contains(path) {
            return Err(Error::duplicate_key(path));
        }
        self.insert_new(path, value)
    }

    /// Removes every entry at `path` together with its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if nothing is stored at `path`.
    pub fn remove(&mut self, path: &KeywordPath) -> Result<()> {
        let mut spans: Vec<Range<usize>> = self.index.get_all(path).map(|e| e.span()).collect();
        if spans.is_empty() {
            return Err(Error::not_found(path));
        }
        self.index.remove(path);
        spans.sort_by_key(|span| span.start);
        for span in spans.iter().rev() {
            self.delete_span(span.start, span.end)?;
        }
        Ok(())
    }
}
