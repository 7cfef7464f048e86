//! The parse index: an ordered multimap from keyword path to parsed entry.
//!
//! Entries live in an arena in insertion order; a path table maps each
//! [`KeywordPath`] to the arena slots holding it. Only directive paths may map
//! to more than one slot. Every entry records the half-open byte range of its
//! text in the backing buffer, which [`ParseIndex::rebase`] keeps current as the
//! buffer is spliced.

use crate::error::{Error, Result};
use crate::map::{Dict, FileDict};
use crate::path::KeywordPath;
use crate::value::Value;
use indexmap::IndexMap;
use std::ops::Range;

/// What a parsed entry holds.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// A terminal value
    Data(Value),
    /// The marker of a `{ ... }` block; its children are separate entries
    SubDict,
}

/// One entry of the parse index.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedEntry {
    pub path: KeywordPath,
    pub slot: Slot,
    pub start: usize,
    pub end: usize,
}

impl ParsedEntry {
    #[inline]
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end
    }

    #[must_use]
    pub const fn is_sub_dict(&self) -> bool {
        matches!(self.slot, Slot::SubDict)
    }

    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match &self.slot {
            Slot::Data(value) => Some(value),
            Slot::SubDict => None,
        }
    }
}

/// Ordered multimap from keyword path to [`ParsedEntry`].
#[derive(Clone, Debug, Default)]
pub struct ParseIndex {
    entries: Vec<ParsedEntry>,
    table: IndexMap<KeywordPath, Vec<usize>>,
}

impl ParseIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ParsedEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn contains(&self, path: &KeywordPath) -> bool {
        self.table.contains_key(path)
    }

    /// The first entry stored under `path`.
    #[must_use]
    pub fn get_one(&self, path: &KeywordPath) -> Option<&ParsedEntry> {
        self.table
            .get(path)
            .and_then(|slots| slots.first())
            .map(|&i| &self.entries[i])
    }

    /// Every entry stored under `path`, in insertion order.
    pub fn get_all<'a>(&'a self, path: &KeywordPath) -> impl Iterator<Item = &'a ParsedEntry> + 'a {
        self.table
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(move |&i| &self.entries[i])
    }

    /// Direct child keywords of `prefix`, in first-insertion order.
    pub fn children<'a>(&'a self, prefix: &'a KeywordPath) -> impl Iterator<Item = &'a str> + 'a {
        self.table
            .keys()
            .filter(move |path| path.len() == prefix.len() + 1 && path.starts_with(prefix))
            .filter_map(KeywordPath::last)
    }

    fn push(&mut self, entry: ParsedEntry) -> usize {
        let slot = self.entries.len();
        self.table.entry(entry.path.clone()).or_default().push(slot);
        self.entries.push(entry);
        slot
    }

    /// Appends an entry and returns its arena slot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateKey`] if a non-directive path is already present.
    pub fn add(&mut self, path: KeywordPath, slot: Slot, span: Range<usize>) -> Result<usize> {
        if !path.is_directive() && self.contains(&path) {
            return Err(Error::duplicate_key(&path));
        }
        Ok(self.push(ParsedEntry {
            path,
            slot,
            start: span.start,
            end: span.end,
        }))
    }

    /// Replaces the first entry under `path` in place, dropping any further
    /// duplicates, or appends a new entry.
    pub fn insert_or_replace(&mut self, path: KeywordPath, slot: Slot, span: Range<usize>) {
        let Some(slots) = self.table.get(&path) else {
            self.push(ParsedEntry {
                path,
                slot,
                start: span.start,
                end: span.end,
            });
            return;
        };

        let first = slots[0];
        let extra: Vec<usize> = slots[1..].to_vec();
        let entry = &mut self.entries[first];
        entry.slot = slot;
        entry.start = span.start;
        entry.end = span.end;

        if !extra.is_empty() {
            let mut slot = 0;
            self.entries.retain(|_| {
                let keep = !extra.contains(&slot);
                slot += 1;
                keep
            });
            self.rebuild_table();
        }
    }

    /// Moves the end of the entry in arena slot `slot`.
    pub(crate) fn set_end(&mut self, slot: usize, end: usize) {
        if let Some(entry) = self.entries.get_mut(slot) {
            entry.end = end;
        }
    }

    /// Drops every entry added after the first `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        if len < self.entries.len() {
            self.entries.truncate(len);
            self.rebuild_table();
        }
    }

    /// Removes `path` and all of its descendants, returning how many entries went.
    ///
    /// The root path has no descendants here: removing it only drops the
    /// standalone entry.
    pub fn remove(&mut self, path: &KeywordPath) -> usize {
        self.remove_where(|p| p == path || (!path.is_empty() && p.is_descendant_of(path)))
    }

    /// Removes the descendants of `path`, keeping `path` itself.
    pub fn remove_descendants(&mut self, path: &KeywordPath) -> usize {
        if path.is_empty() {
            return 0;
        }
        self.remove_where(|p| p.is_descendant_of(path))
    }

    fn remove_where(&mut self, doomed: impl Fn(&KeywordPath) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !doomed(&entry.path));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.rebuild_table();
        }
        removed
    }

    fn rebuild_table(&mut self) {
        self.table.clear();
        for (slot, entry) in self.entries.iter().enumerate() {
            self.table.entry(entry.path.clone()).or_default().push(slot);
        }
    }

    /// Adjusts every span after the bytes in `start..end` were replaced by a run
    /// `delta` bytes longer (or shorter).
    ///
    /// Entries at or after `end` shift bodily; entries that straddle the
    /// replaced range only move their end.
    pub fn rebase(&mut self, start: usize, end: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for entry in &mut self.entries {
            if entry.start >= end {
                entry.start = entry.start.saturating_add_signed(delta);
                entry.end = entry.end.saturating_add_signed(delta);
            } else if entry.end > start {
                entry.end = entry.end.saturating_add_signed(delta);
            }
        }
    }

    /// Collapses the descendants of `prefix` into a nested dictionary.
    #[must_use]
    pub fn subtree(&self, prefix: &KeywordPath) -> Dict {
        let mut root = Dict::new();
        for entry in self.entries.iter().filter(|e| e.path.is_descendant_of(prefix)) {
            let relative = &entry.path.segments()[prefix.len()..];
            let Some((key, parents)) = relative.split_last() else {
                continue;
            };
            let value = match &entry.slot {
                Slot::Data(value) => value.clone(),
                Slot::SubDict => Value::Dict(Dict::new()),
            };
            if let Some(parent) = dict_at(&mut root, parents) {
                parent.insert(key.clone(), value);
            }
        }
        root
    }

    /// Collapses the whole index into a tree.
    #[must_use]
    pub fn to_file_dict(&self) -> FileDict {
        FileDict {
            entries: self.subtree(&KeywordPath::root()),
            standalone: self
                .get_one(&KeywordPath::root())
                .and_then(ParsedEntry::value)
                .cloned(),
        }
    }
}

fn dict_at<'d>(dict: &'d mut Dict, path: &[String]) -> Option<&'d mut Dict> {
    let Some((first, rest)) = path.split_first() else {
        return Some(dict);
    };
    match dict.get_mut(first) {
        Some(Value::Dict(inner)) => dict_at(inner, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ParseIndex {
        let mut index = ParseIndex::new();
        index.add("a".into(), Slot::Data(Value::from(1)), 0..4).unwrap();
        index.add("b".into(), Slot::SubDict, 5..20).unwrap();
        index
            .add(["b", "c"].into(), Slot::Data(Value::from(2)), 8..12)
            .unwrap();
        index
            .add(["b", "d"].into(), Slot::SubDict, 13..18)
            .unwrap();
        index
            .add(["b", "d", "e"].into(), Slot::Data(Value::from(3)), 14..17)
            .unwrap();
        index
    }

    #[test]
    fn test_duplicates_rejected_except_directives() {
        let mut index = index();
        assert!(matches!(
            index.add("a".into(), Slot::Data(Value::Empty), 0..0),
            Err(Error::DuplicateKey(_))
        ));
        index.add("#include".into(), Slot::Data(Value::from("\"x\"")), 21..34).unwrap();
        index.add("#include".into(), Slot::Data(Value::from("\"y\"")), 34..47).unwrap();
        let all: Vec<_> = index
            .get_all(&"#include".into())
            .filter_map(ParsedEntry::value)
            .cloned()
            .collect();
        assert_eq!(all, vec![Value::from("\"x\""), Value::from("\"y\"")]);
    }

    #[test]
    fn test_remove_is_transitive() {
        let mut index = index();
        assert_eq!(index.remove(&"b".into()), 4);
        assert_eq!(index.len(), 1);
        assert!(!index.contains(&["b", "d", "e"].into()));
        assert!(index.contains(&"a".into()));
    }

    #[test]
    fn test_children_in_order() {
        let index = index();
        let root = KeywordPath::root();
        assert_eq!(index.children(&root).collect::<Vec<_>>(), vec!["a", "b"]);
        let b = KeywordPath::from("b");
        assert_eq!(index.children(&b).collect::<Vec<_>>(), vec!["c", "d"]);
    }

    #[test]
    fn test_rebase_shifts_and_grows() {
        let mut index = index();
        // grow b/c by three bytes
        index.rebase(8, 12, 3);
        assert_eq!(index.get_one(&"a".into()).unwrap().span(), 0..4);
        assert_eq!(index.get_one(&"b".into()).unwrap().span(), 5..23);
        assert_eq!(index.get_one(&["b", "c"].into()).unwrap().span(), 8..15);
        assert_eq!(index.get_one(&["b", "d"].into()).unwrap().span(), 16..21);
    }

    #[test]
    fn test_rebase_insertion_point() {
        let mut index = index();
        // insertion exactly where b starts moves b, leaves a alone
        index.rebase(5, 5, 2);
        assert_eq!(index.get_one(&"a".into()).unwrap().span(), 0..4);
        assert_eq!(index.get_one(&"b".into()).unwrap().span(), 7..22);
    }

    #[test]
    fn test_insert_or_replace_drops_duplicates() {
        let mut index = ParseIndex::new();
        index.add("#x".into(), Slot::Data(Value::from(1)), 0..3).unwrap();
        index.add("#x".into(), Slot::Data(Value::from(2)), 3..6).unwrap();
        index.insert_or_replace("#x".into(), Slot::Data(Value::from(9)), 0..4);
        assert_eq!(index.get_all(&"#x".into()).count(), 1);
        assert_eq!(index.get_one(&"#x".into()).unwrap().value(), Some(&Value::from(9)));
    }

    #[test]
    fn test_subtree() {
        let index = index();
        let tree = index.to_file_dict();
        let b = tree.get("b").and_then(Value::as_dict).unwrap();
        assert_eq!(b.get("c"), Some(&Value::from(2)));
        assert_eq!(
            b.get("d").and_then(Value::as_dict).and_then(|d| d.get("e")),
            Some(&Value::from(3))
        );
        assert!(tree.standalone.is_none());
    }
}
