//! Whole-file parsing into a [`ParseIndex`].
//!
//! Every accepted entry is recorded with the byte range of its text, from the
//! first byte of the keyword to the byte after its `;`, its closing `}`, or the
//! newline ending a directive. A sub-dictionary's marker is recorded before its
//! children so that parents always precede descendants in the index.

use crate::error::Result;
use crate::grammar::Parser;
use crate::index::{ParseIndex, Slot};
use crate::map::FileDict;
use crate::options::Format;
use crate::path::KeywordPath;
use crate::scan::{directive_end, expect, peek, scan_token, Fail};
use crate::value::Value;
use log::debug;

struct Located<'a> {
    parser: Parser<'a>,
    index: ParseIndex,
    standalone_seen: bool,
}

impl<'a> Located<'a> {
    fn input(&self) -> &'a [u8] {
        self.parser.input()
    }

    /// Entries of a `{ ... }` body up to and including the closing brace.
    fn body(&mut self, mut pos: usize, prefix: &KeywordPath) -> std::result::Result<usize, Fail> {
        loop {
            pos = self.parser.skip(pos)?;
            if peek(self.input(), pos) == Some(b'}') {
                return Ok(pos + 1);
            }
            pos = self.keyword_entry(pos, prefix)?;
        }
    }

    fn keyword_entry(&mut self, pos: usize, prefix: &KeywordPath) -> std::result::Result<usize, Fail> {
        let input = self.input();
        let (keyword, after_key) = scan_token(input, pos)?;
        let path = prefix.child(keyword);

        if path.is_directive() {
            let i = self.parser.skip(after_key)?;
            let (value, i) = self.parser.data_entry(i)?;
            let end = directive_end(input, i)?;
            self.index.add(path, Slot::Data(value), pos..end)?;
            return Ok(end);
        }

        let i = self.parser.skip(after_key)?;
        if peek(input, i) == Some(b'{') {
            self.reject_duplicate(&path, pos)?;
            let marker = self.index.add(path.clone(), Slot::SubDict, pos..pos)?;
            let end = self.body(i + 1, &path)?;
            self.index.set_end(marker, end);
            return Ok(end);
        }

        let (value, end) = if peek(input, i) == Some(b';') {
            (Value::Empty, i + 1)
        } else {
            let (value, j) = self.parser.data(i)?;
            let k = self.parser.skip(j)?;
            let end = expect(input, k, ";").map_err(|_| Fail::backtrack(j, "';'"))?;
            (value, end)
        };

        self.reject_duplicate(&path, pos)?;
        if is_binary_format(&path, &value) {
            self.parser.set_format(Format::Binary);
        }
        self.index.add(path, Slot::Data(value), pos..end)?;
        Ok(end)
    }

    fn reject_duplicate(&self, path: &KeywordPath, pos: usize) -> std::result::Result<(), Fail> {
        if self.index.contains(path) {
            return Err(Fail::fatal_semantic(
                self.input(),
                pos,
                format!("duplicate keyword '{path}'"),
            ));
        }
        Ok(())
    }

    /// Top level: keyword entries, interrupted at most once by standalone data.
    fn file(&mut self) -> std::result::Result<(), Fail> {
        let root = KeywordPath::root();
        let mut pos = 0;
        loop {
            pos = self.parser.skip(pos)?;
            if pos >= self.input().len() {
                return Ok(());
            }

            let mark = self.index.len();
            let miss = match self.keyword_entry(pos, &root) {
                Ok(end) => {
                    pos = end;
                    continue;
                }
                Err(Fail::Fatal(err)) => return Err(Fail::Fatal(err)),
                Err(miss) => miss,
            };
            self.index.truncate(mark);

            match self.parser.standalone(pos) {
                // the keyword entry got past what standalone data can explain
                Ok((_, end)) if miss.reach() > end => return Err(miss),
                Ok((value, end)) => {
                    if self.standalone_seen {
                        return Err(Fail::fatal_semantic(
                            self.input(),
                            pos,
                            "only one standalone data block is allowed",
                        ));
                    }
                    self.standalone_seen = true;
                    self.index.add(KeywordPath::root(), Slot::Data(value), pos..end)?;
                    pos = end;
                }
                Err(Fail::Fatal(err)) => return Err(Fail::Fatal(err)),
                Err(other) => return Err(miss.furthest(other)),
            }
        }
    }
}

fn is_binary_format(path: &KeywordPath, value: &Value) -> bool {
    matches!(path.segments(), [header, key] if header == "FoamFile" && key == "format")
        && value.as_unquoted_str() == Some("binary")
}

/// Parses a whole file into a located index.
///
/// # Errors
///
/// Returns a syntax error when no production matches, or a semantic error for
/// a duplicate keyword, a bad tensor size or a second standalone block.
pub fn parse_located(input: &[u8]) -> Result<ParseIndex> {
    debug!("parsing {} bytes", input.len());
    let mut located = Located {
        parser: Parser::new(input),
        index: ParseIndex::new(),
        standalone_seen: false,
    };
    located.file().map_err(|fail| fail.into_error(input))?;
    debug!("parsed {} entries", located.index.len());
    Ok(located.index)
}

/// Parses a whole file into a tree.
///
/// # Errors
///
/// Fails under the same conditions as [`parse_located`].
pub fn parse_file(input: &[u8]) -> Result<FileDict> {
    parse_located(input).map(|index| index.to_file_dict())
}
