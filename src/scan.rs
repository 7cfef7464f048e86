//! Lexical scanners over a byte cursor.
//!
//! Every scanner takes the whole input and a start offset and returns either the
//! recognized unit with the offset just past it, or a [`Fail`]. A
//! [`Fail::Backtrack`] is the ordinary "no match here" signal that lets callers
//! try the next alternative; [`Fail::Fatal`] is reserved for regions that cannot
//! be recovered from, such as an unterminated quoted string.

use crate::error::Error;
use crate::value::Number;
use std::borrow::Cow;

/// Failure of a scanner or grammar production.
#[derive(Debug)]
pub enum Fail {
    /// Recoverable mismatch at `pos`
    Backtrack {
        pos: usize,
        expected: Cow<'static, str>,
    },
    /// Unrecoverable error; aborts the whole parse
    Fatal(Error),
}

/// Result of a scanner: the value and the position after it.
pub type Scan<T> = std::result::Result<(T, usize), Fail>;

impl Fail {
    pub fn backtrack(pos: usize, expected: impl Into<Cow<'static, str>>) -> Self {
        Fail::Backtrack {
            pos,
            expected: expected.into(),
        }
    }

    pub fn fatal_syntax(input: &[u8], pos: usize, expected: impl Into<String>) -> Self {
        Fail::Fatal(Error::syntax_at(input, pos, expected))
    }

    pub fn fatal_semantic(input: &[u8], pos: usize, msg: impl Into<String>) -> Self {
        Fail::Fatal(Error::semantic_at(input, pos, msg))
    }

    /// How far into the input the failing production got.
    #[must_use]
    pub fn reach(&self) -> usize {
        match self {
            Fail::Fatal(_) => usize::MAX,
            Fail::Backtrack { pos, .. } => *pos,
        }
    }

    /// Of two failures keep the one that got further; fatal errors always win.
    #[must_use]
    pub fn furthest(self, other: Fail) -> Fail {
        if other.reach() > self.reach() {
            other
        } else {
            self
        }
    }

    /// Converts to a crate error, rendering backtracks as syntax errors.
    pub fn into_error(self, input: &[u8]) -> Error {
        match self {
            Fail::Backtrack { pos, expected } => Error::syntax_at(input, pos, expected),
            Fail::Fatal(err) => err,
        }
    }
}

impl From<Error> for Fail {
    fn from(err: Error) -> Self {
        Fail::Fatal(err)
    }
}

/// Turns a backtrack into `None` and propagates fatal errors.
pub fn attempt<T>(result: Scan<T>) -> std::result::Result<Option<(T, usize)>, Fail> {
    match result {
        Ok(hit) => Ok(Some(hit)),
        Err(Fail::Backtrack { .. }) => Ok(None),
        Err(fatal) => Err(fatal),
    }
}

const fn whitespace_table(newline: bool) -> [bool; 256] {
    let mut table = [false; 256];
    table[b' ' as usize] = true;
    table[b'\t' as usize] = true;
    table[b'\r' as usize] = true;
    table[0x0c] = true;
    table[0x0b] = true;
    table[b'\n' as usize] = newline;
    table
}

static IS_WHITESPACE: [bool; 256] = whitespace_table(true);
static IS_WHITESPACE_NO_NEWLINE: [bool; 256] = whitespace_table(false);

const TOKEN_CONTINUATION: &[u8] = b"._<>#$:+-*/|^%&=!";

#[inline]
#[must_use]
pub fn is_token_continuation(c: u8) -> bool {
    c.is_ascii_alphanumeric() || TOKEN_CONTINUATION.contains(&c)
}

#[inline]
#[must_use]
pub fn is_token_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || matches!(c, b'_' | b'#' | b'$')
}

/// Returns `true` if a token could not continue at `pos`.
#[inline]
#[must_use]
pub fn is_token_boundary(input: &[u8], pos: usize) -> bool {
    input.get(pos).map_or(true, |&c| !is_token_continuation(c))
}

#[inline]
#[must_use]
pub fn peek(input: &[u8], pos: usize) -> Option<u8> {
    input.get(pos).copied()
}

/// Skips whitespace and comments.
///
/// With `newline_ok == false` a newline ends the run (used after directives),
/// and a line comment stops right before its newline.
pub fn skip(input: &[u8], mut pos: usize, newline_ok: bool) -> Result<usize, Fail> {
    let table = if newline_ok {
        &IS_WHITESPACE
    } else {
        &IS_WHITESPACE_NO_NEWLINE
    };

    loop {
        while pos < input.len() && table[input[pos] as usize] {
            pos += 1;
        }

        let rest = &input[pos..];
        if rest.starts_with(b"//") {
            pos += 2;
            loop {
                match input.get(pos) {
                    None => break,
                    Some(b'\n') => {
                        if newline_ok {
                            pos += 1;
                        }
                        break;
                    }
                    Some(b'\\') if input.get(pos + 1) == Some(&b'\n') => pos += 2,
                    Some(_) => pos += 1,
                }
            }
        } else if rest.starts_with(b"/*") {
            let close = input[pos + 2..]
                .windows(2)
                .position(|w| w == b"*/")
                .ok_or_else(|| Fail::fatal_syntax(input, pos, "'*/' to close comment"))?;
            pos += 2 + close + 2;
        } else {
            return Ok(pos);
        }
    }
}

/// Ends a directive line: skips trailing blanks and comments, then consumes the
/// newline. A closing `}` or the end of input also ends the line but is left
/// in place.
pub fn directive_end(input: &[u8], pos: usize) -> Result<usize, Fail> {
    let i = skip(input, pos, false)?;
    match peek(input, i) {
        Some(b'\n') => Ok(i + 1),
        Some(b'}') | None => Ok(i),
        Some(_) => Err(Fail::backtrack(i, "end of line")),
    }
}

/// Matches a literal byte string.
pub fn expect(input: &[u8], pos: usize, literal: &'static str) -> Result<usize, Fail> {
    if input[pos.min(input.len())..].starts_with(literal.as_bytes()) {
        Ok(pos + literal.len())
    } else {
        Err(Fail::backtrack(pos, format!("'{literal}'")))
    }
}

/// Decodes token bytes, falling back to Latin-1 for non UTF-8 input.
#[must_use]
pub fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn scan_quoted(input: &[u8], pos: usize) -> Scan<String> {
    let mut i = pos + 1;
    loop {
        match input.get(i) {
            None => return Err(Fail::fatal_syntax(input, pos, "closing '\"'")),
            Some(b'\\') => i += 2,
            Some(b'"') => return Ok((decode(&input[pos..=i]), i + 1)),
            Some(_) => i += 1,
        }
    }
}

/// Scans an identifier-like token or a double-quoted string.
///
/// A token may end in one parenthesised group, so `div(phi,U)` is one token.
/// The group's contents only need to balance and may nest further, as in
/// `div((nuEff*dev2(T(grad(U)))))`; the token ends at the group's closing
/// parenthesis. Quoted strings are returned with their quotes.
pub fn scan_token(input: &[u8], pos: usize) -> Scan<String> {
    match input.get(pos) {
        Some(b'"') => return scan_quoted(input, pos),
        Some(&c) if is_token_start(c) => {}
        _ => return Err(Fail::backtrack(pos, "token")),
    }

    let mut i = pos + 1;
    let mut depth = 0usize;
    while let Some(&c) = input.get(i) {
        if depth == 0 {
            if is_token_continuation(c) {
                i += 1;
                continue;
            }
            if c != b'(' {
                break;
            }
            depth = 1;
        } else {
            match c {
                b'(' => depth += 1,
                b')' if depth == 1 => {
                    i += 1;
                    depth = 0;
                    break;
                }
                b')' => depth -= 1,
                b';' | b'{' | b'}' | b'[' | b']' => break,
                _ => {}
            }
        }
        i += 1;
    }

    if depth > 0 {
        return Err(Fail::fatal_syntax(input, i, "')'"));
    }
    Ok((decode(&input[pos..i]), i))
}

/// Scans a `#`-prefixed directive word such as `#include`.
pub fn scan_directive(input: &[u8], pos: usize) -> Scan<String> {
    if input.get(pos) != Some(&b'#') {
        return Err(Fail::backtrack(pos, "directive"));
    }
    scan_token(input, pos)
}

/// Scans `yes/true/on` or `no/false/off` as a whole word.
pub fn scan_switch(input: &[u8], pos: usize) -> Scan<bool> {
    if input.get(pos) == Some(&b'"') {
        return Err(Fail::backtrack(pos, "switch"));
    }
    let (word, end) = scan_token(input, pos)?;
    match word.as_str() {
        "yes" | "true" | "on" => Ok((true, end)),
        "no" | "false" | "off" => Ok((false, end)),
        _ => Err(Fail::backtrack(pos, "switch")),
    }
}

fn count_digits(input: &[u8], mut pos: usize) -> usize {
    let start = pos;
    while input.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    pos - start
}

const SPECIAL_FLOATS: [(&str, f64); 3] = [
    ("infinity", f64::INFINITY),
    ("inf", f64::INFINITY),
    ("nan", f64::NAN),
];

fn scan_numeric(input: &[u8], pos: usize, allow_float: bool) -> Scan<Number> {
    let mut i = pos;
    let negative = match input.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    if allow_float {
        for (word, value) in SPECIAL_FLOATS {
            let end = i + word.len();
            if input.len() >= end
                && input[i..end].eq_ignore_ascii_case(word.as_bytes())
                && is_token_boundary(input, end)
            {
                let value = if negative { -value } else { value };
                return Ok((Number::Float(value), end));
            }
        }
    }

    let int_digits = count_digits(input, i);
    i += int_digits;
    let mut is_float = false;

    if input.get(i) == Some(&b'.') {
        if !allow_float {
            return Err(Fail::backtrack(pos, "integer"));
        }
        let frac_digits = count_digits(input, i + 1);
        if int_digits == 0 && frac_digits == 0 {
            return Err(Fail::backtrack(pos, "number"));
        }
        i += 1 + frac_digits;
        is_float = true;
    } else if int_digits == 0 {
        return Err(Fail::backtrack(pos, "number"));
    }

    if matches!(input.get(i), Some(b'e' | b'E')) {
        if !allow_float {
            return Err(Fail::backtrack(pos, "integer"));
        }
        let mut j = i + 1;
        if matches!(input.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(input, j);
        if exp_digits == 0 {
            return Err(Fail::backtrack(j, "exponent digits"));
        }
        i = j + exp_digits;
        is_float = true;
    }

    // The matched range is ASCII by construction.
    let text = std::str::from_utf8(&input[pos..i]).map_err(|_| Fail::backtrack(pos, "number"))?;
    if !is_float {
        if let Ok(int) = text.parse::<i64>() {
            return Ok((Number::Integer(int), i));
        }
        if !allow_float {
            return Err(Fail::backtrack(pos, "integer within range"));
        }
    }
    text.parse::<f64>()
        .map(|f| (Number::Float(f), i))
        .map_err(|_| Fail::backtrack(pos, "number"))
}

/// Scans an integer or float; integers are returned when there is no fraction
/// and no exponent.
pub fn scan_number(input: &[u8], pos: usize) -> Scan<Number> {
    scan_numeric(input, pos, true)
}

/// Scans a signed integer, rejecting anything with a fraction or exponent.
pub fn scan_integer(input: &[u8], pos: usize) -> Scan<i64> {
    match scan_numeric(input, pos, false)? {
        (Number::Integer(i), end) => Ok((i, end)),
        (Number::Float(_), _) => Err(Fail::backtrack(pos, "integer")),
    }
}

/// Scans any number as a float, including `nan` and `inf`.
pub fn scan_float(input: &[u8], pos: usize) -> Scan<f64> {
    scan_numeric(input, pos, true).map(|(n, end)| (n.as_f64(), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skipped(input: &str) -> usize {
        skip(input.as_bytes(), 0, true).unwrap()
    }

    #[test]
    fn test_skip_whitespace_and_comments() {
        assert_eq!(skipped("  \t\n x"), 5);
        assert_eq!(skipped("// line\nx"), 8);
        assert_eq!(skipped("/* a\n b */ x"), 11);
        assert_eq!(skipped("/* a */ /* b */x"), 15);
    }

    #[test]
    fn test_line_comment_continuation() {
        assert_eq!(skipped("// one \\\n two\nx"), 14);
    }

    #[test]
    fn test_skip_without_newline() {
        let input = b"  // comment\nnext";
        assert_eq!(skip(input, 0, false).unwrap(), 12);
        assert_eq!(skip(b" \n", 0, false).unwrap(), 1);
    }

    #[test]
    fn test_unterminated_block_comment_is_fatal() {
        assert!(matches!(skip(b"/* open", 0, true), Err(Fail::Fatal(_))));
    }

    #[test]
    fn test_block_comments_do_not_nest() {
        assert_eq!(skipped("/* /* */x */"), 8);
    }

    #[test]
    fn test_token_with_parentheses() {
        let (token, end) = scan_token(b"div(phi,U) Gauss", 0).unwrap();
        assert_eq!(token, "div(phi,U)");
        assert_eq!(end, 10);
    }

    #[test]
    fn test_token_stops_at_structural_chars() {
        assert_eq!(scan_token(b"solver;", 0).unwrap(), ("solver".to_string(), 6));
        assert_eq!(scan_token(b"List<scalar> 2", 0).unwrap().0, "List<scalar>");
        assert!(matches!(scan_token(b"1abc", 0), Err(Fail::Backtrack { .. })));
    }

    #[test]
    fn test_token_ends_after_one_group() {
        let input = b"div((nuEff*dev2(T(grad(U))))) Gauss";
        let (token, end) = scan_token(input, 0).unwrap();
        assert_eq!(token, "div((nuEff*dev2(T(grad(U)))))");
        assert_eq!(end, 29);
        assert_eq!(scan_token(b"grad(U)(V)", 0).unwrap(), ("grad(U)".to_string(), 7));
    }

    #[test]
    fn test_directive_end() {
        assert_eq!(directive_end(b" // note\nx", 0).unwrap(), 9);
        assert_eq!(directive_end(b"  }", 0).unwrap(), 2);
        assert_eq!(directive_end(b"", 0).unwrap(), 0);
        assert!(matches!(directive_end(b" x", 0), Err(Fail::Backtrack { pos: 1, .. })));
    }

    #[test]
    fn test_unbalanced_token_is_fatal() {
        assert!(matches!(scan_token(b"div(phi;", 0), Err(Fail::Fatal(_))));
    }

    #[test]
    fn test_quoted_string_keeps_quotes() {
        let (token, end) = scan_token(br#""a \"b\" c" x"#, 0).unwrap();
        assert_eq!(token, r#""a \"b\" c""#);
        assert_eq!(end, 11);
        assert!(matches!(scan_token(b"\"open", 0), Err(Fail::Fatal(_))));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(scan_number(b"42;", 0).unwrap(), (Number::Integer(42), 2));
        assert_eq!(scan_number(b"-1.5e-3 ", 0).unwrap(), (Number::Float(-1.5e-3), 7));
        assert_eq!(scan_number(b".5", 0).unwrap(), (Number::Float(0.5), 2));
        assert_eq!(scan_number(b"1e5", 0).unwrap(), (Number::Float(1e5), 3));
        assert!(scan_number(b".", 0).is_err());
        assert!(scan_number(b"1e", 0).is_err());
        assert!(scan_number(b"abc", 0).is_err());
    }

    #[test]
    fn test_special_floats() {
        let (value, end) = scan_float(b"-Infinity)", 0).unwrap();
        assert_eq!(value, f64::NEG_INFINITY);
        assert_eq!(end, 9);
        assert!(scan_float(b"NaN", 0).unwrap().0.is_nan());
        assert_eq!(scan_float(b"inf", 0).unwrap().0, f64::INFINITY);
        assert!(scan_float(b"information", 0).is_err());
    }

    #[test]
    fn test_integer_rejects_floats() {
        assert_eq!(scan_integer(b"12(", 0).unwrap(), (12, 2));
        assert!(scan_integer(b"1.5", 0).is_err());
        assert!(scan_integer(b"1e3", 0).is_err());
        assert!(scan_integer(b"nan", 0).is_err());
    }

    #[test]
    fn test_switch_whole_word() {
        assert_eq!(scan_switch(b"yes;", 0).unwrap(), (true, 3));
        assert_eq!(scan_switch(b"off", 0).unwrap(), (false, 3));
        assert!(scan_switch(b"yesterday", 0).is_err());
        assert!(scan_switch(b"Yes", 0).is_err());
    }

    #[test]
    fn test_directive() {
        assert_eq!(scan_directive(b"#include \"x\"", 0).unwrap().0, "#include");
        assert!(scan_directive(b"include", 0).is_err());
    }

    #[test]
    fn test_expect() {
        assert_eq!(expect(b"{a", 0, "{").unwrap(), 1);
        assert!(expect(b"a", 0, "{").is_err());
        assert!(expect(b"", 3, "{").is_err());
    }
}
