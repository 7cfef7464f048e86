//! Grammar productions for OpenFOAM values.
//!
//! A [`Parser`] wraps the input buffer together with a [`Format`] hint and
//! exposes one method per production. Each method takes a start offset and
//! returns a [`Scan`]: either the parsed value and the offset after it, or a
//! [`Fail`]. Alternatives are tried in a fixed order and the first one that
//! matches wins:
//!
//! ```text
//! data entry := field | list | dimensioned | dimension set | number | switch | token
//! data       := data entry { data entry }
//! ```
//!
//! Binary numeric payloads are located purely by their length prefix; the bytes
//! between the parentheses are never scanned as text.

use crate::dimensions::{DimensionSet, Dimensioned};
use crate::error::Result;
use crate::field::{Field, NumericArray, NumericData};
use crate::map::Dict;
use crate::options::Format;
use crate::scan::{
    attempt, directive_end, expect, peek, scan_float, scan_integer, scan_number, scan_switch,
    scan_token, skip, Fail, Scan,
};
use crate::tensor::{Tensor, TensorKind};
use crate::value::{KeywordEntry, ListItem, Value};

/// Element type of a binary numeric payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryItem {
    I32,
    F32,
    F64,
}

impl BinaryItem {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            BinaryItem::I32 | BinaryItem::F32 => 4,
            BinaryItem::F64 => 8,
        }
    }

    fn decode(self, payload: &[u8]) -> NumericData {
        match self {
            BinaryItem::I32 => NumericData::I32(
                payload
                    .chunks_exact(4)
                    .map(|c| {
                        let mut buf = [0u8; 4];
                        buf.copy_from_slice(c);
                        i32::from_ne_bytes(buf)
                    })
                    .collect(),
            ),
            BinaryItem::F32 => NumericData::F32(
                payload
                    .chunks_exact(4)
                    .map(|c| {
                        let mut buf = [0u8; 4];
                        buf.copy_from_slice(c);
                        f32::from_ne_bytes(buf)
                    })
                    .collect(),
            ),
            BinaryItem::F64 => NumericData::F64(
                payload
                    .chunks_exact(8)
                    .map(|c| {
                        let mut buf = [0u8; 8];
                        buf.copy_from_slice(c);
                        f64::from_ne_bytes(buf)
                    })
                    .collect(),
            ),
        }
    }
}

/// Upper bound on the number of values a `count{item}` repeat may expand to.
pub const MAX_REPEAT: usize = 1 << 27;

/// Checks an `N{x}` expansion of `width` values per copy against [`MAX_REPEAT`].
fn check_repeat(input: &[u8], pos: usize, times: usize, width: usize) -> std::result::Result<(), Fail> {
    match times.checked_mul(width) {
        Some(total) if total <= MAX_REPEAT => Ok(()),
        _ => Err(Fail::fatal_semantic(
            input,
            pos,
            format!("repeat count {times} exceeds the limit of {MAX_REPEAT} values"),
        )),
    }
}

/// Accumulates ASCII list elements as integers or floats.
enum Accum {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Accum {
    fn new(integers: bool, capacity: usize) -> Self {
        if integers {
            Accum::Int(Vec::with_capacity(capacity))
        } else {
            Accum::Float(Vec::with_capacity(capacity))
        }
    }

    fn push_scanned(&mut self, input: &[u8], pos: usize) -> std::result::Result<usize, Fail> {
        match self {
            Accum::Int(values) => {
                let (n, end) = scan_integer(input, pos)?;
                values.push(n);
                Ok(end)
            }
            Accum::Float(values) => {
                let (x, end) = scan_float(input, pos)?;
                values.push(x);
                Ok(end)
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Accum::Int(v) => v.len(),
            Accum::Float(v) => v.len(),
        }
    }

    /// Repeats the current contents until there are `times` copies.
    fn repeat(&mut self, times: usize) {
        match self {
            Accum::Int(v) => *v = v.repeat(times),
            Accum::Float(v) => *v = v.repeat(times),
        }
    }

    fn into_data(self) -> NumericData {
        match self {
            Accum::Int(v) => NumericData::I64(v),
            Accum::Float(v) => NumericData::F64(v),
        }
    }
}

/// Runs alternatives in order, returning the first match.
///
/// When none matches, the failure that got furthest into the input is reported.
fn first_of<T>(pos: usize, expected: &'static str, alternatives: &[&dyn Fn(usize) -> Scan<T>]) -> Scan<T> {
    let mut failure = Fail::backtrack(pos, expected);
    for alternative in alternatives {
        match alternative(pos) {
            Ok(hit) => return Ok(hit),
            Err(Fail::Fatal(err)) => return Err(Fail::Fatal(err)),
            Err(miss) => failure = failure.furthest(miss),
        }
    }
    Err(failure)
}

/// Grammar productions over one input buffer.
#[derive(Clone, Copy, Debug)]
pub struct Parser<'a> {
    input: &'a [u8],
    format: Format,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Parser {
            input,
            format: Format::Ascii,
        }
    }

    #[must_use]
    pub const fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub const fn input(&self) -> &'a [u8] {
        self.input
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    pub fn set_format(&mut self, format: Format) {
        self.format = format;
    }

    #[inline]
    pub fn skip(&self, pos: usize) -> std::result::Result<usize, Fail> {
        skip(self.input, pos, true)
    }

    /// Runs `production` over the whole input, allowing surrounding whitespace
    /// and comments, and converts failures into crate errors.
    pub fn complete<T>(&self, production: impl FnOnce(usize) -> Scan<T>) -> Result<T> {
        let run = || -> std::result::Result<T, Fail> {
            let start = self.skip(0)?;
            let (value, end) = production(start)?;
            let end = self.skip(end)?;
            if end < self.input.len() {
                return Err(Fail::backtrack(end, "end of input"));
            }
            Ok(value)
        };
        run().map_err(|fail| fail.into_error(self.input))
    }

    /// `[` up to seven numbers `]`.
    pub fn dimension_set(&self, pos: usize) -> Scan<DimensionSet> {
        let mut i = expect(self.input, pos, "[")?;
        let mut values = Vec::with_capacity(7);
        loop {
            i = self.skip(i)?;
            if peek(self.input, i) == Some(b']') {
                i += 1;
                break;
            }
            if values.len() == 7 {
                return Err(Fail::backtrack(i, "']'"));
            }
            let (n, next) = scan_number(self.input, i)?;
            values.push(n.as_f64());
            i = next;
        }
        DimensionSet::from_slice(&values)
            .map(|dims| (dims, i))
            .ok_or_else(|| Fail::backtrack(pos, "dimension set"))
    }

    /// Optional name, dimension set, then a tensor.
    pub fn dimensioned(&self, pos: usize) -> Scan<Dimensioned> {
        let (name, i) = match attempt(scan_token(self.input, pos))? {
            Some((name, next)) => (Some(name), self.skip(next)?),
            None => (None, pos),
        };
        let (dimensions, i) = self.dimension_set(i)?;
        let i = self.skip(i)?;
        let (value, end) = self.tensor(i)?;
        Ok((
            Dimensioned {
                value,
                dimensions,
                name,
            },
            end,
        ))
    }

    /// A bare number, or `(` 3, 6 or 9 numbers `)`.
    pub fn tensor(&self, pos: usize) -> Scan<Tensor> {
        if peek(self.input, pos) != Some(b'(') {
            return scan_float(self.input, pos).map(|(x, end)| (Tensor::Scalar(x), end));
        }

        let mut i = pos + 1;
        let mut values = Vec::with_capacity(9);
        loop {
            i = self.skip(i)?;
            if peek(self.input, i) == Some(b')') {
                i += 1;
                break;
            }
            if values.len() == 9 {
                return Err(Fail::backtrack(i, "')'"));
            }
            let (x, next) = scan_float(self.input, i)?;
            values.push(x);
            i = next;
        }

        match values.len() {
            3 | 6 | 9 => Tensor::from_components(&values)
                .map(|t| (t, i))
                .ok_or_else(|| Fail::backtrack(pos, "tensor")),
            n => Err(Fail::fatal_semantic(
                self.input,
                pos,
                format!("tensor must have 3, 6 or 9 components, found {n}"),
            )),
        }
    }

    /// `uniform <tensor>` or `nonuniform [List<kind>] <numeric list>`.
    pub fn field(&self, pos: usize) -> Scan<Field> {
        let (word, i) = scan_token(self.input, pos)?;
        match word.as_str() {
            "uniform" => {
                let i = self.skip(i)?;
                let (tensor, end) = self.tensor(i)?;
                Ok((Field::Uniform(tensor), end))
            }
            "nonuniform" => {
                let i = self.skip(i)?;
                let (kind, i) = match attempt(scan_token(self.input, i))? {
                    Some((tag, next)) => {
                        let kind = tag
                            .strip_prefix("List<")
                            .and_then(|inner| inner.strip_suffix('>'))
                            .and_then(TensorKind::from_name)
                            .ok_or_else(|| {
                                Fail::backtrack(i, "List<scalar|vector|symmTensor|tensor>")
                            })?;
                        (Some(kind), self.skip(next)?)
                    }
                    None => (None, i),
                };
                let (array, end) = self.nonuniform_values(i, kind)?;
                Ok((Field::NonUniform(array), end))
            }
            _ => Err(Fail::backtrack(pos, "'uniform' or 'nonuniform'")),
        }
    }

    /// Numeric payload of a nonuniform field.
    ///
    /// Without a type tag the element shapes are tried scalar first. ASCII is
    /// tried before binary unless the document is binary.
    fn nonuniform_values(&self, pos: usize, kind: Option<TensorKind>) -> Scan<NumericArray> {
        let kinds: Vec<TensorKind> = kind.map_or_else(|| TensorKind::ALL.to_vec(), |k| vec![k]);
        let kinds = kinds.as_slice();

        let ascii = |p: usize| -> Scan<NumericArray> {
            let mut failure = Fail::backtrack(p, "numeric list");
            for &k in kinds {
                match self.ascii_numeric_list(p, k, false, true) {
                    Ok(hit) => return Ok(hit),
                    Err(Fail::Fatal(err)) => return Err(Fail::Fatal(err)),
                    Err(miss) => failure = failure.furthest(miss),
                }
            }
            Err(failure)
        };
        let binary = |item: BinaryItem| {
            move |p: usize| -> Scan<NumericArray> {
                let mut failure = Fail::backtrack(p, "binary numeric list");
                for &k in kinds {
                    match self.binary_numeric_list(p, k, item) {
                        Ok(hit) => return Ok(hit),
                        Err(miss) => failure = failure.furthest(miss),
                    }
                }
                Err(failure)
            }
        };
        let binary_f64 = binary(BinaryItem::F64);
        let binary_f32 = binary(BinaryItem::F32);

        if self.format.is_binary() {
            first_of(pos, "numeric list", &[&binary_f64, &binary_f32, &ascii])
        } else {
            first_of(pos, "numeric list", &[&ascii, &binary_f64, &binary_f32])
        }
    }

    fn ascii_element(&self, pos: usize, kind: TensorKind, acc: &mut Accum) -> std::result::Result<usize, Fail> {
        if kind == TensorKind::Scalar {
            return acc.push_scanned(self.input, pos);
        }
        let mut i = expect(self.input, pos, "(")?;
        for _ in 0..kind.components() {
            i = self.skip(i)?;
            i = acc.push_scanned(self.input, i)?;
        }
        i = self.skip(i)?;
        expect(self.input, i, ")")
    }

    /// `[count] ( elements )` or `count{element}`.
    ///
    /// Elements are bare numbers for scalars, or parenthesised groups of the
    /// kind's component count. With `integers` set, any fraction or exponent
    /// makes the list fail.
    pub fn ascii_numeric_list(
        &self,
        pos: usize,
        kind: TensorKind,
        integers: bool,
        empty_ok: bool,
    ) -> Scan<NumericArray> {
        let mut i = pos;
        let count = match attempt(scan_integer(self.input, i))? {
            Some((n, next)) => {
                let n = usize::try_from(n).map_err(|_| Fail::backtrack(pos, "list size"))?;
                i = self.skip(next)?;
                Some(n)
            }
            None => None,
        };
        if count == Some(0) && !empty_ok {
            return Err(Fail::backtrack(pos, "non-empty list"));
        }

        let components = kind.components();
        let capacity = count
            .unwrap_or(0)
            .saturating_mul(components)
            .min(self.input.len());
        let mut acc = Accum::new(integers, capacity);

        match (peek(self.input, i), count) {
            (Some(b'('), _) => {
                i += 1;
                loop {
                    i = self.skip(i)?;
                    if peek(self.input, i) == Some(b')') {
                        i += 1;
                        break;
                    }
                    i = self.ascii_element(i, kind, &mut acc)?;
                }
            }
            (Some(b'{'), Some(n)) => {
                i = self.skip(i + 1)?;
                i = self.ascii_element(i, kind, &mut acc)?;
                i = self.skip(i)?;
                i = expect(self.input, i, "}")?;
                check_repeat(self.input, pos, n, components)?;
                acc.repeat(n);
            }
            _ => return Err(Fail::backtrack(i, "'('")),
        }

        let elements = acc.len() / components;
        if let Some(n) = count {
            if n != elements {
                return Err(Fail::backtrack(pos, format!("list of {n} elements")));
            }
        }
        if elements == 0 && !empty_ok {
            return Err(Fail::backtrack(pos, "non-empty list"));
        }

        let array = NumericArray::new(kind, acc.into_data())?;
        Ok((array, i))
    }

    /// `count ( <raw bytes> )` with exactly `count × components × item size` bytes.
    pub fn binary_numeric_list(&self, pos: usize, kind: TensorKind, item: BinaryItem) -> Scan<NumericArray> {
        let (count, i) = scan_integer(self.input, pos)?;
        let count = usize::try_from(count).map_err(|_| Fail::backtrack(pos, "list size"))?;
        let i = self.skip(i)?;
        let start = expect(self.input, i, "(")?;

        let size = count
            .checked_mul(kind.components())
            .and_then(|n| n.checked_mul(item.size()))
            .ok_or_else(|| Fail::backtrack(pos, "list size"))?;
        let end = start
            .checked_add(size)
            .filter(|&end| peek(self.input, end) == Some(b')'))
            .ok_or_else(|| Fail::backtrack(start, "')' after binary payload"))?;

        let array = NumericArray::new(kind, item.decode(&self.input[start..end]))?;
        Ok((array, end + 1))
    }

    /// `[count] ( 3(a b c) 4(a b c d) ... )`.
    pub fn faces_list(&self, pos: usize) -> Scan<Vec<Vec<i64>>> {
        let mut i = pos;
        let count = match attempt(scan_integer(self.input, i))? {
            Some((n, next)) => {
                i = self.skip(next)?;
                Some(n)
            }
            None => None,
        };
        i = expect(self.input, i, "(")?;

        let mut faces = Vec::new();
        loop {
            i = self.skip(i)?;
            if peek(self.input, i) == Some(b')') {
                i += 1;
                break;
            }
            let (n, next) = scan_integer(self.input, i)?;
            if n != 3 && n != 4 {
                return Err(Fail::backtrack(i, "face size 3 or 4"));
            }
            i = self.skip(next)?;
            i = expect(self.input, i, "(")?;
            let mut face = Vec::with_capacity(4);
            for _ in 0..n {
                i = self.skip(i)?;
                let (index, next) = scan_integer(self.input, i)?;
                face.push(index);
                i = next;
            }
            i = self.skip(i)?;
            i = expect(self.input, i, ")")?;
            faces.push(face);
        }

        if let Some(n) = count {
            if usize::try_from(n).ok() != Some(faces.len()) {
                return Err(Fail::backtrack(pos, format!("list of {n} faces")));
            }
        }
        Ok((faces, i))
    }

    /// `[count] ( items )` or `count{item}`.
    pub fn list(&self, pos: usize) -> Scan<Vec<ListItem>> {
        let mut i = pos;
        let count = match attempt(scan_integer(self.input, i))? {
            Some((n, next)) => {
                let n = usize::try_from(n).map_err(|_| Fail::backtrack(pos, "list size"))?;
                i = self.skip(next)?;
                Some(n)
            }
            None => None,
        };

        match (peek(self.input, i), count) {
            (Some(b'('), _) => {
                i += 1;
                let mut items = Vec::with_capacity(count.unwrap_or(0).min(1024));
                loop {
                    i = self.skip(i)?;
                    match count {
                        Some(n) if items.len() == n => {
                            i = expect(self.input, i, ")")?;
                            break;
                        }
                        None if peek(self.input, i) == Some(b')') => {
                            i += 1;
                            break;
                        }
                        _ => {}
                    }
                    let (item, next) = self.list_item(i)?;
                    items.push(item);
                    i = next;
                }
                Ok((items, i))
            }
            (Some(b'{'), Some(n)) => {
                i = self.skip(i + 1)?;
                let (item, next) = self.list_item(i)?;
                i = self.skip(next)?;
                i = expect(self.input, i, "}")?;
                check_repeat(self.input, pos, n, 1)?;
                Ok((vec![item; n], i))
            }
            _ => Err(Fail::backtrack(i, "'('")),
        }
    }

    fn list_item(&self, pos: usize) -> Scan<ListItem> {
        if let Some((dict, end)) = attempt(self.dictionary(pos))? {
            return Ok((ListItem::Value(Value::Dict(dict)), end));
        }
        if let Some((entry, end)) = attempt(self.keyword_entry(pos))? {
            return Ok((ListItem::Entry(entry), end));
        }
        let (value, end) = self.data_entry(pos)?;
        Ok((ListItem::Value(value), end))
    }

    /// `keyword {dict}` or `keyword data;` inside a list.
    pub fn keyword_entry(&self, pos: usize) -> Scan<KeywordEntry> {
        let (keyword, i) = self.data_entry(pos)?;
        if keyword.is_number() {
            return Err(Fail::backtrack(pos, "keyword"));
        }
        let i = self.skip(i)?;
        if let Some((dict, end)) = attempt(self.dictionary(i))? {
            return Ok((KeywordEntry::new(keyword, Value::Dict(dict)), end));
        }
        let (value, i) = self.data(i)?;
        let i = self.skip(i)?;
        let end = expect(self.input, i, ";")?;
        Ok((KeywordEntry::new(keyword, value), end))
    }

    /// `{ entries }` appearing as a value.
    pub fn dictionary(&self, pos: usize) -> Scan<Dict> {
        let mut i = expect(self.input, pos, "{")?;
        let mut dict = Dict::new();
        loop {
            i = self.skip(i)?;
            if peek(self.input, i) == Some(b'}') {
                return Ok((dict, i + 1));
            }
            let key_pos = i;
            let (key, next) = scan_token(self.input, i)?;
            i = self.skip(next)?;

            let value = if key.starts_with('#') {
                let (value, next) = self.data_entry(i)?;
                i = directive_end(self.input, next)?;
                value
            } else if let Some((sub, end)) = attempt(self.dictionary(i))? {
                i = end;
                Value::Dict(sub)
            } else if peek(self.input, i) == Some(b';') {
                i += 1;
                Value::Empty
            } else {
                let (value, next) = self.data(i)?;
                i = self.skip(next)?;
                i = expect(self.input, i, ";")?;
                value
            };

            if dict.try_insert(key.clone(), value).is_err() {
                return Err(Fail::fatal_semantic(
                    self.input,
                    key_pos,
                    format!("duplicate keyword '{key}'"),
                ));
            }
        }
    }

    /// One value, trying each production in priority order.
    pub fn data_entry(&self, pos: usize) -> Scan<Value> {
        let input = self.input;
        first_of(
            pos,
            "value",
            &[
                &|p| self.field(p).map(|(f, e)| (Value::Field(f), e)),
                &|p| self.list(p).map(|(l, e)| (Value::List(l), e)),
                &|p| self.dimensioned(p).map(|(d, e)| (Value::Dimensioned(d), e)),
                &|p| self.dimension_set(p).map(|(d, e)| (Value::DimensionSet(d), e)),
                &|p| scan_number(input, p).map(|(n, e)| (Value::Number(n), e)),
                &|p| scan_switch(input, p).map(|(b, e)| (Value::Switch(b), e)),
                &|p| scan_token(input, p).map(|(t, e)| (Value::Text(t), e)),
            ],
        )
    }

    /// One or more data entries; two or more form a tuple.
    pub fn data(&self, pos: usize) -> Scan<Value> {
        let (first, mut end) = self.data_entry(pos)?;
        let mut values = vec![first];
        loop {
            let next = self.skip(end)?;
            match attempt(self.data_entry(next))? {
                Some((value, after)) => {
                    values.push(value);
                    end = after;
                }
                None => break,
            }
        }
        Ok((collapse(values), end))
    }

    fn binary_standalone(&self, pos: usize) -> Option<(NumericArray, usize)> {
        [
            (TensorKind::Scalar, BinaryItem::I32),
            (TensorKind::Scalar, BinaryItem::F64),
            (TensorKind::Vector, BinaryItem::F64),
            (TensorKind::Vector, BinaryItem::F32),
        ]
        .into_iter()
        .find_map(|(kind, item)| self.binary_numeric_list(pos, kind, item).ok())
    }

    /// Text alternatives for standalone data: ASCII numeric lists, then faces
    /// lists, then ordinary data.
    fn text_standalone(&self, pos: usize) -> Scan<Value> {
        for (kind, integers) in [
            (TensorKind::Scalar, true),
            (TensorKind::Scalar, false),
            (TensorKind::Vector, false),
        ] {
            if let Some((array, end)) = attempt(self.ascii_numeric_list(pos, kind, integers, false))? {
                return Ok((Value::Array(array), end));
            }
        }
        if let Some((faces, end)) = attempt(self.faces_list(pos))? {
            return Ok((Value::Faces(faces), end));
        }
        self.data_entry(pos)
    }

    /// One un-keyed top-level value.
    ///
    /// In a binary document the binary payloads are tried first, so the raw
    /// bytes are never scanned as text. Otherwise ASCII numeric lists and faces
    /// lists win outright, and ordinary data competes with a binary payload:
    /// the longer match wins with ties going to binary. Any text failure,
    /// fatal or not, gives way to a binary match.
    pub fn standalone_entry(&self, pos: usize) -> Scan<Value> {
        let binary = self.binary_standalone(pos);
        if self.format.is_binary() {
            if let Some((array, end)) = binary {
                return Ok((Value::Array(array), end));
            }
        }

        match (self.text_standalone(pos), binary) {
            (Ok((value, text_end)), Some((array, binary_end))) => match value {
                Value::Array(_) | Value::Faces(_) => Ok((value, text_end)),
                _ if text_end > binary_end => Ok((value, text_end)),
                _ => Ok((Value::Array(array), binary_end)),
            },
            (Ok(hit), None) => Ok(hit),
            (Err(_), Some((array, end))) => Ok((Value::Array(array), end)),
            (Err(fail), None) => Err(fail),
        }
    }

    /// One or more standalone entries; two or more form a tuple.
    pub fn standalone(&self, pos: usize) -> Scan<Value> {
        let (first, mut end) = self.standalone_entry(pos)?;
        let mut values = vec![first];
        loop {
            let next = self.skip(end)?;
            if next >= self.input.len() {
                break;
            }
            match attempt(self.standalone_entry(next))? {
                Some((value, after)) => {
                    values.push(value);
                    end = after;
                }
                None => break,
            }
        }
        Ok((collapse(values), end))
    }
}

fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.pop().unwrap_or_default()
    } else {
        Value::Tuple(values)
    }
}
