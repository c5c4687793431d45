//! Lazily decoded, read-only columns over a text buffer.
//!
//! A [`Column`] never copies the buffer. Each call to [`Column::value`] slices
//! the text for one row and decodes it, so a column costs a few words no
//! matter how many rows it covers. Four sources back a column:
//!
//! - **fixed-width**: a byte offset and width inside each line
//! - **token**: one pre-tokenized range per row
//! - **list**: a token range split on a separator at every access
//! - **undefined**: stand-in for data the file does not contain
//!
//! ```ignore
//! let x: Column<f64> = Column::fixed(data, &lines, 20, 8);
//! let first = x.value(0);
//! let all: Vec<f64> = x.to_vec();
//! ```

pub mod value;

use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::text::number::Scanned;
use crate::text::tokenizer::{slice, Tokens};

pub use value::{ColumnValue, Element, ElementType, ValueType};

/// Whether a row holds a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Present,
    /// Explicitly absent: CIF `.`, or a fixed-width field past the line end.
    Missing,
    /// Unknown: CIF `?`, or every row of an undefined column.
    Unspecified,
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Fixed {
        data: &'a str,
        lines: &'a Tokens,
        offset: usize,
        width: usize,
    },
    Token {
        data: &'a str,
        tokens: &'a Tokens,
    },
    List {
        data: &'a str,
        tokens: &'a Tokens,
        separator: char,
    },
    Undefined,
}

/// A typed, lazily evaluated view over one field's values.
pub struct Column<'a, T> {
    source: Source<'a>,
    row_count: usize,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Column<'_, T> {}

impl<T: ColumnValue> fmt::Debug for Column<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            Source::Fixed { .. } => "fixed",
            Source::Token { .. } => "token",
            Source::List { .. } => "list",
            Source::Undefined => "undefined",
        };
        f.debug_struct("Column")
            .field("type", &T::TYPE)
            .field("source", &source)
            .field("row_count", &self.row_count)
            .finish()
    }
}

impl<'a, T: ColumnValue> Column<'a, T> {
    /// Column sliced at `offset..offset + width` within each line of `lines`.
    pub fn fixed(data: &'a str, lines: &'a Tokens, offset: usize, width: usize) -> Self {
        Self {
            source: Source::Fixed {
                data,
                lines,
                offset,
                width,
            },
            row_count: lines.count(),
            _value: PhantomData,
        }
    }

    /// Column with one token range per row.
    pub fn tokens(data: &'a str, tokens: &'a Tokens) -> Self {
        Self {
            source: Source::Token { data, tokens },
            row_count: tokens.count(),
            _value: PhantomData,
        }
    }

    /// Stand-in column: `row_count` rows, all zero and [`ValueKind::Unspecified`].
    pub fn undefined(row_count: usize) -> Self {
        Self {
            source: Source::Undefined,
            row_count,
            _value: PhantomData,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn value_type(&self) -> ValueType {
        T::TYPE
    }

    /// False only for the undefined stand-in.
    pub fn is_defined(&self) -> bool {
        !matches!(self.source, Source::Undefined)
    }

    /// Raw text of a row, before decoding. Empty for undefined columns.
    pub fn raw(&self, row: usize) -> &'a str {
        debug_assert!(row < self.row_count, "row {row} out of range");
        match self.source {
            Source::Fixed {
                data,
                lines,
                offset,
                width,
            } => {
                let start = lines.start(row) + offset;
                let line_end = lines.end(row);
                if start >= line_end {
                    return "";
                }
                slice(data, start, (start + width).min(line_end)).trim()
            }
            Source::Token { data, tokens } | Source::List { data, tokens, .. } => {
                tokens.slice(data, row)
            }
            Source::Undefined => "",
        }
    }

    pub fn value_kind(&self, row: usize) -> ValueKind {
        match self.source {
            Source::Fixed { lines, offset, .. } => {
                if lines.start(row) + offset >= lines.end(row) {
                    ValueKind::Missing
                } else {
                    ValueKind::Present
                }
            }
            Source::Token { data, tokens } | Source::List { data, tokens, .. } => {
                token_kind(data, tokens.start(row), tokens.end(row))
            }
            Source::Undefined => ValueKind::Unspecified,
        }
    }

    fn decode(&self, row: usize) -> Option<Scanned<T>> {
        if self.value_kind(row) != ValueKind::Present {
            return None;
        }
        let separator = match self.source {
            Source::List { separator, .. } => Some(separator),
            _ => None,
        };
        Some(T::decode(self.raw(row), separator))
    }

    /// Decoded value of `row`; the zero value when the row is not present or
    /// does not parse.
    pub fn value(&self, row: usize) -> T {
        self.decode(row).map_or_else(T::zero, |scanned| scanned.value)
    }

    /// Like [`value`](Self::value), but a present value that fails to parse is
    /// an error instead of a zero.
    pub fn try_value(&self, row: usize) -> Result<T, DecodeError> {
        match self.decode(row) {
            None => Ok(T::zero()),
            Some(scanned) if scanned.complete => Ok(scanned.value),
            Some(_) => Err(DecodeError::InvalidNumericLiteral {
                category: String::new(),
                field: String::new(),
                row,
                literal: self.raw(row).to_string(),
            }),
        }
    }

    /// Check every row with [`try_value`](Self::try_value).
    pub fn validate(&self) -> Result<(), DecodeError> {
        (0..self.row_count).try_for_each(|row| self.try_value(row).map(drop))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = T> + 'a {
        let column = *self;
        (0..column.row_count).map(move |row| column.value(row))
    }

    /// Decode every row into a `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// Decode every row into any collection, e.g. a `Box<[T]>` or `VecDeque`.
    pub fn collect_into<C: FromIterator<T>>(&self) -> C {
        self.iter().collect()
    }

    /// Compare the decoded values of two rows.
    pub fn are_values_equal(&self, row_a: usize, row_b: usize) -> bool {
        self.value(row_a) == self.value(row_b)
    }
}

impl<'a, E: Element> Column<'a, Vec<E>> {
    /// Column whose token for each row is split on `separator` at every access.
    pub fn list(data: &'a str, tokens: &'a Tokens, separator: char) -> Self {
        Self {
            source: Source::List {
                data,
                tokens,
                separator,
            },
            row_count: tokens.count(),
            _value: PhantomData,
        }
    }

    /// Number of elements in a row without decoding them.
    pub fn element_count(&self, row: usize) -> usize {
        if self.value_kind(row) != ValueKind::Present {
            return 0;
        }
        let raw = self.raw(row);
        match self.source {
            Source::List { separator, .. } if !separator.is_whitespace() => {
                if raw.trim().is_empty() {
                    0
                } else {
                    raw.split(separator).count()
                }
            }
            _ => raw.split_whitespace().count(),
        }
    }
}

impl<'a> Column<'a, String> {
    /// Decoded string of a row, borrowed from the buffer.
    pub fn str_value(&self, row: usize) -> &'a str {
        if self.value_kind(row) != ValueKind::Present {
            return "";
        }
        self.raw(row)
    }

    /// Compare the decoded value of `row` with `s`, without allocating.
    pub fn string_equals(&self, row: usize, s: &str) -> bool {
        self.str_value(row) == s
    }
}

/// Classify a token: a bare `.` is missing and a bare `?` is unspecified.
///
/// Quoted `'.'` and `'?'` are ordinary strings; the byte before the token body
/// is the opening quote (or `;` for text fields) in that case.
fn token_kind(data: &str, start: usize, end: usize) -> ValueKind {
    if end != start + 1 {
        return ValueKind::Present;
    }
    let bytes = data.as_bytes();
    let quoted = start > 0 && matches!(bytes[start - 1], b'\'' | b'"' | b';');
    match bytes[start] {
        b'.' if !quoted => ValueKind::Missing,
        b'?' if !quoted => ValueKind::Unspecified,
        _ => ValueKind::Present,
    }
}
