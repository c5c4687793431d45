//! Raw tabular model shared by all format drivers.
//!
//! A [`Document`] holds [`Block`]s, a block holds named [`Category`] tables and
//! a category holds [`Field`]s. Nothing is decoded at this layer: a field is
//! only a set of byte ranges into the source buffer plus a raw [`FieldKind`].
//! Typed access goes through [`Field::column`] or the schema mapper.

use std::sync::Arc;

use crate::column::{Column, ColumnValue, Element, ValueKind};
use crate::error::DecodeError;
use crate::text::tokenizer::Tokens;

/// Physical kind of a raw field, as written in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int,
    Float,
    /// Free text; every CIF value is raw text.
    Str,
    /// Text holding a separated list.
    List,
}

/// How a field's rows are located in the buffer.
#[derive(Debug, Clone)]
pub enum Encoding {
    /// One token range per row.
    Tokens(Tokens),
    /// A byte window inside each line. Lines are shared by every field of a
    /// fixed-column table.
    Fixed {
        lines: Arc<Tokens>,
        offset: usize,
        width: usize,
    },
}

/// A named column of raw values.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    name: String,
    kind: FieldKind,
    data: &'a str,
    encoding: Encoding,
}

impl<'a> Field<'a> {
    /// Field backed by one token per row.
    pub fn from_tokens(
        name: impl Into<String>,
        kind: FieldKind,
        data: &'a str,
        tokens: Tokens,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
            encoding: Encoding::Tokens(tokens),
        }
    }

    /// Field backed by a fixed byte window of each line.
    pub fn fixed(
        name: impl Into<String>,
        kind: FieldKind,
        data: &'a str,
        lines: Arc<Tokens>,
        offset: usize,
        width: usize,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            data,
            encoding: Encoding::Fixed {
                lines,
                offset,
                width,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn row_count(&self) -> usize {
        match &self.encoding {
            Encoding::Tokens(tokens) => tokens.count(),
            Encoding::Fixed { lines, .. } => lines.count(),
        }
    }

    /// Typed view of this field.
    pub fn column<T: ColumnValue>(&self) -> Column<'_, T> {
        match &self.encoding {
            Encoding::Tokens(tokens) => Column::tokens(self.data, tokens),
            Encoding::Fixed {
                lines,
                offset,
                width,
            } => Column::fixed(self.data, lines, *offset, *width),
        }
    }

    /// List view splitting each row on `separator`.
    ///
    /// Returns `None` for fixed-width fields, whose windows are not list
    /// tokens.
    pub fn list_column<E: Element>(&self, separator: char) -> Option<Column<'_, Vec<E>>> {
        match &self.encoding {
            Encoding::Tokens(tokens) => Some(Column::list(self.data, tokens, separator)),
            Encoding::Fixed { .. } => None,
        }
    }

    /// Raw text of a row.
    pub fn text(&self, row: usize) -> &str {
        self.column::<String>().raw(row)
    }

    pub fn value_kind(&self, row: usize) -> ValueKind {
        self.column::<String>().value_kind(row)
    }

    /// Text of a row, or `None` for `.` / `?` markers.
    pub fn as_str(&self, row: usize) -> Option<&str> {
        match self.value_kind(row) {
            ValueKind::Present => Some(self.text(row)),
            _ => None,
        }
    }

    /// Tries to parse a row as `f64`, accepting CIF uncertainty notation such
    /// as `50.123(4)`.
    pub fn as_f64(&self, row: usize) -> Option<f64> {
        if self.value_kind(row) != ValueKind::Present {
            return None;
        }
        self.column::<f64>().try_value(row).ok()
    }

    pub fn as_i32(&self, row: usize) -> Option<i32> {
        if self.value_kind(row) != ValueKind::Present {
            return None;
        }
        self.column::<i32>().try_value(row).ok()
    }
}

/// One logical table: equally long fields under a category name.
#[derive(Debug, Clone)]
pub struct Category<'a> {
    name: String,
    row_count: usize,
    fields: Vec<Field<'a>>,
}

impl<'a> Category<'a> {
    /// Build a category, checking that every field has `row_count` rows.
    pub fn new(
        name: impl Into<String>,
        row_count: usize,
        fields: Vec<Field<'a>>,
    ) -> Result<Self, DecodeError> {
        let name = name.into();
        if let Some(field) = fields.iter().find(|f| f.row_count() != row_count) {
            return Err(DecodeError::RowCountMismatch {
                category: name,
                field: field.name.clone(),
                expected: row_count,
                found: field.row_count(),
            });
        }
        Ok(Self {
            name,
            row_count,
            fields,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn fields(&self) -> &[Field<'a>] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Find a field by name (case-insensitive).
    pub fn field(&self, name: &str) -> Option<&Field<'a>> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A named group of categories (`data_NAME` in CIF, one record in GRO).
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub name: String,
    pub categories: Vec<Category<'a>>,
    /// Save frames (rare, only in dictionaries).
    pub frames: Vec<Block<'a>>,
}

impl<'a> Block<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            categories: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Find a category by name (case-insensitive, leading `_` optional).
    pub fn category(&self, name: &str) -> Option<&Category<'a>> {
        let name = name.strip_prefix('_').unwrap_or(name);
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Find a field by its full tag, e.g. `_atom_site.Cartn_x`.
    pub fn field(&self, tag: &str) -> Option<&Field<'a>> {
        let (category, field) = split_tag(tag);
        self.category(category)?.field(field)
    }
}

/// A parsed multi-block document.
#[derive(Debug, Clone, Default)]
pub struct Document<'a> {
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Document<'a> {
    /// Find a block by name (case-insensitive).
    pub fn block(&self, name: &str) -> Option<&Block<'a>> {
        self.blocks.iter().find(|b| b.name.eq_ignore_ascii_case(name))
    }
}

/// Split `_category.field` into its parts. A tag without a `.` is a category
/// with a single unnamed field.
pub fn split_tag(tag: &str) -> (&str, &str) {
    let tag = tag.strip_prefix('_').unwrap_or(tag);
    match tag.find('.') {
        Some(dot) => (&tag[..dot], &tag[dot + 1..]),
        None => (tag, ""),
    }
}
