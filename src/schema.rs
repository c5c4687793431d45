//! Schema-driven mapping from raw blocks to typed columns.
//!
//! A [`Schema`] declares, per category, which fields the caller wants and how
//! to decode them. [`map_schema`] binds each declared field to the matching raw
//! field of a [`Block`], or to an undefined column when the file does not have
//! it:
//!
//! ```ignore
//! let schema = Schema::new().category("atom_site", |c| {
//!     c.int("id").str("label_atom_id").float("Cartn_x")
//! });
//! let db = map_schema(&schema, &doc.blocks[0])?;
//! let x = db.table("atom_site").unwrap().float("Cartn_x")?;
//! ```

use std::fmt;

use log::trace;

use crate::column::{Column, ColumnValue, Element, ElementType, ValueKind};
use crate::dom::{Block, Category, Field, FieldKind};
use crate::error::DecodeError;

/// How a declared field is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDecoder {
    Int,
    Float,
    Str,
    List {
        separator: char,
        element: ElementType,
    },
}

impl FieldDecoder {
    /// Whether a raw field of `kind` can be decoded this way.
    pub fn accepts(self, kind: FieldKind) -> bool {
        match (kind, self) {
            (FieldKind::Str, _) => true,
            (FieldKind::Int, FieldDecoder::Int | FieldDecoder::Float | FieldDecoder::Str) => true,
            (FieldKind::Float, FieldDecoder::Float | FieldDecoder::Str) => true,
            (FieldKind::List, FieldDecoder::List { .. } | FieldDecoder::Str) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDecoder::Int => f.write_str("int"),
            FieldDecoder::Float => f.write_str("float"),
            FieldDecoder::Str => f.write_str("str"),
            FieldDecoder::List { separator, element } => {
                write!(f, "list<{element}>({separator:?})")
            }
        }
    }
}

/// Declared fields of one category, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySchema {
    name: String,
    fields: Vec<(String, FieldDecoder)>,
}

impl CategorySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, decoder: FieldDecoder) -> Self {
        self.fields.push((name.into(), decoder));
        self
    }

    pub fn int(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDecoder::Int)
    }

    pub fn float(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDecoder::Float)
    }

    pub fn str(self, name: impl Into<String>) -> Self {
        self.field(name, FieldDecoder::Str)
    }

    pub fn list(self, name: impl Into<String>, separator: char, element: ElementType) -> Self {
        self.field(name, FieldDecoder::List { separator, element })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldDecoder)> {
        self.fields.iter().map(|(name, decoder)| (name.as_str(), *decoder))
    }
}

/// Caller-declared shape of a block: category name → field name → decoder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    categories: Vec<CategorySchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a category, filling in its fields with `build`.
    pub fn category(
        mut self,
        name: impl Into<String>,
        build: impl FnOnce(CategorySchema) -> CategorySchema,
    ) -> Self {
        self.categories.push(build(CategorySchema::new(name)));
        self
    }

    pub fn categories(&self) -> &[CategorySchema] {
        &self.categories
    }
}

/// A declared field bound to its typed column.
#[derive(Debug, Clone, Copy)]
pub enum TypedColumn<'a> {
    Int(Column<'a, i32>),
    Float(Column<'a, f64>),
    Str(Column<'a, String>),
    IntList(Column<'a, Vec<i32>>),
    FloatList(Column<'a, Vec<f64>>),
    StrList(Column<'a, Vec<String>>),
}

impl TypedColumn<'_> {
    pub fn row_count(&self) -> usize {
        match self {
            TypedColumn::Int(c) => c.row_count(),
            TypedColumn::Float(c) => c.row_count(),
            TypedColumn::Str(c) => c.row_count(),
            TypedColumn::IntList(c) => c.row_count(),
            TypedColumn::FloatList(c) => c.row_count(),
            TypedColumn::StrList(c) => c.row_count(),
        }
    }

    pub fn is_defined(&self) -> bool {
        match self {
            TypedColumn::Int(c) => c.is_defined(),
            TypedColumn::Float(c) => c.is_defined(),
            TypedColumn::Str(c) => c.is_defined(),
            TypedColumn::IntList(c) => c.is_defined(),
            TypedColumn::FloatList(c) => c.is_defined(),
            TypedColumn::StrList(c) => c.is_defined(),
        }
    }

    pub fn value_kind(&self, row: usize) -> ValueKind {
        match self {
            TypedColumn::Int(c) => c.value_kind(row),
            TypedColumn::Float(c) => c.value_kind(row),
            TypedColumn::Str(c) => c.value_kind(row),
            TypedColumn::IntList(c) => c.value_kind(row),
            TypedColumn::FloatList(c) => c.value_kind(row),
            TypedColumn::StrList(c) => c.value_kind(row),
        }
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        match self {
            TypedColumn::Int(c) => c.validate(),
            TypedColumn::Float(c) => c.validate(),
            TypedColumn::Str(c) => c.validate(),
            TypedColumn::IntList(c) => c.validate(),
            TypedColumn::FloatList(c) => c.validate(),
            TypedColumn::StrList(c) => c.validate(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            TypedColumn::Int(_) => "int",
            TypedColumn::Float(_) => "float",
            TypedColumn::Str(_) => "str",
            TypedColumn::IntList(_) => "list<int>",
            TypedColumn::FloatList(_) => "list<float>",
            TypedColumn::StrList(_) => "list<str>",
        }
    }
}

/// Typed view of one declared category.
#[derive(Debug, Clone)]
pub struct Table<'a> {
    name: String,
    row_count: usize,
    present: bool,
    columns: Vec<(String, TypedColumn<'a>)>,
}

impl<'a> Table<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// False when the block has no category of this name.
    pub fn is_present(&self) -> bool {
        self.present
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Find a declared column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&TypedColumn<'a>> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| c)
    }

    fn lookup(&self, name: &str) -> Result<&TypedColumn<'a>, DecodeError> {
        self.column(name).ok_or_else(|| DecodeError::UndeclaredField {
            category: self.name.clone(),
            field: name.to_string(),
        })
    }

    fn wrong_type(&self, name: &str, column: &TypedColumn<'a>, requested: &str) -> DecodeError {
        DecodeError::SchemaTypeMismatch {
            category: self.name.clone(),
            field: name.to_string(),
            declared: column.type_name().to_string(),
            found: format!("request for {requested}"),
        }
    }

    pub fn int(&self, name: &str) -> Result<Column<'a, i32>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::Int(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "int")),
        }
    }

    pub fn float(&self, name: &str) -> Result<Column<'a, f64>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::Float(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "float")),
        }
    }

    pub fn str(&self, name: &str) -> Result<Column<'a, String>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::Str(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "str")),
        }
    }

    pub fn int_list(&self, name: &str) -> Result<Column<'a, Vec<i32>>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::IntList(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "list<int>")),
        }
    }

    pub fn float_list(&self, name: &str) -> Result<Column<'a, Vec<f64>>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::FloatList(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "list<float>")),
        }
    }

    pub fn str_list(&self, name: &str) -> Result<Column<'a, Vec<String>>, DecodeError> {
        match self.lookup(name)? {
            TypedColumn::StrList(c) => Ok(*c),
            other => Err(self.wrong_type(name, other, "list<str>")),
        }
    }

    /// Check every defined column for unparsable values, reporting the first
    /// with this table's name and the column's.
    pub fn validate(&self) -> Result<(), DecodeError> {
        self.columns.iter().try_for_each(|(name, column)| {
            column
                .validate()
                .map_err(|e| e.in_field(&self.name, name))
        })
    }
}

/// Typed result of applying a [`Schema`] to a [`Block`].
#[derive(Debug, Clone)]
pub struct Database<'a> {
    tables: Vec<Table<'a>>,
}

impl<'a> Database<'a> {
    /// Find a declared table by name (case-insensitive).
    pub fn table(&self, name: &str) -> Option<&Table<'a>> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn tables(&self) -> &[Table<'a>] {
        &self.tables
    }

    pub fn validate(&self) -> Result<(), DecodeError> {
        self.tables.iter().try_for_each(Table::validate)
    }
}

/// Bind every field `schema` declares to a typed column over `block`.
///
/// Absent categories and fields become undefined columns. Fails only when a
/// declared decoder cannot read the raw field's encoding.
pub fn map_schema<'a>(schema: &Schema, block: &'a Block<'_>) -> Result<Database<'a>, DecodeError> {
    let tables = schema
        .categories
        .iter()
        .map(|declared| map_category(declared, block.category(&declared.name)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Database { tables })
}

fn map_category<'a>(
    declared: &CategorySchema,
    raw: Option<&'a Category<'_>>,
) -> Result<Table<'a>, DecodeError> {
    let row_count = raw.map_or(0, Category::row_count);
    let mut columns = Vec::with_capacity(declared.fields.len());

    for (name, decoder) in &declared.fields {
        let field = raw.and_then(|category| category.field(name));
        let column = match field {
            Some(field) => bind_field(&declared.name, field, *decoder)?,
            None => {
                trace!("{}.{} absent, binding undefined column", declared.name, name);
                undefined(*decoder, row_count)
            }
        };
        columns.push((name.clone(), column));
    }

    Ok(Table {
        name: declared.name.clone(),
        row_count,
        present: raw.is_some(),
        columns,
    })
}

fn bind_field<'a>(
    category: &str,
    field: &'a Field<'_>,
    decoder: FieldDecoder,
) -> Result<TypedColumn<'a>, DecodeError> {
    let mismatch = || DecodeError::SchemaTypeMismatch {
        category: category.to_string(),
        field: field.name().to_string(),
        declared: decoder.to_string(),
        found: format!("{:?} field", field.kind()),
    };
    if !decoder.accepts(field.kind()) {
        return Err(mismatch());
    }

    Ok(match decoder {
        FieldDecoder::Int => TypedColumn::Int(field.column()),
        FieldDecoder::Float => TypedColumn::Float(field.column()),
        FieldDecoder::Str => TypedColumn::Str(field.column()),
        FieldDecoder::List { separator, element } => match element {
            ElementType::Int => TypedColumn::IntList(list(field, separator).ok_or_else(mismatch)?),
            ElementType::Float => {
                TypedColumn::FloatList(list(field, separator).ok_or_else(mismatch)?)
            }
            ElementType::Str => TypedColumn::StrList(list(field, separator).ok_or_else(mismatch)?),
        },
    })
}

fn list<'a, E: Element>(field: &'a Field<'_>, separator: char) -> Option<Column<'a, Vec<E>>> {
    field.list_column(separator)
}

fn undefined<'a>(decoder: FieldDecoder, row_count: usize) -> TypedColumn<'a> {
    fn col<'a, T: ColumnValue>(row_count: usize) -> Column<'a, T> {
        Column::undefined(row_count)
    }
    match decoder {
        FieldDecoder::Int => TypedColumn::Int(col(row_count)),
        FieldDecoder::Float => TypedColumn::Float(col(row_count)),
        FieldDecoder::Str => TypedColumn::Str(col(row_count)),
        FieldDecoder::List { element, .. } => match element {
            ElementType::Int => TypedColumn::IntList(col(row_count)),
            ElementType::Float => TypedColumn::FloatList(col(row_count)),
            ElementType::Str => TypedColumn::StrList(col(row_count)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tokenizer::Tokens;
    use std::sync::Arc;

    const COLUMN_DATA: &str = "123abc d,e,f '4 5 6'";

    fn tokens(pairs: &[(usize, usize)]) -> Tokens {
        let mut tokens = Tokens::with_capacity(pairs.len());
        for &(start, end) in pairs {
            tokens.push(start, end);
        }
        tokens
    }

    /// Three rows; the list fields repeat their single token on every row.
    fn test_block() -> Block<'static> {
        let fields = vec![
            Field::from_tokens(
                "int",
                FieldKind::Str,
                COLUMN_DATA,
                tokens(&[(0, 1), (1, 2), (2, 3)]),
            ),
            Field::from_tokens(
                "str",
                FieldKind::Str,
                COLUMN_DATA,
                tokens(&[(3, 4), (4, 5), (5, 6)]),
            ),
            Field::from_tokens(
                "strList",
                FieldKind::Str,
                COLUMN_DATA,
                tokens(&[(7, 12), (7, 12), (7, 12)]),
            ),
            Field::from_tokens(
                "intList",
                FieldKind::Str,
                COLUMN_DATA,
                tokens(&[(14, 19), (14, 19), (14, 19)]),
            ),
        ];
        let mut block = Block::new("test");
        block
            .categories
            .push(Category::new("test", 3, fields).unwrap());
        block
    }

    fn test_schema() -> Schema {
        Schema::new().category("test", |c| {
            c.int("int")
                .str("str")
                .list("strList", ',', ElementType::Str)
                .list("intList", ' ', ElementType::Int)
        })
    }

    #[test]
    fn property_access() {
        let block = test_block();
        let db = map_schema(&test_schema(), &block).unwrap();
        let test = db.table("test").unwrap();

        assert_eq!(test.int("int").unwrap().value(0), 1);
        assert_eq!(test.str("str").unwrap().value(1), "b");
        assert_eq!(test.str_list("strList").unwrap().value(0), vec!["d", "e", "f"]);
        assert_eq!(test.int_list("intList").unwrap().value(0), vec![4, 5, 6]);
    }

    #[test]
    fn to_vec() {
        let block = test_block();
        let db = map_schema(&test_schema(), &block).unwrap();
        let ints = db.table("test").unwrap().int("int").unwrap();
        let values: Vec<i32> = ints.to_vec();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn absent_field_is_undefined() {
        let block = test_block();
        let schema = Schema::new().category("test", |c| c.int("int").float("missing"));
        let db = map_schema(&schema, &block).unwrap();
        let missing = db.table("test").unwrap().float("missing").unwrap();
        assert_eq!(missing.row_count(), 3);
        assert!(!missing.is_defined());
        assert_eq!(missing.value_kind(2), ValueKind::Unspecified);
        assert_eq!(missing.value(2), 0.0);
    }

    #[test]
    fn absent_category_has_zero_rows() {
        let block = test_block();
        let schema = Schema::new().category("nothing", |c| {
            c.str("name").list("ids", ',', ElementType::Int)
        });
        let db = map_schema(&schema, &block).unwrap();
        let table = db.table("nothing").unwrap();
        assert!(!table.is_present());
        assert_eq!(table.row_count(), 0);
        let name = table.str("name").unwrap();
        assert_eq!(name.row_count(), 0);
        assert!(!name.is_defined());
    }

    #[test]
    fn wrong_accessor_is_a_mismatch() {
        let block = test_block();
        let db = map_schema(&test_schema(), &block).unwrap();
        let test = db.table("test").unwrap();
        assert!(matches!(
            test.float("int"),
            Err(DecodeError::SchemaTypeMismatch { .. })
        ));
        assert!(matches!(
            test.int("nope"),
            Err(DecodeError::UndeclaredField { .. })
        ));
    }

    #[test]
    fn list_over_fixed_width_is_a_mismatch() {
        let data = "  1\n  2";
        let lines = Arc::new(tokens(&[(0, 3), (4, 7)]));
        let field = Field::fixed("n", FieldKind::Int, data, lines, 0, 3);
        let mut block = Block::new("fixed");
        block
            .categories
            .push(Category::new("rows", 2, vec![field]).unwrap());

        let schema = Schema::new().category("rows", |c| c.list("n", ',', ElementType::Int));
        let err = map_schema(&schema, &block).unwrap_err();
        assert!(matches!(err, DecodeError::SchemaTypeMismatch { ref field, .. } if field == "n"));

        let ok = Schema::new().category("rows", |c| c.float("n").str("N"));
        let db = map_schema(&ok, &block).unwrap();
        let rows = db.table("rows").unwrap();
        assert_eq!(rows.float("n").unwrap().to_vec(), vec![1.0, 2.0]);
        assert_eq!(rows.str("N").unwrap().value(1), "2");
    }

    #[test]
    fn float_field_rejects_int_decoder() {
        let data = "1.5";
        let lines = Arc::new(tokens(&[(0, 3)]));
        let field = Field::fixed("x", FieldKind::Float, data, lines, 0, 3);
        let mut block = Block::new("b");
        block
            .categories
            .push(Category::new("c", 1, vec![field]).unwrap());
        let schema = Schema::new().category("c", |c| c.int("x"));
        assert!(map_schema(&schema, &block).is_err());
    }

    #[test]
    fn validate_reports_bad_numbers() {
        let data = "1 x";
        let field = Field::from_tokens("n", FieldKind::Str, data, tokens(&[(0, 1), (2, 3)]));
        let mut block = Block::new("b");
        block
            .categories
            .push(Category::new("c", 2, vec![field]).unwrap());
        let schema = Schema::new().category("c", |c| c.int("n"));
        let db = map_schema(&schema, &block).unwrap();
        assert_eq!(
            db.validate(),
            Err(DecodeError::InvalidNumericLiteral {
                category: "c".into(),
                field: "n".into(),
                row: 1,
                literal: "x".into()
            })
        );
        let message = db.validate().unwrap_err().to_string();
        assert!(message.contains("c.n"), "{message}");
    }

    #[test]
    fn decoder_compatibility() {
        let list = FieldDecoder::List {
            separator: ',',
            element: ElementType::Str,
        };
        assert!(FieldDecoder::Int.accepts(FieldKind::Str));
        assert!(list.accepts(FieldKind::Str));
        assert!(list.accepts(FieldKind::List));
        assert!(!list.accepts(FieldKind::Int));
        assert!(FieldDecoder::Float.accepts(FieldKind::Int));
        assert!(!FieldDecoder::Int.accepts(FieldKind::Float));
        assert_eq!(list.to_string(), "list<str>(',')");
    }
}
