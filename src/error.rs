//! Error type shared by the tokenizer drivers, columns and the schema mapper.

/// Errors that can occur while decoding a text buffer into columns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed header at line {line}: {detail}")]
    MalformedHeader { line: usize, detail: String },
    #[error("truncated data in {context}: expected {expected}, found {found}")]
    TruncatedData {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("line {line} too short: fixed columns need {expected} bytes, found {found}")]
    TruncatedLine {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("cannot decode {category}.{field}: declared {declared}, found {found}")]
    SchemaTypeMismatch {
        category: String,
        field: String,
        declared: String,
        found: String,
    },
    /// `category` and `field` are empty when raised by a bare column.
    #[error("invalid numeric literal {literal:?} in {} at row {row}", field_path(.category, .field))]
    InvalidNumericLiteral {
        category: String,
        field: String,
        row: usize,
        literal: String,
    },
    #[error("field {category}.{field} has {found} rows, category has {expected}")]
    RowCountMismatch {
        category: String,
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("field {category}.{field} is not declared by the schema")]
    UndeclaredField { category: String, field: String },
    #[error("invalid input encoding: {0}")]
    InvalidEncoding(String),
}

impl DecodeError {
    /// Attach the category and field a column-level error came from.
    pub fn in_field(self, category: &str, field: &str) -> Self {
        match self {
            DecodeError::InvalidNumericLiteral { row, literal, .. } => {
                DecodeError::InvalidNumericLiteral {
                    category: category.to_string(),
                    field: field.to_string(),
                    row,
                    literal,
                }
            }
            other => other,
        }
    }
}

fn field_path(category: &str, field: &str) -> String {
    if category.is_empty() && field.is_empty() {
        "column".to_string()
    } else {
        format!("{category}.{field}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_error_names_its_field() {
        let bare = DecodeError::InvalidNumericLiteral {
            category: String::new(),
            field: String::new(),
            row: 1,
            literal: "x".into(),
        };
        assert_eq!(bare.to_string(), "invalid numeric literal \"x\" in column at row 1");

        let located = bare.in_field("t", "v");
        assert_eq!(located.to_string(), "invalid numeric literal \"x\" in t.v at row 1");
    }

    #[test]
    fn in_field_leaves_other_errors_alone() {
        let err = DecodeError::InvalidEncoding("bad".into());
        assert_eq!(err.clone().in_field("t", "v"), err);
    }
}
