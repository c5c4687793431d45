//! Value types a column can decode to.

use std::fmt;

use crate::text::number::{parse_float, parse_int, Scanned};

/// Primitive element type of a column or list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int,
    Float,
    Str,
}

/// Decoded value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Str,
    List(ElementType),
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Int => f.write_str("int"),
            ElementType::Float => f.write_str("float"),
            ElementType::Str => f.write_str("str"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Str => f.write_str("str"),
            ValueType::List(element) => write!(f, "list<{element}>"),
        }
    }
}

/// A type that column text can be decoded into.
///
/// `decode` never fails; [`Scanned::complete`] reports whether the text was a
/// valid literal for the type.
pub trait ColumnValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    const TYPE: ValueType;

    /// Value reported for absent rows.
    fn zero() -> Self;

    /// Decode `text`. List types split on `separator`, or on whitespace runs
    /// when no separator is given.
    fn decode(text: &str, separator: Option<char>) -> Scanned<Self>;
}

/// A [`ColumnValue`] that can also be a list element.
pub trait Element: ColumnValue {
    const ELEMENT: ElementType;
}

impl ColumnValue for i32 {
    const TYPE: ValueType = ValueType::Int;

    fn zero() -> Self {
        0
    }

    fn decode(text: &str, _separator: Option<char>) -> Scanned<Self> {
        parse_int(text, 0, text.len())
    }
}

impl ColumnValue for f64 {
    const TYPE: ValueType = ValueType::Float;

    fn zero() -> Self {
        0.0
    }

    fn decode(text: &str, _separator: Option<char>) -> Scanned<Self> {
        parse_float(text, 0, text.len())
    }
}

impl ColumnValue for String {
    const TYPE: ValueType = ValueType::Str;

    fn zero() -> Self {
        String::new()
    }

    fn decode(text: &str, _separator: Option<char>) -> Scanned<Self> {
        Scanned {
            value: text.to_string(),
            complete: true,
        }
    }
}

impl Element for i32 {
    const ELEMENT: ElementType = ElementType::Int;
}

impl Element for f64 {
    const ELEMENT: ElementType = ElementType::Float;
}

impl Element for String {
    const ELEMENT: ElementType = ElementType::Str;
}

impl<E: Element> ColumnValue for Vec<E> {
    const TYPE: ValueType = ValueType::List(E::ELEMENT);

    fn zero() -> Self {
        Vec::new()
    }

    fn decode(text: &str, separator: Option<char>) -> Scanned<Self> {
        let mut complete = true;
        let mut push = |out: &mut Vec<E>, piece: &str| {
            let element = E::decode(piece, None);
            complete &= element.complete;
            out.push(element.value);
        };

        let mut out = Vec::new();
        match separator {
            Some(sep) if !sep.is_whitespace() => {
                if !text.trim().is_empty() {
                    for piece in text.split(sep) {
                        push(&mut out, piece.trim());
                    }
                }
            }
            _ => {
                for piece in text.split_whitespace() {
                    push(&mut out, piece);
                }
            }
        }
        Scanned {
            value: out,
            complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_decoding() {
        assert_eq!(i32::decode(" 12", None).value, 12);
        assert_eq!(f64::decode("1.5", None).value, 1.5);
        assert_eq!(String::decode("abc", None).value, "abc");
        assert!(!i32::decode("x", None).complete);
    }

    #[test]
    fn list_decoding() {
        let strs = Vec::<String>::decode("d,e,f", Some(','));
        assert_eq!(strs.value, vec!["d", "e", "f"]);
        let ints = Vec::<i32>::decode("4 5 6", Some(' '));
        assert_eq!(ints.value, vec![4, 5, 6]);
        assert!(ints.complete);
        let spaced = Vec::<f64>::decode(" 1.0   2.5 ", None);
        assert_eq!(spaced.value, vec![1.0, 2.5]);
    }

    #[test]
    fn list_edge_cases() {
        assert!(Vec::<i32>::decode("", Some(',')).value.is_empty());
        assert_eq!(Vec::<String>::decode("a,,b", Some(',')).value, vec!["a", "", "b"]);
        let bad = Vec::<i32>::decode("1,x", Some(','));
        assert_eq!(bad.value, vec![1, 0]);
        assert!(!bad.complete);
    }

    #[test]
    fn type_names() {
        assert_eq!(<Vec<i32> as ColumnValue>::TYPE.to_string(), "list<int>");
        assert_eq!(f64::TYPE.to_string(), "float");
    }
}
