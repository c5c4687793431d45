//! Decode options.

/// How drivers treat fixed-width rows that end before all inferred columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strictness {
    /// Short rows decode to zero values, as the formats permit.
    #[default]
    Permissive,
    /// Short rows are a [`TruncatedLine`](crate::DecodeError::TruncatedLine) error.
    Strict,
}

/// Options accepted by the `parse_with` entry points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub strictness: Strictness,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }
}
