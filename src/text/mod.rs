//! Text-level primitives: buffer preparation, tokenizing and number parsing.

pub mod buffer;
pub mod number;
pub mod tokenizer;

pub use buffer::decode_bytes;
pub use number::{parse_float, parse_int, Scanned};
pub use tokenizer::{Tokenizer, Tokens};
