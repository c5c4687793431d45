//! Lazy, zero-copy columnar decoding of CIF-family and GROMACS `.gro` text.
//!
//! Drivers index a loaded text buffer into a raw [`Document`] of
//! [`Block`]s, [`Category`]s and [`Field`]s without copying any value. Typed
//! access goes through [`Column`] views, either straight from a field or via
//! a [`Schema`] mapped over a block with [`map_schema`].
//!
//! ```ignore
//! let doc = foldit_reader::cif::parse(text)?;
//! let coords = foldit_reader::cif::extract_coordinates(&doc.blocks[0])?;
//!
//! let gro = foldit_reader::gro::parse(gro_text)?;
//! let positions = gro.structures[0].atoms()?.positions();
//! ```

pub mod cif;
pub mod column;
pub mod dom;
pub mod error;
pub mod gro;
pub mod options;
pub mod schema;
pub mod text;

pub use column::{Column, ColumnValue, Element, ElementType, ValueKind, ValueType};
pub use dom::{Block, Category, Document, Encoding, Field, FieldKind};
pub use error::DecodeError;
pub use options::{DecodeOptions, Strictness};
pub use schema::{map_schema, CategorySchema, Database, FieldDecoder, Schema, Table, TypedColumn};
pub use text::decode_bytes;
