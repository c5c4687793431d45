//! CIF/STAR parser and typed extractors.
//!
//! Two-layer design:
//! - **Layer 1 (DOM)**: [`parse`] any CIF/STAR file into an untyped
//!   [`Document`](crate::Document) of byte ranges.
//! - **Layer 2 (Extractors)**: map [`mmcif_schema`] over a block and pull typed
//!   column views out via `TryFrom<&Database>`.
//!
//! ```ignore
//! let doc = foldit_reader::cif::parse(input)?;
//! let coords = foldit_reader::cif::extract_coordinates(&doc.blocks[0])?;
//! let positions = coords.atoms.positions();
//! ```

pub mod extract;
pub mod parse;

use crate::dom::Document;
use crate::error::DecodeError;
use crate::text::buffer::decode_bytes;

pub use extract::{
    extract_coordinates, mmcif_schema, AtomSites, CoordinateData, ExtractionError, UnitCell,
};
pub use parse::parse;

/// Run `f` over the document parsed from raw bytes, which may be gzip
/// compressed.
///
/// The document borrows the decompressed text, so it only lives for the
/// duration of the callback.
pub fn with_bytes<R>(
    bytes: &[u8],
    f: impl FnOnce(&Document<'_>) -> R,
) -> Result<R, DecodeError> {
    let text = decode_bytes(bytes)?;
    let doc = parse(&text)?;
    Ok(f(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const INPUT: &str = "data_gz\n_cell.length_a 12.5\n";

    fn block_names(doc: &Document<'_>) -> Vec<String> {
        doc.blocks.iter().map(|b| b.name.clone()).collect()
    }

    #[test]
    fn plain_and_gzip_bytes_parse_alike() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(INPUT.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let plain = with_bytes(INPUT.as_bytes(), block_names).unwrap();
        let gz = with_bytes(&compressed, block_names).unwrap();
        assert_eq!(plain, vec!["gz"]);
        assert_eq!(plain, gz);

        let a = with_bytes(&compressed, |doc| {
            doc.blocks[0].field("_cell.length_a").and_then(|f| f.as_f64(0))
        })
        .unwrap();
        assert_eq!(a, Some(12.5));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = with_bytes(&[b'd', 0xff, 0xfe], |_| ()).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEncoding(_)));
    }
}
