//! Input buffer preparation.
//!
//! Decoding works on a fully loaded `&str`. This turns raw file bytes into one:
//! gzip input is inflated in memory, a UTF-8 byte-order mark is dropped, and
//! invalid UTF-8 is rejected.

use std::borrow::Cow;
use std::io::Read;

use crate::error::DecodeError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: &str = "\u{feff}";

/// True when `bytes` starts with the gzip magic number.
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Turn raw file contents into a text buffer, inflating gzip if needed.
///
/// Plain UTF-8 input is borrowed; only compressed input allocates.
pub fn decode_bytes(bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    if is_gzip(bytes) {
        let mut decoder = flate2::read::GzDecoder::new(bytes);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| DecodeError::InvalidEncoding(format!("gzip decompression failed: {e}")))?;
        let text = String::from_utf8(out)
            .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;
        return Ok(match text.strip_prefix(UTF8_BOM) {
            Some(rest) => Cow::Owned(rest.to_string()),
            None => Cow::Owned(text),
        });
    }

    let text =
        std::str::from_utf8(bytes).map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;
    Ok(Cow::Borrowed(text.strip_prefix(UTF8_BOM).unwrap_or(text)))
}
