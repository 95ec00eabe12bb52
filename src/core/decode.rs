//! Chunk payload decoding.
//!
//! The host bridge can only hand strings across its boundary, so every byte
//! range arrives in a text-safe encoding. This module turns those strings back
//! into raw bytes (and, for host-side bridge implementations, encodes them).
//!
//! Based on the `atob` + `stringToBytes` pair used by PDF.js embedders.

use super::error::{ViewerError, ViewerResult};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Forgiving base64: padding optional, trailing bits ignored (matches `atob`).
const FORGIVING_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Text-safe representation the bridge uses for chunk payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkEncoding {
    /// Standard-alphabet base64. ASCII whitespace is ignored.
    #[default]
    Base64,
    /// "Binary string": one character per byte, code point truncated to 8 bits.
    Latin1,
}

/// Decodes a chunk payload into raw bytes.
///
/// The output length is whatever the payload encodes; short payloads are
/// returned as-is, never padded.
///
/// # Example
/// ```
/// use pdf_x_viewport::core::decode::{decode_chunk, ChunkEncoding};
///
/// let bytes = decode_chunk("JVBERi0=", ChunkEncoding::Base64).unwrap();
/// assert_eq!(bytes, b"%PDF-");
/// ```
pub fn decode_chunk(encoded: &str, encoding: ChunkEncoding) -> ViewerResult<Vec<u8>> {
    match encoding {
        ChunkEncoding::Base64 => decode_base64(encoded),
        ChunkEncoding::Latin1 => Ok(binary_string_to_bytes(encoded)),
    }
}

/// Encodes raw bytes the way a host bridge would before handing them over.
pub fn encode_chunk(bytes: &[u8], encoding: ChunkEncoding) -> String {
    match encoding {
        ChunkEncoding::Base64 => FORGIVING_BASE64.encode(bytes),
        ChunkEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Maps every character to one byte by keeping the low 8 bits of its code point.
pub fn binary_string_to_bytes(s: &str) -> Vec<u8> {
    s.chars().map(|c| (u32::from(c) & 0xFF) as u8).collect()
}

fn decode_base64(encoded: &str) -> ViewerResult<Vec<u8>> {
    let result = if encoded.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        FORGIVING_BASE64.decode(compact)
    } else {
        FORGIVING_BASE64.decode(encoded)
    };

    result.map_err(|e| ViewerError::ChunkDecode(format!("base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_base64_header() {
        let bytes = decode_chunk("JVBERi0xLjc=", ChunkEncoding::Base64).unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
    }

    #[test]
    fn test_decode_base64_without_padding() {
        let bytes = decode_chunk("JVBERi0xLjc", ChunkEncoding::Base64).unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
    }

    #[test]
    fn test_decode_base64_ignores_whitespace() {
        let bytes = decode_chunk("JVBE\nRi0x\r\nLjc=", ChunkEncoding::Base64).unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.7");
    }

    #[test]
    fn test_decode_base64_malformed() {
        let result = decode_chunk("not*base64!", ChunkEncoding::Base64);
        assert!(matches!(result, Err(ViewerError::ChunkDecode(_))));
    }

    #[test]
    fn test_binary_string_truncates_to_low_byte() {
        // U+0141 has low byte 0x41
        let bytes = binary_string_to_bytes("\u{00FF}\u{0141}A");
        assert_eq!(bytes, vec![0xFF, 0x41, 0x41]);
    }

    #[test]
    fn test_binary_encoding_covers_all_bytes() {
        let all: Vec<u8> = (0..=255).collect();
        let encoded = encode_chunk(&all, ChunkEncoding::Latin1);
        assert_eq!(encoded.chars().count(), 256);
        assert_eq!(decode_chunk(&encoded, ChunkEncoding::Latin1).unwrap(), all);
    }

    #[test]
    fn test_empty_payload() {
        assert!(decode_chunk("", ChunkEncoding::Base64).unwrap().is_empty());
        assert!(decode_chunk("", ChunkEncoding::Latin1).unwrap().is_empty());
    }
}
