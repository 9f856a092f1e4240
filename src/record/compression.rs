//! Text compression and code page decoding.
//!
//! Compressed text columns start with a one-byte header that selects the
//! encoding of the rest of the buffer. The format has no unambiguous
//! discriminator, so classification follows a fixed order:
//! 1. `0x18`: LZXPRESS, not supported; the raw bytes are kept
//! 2. `0x00`, `0x01`, `0x03`, `0x08`: UTF-16LE
//! 3. a zero third byte: UTF-16LE
//! 4. anything else: 7-bit packed ASCII

use encoding_rs::{UTF_16LE, WINDOWS_1252};
use tracing::warn;

/// Header byte of LZXPRESS-compressed data
pub const LZXPRESS_MARKER: u8 = 0x18;

/// Code page id for UTF-16LE text
pub const CODEPAGE_UNICODE: u32 = 1200;

/// Header bytes that always mean UTF-16LE
const UTF16_MARKERS: [u8; 4] = [0x00, 0x01, 0x08, 0x03];

/// How a compressed text buffer is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-16LE after the header byte
    Utf16,
    /// 7-bit packed ASCII after the header byte
    SevenBit,
    /// LZXPRESS, returned undecoded
    Lzxpress,
}

/// Pick the encoding of a compressed text buffer
pub fn classify(buf: &[u8]) -> TextEncoding {
    match buf.first() {
        Some(&LZXPRESS_MARKER) => TextEncoding::Lzxpress,
        Some(b) if UTF16_MARKERS.contains(b) => TextEncoding::Utf16,
        _ if buf.len() > 2 && buf[2] == 0 => TextEncoding::Utf16,
        _ => TextEncoding::SevenBit,
    }
}

/// Decode a compressed text buffer, reporting which encoding was used.
///
/// LZXPRESS data is not decompressed and yields no text; the caller keeps
/// the raw bytes and flags the value.
pub fn classify_and_decode(buf: &[u8]) -> (Option<String>, TextEncoding) {
    let encoding = classify(buf);
    let body = buf.get(1..).unwrap_or(&[]);
    let text = match encoding {
        TextEncoding::Lzxpress => {
            warn!(len = buf.len(), "LZXPRESS-compressed text is not supported; keeping raw bytes");
            None
        }
        TextEncoding::Utf16 => Some(decode_utf16le(body)),
        TextEncoding::SevenBit => Some(decompress_7bit(body)),
    };
    (text, encoding)
}

/// Unpack 7-bit packed ASCII.
///
/// Characters are packed back to back, low bits first. A 16-bit
/// accumulator takes one input byte at a time and yields a character
/// whenever it holds at least 7 bits. Decoding stops at the first NUL.
pub fn decompress_7bit(packed: &[u8]) -> String {
    let mut out = String::with_capacity(packed.len() * 8 / 7);
    let mut acc: u16 = 0;
    let mut bits = 0u32;

    for &byte in packed {
        acc |= (byte as u16) << bits;
        bits += 8;

        while bits >= 7 {
            let ch = (acc & 0x7F) as u8;
            if ch == 0 {
                return out;
            }
            out.push(ch as char);
            acc >>= 7;
            bits -= 7;
        }
    }
    out
}

/// Decode UTF-16LE, dropping trailing NULs
pub fn decode_utf16le(bytes: &[u8]) -> String {
    let (text, _) = UTF_16LE.decode_without_bom_handling(bytes);
    text.trim_end_matches('\0').to_string()
}

/// Decode text stored under a column code page.
///
/// Code page 1200 is UTF-16LE; everything else is read as Windows-1252,
/// which is what ESE uses for its ASCII columns.
pub fn decode_codepage(bytes: &[u8], codepage: u32) -> String {
    if codepage == CODEPAGE_UNICODE {
        return decode_utf16le(bytes);
    }
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.trim_end_matches('\0').to_string()
}
