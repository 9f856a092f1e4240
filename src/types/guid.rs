//! GUID rendering.

use uuid::Uuid;

/// Render a 16-byte on-disk GUID in Windows text form.
///
/// The first three groups are stored little-endian, as in a `GUID` struct.
pub fn format_guid(bytes: &[u8; 16]) -> String {
    Uuid::from_bytes_le(*bytes).braced().to_string()
}
