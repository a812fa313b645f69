//! Fixed header and the version gate.
//!
//! Both the decoder and the lazy view run [`read_header`] before touching
//! anything past the first 24 bytes. [`peek_version`] and [`is_compatible`]
//! are the non-failing pre-flight forms.

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::limits::{
    FLAG_HAS_BBOX, FLAG_HAS_TRANSFORM, FLOAT_COORD_LEN, KNOWN_FLAGS, MAGIC_BYTES,
    MAX_SUPPORTED_VERSION, MIN_SUPPORTED_VERSION, QUANTIZED_COORD_LEN, VERSION_PREFIX_LEN,
};

/// The fixed 24-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    pub flags: u16,
    pub arc_count: usize,
    pub total_points: usize,
    pub object_count: usize,
    /// Unpadded string-table length.
    pub string_table_len: usize,
}

impl Header {
    /// Returns true if a transform block is present and arc data is `i32`.
    pub fn has_transform(&self) -> bool {
        self.flags & FLAG_HAS_TRANSFORM != 0
    }

    /// Returns true if a bbox block is present.
    pub fn has_bbox(&self) -> bool {
        self.flags & FLAG_HAS_BBOX != 0
    }

    /// Bytes per coordinate in the arc data section.
    pub fn coord_len(&self) -> usize {
        if self.has_transform() {
            QUANTIZED_COORD_LEN
        } else {
            FLOAT_COORD_LEN
        }
    }
}

/// Returns the format version of a buffer, or `None` if the buffer is
/// shorter than 6 bytes or does not start with the magic signature.
///
/// Does not check the version against the supported range.
pub fn peek_version(data: &[u8]) -> Option<u16> {
    if data.len() < VERSION_PREFIX_LEN || &data[0..4] != MAGIC_BYTES {
        return None;
    }
    Some(u16::from_be_bytes([data[4], data[5]]))
}

/// Returns true if the buffer carries a version this crate can read.
pub fn is_compatible(data: &[u8]) -> bool {
    peek_version(data).is_some_and(is_supported)
}

fn is_supported(version: u16) -> bool {
    (MIN_SUPPORTED_VERSION..=MAX_SUPPORTED_VERSION).contains(&version)
}

/// Validates magic and version, returning the version.
pub fn check_header(data: &[u8]) -> Result<u16, DecodeError> {
    if data.len() < VERSION_PREFIX_LEN {
        return Err(DecodeError::BufferTooShort {
            len: data.len(),
            needed: VERSION_PREFIX_LEN,
        });
    }
    if &data[0..4] != MAGIC_BYTES {
        let mut found = [0u8; 4];
        found.copy_from_slice(&data[0..4]);
        return Err(DecodeError::InvalidMagic { found });
    }
    let version = u16::from_be_bytes([data[4], data[5]]);
    if !is_supported(version) {
        return Err(DecodeError::UnsupportedVersion {
            version,
            min: MIN_SUPPORTED_VERSION,
            max: MAX_SUPPORTED_VERSION,
        });
    }
    Ok(version)
}

/// Validates the version gate and reads the full fixed header.
pub fn read_header(data: &[u8]) -> Result<Header, DecodeError> {
    let version = check_header(data)?;

    let mut reader = Reader::at(data, VERSION_PREFIX_LEN);
    let flags = reader.read_u16("flags")?;
    if flags & !KNOWN_FLAGS != 0 {
        return Err(DecodeError::UnknownFlags { flags });
    }

    Ok(Header {
        version,
        flags,
        arc_count: reader.read_u32("arc count")? as usize,
        total_points: reader.read_u32("total arc points")? as usize,
        object_count: reader.read_u32("object count")? as usize,
        string_table_len: reader.read_u32("string table length")? as usize,
    })
}
