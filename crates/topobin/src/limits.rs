//! Format constants and decoding limits.
//!
//! These values are part of the wire format. Changing any of them produces
//! buffers that existing readers reject.

/// Magic signature at offset 0 ("TOPO" in ASCII).
pub const MAGIC: u32 = 0x544F_504F;

/// Magic signature as it appears on the wire (big-endian).
pub const MAGIC_BYTES: &[u8; 4] = b"TOPO";

/// Magic for the zstd transport envelope.
pub const MAGIC_COMPRESSED: &[u8; 4] = b"TOPZ";

/// Version written by the encoder.
pub const FORMAT_VERSION: u16 = 1;

/// Oldest version the readers accept.
pub const MIN_SUPPORTED_VERSION: u16 = 1;

/// Newest version the readers accept.
pub const MAX_SUPPORTED_VERSION: u16 = 1;

/// Flag bit 0: a transform block follows the header and arc data is `i32`.
pub const FLAG_HAS_TRANSFORM: u16 = 0x0001;

/// Flag bit 1: a bbox block follows the header (or the transform).
pub const FLAG_HAS_BBOX: u16 = 0x0002;

/// Every flag bit this version understands. Others must be zero.
pub const KNOWN_FLAGS: u16 = FLAG_HAS_TRANSFORM | FLAG_HAS_BBOX;

/// Bytes needed to read magic and version.
pub const VERSION_PREFIX_LEN: usize = 6;

/// Size of the fixed header (magic through string-table length).
pub const HEADER_LEN: usize = 24;

/// Size of the transform block (scale x/y, translate x/y).
pub const TRANSFORM_LEN: usize = 32;

/// Size of the bbox block.
pub const BBOX_LEN: usize = 32;

/// Alignment of the section following the string table.
pub const STRING_TABLE_ALIGN: usize = 4;

/// Bytes per coordinate in a quantized buffer.
pub const QUANTIZED_COORD_LEN: usize = 4;

/// Bytes per coordinate in an unquantized buffer.
pub const FLOAT_COORD_LEN: usize = 8;

/// Largest count or byte length a `u32` header field can hold.
pub const MAX_U32_FIELD: usize = u32::MAX as usize;

/// Upper bound on the size a compressed envelope may declare (1 GiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 1 << 30;
