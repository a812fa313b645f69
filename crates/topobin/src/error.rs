//! Error types for topobin encoding, decoding and arc access.

use thiserror::Error;

/// Failure class of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Structural violation: bad magic, truncation, inconsistent sections.
    Format,
    /// Well-formed header carrying a version outside the supported range.
    Version,
}

impl ErrorKind {
    /// Returns a short name for the kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Format => "format",
            ErrorKind::Version => "version",
        }
    }
}

/// Error while reading a buffer (decoder, lazy view, envelope).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    // === Version ===
    #[error("unsupported version {version} (supported {min}-{max})")]
    UnsupportedVersion { version: u16, min: u16, max: u16 },

    // === Format ===
    #[error("invalid magic bytes: expected TOPO, found {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("buffer too short: {len} bytes, need at least {needed}")]
    BufferTooShort { len: usize, needed: usize },

    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("unknown flag bits set: {flags:#06x}")]
    UnknownFlags { flags: u16 },

    #[error("arc offset {index} is {offset}, expected {expected}")]
    OffsetBoundary {
        index: usize,
        offset: u32,
        expected: u32,
    },

    #[error("arc offsets decrease at index {index} ({prev} > {next})")]
    OffsetsNotMonotonic { index: usize, prev: u32, next: u32 },

    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    #[error("string table holds {found} names, header declares {declared}")]
    NameCountMismatch { declared: usize, found: usize },

    #[error("string table does not end with a zero byte")]
    UnterminatedStringTable,

    #[error("objects payload is malformed: {0}")]
    MalformedObjects(String),

    #[error("objects payload does not match string table: {context}")]
    ObjectsMismatch { context: String },

    #[error("{count} trailing bytes after objects payload")]
    TrailingBytes { count: usize },

    // === Envelope ===
    #[error("zstd decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("decompressed size {actual} doesn't match declared {declared}")]
    UncompressedSizeMismatch { declared: usize, actual: usize },
}

impl DecodeError {
    /// Returns the failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::UnsupportedVersion { .. } => ErrorKind::Version,
            _ => ErrorKind::Format,
        }
    }
}

/// Arc index out of range on a [`TopologyView`](crate::view::TopologyView).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("arc index {index} out of bounds (arc count: {count})")]
pub struct IndexError {
    pub index: usize,
    pub count: usize,
}

/// Error during encoding.
///
/// Well-formed topologies never produce one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("{field} length {len} exceeds maximum {max}")]
    LengthExceedsLimit {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("duplicate object name {name:?}")]
    DuplicateObjectName { name: String },

    #[error("object name {name:?} contains a zero byte")]
    InvalidObjectName { name: String },

    #[error("arc {arc} point {point}: {value} is not a 32-bit integer in a quantized topology")]
    CoordinateNotQuantized { arc: usize, point: usize, value: f64 },

    #[error("arc {arc} point {point}: coordinate {value} is not finite")]
    NonFiniteCoordinate { arc: usize, point: usize, value: f64 },

    #[error("objects serialization failed: {0}")]
    ObjectsSerialization(String),

    #[error("zstd compression failed: {0}")]
    CompressionFailed(String),
}
