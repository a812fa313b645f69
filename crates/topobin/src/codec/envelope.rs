//! Optional zstd envelope around a complete topobin buffer.
//!
//! Layout: `TOPZ` magic, `u32` big-endian uncompressed length, zstd frame.
//! The envelope is not itself a topobin buffer; decompress first, then
//! decode or view the result:
//!
//! ```ignore
//! let buffer = decompress(&stored)?;
//! let view = TopologyView::new(&buffer)?; // borrows from buffer
//! ```

use std::io::Read;

use tracing::debug;

use crate::codec::primitives::{Reader, Writer};
use crate::codec::topology::{EncodeOptions, encode_topology_with_options};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAGIC_COMPRESSED, MAX_DECOMPRESSED_SIZE, MAX_U32_FIELD};
use crate::model::Topology;

/// Returns true if the input starts with the envelope magic.
pub fn is_compressed(input: &[u8]) -> bool {
    input.len() >= 4 && &input[0..4] == MAGIC_COMPRESSED
}

/// Wraps an encoded buffer in a zstd envelope.
pub fn compress(buffer: &[u8], level: i32) -> Result<Vec<u8>, EncodeError> {
    if buffer.len() > MAX_U32_FIELD {
        return Err(EncodeError::LengthExceedsLimit {
            field: "uncompressed buffer",
            len: buffer.len(),
            max: MAX_U32_FIELD,
        });
    }

    let compressed = zstd::encode_all(buffer, level)
        .map_err(|e| EncodeError::CompressionFailed(e.to_string()))?;

    let mut writer = Writer::with_capacity(8 + compressed.len());
    writer.write_bytes(MAGIC_COMPRESSED);
    writer.write_u32(buffer.len() as u32);
    writer.write_bytes(&compressed);

    debug!(
        level,
        uncompressed = buffer.len(),
        compressed = writer.len(),
        "topobin.compress"
    );
    Ok(writer.into_bytes())
}

/// Encodes a topology and wraps it in a zstd envelope.
pub fn encode_topology_compressed(topology: &Topology, level: i32) -> Result<Vec<u8>, EncodeError> {
    encode_topology_compressed_with_options(topology, level, EncodeOptions::default())
}

/// Encodes a topology with options and wraps it in a zstd envelope.
pub fn encode_topology_compressed_with_options(
    topology: &Topology,
    level: i32,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    let buffer = encode_topology_with_options(topology, options)?;
    compress(&buffer, level)
}

/// Unwraps a zstd envelope, returning the topobin buffer inside.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut reader = Reader::new(input);
    let magic: [u8; 4] = reader.read_array("magic")?;
    if &magic != MAGIC_COMPRESSED {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let declared_size = reader.read_u32("uncompressed size")? as usize;
    if declared_size > MAX_DECOMPRESSED_SIZE {
        return Err(DecodeError::LengthExceedsLimit {
            field: "uncompressed size",
            len: declared_size,
            max: MAX_DECOMPRESSED_SIZE,
        });
    }

    let decoder = zstd::Decoder::new(reader.remaining())
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    // One byte past the declared size is enough to detect an oversized frame.
    let mut decompressed = Vec::with_capacity(declared_size);
    decoder
        .take(declared_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != declared_size {
        return Err(DecodeError::UncompressedSizeMismatch {
            declared: declared_size,
            actual: decompressed.len(),
        });
    }

    debug!(
        compressed = input.len(),
        uncompressed = declared_size,
        "topobin.decompress"
    );
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::header::peek_version;
    use crate::codec::topology::{decode_topology, encode_topology};
    use crate::model::Geometry;

    fn make_test_topology() -> Topology {
        let mut topo = Topology::new();
        for i in 0..50 {
            let x = i as f64;
            topo.push_arc(vec![[x, 0.0], [x + 0.5, 1.0], [x + 1.0, 0.0]]);
        }
        topo.push_object("zigzag", Geometry::line_string((0..50).collect()));
        topo
    }

    #[test]
    fn test_compressed_roundtrip() {
        let topo = make_test_topology();

        let compressed = encode_topology_compressed(&topo, 3).unwrap();
        assert!(is_compressed(&compressed));

        let buffer = decompress(&compressed).unwrap();
        assert_eq!(buffer, encode_topology(&topo).unwrap());
        assert_eq!(decode_topology(&buffer).unwrap(), topo);
    }

    #[test]
    fn test_compression_shrinks_repetitive_arcs() {
        let topo = make_test_topology();
        let plain = encode_topology(&topo).unwrap();
        let compressed = compress(&plain, 3).unwrap();
        assert!(compressed.len() < plain.len());
    }

    #[test]
    fn test_envelope_is_not_a_buffer() {
        let compressed = encode_topology_compressed(&make_test_topology(), 1).unwrap();
        assert_eq!(peek_version(&compressed), None);
        assert!(matches!(
            decode_topology(&compressed),
            Err(DecodeError::InvalidMagic { found }) if &found == b"TOPZ"
        ));
    }

    #[test]
    fn test_decompress_rejects_plain_buffer() {
        let plain = encode_topology(&make_test_topology()).unwrap();
        assert!(!is_compressed(&plain));
        assert!(matches!(
            decompress(&plain),
            Err(DecodeError::InvalidMagic { found }) if &found == b"TOPO"
        ));
    }

    #[test]
    fn test_decompress_truncated() {
        assert!(matches!(
            decompress(b"TOP"),
            Err(DecodeError::UnexpectedEof { context: "magic" })
        ));
        assert!(matches!(
            decompress(b"TOPZ\0\0"),
            Err(DecodeError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_declared_size_limit() {
        let mut data = Vec::new();
        data.extend_from_slice(MAGIC_COMPRESSED);
        data.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(matches!(
            decompress(&data),
            Err(DecodeError::LengthExceedsLimit { .. })
        ));
    }

    #[test]
    fn test_declared_size_mismatch() {
        let mut compressed = compress(b"TOPO\0\x01abcdef", 1).unwrap();
        // Declare one byte fewer than the frame holds
        compressed[7] -= 1;
        assert!(matches!(
            decompress(&compressed),
            Err(DecodeError::UncompressedSizeMismatch { declared: 11, actual: 12 })
        ));
    }
}
