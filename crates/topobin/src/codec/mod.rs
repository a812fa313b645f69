//! Binary encoding/decoding for topobin buffers.
//!
//! [`topology`] holds the encoder and the full decoder, [`header`] the
//! version gate shared with [`crate::view`], and [`envelope`] the optional
//! zstd wrapper.

pub mod envelope;
pub mod header;
pub(crate) mod layout;
pub mod objects;
pub mod primitives;
pub mod topology;

pub use envelope::{
    compress, decompress, encode_topology_compressed, encode_topology_compressed_with_options,
    is_compressed,
};
pub use header::{Header, check_header, is_compatible, peek_version, read_header};
pub use primitives::{Reader, Writer};
pub use topology::{EncodeOptions, decode_topology, encode_topology, encode_topology_with_options};
