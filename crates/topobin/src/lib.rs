//! topobin: compact fixed-layout binary encoding for TopoJSON topologies.
//!
//! This crate converts a topology (shared polyline arcs referenced by named
//! geometric objects) into a single contiguous buffer and back, with no
//! loss of information.
//!
//! # Overview
//!
//! The buffer is designed for:
//! - **Random access**: arc data sits behind an offset table, so a single arc
//!   can be read without decoding the rest
//! - **Zero copy**: [`TopologyView`] borrows the buffer and materializes only
//!   what is asked for
//! - **Forward safety**: every reader checks the version before trusting
//!   anything past the header
//!
//! # Quick Start
//!
//! ```rust
//! use topobin::{Geometry, Topology, TopologyView};
//! use topobin::codec::{decode_topology, encode_topology};
//!
//! let mut topology = Topology::new();
//! topology.push_arc(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]);
//! topology.push_arc(vec![[2.0, 0.0], [3.0, 1.0]]);
//! topology.push_object("test", Geometry::line_string(vec![0]));
//!
//! // Encode to binary
//! let bytes = encode_topology(&topology).unwrap();
//!
//! // Decode everything back
//! let decoded = decode_topology(&bytes).unwrap();
//! assert_eq!(decoded, topology);
//!
//! // Or read a single arc in place
//! let view = TopologyView::new(&bytes).unwrap();
//! assert_eq!(view.arc_count(), 2);
//! assert_eq!(view.arc(1).unwrap(), vec![[2.0, 0.0], [3.0, 1.0]]);
//! ```
//!
//! # Modules
//!
//! - [`model`]: Topology, arcs, transform and geometry types
//! - [`codec`]: Encoder, decoder, version gate and zstd envelope
//! - [`view`]: Lazy read-only view over an encoded buffer
//! - [`error`]: Error types
//! - [`limits`]: Layout constants and decoding bounds
//!
//! # Wire Format
//!
//! All fixed-width fields are big-endian:
//! - 24-byte header: `TOPO` magic, version, flags, arc/point/object counts,
//!   string-table length
//! - Optional transform and bbox blocks (4 × f64 each)
//! - Zero-terminated object names, padded to 4 bytes
//! - Arc offset table and arc data (`i32` if quantized, `f64` otherwise)
//! - Length-prefixed JSON objects payload
//!
//! A buffer may be wrapped in a `TOPZ` zstd envelope for storage; see
//! [`codec::envelope`].

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod view;

// Re-export commonly used types at crate root
pub use codec::{
    EncodeOptions, compress, decode_topology, decompress, encode_topology,
    encode_topology_compressed, encode_topology_with_options, is_compatible, peek_version,
};
pub use error::{DecodeError, EncodeError, ErrorKind, IndexError};
pub use model::{
    Arc, ArcIndex, BBox, Geometry, GeometryId, GeometryKind, Position, Properties, Topology,
    Transform,
};
pub use view::{ArcIter, TopologyView};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
