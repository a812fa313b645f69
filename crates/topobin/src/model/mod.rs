//! Data model types for topobin.
//!
//! - Topologies (shared arcs plus named objects)
//! - Geometries (the closed TopoJSON variant set)

pub mod geometry;
pub mod topology;

pub use geometry::{ArcIndex, Geometry, GeometryId, GeometryKind, Properties};
pub use topology::{Arc, BBox, Position, Topology, Transform};
