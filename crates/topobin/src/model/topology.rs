//! The topology value: shared arcs plus named objects.

use std::fmt;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use rustc_hash::FxHashSet;

use crate::model::Geometry;

/// A 2D position. Quantized topologies hold integral values.
pub type Position = [f64; 2];

/// A shared polyline. Zero-length arcs are legal.
pub type Arc = Vec<Position>;

/// Bounds as `[min_x, min_y, max_x, max_y]`.
pub type BBox = [f64; 4];

/// Quantization descriptor.
///
/// Present on a topology iff its arc coordinates are integer-quantized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Transform {
    /// Creates a transform from scale and translate pairs.
    pub fn new(scale: [f64; 2], translate: [f64; 2]) -> Self {
        Self { scale, translate }
    }

    /// Returns `[scale_x, scale_y, translate_x, translate_y]`, the wire order.
    pub fn to_array(&self) -> [f64; 4] {
        [self.scale[0], self.scale[1], self.translate[0], self.translate[1]]
    }

    /// Inverse of [`Transform::to_array`].
    pub fn from_array(v: [f64; 4]) -> Self {
        Self {
            scale: [v[0], v[1]],
            translate: [v[2], v[3]],
        }
    }

    /// Maps a quantized position to real coordinates.
    pub fn apply(&self, p: Position) -> Position {
        [
            p[0] * self.scale[0] + self.translate[0],
            p[1] * self.scale[1] + self.translate[1],
        ]
    }
}

/// A topology graph.
///
/// Serializes as a TopoJSON document. Object order is preserved in both the
/// JSON form and the binary form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    /// Shared arcs. Objects reference them by position.
    pub arcs: Vec<Arc>,
    /// Named objects in insertion order. Names are unique.
    pub objects: Vec<(String, Geometry)>,
    pub transform: Option<Transform>,
    pub bbox: Option<BBox>,
}

impl Topology {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if arc coordinates are quantized.
    pub fn is_quantized(&self) -> bool {
        self.transform.is_some()
    }

    /// Returns the number of positions across all arcs.
    pub fn total_points(&self) -> usize {
        self.arcs.iter().map(Vec::len).sum()
    }

    /// Looks up an object by name.
    pub fn object(&self, name: &str) -> Option<&Geometry> {
        self.objects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, g)| g)
    }

    /// Appends an arc and returns its index.
    pub fn push_arc(&mut self, arc: Arc) -> usize {
        self.arcs.push(arc);
        self.arcs.len() - 1
    }

    /// Appends a named object.
    pub fn push_object(&mut self, name: impl Into<String>, geometry: Geometry) {
        self.objects.push((name.into(), geometry));
    }
}

/// Serializes `(name, geometry)` pairs as a JSON object, in order.
pub(crate) struct ObjectsRef<'a>(pub(crate) &'a [(String, Geometry)]);

impl Serialize for ObjectsRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, geometry) in self.0 {
            map.serialize_entry(name, geometry)?;
        }
        map.end()
    }
}

/// Deserializes a JSON object into ordered `(name, geometry)` pairs.
pub(crate) struct ObjectList(pub(crate) Vec<(String, Geometry)>);

impl<'de> Deserialize<'de> for ObjectList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ObjectsVisitor;

        impl<'de> Visitor<'de> for ObjectsVisitor {
            type Value = ObjectList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of object names to geometries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ObjectList, A::Error> {
                let mut objects = Vec::with_capacity(access.size_hint().unwrap_or(0));
                let mut seen = FxHashSet::default();
                while let Some((name, geometry)) = access.next_entry::<String, Geometry>()? {
                    if !seen.insert(name.clone()) {
                        return Err(de::Error::custom(format!("duplicate object name {name:?}")));
                    }
                    objects.push((name, geometry));
                }
                Ok(ObjectList(objects))
            }
        }

        deserializer.deserialize_map(ObjectsVisitor)
    }
}

impl Serialize for Topology {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "Topology")?;
        if let Some(bbox) = &self.bbox {
            map.serialize_entry("bbox", bbox)?;
        }
        if let Some(transform) = &self.transform {
            map.serialize_entry("transform", transform)?;
        }
        map.serialize_entry("objects", &ObjectsRef(&self.objects))?;
        map.serialize_entry("arcs", &self.arcs)?;
        map.end()
    }
}

#[derive(Deserialize)]
enum DocumentType {
    Topology,
}

#[derive(Deserialize)]
struct TopologyDocument {
    #[serde(rename = "type")]
    _kind: DocumentType,
    #[serde(default)]
    arcs: Vec<Arc>,
    objects: ObjectList,
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    bbox: Option<BBox>,
}

impl<'de> Deserialize<'de> for Topology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = TopologyDocument::deserialize(deserializer)?;
        Ok(Topology {
            arcs: doc.arcs,
            objects: doc.objects.0,
            transform: doc.transform,
            bbox: doc.bbox,
        })
    }
}
