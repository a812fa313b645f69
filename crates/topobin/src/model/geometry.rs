//! Geometry objects referenced by name from a topology.
//!
//! The variant set is the fixed TopoJSON one. Geometries reference arcs by
//! signed index: `i >= 0` is arc `i`, `i < 0` is arc `!i` traversed backwards.

use serde::de::{self, Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::model::{BBox, Position};

/// Signed arc reference.
pub type ArcIndex = i64;

/// Free-form property bag attached to a geometry.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Geometry identifier: TopoJSON allows either a string or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GeometryId {
    Number(serde_json::Number),
    String(String),
}

impl From<&str> for GeometryId {
    fn from(s: &str) -> Self {
        GeometryId::String(s.to_string())
    }
}

impl From<i64> for GeometryId {
    fn from(n: i64) -> Self {
        GeometryId::Number(n.into())
    }
}

/// The shape carried by a geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryKind {
    /// The TopoJSON null geometry (`"type": null`).
    Null,
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { arcs: Vec<ArcIndex> },
    MultiLineString { arcs: Vec<Vec<ArcIndex>> },
    Polygon { arcs: Vec<Vec<ArcIndex>> },
    MultiPolygon { arcs: Vec<Vec<Vec<ArcIndex>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl GeometryKind {
    /// Returns the TopoJSON type name, or `None` for the null geometry.
    pub fn type_name(&self) -> Option<&'static str> {
        match self {
            GeometryKind::Null => None,
            GeometryKind::Point { .. } => Some("Point"),
            GeometryKind::MultiPoint { .. } => Some("MultiPoint"),
            GeometryKind::LineString { .. } => Some("LineString"),
            GeometryKind::MultiLineString { .. } => Some("MultiLineString"),
            GeometryKind::Polygon { .. } => Some("Polygon"),
            GeometryKind::MultiPolygon { .. } => Some("MultiPolygon"),
            GeometryKind::GeometryCollection { .. } => Some("GeometryCollection"),
        }
    }
}

/// A named object's geometry with its optional identifier and properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub kind: GeometryKind,
    pub id: Option<GeometryId>,
    pub properties: Option<Properties>,
    pub bbox: Option<BBox>,
}

impl Geometry {
    /// Creates a geometry with no identifier, properties or bbox.
    pub fn new(kind: GeometryKind) -> Self {
        Self {
            kind,
            id: None,
            properties: None,
            bbox: None,
        }
    }

    /// Creates a line string over the given arcs.
    pub fn line_string(arcs: Vec<ArcIndex>) -> Self {
        Self::new(GeometryKind::LineString { arcs })
    }

    /// Creates a polygon from its rings.
    pub fn polygon(rings: Vec<Vec<ArcIndex>>) -> Self {
        Self::new(GeometryKind::Polygon { arcs: rings })
    }

    /// Creates a point.
    pub fn point(coordinates: Position) -> Self {
        Self::new(GeometryKind::Point { coordinates })
    }

    /// Creates a collection of geometries.
    pub fn collection(geometries: Vec<Geometry>) -> Self {
        Self::new(GeometryKind::GeometryCollection { geometries })
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: impl Into<GeometryId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets one property, creating the bag if needed.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties
            .get_or_insert_with(Properties::new)
            .insert(key.into(), value.into());
        self
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind.type_name())?;
        match &self.kind {
            GeometryKind::Null => {}
            GeometryKind::Point { coordinates } => map.serialize_entry("coordinates", coordinates)?,
            GeometryKind::MultiPoint { coordinates } => {
                map.serialize_entry("coordinates", coordinates)?
            }
            GeometryKind::LineString { arcs } => map.serialize_entry("arcs", arcs)?,
            GeometryKind::MultiLineString { arcs } | GeometryKind::Polygon { arcs } => {
                map.serialize_entry("arcs", arcs)?
            }
            GeometryKind::MultiPolygon { arcs } => map.serialize_entry("arcs", arcs)?,
            GeometryKind::GeometryCollection { geometries } => {
                map.serialize_entry("geometries", geometries)?
            }
        }
        if let Some(id) = &self.id {
            map.serialize_entry("id", id)?;
        }
        if let Some(properties) = &self.properties {
            map.serialize_entry("properties", properties)?;
        }
        if let Some(bbox) = &self.bbox {
            map.serialize_entry("bbox", bbox)?;
        }
        map.end()
    }
}

/// Wire shape of a geometry before the type tag is resolved.
#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<GeometryId>,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    bbox: Option<BBox>,
    #[serde(default)]
    coordinates: Option<serde_json::Value>,
    #[serde(default)]
    arcs: Option<serde_json::Value>,
    #[serde(default)]
    geometries: Option<Vec<Geometry>>,
}

const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

fn member<T, E>(value: Option<serde_json::Value>, name: &'static str) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    let value = value.ok_or_else(|| E::missing_field(name))?;
    serde_json::from_value(value).map_err(E::custom)
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawGeometry::deserialize(deserializer)?;
        let kind = match raw.kind.as_deref() {
            None => GeometryKind::Null,
            Some("Point") => GeometryKind::Point {
                coordinates: member::<_, D::Error>(raw.coordinates, "coordinates")?,
            },
            Some("MultiPoint") => GeometryKind::MultiPoint {
                coordinates: member::<_, D::Error>(raw.coordinates, "coordinates")?,
            },
            Some("LineString") => GeometryKind::LineString {
                arcs: member::<_, D::Error>(raw.arcs, "arcs")?,
            },
            Some("MultiLineString") => GeometryKind::MultiLineString {
                arcs: member::<_, D::Error>(raw.arcs, "arcs")?,
            },
            Some("Polygon") => GeometryKind::Polygon {
                arcs: member::<_, D::Error>(raw.arcs, "arcs")?,
            },
            Some("MultiPolygon") => GeometryKind::MultiPolygon {
                arcs: member::<_, D::Error>(raw.arcs, "arcs")?,
            },
            Some("GeometryCollection") => GeometryKind::GeometryCollection {
                geometries: raw
                    .geometries
                    .ok_or_else(|| D::Error::missing_field("geometries"))?,
            },
            Some(other) => {
                return Err(D::Error::unknown_variant(other, GEOMETRY_TYPES));
            }
        };
        Ok(Geometry {
            kind,
            id: raw.id,
            properties: raw.properties,
            bbox: raw.bbox,
        })
    }
}
