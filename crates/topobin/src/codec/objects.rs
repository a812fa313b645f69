//! The objects payload: named geometries as opaque UTF-8 JSON.
//!
//! The payload is `{"names": [...], "objects": {name: geometry, ...}}`.
//! Nothing else in the codec looks inside it; a binary geometry encoding
//! would replace this module behind a new version or flag bit.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, EncodeError};
use crate::model::Geometry;
use crate::model::topology::{ObjectList, ObjectsRef};

#[derive(Serialize)]
struct PayloadRef<'a> {
    names: Vec<&'a str>,
    objects: ObjectsRef<'a>,
}

#[derive(Deserialize)]
struct Payload {
    names: Vec<String>,
    objects: ObjectList,
}

/// Serializes named geometries to the payload text.
pub fn encode_objects(objects: &[(String, Geometry)]) -> Result<Vec<u8>, EncodeError> {
    let payload = PayloadRef {
        names: objects.iter().map(|(name, _)| name.as_str()).collect(),
        objects: ObjectsRef(objects),
    };
    serde_json::to_vec(&payload).map_err(|e| EncodeError::ObjectsSerialization(e.to_string()))
}

/// Parses the payload and returns geometries in the order of `names`.
///
/// `names` comes from the string table; the payload must agree with it.
pub fn decode_objects<'n>(
    payload: &[u8],
    names: impl ExactSizeIterator<Item = &'n str>,
) -> Result<Vec<(String, Geometry)>, DecodeError> {
    let text = std::str::from_utf8(payload).map_err(|_| DecodeError::InvalidUtf8 {
        field: "objects payload",
    })?;
    let payload: Payload =
        serde_json::from_str(text).map_err(|e| DecodeError::MalformedObjects(e.to_string()))?;

    let count = names.len();
    if payload.names.len() != count || payload.objects.0.len() != count {
        return Err(DecodeError::ObjectsMismatch {
            context: format!(
                "string table has {} names, payload has {} names and {} objects",
                count,
                payload.names.len(),
                payload.objects.0.len()
            ),
        });
    }

    let mut by_name: FxHashMap<String, Geometry> = payload.objects.0.into_iter().collect();
    let mut objects = Vec::with_capacity(count);
    for (name, listed) in names.zip(&payload.names) {
        if name != listed.as_str() {
            return Err(DecodeError::ObjectsMismatch {
                context: format!("name {name:?} listed as {listed:?}"),
            });
        }
        let geometry = by_name.remove(name).ok_or_else(|| DecodeError::ObjectsMismatch {
            context: format!("no geometry for {name:?}"),
        })?;
        objects.push((name.to_string(), geometry));
    }
    Ok(objects)
}
