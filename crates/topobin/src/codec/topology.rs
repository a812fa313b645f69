//! Topology encoding/decoding for the topobin binary format.
//!
//! Section order and widths are fixed by the layout in [`crate::limits`]:
//! header, transform, bbox, string table, arc offsets, arc data, objects.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::codec::header::read_header;
use crate::codec::layout::{Sections, parse_string_table, read_arc, split_names, validate_offsets};
use crate::codec::objects::{decode_objects, encode_objects};
use crate::codec::primitives::{Reader, Writer, padding_for};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{
    BBOX_LEN, FLAG_HAS_BBOX, FLAG_HAS_TRANSFORM, FLOAT_COORD_LEN, FORMAT_VERSION, HEADER_LEN,
    MAGIC_BYTES, MAX_U32_FIELD, QUANTIZED_COORD_LEN, STRING_TABLE_ALIGN, TRANSFORM_LEN,
};
use crate::model::{Topology, Transform};

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a complete topology from a buffer.
///
/// Validates magic and version before reading anything else, then every
/// section. Any structural problem aborts the whole decode.
pub fn decode_topology(input: &[u8]) -> Result<Topology, DecodeError> {
    let header = read_header(input)?;
    let sections = Sections::locate(&header)?;
    sections.require_arc_data(input.len())?;

    let mut reader = Reader::at(input, HEADER_LEN);
    let transform = if header.has_transform() {
        Some(Transform::from_array(reader.read_f64x4("transform")?))
    } else {
        None
    };
    let bbox = if header.has_bbox() {
        Some(reader.read_f64x4("bbox")?)
    } else {
        None
    };

    let table = reader.read_bytes(header.string_table_len, "string table")?;
    let table = parse_string_table(table, header.object_count)?;
    let names: Vec<&str> = split_names(table, header.object_count).collect();
    trace!(
        string_table = sections.string_table,
        offsets = sections.offsets,
        arc_data = sections.arc_data,
        objects = sections.objects,
        "topobin.decode.sections"
    );

    validate_offsets(input, sections.offsets, header.arc_count, header.total_points)?;
    let quantized = header.has_transform();
    let mut arcs = Vec::with_capacity(header.arc_count);
    let mut start = 0usize;
    let mut offsets = Reader::at(input, sections.offsets + 4);
    for _ in 0..header.arc_count {
        let end = offsets.read_u32("arc offsets")? as usize;
        arcs.push(read_arc(input, sections.arc_data, start, end, quantized));
        start = end;
    }

    let mut reader = Reader::at(input, sections.objects);
    let payload = reader.read_bytes_prefixed("objects payload")?;
    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            count: reader.remaining_len(),
        });
    }
    let objects = decode_objects(payload, names.iter().copied())?;

    debug!(
        version = header.version,
        arcs = header.arc_count,
        points = header.total_points,
        objects = header.object_count,
        quantized,
        bytes = input.len(),
        "topobin.decode"
    );

    Ok(Topology {
        arcs,
        objects,
        transform,
        bbox,
    })
}

// =============================================================================
// ENCODING
// =============================================================================

/// Options for encoding topologies.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Check object names and arc coordinates before writing.
    ///
    /// When enabled (the default), the encoder rejects:
    /// - duplicate object names, or names containing a zero byte
    /// - quantized coordinates that are not `i32` integers
    /// - non-finite coordinates in unquantized topologies
    ///
    /// When disabled those inputs produce a buffer that does not round-trip;
    /// quantized coordinates are saturated to `i32`. Counts and lengths are
    /// always checked.
    pub validate: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { validate: true }
    }
}

impl EncodeOptions {
    /// Creates default (validating) encoding options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options that skip name and coordinate checks.
    pub fn unchecked() -> Self {
        Self { validate: false }
    }
}

fn check_u32_field(field: &'static str, len: usize) -> Result<(), EncodeError> {
    if len > MAX_U32_FIELD {
        return Err(EncodeError::LengthExceedsLimit {
            field,
            len,
            max: MAX_U32_FIELD,
        });
    }
    Ok(())
}

fn is_quantized_coord(v: f64) -> bool {
    v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64
}

fn validate_names(topology: &Topology) -> Result<(), EncodeError> {
    let mut seen = FxHashSet::with_capacity_and_hasher(topology.objects.len(), Default::default());
    for (name, _) in &topology.objects {
        if name.as_bytes().contains(&0) {
            return Err(EncodeError::InvalidObjectName { name: name.clone() });
        }
        if !seen.insert(name.as_str()) {
            return Err(EncodeError::DuplicateObjectName { name: name.clone() });
        }
    }
    Ok(())
}

fn validate_coordinates(topology: &Topology) -> Result<(), EncodeError> {
    let quantized = topology.is_quantized();
    for (a, arc) in topology.arcs.iter().enumerate() {
        for (p, position) in arc.iter().enumerate() {
            for &value in position {
                if quantized && !is_quantized_coord(value) {
                    return Err(EncodeError::CoordinateNotQuantized {
                        arc: a,
                        point: p,
                        value,
                    });
                }
                if !quantized && !value.is_finite() {
                    return Err(EncodeError::NonFiniteCoordinate {
                        arc: a,
                        point: p,
                        value,
                    });
                }
            }
        }
    }
    Ok(())
}

/// Encodes a topology to a new buffer.
pub fn encode_topology(topology: &Topology) -> Result<Vec<u8>, EncodeError> {
    encode_topology_with_options(topology, EncodeOptions::default())
}

/// Encodes a topology to a new buffer with the given options.
pub fn encode_topology_with_options(
    topology: &Topology,
    options: EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    if options.validate {
        validate_names(topology)?;
        validate_coordinates(topology)?;
    }

    let has_transform = topology.transform.is_some();
    let has_bbox = topology.bbox.is_some();
    let num_arcs = topology.arcs.len();
    let total_points = topology.total_points();
    let num_objects = topology.objects.len();
    let table_len: usize = topology.objects.iter().map(|(name, _)| name.len() + 1).sum();

    check_u32_field("arcs", num_arcs)?;
    check_u32_field("arc points", total_points)?;
    check_u32_field("objects", num_objects)?;
    check_u32_field("string table", table_len)?;

    let payload = encode_objects(&topology.objects)?;
    check_u32_field("objects payload", payload.len())?;

    let coord_len = if has_transform {
        QUANTIZED_COORD_LEN
    } else {
        FLOAT_COORD_LEN
    };
    let capacity = HEADER_LEN
        + if has_transform { TRANSFORM_LEN } else { 0 }
        + if has_bbox { BBOX_LEN } else { 0 }
        + table_len
        + padding_for(table_len, STRING_TABLE_ALIGN)
        + (num_arcs + 1) * 4
        + total_points * 2 * coord_len
        + 4
        + payload.len();
    let mut writer = Writer::with_capacity(capacity);

    // Header
    let mut flags = 0u16;
    if has_transform {
        flags |= FLAG_HAS_TRANSFORM;
    }
    if has_bbox {
        flags |= FLAG_HAS_BBOX;
    }
    writer.write_bytes(MAGIC_BYTES);
    writer.write_u16(FORMAT_VERSION);
    writer.write_u16(flags);
    writer.write_u32(num_arcs as u32);
    writer.write_u32(total_points as u32);
    writer.write_u32(num_objects as u32);
    writer.write_u32(table_len as u32);

    if let Some(transform) = &topology.transform {
        writer.write_f64x4(&transform.to_array());
    }
    if let Some(bbox) = &topology.bbox {
        writer.write_f64x4(bbox);
    }

    // String table (header and optional blocks keep the writer 4-aligned)
    for (name, _) in &topology.objects {
        writer.write_bytes(name.as_bytes());
        writer.write_byte(0);
    }
    writer.pad_to(STRING_TABLE_ALIGN);

    // Arc offsets
    let mut offset = 0u32;
    writer.write_u32(offset);
    for arc in &topology.arcs {
        offset += arc.len() as u32;
        writer.write_u32(offset);
    }

    // Arc data
    for arc in &topology.arcs {
        for position in arc {
            if has_transform {
                writer.write_i32(position[0] as i32);
                writer.write_i32(position[1] as i32);
            } else {
                writer.write_f64(position[0]);
                writer.write_f64(position[1]);
            }
        }
    }

    // Objects
    writer.write_bytes_prefixed(&payload);

    debug!(
        arcs = num_arcs,
        points = total_points,
        objects = num_objects,
        quantized = has_transform,
        payload_bytes = payload.len(),
        bytes = writer.len(),
        "topobin.encode"
    );
    debug_assert_eq!(writer.len(), capacity);

    Ok(writer.into_bytes())
}
