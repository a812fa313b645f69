//! Section positions and the table readers shared by the decoder and the view.

use crate::codec::header::Header;
use crate::codec::primitives::{f64_at, i32_at, padding_for, u32_at};
use crate::error::DecodeError;
use crate::limits::{BBOX_LEN, HEADER_LEN, STRING_TABLE_ALIGN, TRANSFORM_LEN};
use crate::model::Arc;

/// Byte offsets of every section, derived from the header alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Sections {
    pub transform: Option<usize>,
    pub bbox: Option<usize>,
    pub string_table: usize,
    pub offsets: usize,
    pub arc_data: usize,
    /// Start of the objects length prefix (end of arc data).
    pub objects: usize,
}

fn grow(pos: usize, n: Option<usize>) -> Result<usize, DecodeError> {
    n.and_then(|n| pos.checked_add(n))
        .ok_or(DecodeError::UnexpectedEof { context: "section layout" })
}

impl Sections {
    /// Computes section offsets. Fails only if they overflow `usize`.
    pub fn locate(header: &Header) -> Result<Self, DecodeError> {
        let mut pos = HEADER_LEN;

        let transform = header.has_transform().then_some(pos);
        if transform.is_some() {
            pos += TRANSFORM_LEN;
        }
        let bbox = header.has_bbox().then_some(pos);
        if bbox.is_some() {
            pos += BBOX_LEN;
        }

        let string_table = pos;
        let table_len = header.string_table_len;
        pos = grow(pos, table_len.checked_add(padding_for(table_len, STRING_TABLE_ALIGN)))?;

        let offsets = pos;
        pos = grow(pos, header.arc_count.checked_add(1).and_then(|n| n.checked_mul(4)))?;

        let arc_data = pos;
        pos = grow(
            pos,
            header
                .total_points
                .checked_mul(2)
                .and_then(|n| n.checked_mul(header.coord_len())),
        )?;

        Ok(Self {
            transform,
            bbox,
            string_table,
            offsets,
            arc_data,
            objects: pos,
        })
    }

    /// Fails unless the buffer covers everything up to the end of arc data.
    pub fn require_arc_data(&self, len: usize) -> Result<(), DecodeError> {
        if len < self.objects {
            return Err(DecodeError::UnexpectedEof { context: "arc data" });
        }
        Ok(())
    }
}

/// Validates a string table and returns it without the final terminator.
///
/// Names are separated by zero bytes; the number of zero bytes must equal
/// the declared object count.
pub(crate) fn parse_string_table(table: &[u8], declared: usize) -> Result<&str, DecodeError> {
    let body = match table.split_last() {
        None => table,
        Some((&0, body)) => body,
        Some(_) => return Err(DecodeError::UnterminatedStringTable),
    };
    let found = table.iter().filter(|b| **b == 0).count();
    if found != declared {
        return Err(DecodeError::NameCountMismatch { declared, found });
    }
    std::str::from_utf8(body).map_err(|_| DecodeError::InvalidUtf8 {
        field: "string table",
    })
}

/// Iterates the names in a table returned by [`parse_string_table`].
pub(crate) fn split_names(body: &str, count: usize) -> impl Iterator<Item = &str> {
    body.split('\0').take(count)
}

/// Checks the arc-offset table: starts at 0, ends at `total_points`,
/// never decreases.
///
/// Callers guarantee the table lies inside `data`.
pub(crate) fn validate_offsets(
    data: &[u8],
    pos: usize,
    arc_count: usize,
    total_points: usize,
) -> Result<(), DecodeError> {
    let first = u32_at(data, pos);
    if first != 0 {
        return Err(DecodeError::OffsetBoundary {
            index: 0,
            offset: first,
            expected: 0,
        });
    }

    let mut prev = first;
    for i in 1..=arc_count {
        let next = u32_at(data, pos + i * 4);
        if next < prev {
            return Err(DecodeError::OffsetsNotMonotonic {
                index: i,
                prev,
                next,
            });
        }
        prev = next;
    }

    // total_points came from a u32 header field
    let expected = total_points as u32;
    if prev != expected {
        return Err(DecodeError::OffsetBoundary {
            index: arc_count,
            offset: prev,
            expected,
        });
    }
    Ok(())
}

/// Returns the `[start, end)` point range of arc `index`.
#[inline]
pub(crate) fn arc_range(data: &[u8], offsets_pos: usize, index: usize) -> (usize, usize) {
    let start = u32_at(data, offsets_pos + index * 4) as usize;
    let end = u32_at(data, offsets_pos + (index + 1) * 4) as usize;
    (start, end)
}

/// Copies points `[start, end)` out of the arc data section.
pub(crate) fn read_arc(data: &[u8], arc_data_pos: usize, start: usize, end: usize, quantized: bool) -> Arc {
    let mut arc = Vec::with_capacity(end - start);
    if quantized {
        let mut pos = arc_data_pos + start * 8;
        for _ in start..end {
            arc.push([i32_at(data, pos) as f64, i32_at(data, pos + 4) as f64]);
            pos += 8;
        }
    } else {
        let mut pos = arc_data_pos + start * 16;
        for _ in start..end {
            arc.push([f64_at(data, pos), f64_at(data, pos + 8)]);
            pos += 16;
        }
    }
    arc
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::primitives::Writer;
    use crate::limits::{FLAG_HAS_BBOX, FLAG_HAS_TRANSFORM, FORMAT_VERSION};

    fn header(flags: u16, arc_count: usize, total_points: usize, table_len: usize) -> Header {
        Header {
            version: FORMAT_VERSION,
            flags,
            arc_count,
            total_points,
            object_count: 0,
            string_table_len: table_len,
        }
    }

    #[test]
    fn test_sections_without_optional_blocks() {
        let s = Sections::locate(&header(0, 2, 5, 5)).unwrap();
        assert_eq!(s.transform, None);
        assert_eq!(s.bbox, None);
        assert_eq!(s.string_table, 24);
        assert_eq!(s.offsets, 24 + 8);
        assert_eq!(s.arc_data, 32 + 3 * 4);
        assert_eq!(s.objects, 44 + 5 * 16);
    }

    #[test]
    fn test_sections_with_transform_and_bbox() {
        let s = Sections::locate(&header(FLAG_HAS_TRANSFORM | FLAG_HAS_BBOX, 1, 3, 4)).unwrap();
        assert_eq!(s.transform, Some(24));
        assert_eq!(s.bbox, Some(56));
        assert_eq!(s.string_table, 88);
        assert_eq!(s.offsets, 92);
        assert_eq!(s.arc_data, 100);
        assert_eq!(s.objects, 100 + 3 * 8);
    }

    #[test]
    fn test_string_table_parsing() {
        assert_eq!(parse_string_table(b"", 0).unwrap(), "");
        assert_eq!(parse_string_table(b"a\0bc\0", 2).unwrap(), "a\0bc");
        assert_eq!(parse_string_table(b"\0", 1).unwrap(), "");

        let names: Vec<&str> = split_names("a\0bc", 2).collect();
        assert_eq!(names, ["a", "bc"]);
        assert_eq!(split_names("", 0).count(), 0);
        assert_eq!(split_names("", 1).collect::<Vec<_>>(), [""]);
    }

    #[test]
    fn test_string_table_errors() {
        assert!(matches!(
            parse_string_table(b"abc", 1),
            Err(DecodeError::UnterminatedStringTable)
        ));
        assert!(matches!(
            parse_string_table(b"a\0b\0", 3),
            Err(DecodeError::NameCountMismatch { declared: 3, found: 2 })
        ));
        assert!(matches!(
            parse_string_table(b"\xff\0", 1),
            Err(DecodeError::InvalidUtf8 { .. })
        ));
    }

    fn offsets(values: &[u32]) -> Vec<u8> {
        let mut writer = Writer::new();
        for v in values {
            writer.write_u32(*v);
        }
        writer.into_bytes()
    }

    #[test]
    fn test_offsets_valid() {
        assert!(validate_offsets(&offsets(&[0]), 0, 0, 0).is_ok());
        assert!(validate_offsets(&offsets(&[0, 3, 3, 5]), 0, 3, 5).is_ok());
    }

    #[test]
    fn test_offsets_invalid() {
        assert!(matches!(
            validate_offsets(&offsets(&[1, 3]), 0, 1, 3),
            Err(DecodeError::OffsetBoundary { index: 0, .. })
        ));
        assert!(matches!(
            validate_offsets(&offsets(&[0, 4, 2, 5]), 0, 3, 5),
            Err(DecodeError::OffsetsNotMonotonic { index: 2, prev: 4, next: 2 })
        ));
        assert!(matches!(
            validate_offsets(&offsets(&[0, 2, 4]), 0, 2, 5),
            Err(DecodeError::OffsetBoundary { index: 2, offset: 4, expected: 5 })
        ));
    }

    #[test]
    fn test_read_arc_both_widths() {
        let mut writer = Writer::new();
        for v in [1, -2, 3, 4] {
            writer.write_i32(v);
        }
        let data = writer.into_bytes();
        assert_eq!(read_arc(&data, 0, 1, 2, true), vec![[3.0, 4.0]]);

        let mut writer = Writer::new();
        for v in [0.5, -1.25, 2.0, 8.5] {
            writer.write_f64(v);
        }
        let data = writer.into_bytes();
        assert_eq!(read_arc(&data, 0, 0, 2, false), vec![[0.5, -1.25], [2.0, 8.5]]);
        assert!(read_arc(&data, 0, 1, 1, false).is_empty());
    }
}
