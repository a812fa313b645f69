//! Zero-copy read access to an encoded buffer.
//!
//! A [`TopologyView`] validates the header, the string table and the arc
//! offsets once, then answers arc queries straight from the borrowed bytes.
//! Only the requested arc is materialized; the objects payload is not parsed
//! unless [`TopologyView::objects`] is called.

use std::iter::FusedIterator;

use tracing::debug;

use crate::codec::header::read_header;
use crate::codec::layout::{Sections, arc_range, parse_string_table, read_arc, split_names, validate_offsets};
use crate::codec::objects::decode_objects;
use crate::codec::primitives::{Reader, f64_at};
use crate::error::{DecodeError, IndexError};
use crate::model::{Arc, BBox, Geometry, Transform};

fn f64x4_at(data: &[u8], pos: usize) -> [f64; 4] {
    [
        f64_at(data, pos),
        f64_at(data, pos + 8),
        f64_at(data, pos + 16),
        f64_at(data, pos + 24),
    ]
}

/// A read-only view over an encoded topology.
///
/// The view never copies or mutates the buffer and cannot outlive it. It is
/// `Copy`, so handing it to other threads or iterators is free.
#[derive(Debug, Clone, Copy)]
pub struct TopologyView<'a> {
    data: &'a [u8],
    version: u16,
    arc_count: usize,
    total_points: usize,
    object_count: usize,
    quantized: bool,
    transform: Option<Transform>,
    bbox: Option<BBox>,
    /// String table without the final terminator.
    names: &'a str,
    offsets_pos: usize,
    arc_data_pos: usize,
    objects_pos: usize,
}

impl<'a> TopologyView<'a> {
    /// Opens a view over `data`.
    ///
    /// Fails with the same error kinds as [`decode_topology`]. After this
    /// succeeds, arc access can only fail on an out-of-range index.
    ///
    /// [`decode_topology`]: crate::codec::decode_topology
    pub fn new(data: &'a [u8]) -> Result<Self, DecodeError> {
        let header = read_header(data)?;
        let sections = Sections::locate(&header)?;
        sections.require_arc_data(data.len())?;

        let table = &data[sections.string_table..sections.string_table + header.string_table_len];
        let names = parse_string_table(table, header.object_count)?;
        validate_offsets(data, sections.offsets, header.arc_count, header.total_points)?;

        debug!(
            version = header.version,
            arcs = header.arc_count,
            points = header.total_points,
            objects = header.object_count,
            bytes = data.len(),
            "topobin.view"
        );

        Ok(Self {
            data,
            version: header.version,
            arc_count: header.arc_count,
            total_points: header.total_points,
            object_count: header.object_count,
            quantized: header.has_transform(),
            transform: sections
                .transform
                .map(|pos| Transform::from_array(f64x4_at(data, pos))),
            bbox: sections.bbox.map(|pos| f64x4_at(data, pos)),
            names,
            offsets_pos: sections.offsets,
            arc_data_pos: sections.arc_data,
            objects_pos: sections.objects,
        })
    }

    /// Returns the format version of the buffer.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Returns the number of arcs.
    pub fn arc_count(&self) -> usize {
        self.arc_count
    }

    /// Returns the number of positions across all arcs.
    pub fn total_points(&self) -> usize {
        self.total_points
    }

    /// Returns the number of named objects.
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    /// Returns true if arc coordinates are quantized.
    pub fn is_quantized(&self) -> bool {
        self.quantized
    }

    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.bbox
    }

    /// Returns the underlying buffer.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    fn check_index(&self, index: usize) -> Result<(), IndexError> {
        if index >= self.arc_count {
            return Err(IndexError {
                index,
                count: self.arc_count,
            });
        }
        Ok(())
    }

    /// Materializes arc `index`.
    pub fn arc(&self, index: usize) -> Result<Arc, IndexError> {
        self.check_index(index)?;
        let (start, end) = arc_range(self.data, self.offsets_pos, index);
        Ok(read_arc(self.data, self.arc_data_pos, start, end, self.quantized))
    }

    /// Returns the number of positions in arc `index` without reading them.
    pub fn arc_len(&self, index: usize) -> Result<usize, IndexError> {
        self.check_index(index)?;
        let (start, end) = arc_range(self.data, self.offsets_pos, index);
        Ok(end - start)
    }

    /// Iterates over all arcs in order.
    ///
    /// Each call starts a fresh pass.
    pub fn arcs(&self) -> ArcIter<'a> {
        ArcIter {
            view: *self,
            front: 0,
            back: self.arc_count,
        }
    }

    /// Iterates over object names in string-table order.
    pub fn names(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        split_names(self.names, self.object_count)
    }

    /// Parses the objects payload.
    ///
    /// This is the only view operation that reads past the arc data.
    pub fn objects(&self) -> Result<Vec<(String, Geometry)>, DecodeError> {
        let mut reader = Reader::at(self.data, self.objects_pos);
        let payload = reader.read_bytes_prefixed("objects payload")?;
        if !reader.is_empty() {
            return Err(DecodeError::TrailingBytes {
                count: reader.remaining_len(),
            });
        }
        let names: Vec<&str> = self.names().collect();
        decode_objects(payload, names.into_iter())
    }
}

/// Iterator over the arcs of a [`TopologyView`].
#[derive(Debug, Clone)]
pub struct ArcIter<'a> {
    view: TopologyView<'a>,
    front: usize,
    back: usize,
}

impl Iterator for ArcIter<'_> {
    type Item = Arc;

    fn next(&mut self) -> Option<Arc> {
        if self.front >= self.back {
            return None;
        }
        let arc = self.view.arc(self.front).ok();
        self.front += 1;
        arc
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for ArcIter<'_> {
    fn next_back(&mut self) -> Option<Arc> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.view.arc(self.back).ok()
    }
}

impl ExactSizeIterator for ArcIter<'_> {}

impl FusedIterator for ArcIter<'_> {}

impl<'a> IntoIterator for &TopologyView<'a> {
    type Item = Arc;
    type IntoIter = ArcIter<'a>;

    fn into_iter(self) -> ArcIter<'a> {
        self.arcs()
    }
}

impl<'a> IntoIterator for TopologyView<'a> {
    type Item = Arc;
    type IntoIter = ArcIter<'a>;

    fn into_iter(self) -> ArcIter<'a> {
        self.arcs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_topology, encode_topology};
    use crate::error::ErrorKind;
    use crate::model::Topology;

    fn make_test_topology() -> Topology {
        let mut topo = Topology::new();
        topo.arcs = vec![
            vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]],
            vec![[2.0, 0.0], [3.0, 1.0]],
        ];
        topo.push_object("test", Geometry::line_string(vec![0]));
        topo
    }

    fn make_quantized_topology() -> Topology {
        let mut topo = Topology::new();
        topo.transform = Some(Transform::new([0.5, 0.25], [10.0, -10.0]));
        topo.bbox = Some([10.0, -10.0, 60.0, 15.0]);
        topo.push_arc(vec![[0.0, 0.0], [100.0, 100.0]]);
        topo.push_arc(vec![]);
        topo.push_arc(vec![[100.0, 100.0], [-7.0, 3.0], [0.0, 0.0]]);
        topo.push_object("ring", Geometry::polygon(vec![vec![0, 2]]));
        topo.push_object("", Geometry::new(crate::model::GeometryKind::Null));
        topo
    }

    #[test]
    fn test_view_reports_arcs() {
        let buffer = encode_topology(&make_test_topology()).unwrap();
        let view = TopologyView::new(&buffer).unwrap();

        assert_eq!(view.arc_count(), 2);
        assert_eq!(view.total_points(), 5);
        assert_eq!(view.object_count(), 1);
        assert!(!view.is_quantized());
        assert_eq!(view.transform(), None);
        assert_eq!(view.bbox(), None);
        assert_eq!(view.arc(1).unwrap(), vec![[2.0, 0.0], [3.0, 1.0]]);
        assert_eq!(view.arc_len(0).unwrap(), 3);
        assert_eq!(view.names().collect::<Vec<_>>(), ["test"]);
    }

    #[test]
    fn test_view_matches_decoder() {
        for topo in [make_test_topology(), make_quantized_topology()] {
            let buffer = encode_topology(&topo).unwrap();
            let view = TopologyView::new(&buffer).unwrap();
            let decoded = decode_topology(&buffer).unwrap();

            assert_eq!(view.arc_count(), decoded.arcs.len());
            for (i, arc) in decoded.arcs.iter().enumerate() {
                assert_eq!(&view.arc(i).unwrap(), arc);
            }
            assert_eq!(view.arcs().collect::<Vec<_>>(), decoded.arcs);
            assert_eq!(view.transform(), decoded.transform);
            assert_eq!(view.bbox(), decoded.bbox);
            assert_eq!(view.objects().unwrap(), decoded.objects);
        }
    }

    #[test]
    fn test_index_error_at_arc_count() {
        let buffer = encode_topology(&make_test_topology()).unwrap();
        let view = TopologyView::new(&buffer).unwrap();

        let err = view.arc(view.arc_count()).unwrap_err();
        assert_eq!(err, IndexError { index: 2, count: 2 });
        assert!(view.arc_len(usize::MAX).is_err());
    }

    #[test]
    fn test_empty_topology_view() {
        let buffer = encode_topology(&Topology::new()).unwrap();
        let view = TopologyView::new(&buffer).unwrap();

        assert_eq!(view.arc_count(), 0);
        assert_eq!(view.arcs().len(), 0);
        assert_eq!(view.names().count(), 0);
        assert!(matches!(view.arc(0), Err(IndexError { index: 0, count: 0 })));
        assert!(view.objects().unwrap().is_empty());
    }

    #[test]
    fn test_quantized_view() {
        let topo = make_quantized_topology();
        let buffer = encode_topology(&topo).unwrap();
        let view = TopologyView::new(&buffer).unwrap();

        assert!(view.is_quantized());
        assert_eq!(view.transform(), topo.transform);
        assert_eq!(view.bbox(), topo.bbox);
        assert_eq!(view.arc_len(1).unwrap(), 0);
        assert!(view.arc(1).unwrap().is_empty());
        assert_eq!(view.arc(2).unwrap()[1], [-7.0, 3.0]);
        assert_eq!(view.names().collect::<Vec<_>>(), ["ring", ""]);
    }

    #[test]
    fn test_arc_iter_is_restartable_and_double_ended() {
        let buffer = encode_topology(&make_quantized_topology()).unwrap();
        let view = TopologyView::new(&buffer).unwrap();

        let mut iter = view.arcs();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().unwrap().len(), 3);
        assert_eq!(iter.next().unwrap().len(), 2);
        assert_eq!(iter.len(), 1);
        assert!(iter.next().unwrap().is_empty());
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let lengths: Vec<usize> = (&view).into_iter().map(|a| a.len()).collect();
        assert_eq!(lengths, [2, 0, 3]);
        assert_eq!(view.arcs().rev().count(), 3);
    }

    #[test]
    fn test_view_version_gate() {
        let mut buffer = encode_topology(&make_test_topology()).unwrap();
        buffer[5] = 5;

        let err = TopologyView::new(&buffer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Version);

        let err = TopologyView::new(b"TOP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_view_rejects_truncated_arc_data() {
        let buffer = encode_topology(&make_test_topology()).unwrap();
        let result = TopologyView::new(&buffer[..60]);
        assert!(matches!(result, Err(DecodeError::UnexpectedEof { context: "arc data" })));
    }

    #[test]
    fn test_view_does_not_parse_objects_eagerly() {
        let mut buffer = encode_topology(&make_test_topology()).unwrap();
        let last = buffer.len() - 1;
        buffer[last] = b'!';

        let view = TopologyView::new(&buffer).unwrap();
        assert_eq!(view.arc(0).unwrap().len(), 3);
        assert!(matches!(view.objects(), Err(DecodeError::MalformedObjects(_))));
    }

    #[test]
    fn test_view_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TopologyView<'static>>();
        assert_send_sync::<ArcIter<'static>>();
    }
}
