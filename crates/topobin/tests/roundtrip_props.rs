use proptest::prelude::*;
use topobin::codec::read_header;
use topobin::{
    ErrorKind, Geometry, GeometryKind, Topology, TopologyView, Transform, decode_topology,
    encode_topology, is_compatible, peek_version,
};

fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

fn arb_geometry() -> impl Strategy<Value = Geometry> {
    prop_oneof![
        prop::collection::vec(-20i64..20, 0..6).prop_map(Geometry::line_string),
        prop::collection::vec(prop::collection::vec(-20i64..20, 1..5), 1..3)
            .prop_map(Geometry::polygon),
        (finite_f64(), finite_f64()).prop_map(|(x, y)| Geometry::point([x, y])),
        Just(Geometry::new(GeometryKind::Null)),
    ]
    .prop_flat_map(|geometry| {
        (
            Just(geometry),
            proptest::option::of(any::<i64>()),
            proptest::option::of("[a-z ]{0,12}"),
        )
    })
    .prop_map(|(geometry, id, label)| {
        let geometry = match id {
            Some(id) => geometry.with_id(id),
            None => geometry,
        };
        match label {
            Some(label) => geometry.with_property("label", label),
            None => geometry,
        }
    })
}

fn arb_objects() -> impl Strategy<Value = Vec<(String, Geometry)>> {
    prop::collection::btree_map("[a-zA-Z0-9_é]{0,10}", arb_geometry(), 0..5)
        .prop_map(|objects| objects.into_iter().collect())
}

fn arb_float_topology() -> impl Strategy<Value = Topology> {
    (
        prop::collection::vec(prop::collection::vec((finite_f64(), finite_f64()), 0..6), 0..8),
        arb_objects(),
        proptest::option::of((finite_f64(), finite_f64(), finite_f64(), finite_f64())),
    )
        .prop_map(|(arcs, objects, bbox)| Topology {
            arcs: arcs
                .into_iter()
                .map(|arc| arc.into_iter().map(|(x, y)| [x, y]).collect())
                .collect(),
            objects,
            transform: None,
            bbox: bbox.map(|(a, b, c, d)| [a, b, c, d]),
        })
}

fn arb_quantized_topology() -> impl Strategy<Value = Topology> {
    (
        prop::collection::vec(prop::collection::vec((any::<i32>(), any::<i32>()), 0..6), 0..8),
        arb_objects(),
        (finite_f64(), finite_f64(), finite_f64(), finite_f64()),
    )
        .prop_map(|(arcs, objects, (sx, sy, tx, ty))| Topology {
            arcs: arcs
                .into_iter()
                .map(|arc| arc.into_iter().map(|(x, y)| [x as f64, y as f64]).collect())
                .collect(),
            objects,
            transform: Some(Transform::new([sx, sy], [tx, ty])),
            bbox: None,
        })
}

fn assert_bit_exact(a: &Topology, b: &Topology) {
    assert_eq!(a.arcs.len(), b.arcs.len());
    for (arc_a, arc_b) in a.arcs.iter().zip(&b.arcs) {
        assert_eq!(arc_a.len(), arc_b.len());
        for (p, q) in arc_a.iter().zip(arc_b) {
            assert_eq!(p[0].to_bits(), q[0].to_bits());
            assert_eq!(p[1].to_bits(), q[1].to_bits());
        }
    }
}

proptest! {
    #[test]
    fn prop_float_roundtrip_is_lossless(topology in arb_float_topology()) {
        let buffer = encode_topology(&topology).unwrap();
        let decoded = decode_topology(&buffer).unwrap();

        assert_bit_exact(&topology, &decoded);
        prop_assert_eq!(&decoded.objects, &topology.objects);
        prop_assert_eq!(decoded.bbox, topology.bbox);
        prop_assert_eq!(decoded.transform, None);
    }

    #[test]
    fn prop_quantized_roundtrip_is_lossless(topology in arb_quantized_topology()) {
        let buffer = encode_topology(&topology).unwrap();
        let decoded = decode_topology(&buffer).unwrap();

        prop_assert_eq!(decoded, topology);
    }

    #[test]
    fn prop_offsets_are_monotonic(topology in arb_float_topology()) {
        let buffer = encode_topology(&topology).unwrap();
        let header = read_header(&buffer).unwrap();
        let table_len = header.string_table_len.div_ceil(4) * 4;
        let mut pos = 24 + if header.has_bbox() { 32 } else { 0 } + table_len;

        let mut prev = None;
        for _ in 0..=header.arc_count {
            let offset = u32::from_be_bytes([buffer[pos], buffer[pos + 1], buffer[pos + 2], buffer[pos + 3]]);
            match prev {
                None => {
                    prop_assert_eq!(offset, 0);
                }
                Some(prev) => {
                    prop_assert!(offset >= prev);
                }
            }
            prev = Some(offset);
            pos += 4;
        }
        prop_assert_eq!(prev, Some(topology.total_points() as u32));
    }

    #[test]
    fn prop_view_matches_decode(topology in arb_quantized_topology()) {
        let buffer = encode_topology(&topology).unwrap();
        let view = TopologyView::new(&buffer).unwrap();
        let decoded = decode_topology(&buffer).unwrap();

        prop_assert_eq!(view.arc_count(), decoded.arcs.len());
        for i in 0..view.arc_count() {
            prop_assert_eq!(&view.arc(i).unwrap(), &decoded.arcs[i]);
        }
        prop_assert!(view.arc(view.arc_count()).is_err());
        let names: Vec<&str> = view.names().collect();
        let expected: Vec<&str> = decoded.objects.iter().map(|(n, _)| n.as_str()).collect();
        prop_assert_eq!(names, expected);
    }

    #[test]
    fn prop_unsupported_versions_rejected(
        topology in arb_float_topology(),
        version in 2u16..,
    ) {
        let mut buffer = encode_topology(&topology).unwrap();
        buffer[4..6].copy_from_slice(&version.to_be_bytes());

        prop_assert_eq!(peek_version(&buffer), Some(version));
        prop_assert!(!is_compatible(&buffer));
        let err = decode_topology(&buffer).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Version);
        let err = TopologyView::new(&buffer).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Version);
    }

    #[test]
    fn prop_truncation_never_panics(topology in arb_quantized_topology(), cut in any::<prop::sample::Index>()) {
        let buffer = encode_topology(&topology).unwrap();
        let len = cut.index(buffer.len());

        let err = decode_topology(&buffer[..len]).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Format);
        if let Err(err) = TopologyView::new(&buffer[..len]) {
            prop_assert_eq!(err.kind(), ErrorKind::Format);
        }
    }
}
