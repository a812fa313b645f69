//! Simple inspector for topobin files.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;

use topobin::{Geometry, GeometryKind, TopologyView};

fn format_arc(arc: &[[f64; 2]]) -> String {
    let preview: Vec<String> = arc
        .iter()
        .take(4)
        .map(|p| format!("({}, {})", p[0], p[1]))
        .collect();
    if arc.len() > 4 {
        format!("[{}, ... {} more]", preview.join(", "), arc.len() - 4)
    } else {
        format!("[{}]", preview.join(", "))
    }
}

fn count_kinds(geometry: &Geometry, counts: &mut BTreeMap<&'static str, usize>) {
    *counts.entry(geometry.kind.type_name().unwrap_or("null")).or_default() += 1;
    if let GeometryKind::GeometryCollection { geometries } = &geometry.kind {
        for child in geometries {
            count_kinds(child, counts);
        }
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "world.topobin".to_string());

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let buffer: Cow<'_, [u8]> = if topobin::codec::is_compressed(&data) {
        let buffer = topobin::decompress(&data).expect("Failed to decompress");
        println!("Envelope: zstd, {} bytes uncompressed", buffer.len());
        Cow::Owned(buffer)
    } else {
        Cow::Borrowed(&data[..])
    };

    match topobin::peek_version(&buffer) {
        Some(version) if topobin::is_compatible(&buffer) => println!("Version: {}", version),
        Some(version) => {
            println!("Version {} is not supported by this build", version);
            return;
        }
        None => {
            println!("Not a topobin buffer");
            return;
        }
    }

    let view = TopologyView::new(&buffer).expect("Failed to open view");

    println!("\n=== Topology ===");
    println!("Arcs: {}", view.arc_count());
    println!("Points: {}", view.total_points());
    println!("Quantized: {}", view.is_quantized());
    if let Some(t) = view.transform() {
        println!("  scale: {:?}, translate: {:?}", t.scale, t.translate);
    }
    if let Some(bbox) = view.bbox() {
        println!("BBox: {:?}", bbox);
    }

    println!("\n=== First 10 Arcs ===");
    for (i, arc) in view.arcs().take(10).enumerate() {
        println!("[{}] {} points {}", i, arc.len(), format_arc(&arc));
    }

    println!("\n=== Objects ({}) ===", view.object_count());
    let objects = view.objects().expect("Failed to parse objects");
    for (name, geometry) in &objects {
        let mut counts = BTreeMap::new();
        count_kinds(geometry, &mut counts);
        let summary: Vec<String> = counts
            .iter()
            .map(|(kind, n)| format!("{} {}", n, kind))
            .collect();
        println!("  {:?}: {}", name, summary.join(", "));
    }
}
