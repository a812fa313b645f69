//! Benchmark for topobin encoding using a TopoJSON file.
//!
//! Falls back to a synthetic quantized grid when no file is given.
//! Set `RUST_LOG=topobin=debug` to see codec events.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use topobin::{EncodeOptions, Geometry, Topology, TopologyView, Transform};
use tracing_subscriber::EnvFilter;

const ITERS: u32 = 10;

/// Builds a `size` × `size` grid of unit cells sharing their edges.
fn synthetic_grid(size: usize) -> Topology {
    let mut topology = Topology::new();
    topology.transform = Some(Transform::new([0.01, 0.01], [0.0, 0.0]));
    topology.bbox = Some([0.0, 0.0, size as f64, size as f64]);

    let step = 100.0;
    let mut horizontal = vec![vec![0i64; size]; size + 1];
    let mut vertical = vec![vec![0i64; size + 1]; size];
    for (r, row) in horizontal.iter_mut().enumerate() {
        for (c, slot) in row.iter_mut().enumerate() {
            let y = r as f64 * step;
            let x = c as f64 * step;
            *slot = topology.push_arc(vec![[x, y], [x + step / 2.0, y], [x + step, y]]) as i64;
        }
    }
    for (r, row) in vertical.iter_mut().enumerate() {
        for (c, slot) in row.iter_mut().enumerate() {
            let y = r as f64 * step;
            let x = c as f64 * step;
            *slot = topology.push_arc(vec![[x, y], [x, y + step]]) as i64;
        }
    }

    let mut cells = Vec::with_capacity(size * size);
    for r in 0..size {
        for c in 0..size {
            let ring = vec![
                horizontal[r][c],
                vertical[r][c + 1],
                !horizontal[r + 1][c],
                !vertical[r][c],
            ];
            cells.push(
                Geometry::polygon(vec![ring])
                    .with_id((r * size + c) as i64)
                    .with_property("row", r)
                    .with_property("col", c),
            );
        }
    }
    topology.push_object("cells", Geometry::collection(cells));
    topology
}

fn throughput(bytes: usize, elapsed: Duration) -> f64 {
    (bytes as f64 / 1_000_000.0) / elapsed.as_secs_f64()
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let data_path = std::env::args().nth(1);

    let load_start = Instant::now();
    let (topology, json_len) = match &data_path {
        Some(path) => {
            println!("Loading topology from: {}", path);
            let json_data = fs::read_to_string(path).expect("Failed to read topology file");
            let topology: Topology =
                serde_json::from_str(&json_data).expect("Failed to parse TopoJSON");
            (topology, json_data.len())
        }
        None => {
            println!("No input file, using a 200x200 synthetic grid");
            let topology = synthetic_grid(200);
            let json_len = serde_json::to_vec(&topology)
                .expect("Failed to serialize TopoJSON")
                .len();
            (topology, json_len)
        }
    };
    let load_time = load_start.elapsed();

    println!(
        "Loaded {} arcs ({} points), {} objects in {:?}",
        topology.arcs.len(),
        topology.total_points(),
        topology.objects.len(),
        load_time
    );
    println!("  Quantized: {}", topology.is_quantized());

    // Benchmark encoding (validating)
    let encode_start = Instant::now();
    let encoded = topobin::encode_topology(&topology).expect("Failed to encode");
    let encode_time = encode_start.elapsed();

    println!("\nEncode: {} bytes in {:?}", encoded.len(), encode_time);
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), encode_time));

    // Benchmark encoding (unchecked)
    let unchecked_start = Instant::now();
    let unchecked = topobin::encode_topology_with_options(&topology, EncodeOptions::unchecked())
        .expect("Failed to encode unchecked");
    let unchecked_time = unchecked_start.elapsed();

    println!("\nEncode (unchecked): {} bytes in {:?}", unchecked.len(), unchecked_time);
    println!(
        "  Validation overhead: {:.1}%",
        100.0 * (encode_time.as_secs_f64() - unchecked_time.as_secs_f64())
            / encode_time.as_secs_f64()
    );
    assert_eq!(encoded, unchecked, "Validation must not change the output");

    // Benchmark compression
    let compress_start = Instant::now();
    let compressed = topobin::compress(&encoded, 3).expect("Failed to compress");
    let compress_time = compress_start.elapsed();

    println!("\nCompressed (level 3): {} bytes in {:?}", compressed.len(), compress_time);
    println!(
        "  Compression ratio: {:.1}x",
        encoded.len() as f64 / compressed.len() as f64
    );

    // Benchmark full decode
    for _ in 0..3 {
        let _ = topobin::decode_topology(&encoded).expect("Failed to decode");
    }

    let decode_start = Instant::now();
    let mut decoded = None;
    for _ in 0..ITERS {
        decoded = Some(topobin::decode_topology(&encoded).expect("Failed to decode"));
    }
    let decode_time = decode_start.elapsed() / ITERS;

    println!("\nDecode: {:?} (avg of {} iterations)", decode_time, ITERS);
    println!("  Throughput: {:.2} MB/s", throughput(encoded.len(), decode_time));
    if let Some(decoded) = decoded {
        assert_eq!(decoded, topology, "Round-trip must be lossless");
    }

    // Benchmark decompress + view
    let view_start = Instant::now();
    for _ in 0..ITERS {
        let buffer = topobin::decompress(&compressed).expect("Failed to decompress");
        let view = TopologyView::new(&buffer).expect("Failed to open view");
        assert_eq!(view.arc_count(), topology.arcs.len());
    }
    let view_time = view_start.elapsed() / ITERS;

    println!("\nDecompress + open view: {:?} (avg of {} iterations)", view_time, ITERS);

    // Benchmark random arc access through the view
    let view = TopologyView::new(&encoded).expect("Failed to open view");
    let arc_count = view.arc_count();
    let access_start = Instant::now();
    let mut points = 0usize;
    if arc_count > 0 {
        for i in 0..10_000usize {
            let index = i.wrapping_mul(7919) % arc_count;
            points += view.arc(index).expect("Index in range").len();
        }
    }
    let access_time = access_start.elapsed();

    println!(
        "\nView: 10000 random arcs ({} points) in {:?}",
        points, access_time
    );

    let iter_start = Instant::now();
    let streamed: usize = view.arcs().map(|arc| arc.len()).sum();
    let iter_time = iter_start.elapsed();
    assert_eq!(streamed, topology.total_points());
    println!("View: full arc scan in {:?}", iter_time);

    // Write output files
    if let Some(path) = &data_path {
        let input_path = Path::new(path);
        let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
        let parent = input_path.parent().unwrap_or(Path::new("."));

        let output_uncompressed = parent.join(format!("{}.topobin", stem));
        let output_compressed = parent.join(format!("{}.topobin.zst", stem));

        fs::write(&output_uncompressed, &encoded).expect("Failed to write .topobin file");
        fs::write(&output_compressed, &compressed).expect("Failed to write .topobin.zst file");

        println!("\n=== Output Files ===");
        println!("Uncompressed: {}", output_uncompressed.display());
        println!("Compressed:   {}", output_compressed.display());
    }

    // Summary
    println!("\n=== Summary ===");
    println!(
        "JSON size: {} bytes ({:.1} MB)",
        json_len,
        json_len as f64 / 1_000_000.0
    );
    println!(
        "topobin: {} bytes ({:.1} MB)",
        encoded.len(),
        encoded.len() as f64 / 1_000_000.0
    );
    println!(
        "topobin + zstd: {} bytes ({:.1} MB)",
        compressed.len(),
        compressed.len() as f64 / 1_000_000.0
    );
    println!(
        "Size vs JSON: {:.1}% (uncompressed), {:.1}% (compressed)",
        100.0 * encoded.len() as f64 / json_len as f64,
        100.0 * compressed.len() as f64 / json_len as f64
    );
}
