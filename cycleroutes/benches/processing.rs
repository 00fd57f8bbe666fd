//! Benchmarks import + traitement sur des réseaux synthétiques

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::path::Path;

use cycleroutes::import::import_str;
use cycleroutes::{process_routes, Crs, ProcessOptions};

/// Génère une FeatureCollection de `count` lignes de 20 sommets en Écosse
fn synthetic_network(count: usize) -> String {
    let features: Vec<serde_json::Value> = (0..count)
        .map(|i| {
            let e0 = 250_000.0 + (i % 500) as f64 * 150.0;
            let n0 = 650_000.0 + (i / 500) as f64 * 150.0;
            let coords: Vec<[f64; 2]> = (0..20)
                .map(|k| [e0 + k as f64 * 7.5, n0 + (k % 3) as f64 * 4.0])
                .collect();
            serde_json::json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coords },
                "properties": {
                    "route_id": format!("R{}", i),
                    "street": "Bench Road",
                    "type": "Cycle Path",
                    "local_authority": "Fife"
                }
            })
        })
        .collect();

    serde_json::json!({ "type": "FeatureCollection", "features": features }).to_string()
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");

    for count in [1_000usize, 10_000] {
        let doc = synthetic_network(count);
        group.throughput(Throughput::Bytes(doc.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &doc, |b, doc| {
            b.iter(|| {
                let table =
                    import_str(black_box(doc), Path::new("bench.json"), Crs::BRITISH_NATIONAL_GRID)
                        .unwrap();
                black_box(table.len())
            })
        });
    }

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");
    group.sample_size(20);

    for count in [1_000usize, 10_000] {
        let doc = synthetic_network(count);
        let table =
            import_str(&doc, Path::new("bench.json"), Crs::BRITISH_NATIONAL_GRID).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &table, |b, table| {
            b.iter(|| {
                let out = process_routes(
                    black_box(table.clone()),
                    Path::new("bench.json"),
                    &ProcessOptions::default(),
                )
                .unwrap();
                black_box(out.len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_import, bench_process);
criterion_main!(benches);
