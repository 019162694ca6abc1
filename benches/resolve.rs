//! Benchmarks for include resolution.
//!
//! These benchmarks resolve include trees held in a `MemoryFS`, with and
//! without a cache directory, to separate directive processing from cache
//! hits.

use std::path::PathBuf;
use std::sync::Arc;

use asset_cache::config::Settings;
use asset_cache::directive::DirectiveParser;
use asset_cache::factory::AssetFactory;
use asset_cache::filesystem::MemoryFS;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A chain `main.js -> part0.js -> part1.js -> ...` of `depth` files.
fn create_chain(depth: usize) -> MemoryFS {
    let fs = MemoryFS::new();
    let mut main = String::new();
    for i in 0..depth {
        main.push_str(&format!("/*# include: part{}.js */\n", i));
        let body = format!("// part {}\nfunction part{}() {{\n    return {};\n}}\n", i, i, i);
        fs.add_file_string(format!("/site/part{}.js", i), &body).unwrap();
    }
    main.push_str("main();\n");
    fs.add_file_string("/site/main.js", &main).unwrap();
    fs
}

fn bench_resolve_uncached(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_uncached");

    for depth in [1, 10, 50] {
        let fs = Arc::new(create_chain(depth));
        let factory = AssetFactory::with_filesystem(Settings::new("/site", None), fs).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let mut asset = factory.resolve(black_box("/site/main.js")).unwrap();
                black_box(asset.content().unwrap().len())
            });
        });
    }

    group.finish();
}

fn bench_resolve_cached(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_cached");

    for depth in [1, 10, 50] {
        let fs = Arc::new(create_chain(depth));
        let settings = Settings::new("/site", Some(PathBuf::from("/tmp/cache")));
        let factory = AssetFactory::with_filesystem(settings, fs).unwrap();
        factory.resolve("/site/main.js").unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let asset = factory.resolve(black_box("/site/main.js")).unwrap();
                black_box(asset.is_from_cache())
            });
        });
    }

    group.finish();
}

fn bench_directive_scan(c: &mut Criterion) {
    let parser = DirectiveParser::new().unwrap();
    let text: String = (0..1000)
        .map(|i| {
            if i % 10 == 0 {
                format!("/*# include: file{}.js */\n", i)
            } else {
                format!("var v{} = {};\n", i, i)
            }
        })
        .collect();

    c.bench_function("directive_scan_1000_lines", |b| {
        b.iter(|| parser.scan(black_box(&text)).count())
    });
}

criterion_group!(
    benches,
    bench_resolve_uncached,
    bench_resolve_cached,
    bench_directive_scan
);
criterion_main!(benches);
