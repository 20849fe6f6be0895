//! Benchmarks for the reference cache and the dependency walker.
//!
//! - Cache hits, the path every compilation after the first takes
//! - Walker resolution over a warm cache, sequential and parallel

extern crate metaref;

use criterion::{criterion_group, criterion_main, Criterion};
use metaref::{
    metadata::module::ModuleImage, DependencyWalker, MetadataBlob, ModuleRc, ReferenceCache,
    ResolverConfig, StaticRegistry,
};
use std::{hint::black_box, sync::Arc};

fn module(name: &str, dependencies: &[String]) -> ModuleRc {
    ModuleImage::builder()
        .name(name)
        .raw_metadata(MetadataBlob::new(vec![0_u8; 256]))
        .dependencies(dependencies.iter().map(String::as_str))
        .build()
        .unwrap()
        .into_rc()
}

/// A root declaring `width` dependencies, all registered.
fn fixture(width: usize) -> (ReferenceCache, ModuleRc) {
    let dependencies: Vec<String> = (0..width)
        .map(|i| format!("Dependency{i}, Version=1.0.0.0, Culture=neutral, PublicKeyToken=null"))
        .collect();
    let root = module("Script", &dependencies);

    let registry = StaticRegistry::new();
    registry.register(root.clone());
    for name in &dependencies {
        registry.register(module(name, &[]));
    }

    (ReferenceCache::new(Arc::new(registry)), root)
}

fn bench_cache_hit(c: &mut Criterion) {
    let (cache, root) = fixture(0);
    cache.get(root.as_ref()).unwrap();

    c.bench_function("cache_get_hit", |b| {
        b.iter(|| black_box(cache.get(black_box(root.as_ref())).unwrap()));
    });
}

fn bench_walker(c: &mut Criterion) {
    let mut group = c.benchmark_group("walker_resolve");

    for width in [8_usize, 64, 512] {
        let (cache, root) = fixture(width);
        let roots = [root];
        DependencyWalker::new(&cache).resolve(&roots).unwrap();

        group.bench_function(format!("sequential_{width}"), |b| {
            let walker = DependencyWalker::new(&cache);
            b.iter(|| black_box(walker.resolve(black_box(&roots)).unwrap()));
        });

        group.bench_function(format!("parallel_{width}"), |b| {
            let walker = DependencyWalker::with_config(&cache, ResolverConfig::parallel());
            b.iter(|| black_box(walker.resolve(black_box(&roots)).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cache_hit, bench_walker);
criterion_main!(benches);
