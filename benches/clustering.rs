use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use tabclust::cluster::{ElbowSelector, HierarchicalClustering, Kmeans, Linkage};
use tabclust::{DistanceMetric, FeatureMatrix};

fn synthetic(n: usize, d: usize) -> FeatureMatrix {
    let mut rng = StdRng::seed_from_u64(42);
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| (0..d).map(|_| rng.random::<f64>()).collect())
        .collect();
    FeatureMatrix::from_rows(&rows).unwrap()
}

fn bench_kmeans(c: &mut Criterion) {
    let mut group = c.benchmark_group("kmeans");
    let data = synthetic(1000, 16);

    group.bench_function("fit_n1000_d16_k10", |b| {
        b.iter(|| {
            Kmeans::new(10)
                .with_max_iter(10)
                .with_seed(42)
                .fit(black_box(&data))
                .unwrap()
        })
    });

    group.bench_function("elbow_n1000_d16_k1to10", |b| {
        let ks: Vec<usize> = (1..=10).collect();
        b.iter(|| {
            ElbowSelector::new(DistanceMetric::Euclidean)
                .with_max_iter(10)
                .fit(black_box(&data), &ks)
                .unwrap()
        })
    });

    group.finish();
}

fn bench_hierarchical(c: &mut Criterion) {
    let mut group = c.benchmark_group("hierarchical");
    let data = synthetic(150, 2);

    for linkage in [Linkage::Single, Linkage::Average, Linkage::Ward] {
        group.bench_function(format!("{linkage}_n150"), |b| {
            b.iter(|| {
                HierarchicalClustering::new(4)
                    .with_linkage(linkage)
                    .fit(black_box(&data))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_kmeans, bench_hierarchical);
criterion_main!(benches);
