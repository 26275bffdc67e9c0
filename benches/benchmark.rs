// Ranking benchmarks over random catalogs
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use courserec::{Catalog, CourseRecord, DuplicatePolicy, RankingConfig, RecommendationRequest, Recommender};
use courserec_core::{EmbeddingMatrix, FeatureStore};
use courserec_storage::{build_overlap, build_weighted_overlap};
use rand::prelude::*;
use std::sync::Arc;

const DIM: usize = 384;
const KEYWORDS: usize = 400;

fn generate_catalog(size: usize, rng: &mut impl Rng) -> Catalog {
    let records = (0..size).map(|i| {
        let mut record = CourseRecord::new(format!("C{:05}", i), format!("Course number {}", i));
        record.faculty = Some(format!("F{}", rng.random_range(0..8)));
        record.department = Some(format!("D{}", rng.random_range(0..40)));
        record.teachers = Some(format!("T{}-T{}", rng.random_range(0..300), rng.random_range(0..300)));
        record.keywords = (0..rng.random_range(3..12))
            .map(|_| format!("kw{}", rng.random_range(0..KEYWORDS)))
            .collect();
        record
    });
    Catalog::from_records(records, DuplicatePolicy::FirstWins).unwrap()
}

fn generate_recommender(size: usize) -> Recommender {
    let mut rng = rand::rng();
    let catalog = generate_catalog(size, &mut rng);
    let rows = (0..size)
        .map(|_| (0..DIM).map(|_| rng.random_range(-1.0f32..1.0f32)).collect())
        .collect();
    let embeddings = EmbeddingMatrix::from_rows(rows).unwrap();
    let overlap = build_overlap(&catalog);
    let features = FeatureStore::new(catalog.len(), embeddings, overlap)
        .unwrap()
        .with_weighted_overlap(build_weighted_overlap(&catalog))
        .unwrap();
    Recommender::new(Arc::new(catalog), Arc::new(features), RankingConfig::default()).unwrap()
}

fn random_request(size: usize, strategy: &str) -> RecommendationRequest {
    let mut rng = rand::rng();
    let liked = (0..5).map(|_| format!("C{:05}", rng.random_range(0..size))).collect();
    let mut request = RecommendationRequest::new(liked, 20, strategy);
    request.disliked = (0..2).map(|_| format!("C{:05}", rng.random_range(0..size))).collect();
    request.params.seed = Some(42);
    request
}

fn benchmark_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("recommend");

    for size in [1_000, 5_000].iter() {
        let recommender = generate_recommender(*size);
        for &name in recommender.strategies() {
            let request = random_request(*size, name);
            group.bench_with_input(BenchmarkId::new(name, size), &request, |b, request| {
                b.iter(|| black_box(recommender.recommend(request).unwrap().len()));
            });
        }
    }

    group.finish();
}

fn benchmark_overlap_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("overlap_build");

    for size in [1_000, 5_000].iter() {
        let catalog = generate_catalog(*size, &mut rand::rng());
        group.bench_with_input(BenchmarkId::from_parameter(size), &catalog, |b, catalog| {
            b.iter(|| black_box(build_overlap(catalog).nnz()));
        });
    }

    group.finish();
}

fn benchmark_cosine(c: &mut Criterion) {
    let mut rng = rand::rng();
    let a: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();
    let b: Vec<f32> = (0..DIM).map(|_| rng.random_range(-1.0f32..1.0f32)).collect();

    c.bench_function("cosine_384", |bench| {
        bench.iter(|| courserec_similarity::distance::cosine(black_box(&a), black_box(&b)))
    });
}

criterion_group!(benches, benchmark_strategies, benchmark_overlap_build, benchmark_cosine);
criterion_main!(benches);
