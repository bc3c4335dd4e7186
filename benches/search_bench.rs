use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use lumen::{Document, IndexConfig, IndexHandle, WriteMode};

const WORDS: &[&str] = &[
    "rust", "programming", "language", "systems", "search", "engine", "index", "query", "segment",
    "posting", "phrase", "prefix", "memory", "safety", "performance", "concurrency",
];

struct BenchEnv {
    _tmp: TempDir,
    index: IndexHandle,
}

fn make_content(i: usize) -> String {
    (0..12)
        .map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn make_docs(start: usize, count: usize) -> Vec<Document> {
    (start..start + count)
        .map(|i| Document::new(format!("doc-{i}"), make_content(i)))
        .collect()
}

fn build_env(doc_count: usize) -> BenchEnv {
    let tmp = TempDir::new().unwrap();
    let config = IndexConfig::default().with_sync_on_commit(false);
    let index = IndexHandle::open(tmp.path(), "bench", config).unwrap();

    for start in (0..doc_count).step_by(1_000) {
        let count = 1_000.min(doc_count - start);
        index.write(&make_docs(start, count), WriteMode::Append).unwrap();
    }

    BenchEnv { _tmp: tmp, index }
}

fn bench_search(c: &mut Criterion) {
    let counts = [1_000usize, 5_000, 10_000];
    let envs: Vec<(usize, BenchEnv)> = counts.iter().map(|&count| (count, build_env(count))).collect();

    let queries = [
        ("term", "rust"),
        ("bool", "rust AND (search OR index) -memory"),
        ("phrase", "\"search engine\"~2"),
        ("prefix", "pro*"),
    ];

    for (name, query) in queries {
        let mut group = c.benchmark_group(format!("search_{name}"));
        for (count, env) in envs.iter() {
            group.bench_with_input(BenchmarkId::from_parameter(count), env, |b, env| {
                b.iter(|| {
                    black_box(env.index.search(query, 10).unwrap());
                });
            });
        }
        group.finish();
    }
}

fn bench_write_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_batch");
    for &batch in &[100usize, 1_000] {
        let docs = make_docs(0, batch);
        group.bench_with_input(BenchmarkId::from_parameter(batch), &docs, |b, docs| {
            let tmp = TempDir::new().unwrap();
            let config = IndexConfig::default().with_sync_on_commit(false);
            let index = IndexHandle::open(tmp.path(), "bench", config).unwrap();
            b.iter(|| {
                black_box(index.write(docs, WriteMode::Recreate).unwrap());
            });
        });
    }
    group.finish();
}

fn bench_similarity(c: &mut Criterion) {
    let a = make_content(1).repeat(4);
    let b = make_content(2).repeat(4);
    c.bench_function("similarity", |bench| {
        bench.iter(|| black_box(lumen::similarity(&a, &b)));
    });
}

criterion_group!(benches, bench_search, bench_write_batch, bench_similarity);
criterion_main!(benches);
