use criterion::{criterion_group, BenchmarkId, Criterion};
use rand::prelude::StdRng;
use rand::{Rng, SeedableRng};
use ldars::{Document, FitOptions, Model, ModelOptions, MonitoringCallback};
use ldars::state::GlobalState;

fn corpus(n_docs: usize, voc_size: usize) -> Vec<Document> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..n_docs)
        .map(|i| {
            let mut words: Vec<usize> = (0..50).map(|_| rng.gen_range(0..voc_size)).collect();
            words.sort_unstable();
            words.dedup();
            let counts = words.iter().map(|_| rng.gen_range(1..4)).collect();
            Document::new(i as i64, words, counts)
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let documents = corpus(1000, 1000);
    let mut group = c.benchmark_group("fit_10_iters");
    group.sample_size(10);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |bh, &workers| {
            bh.iter(|| {
                let mut model = Model::from_options(ModelOptions::default(1000, 20));
                let fit_options = FitOptions { iters: 10, workers, ..FitOptions::default() };
                model.fit(documents.clone(), &fit_options, None::<MonitoringCallback<GlobalState>>).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(model, bench_fit);
