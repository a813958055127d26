//! Forward pass benchmarks
//!
//! Dense evaluation of a randomly initialized network at the default
//! hidden sizes, for sparse and dense bag-of-words inputs.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use synapse::inference::{ForwardEvaluator, WeightStore};

const VOCABULARY: usize = 100;
const INTENTS: usize = 5;

fn input_with_active(active: usize) -> Vec<f64> {
    (0..VOCABULARY)
        .map(|i| if i < active { 1.0 } else { 0.0 })
        .collect()
}

fn bench_forward_pass(c: &mut Criterion) {
    let store = WeightStore::random(&[VOCABULARY, 1500, 1500, INTENTS], Some(42))
        .expect("valid layer sizes");
    let network = store.network();
    let evaluator = ForwardEvaluator;

    let mut group = c.benchmark_group("forward_pass");
    for active in [1, 5, 25, VOCABULARY] {
        let input = input_with_active(active);
        group.bench_with_input(BenchmarkId::new("active_tokens", active), &input, |b, input| {
            b.iter(|| evaluator.evaluate(black_box(network), black_box(input)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_forward_pass);
criterion_main!(benches);
