use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use rand::rngs::StdRng;
use rand::SeedableRng;

use micrograd::nn::{Mlp, Module};
use micrograd::Tape;

// =============================================================================
// ENGINE BENCHMARKS
// =============================================================================

fn forward_chain(c: &mut Criterion) {
  let mut group = c.benchmark_group("engine/forward_chain");

  for chain_len in [10, 50, 100, 500, 1000] {
    group.throughput(Throughput::Elements(chain_len as u64));
    group.bench_with_input(
      BenchmarkId::from_parameter(chain_len),
      &chain_len,
      |b, &len| {
        let mut tape = Tape::new();
        b.iter(|| {
          tape.clear();
          let x = tape.var(black_box(0.5));
          let mut y = x;
          for _ in 0..len {
            y = (y * x + 0.1).relu();
          }
          black_box(y.value())
        });
      },
    );
  }
  group.finish();
}

fn backward_chain(c: &mut Criterion) {
  let mut group = c.benchmark_group("engine/backward_chain");

  for chain_len in [10, 50, 100, 500, 1000] {
    group.throughput(Throughput::Elements(chain_len as u64));
    group.bench_with_input(
      BenchmarkId::from_parameter(chain_len),
      &chain_len,
      |b, &len| {
        let mut tape = Tape::new();
        b.iter(|| {
          tape.clear();
          let x = tape.var(black_box(0.5));
          let mut y = x;
          for _ in 0..len {
            y = (y * x + 0.1).relu();
          }
          y.backward();
          black_box(x.grad())
        });
      },
    );
  }
  group.finish();
}

// =============================================================================
// TRAVERSAL BENCHMARKS
// =============================================================================

fn bench_topological_sort(c: &mut Criterion) {
  let mut group = c.benchmark_group("internals/topo_sort");

  for graph_size in [50, 100, 500, 1000] {
    group.bench_with_input(
      BenchmarkId::from_parameter(graph_size),
      &graph_size,
      |b, &size| {
        let tape = Tape::new();
        let x = tape.var(1.0);
        let mut result = x;
        for _ in 0..size {
          result = result * result + 0.001;
        }
        b.iter(|| black_box(result.topological_order().len()));
      },
    );
  }
  group.finish();
}

fn bench_gradient_accumulation(c: &mut Criterion) {
  let mut group = c.benchmark_group("internals/grad_accumulation");

  // many paths converge on the same leaf
  for fan_in in [4, 64, 1024] {
    group.bench_with_input(BenchmarkId::new("diamond", fan_in), &fan_in, |b, &n| {
      let mut tape = Tape::new();
      b.iter(|| {
        tape.clear();
        let x = tape.var(black_box(1.0));
        let mut result = x * 2.0;
        for k in 1..n {
          result = result + x * (k as f64);
        }
        result.backward();
        black_box(x.grad())
      });
    });
  }
  group.finish();
}

// =============================================================================
// NETWORK BENCHMARKS
// =============================================================================

fn mlp_forward(c: &mut Criterion) {
  let mut group = c.benchmark_group("nn/mlp_forward");

  for width in [4, 16, 32] {
    group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &w| {
      let mut rng = StdRng::seed_from_u64(7);
      b.iter(|| {
        // the network borrows its tape, so each iteration gets a fresh one
        let tape = Tape::new();
        let mlp = Mlp::new(&tape, 3, &[w, w, 1], &mut rng);
        let out = mlp.forward_values(black_box(&[1.0, -2.0, 3.0]));
        black_box(out.map(|o| o[0].value()).unwrap_or_default())
      });
    });
  }
  group.finish();
}

fn mlp_backward(c: &mut Criterion) {
  let mut group = c.benchmark_group("nn/mlp_backward");

  for width in [4, 16, 32] {
    group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &w| {
      let mut rng = StdRng::seed_from_u64(7);
      b.iter(|| {
        let tape = Tape::new();
        let mlp = Mlp::new(&tape, 3, &[w, w, 1], &mut rng);
        if let Ok(out) = mlp.forward_values(black_box(&[1.0, -2.0, 3.0])) {
          out[0].backward();
        }
        let grad = mlp.parameters()[0].grad();
        mlp.zero_grad();
        black_box(grad)
      });
    });
  }
  group.finish();
}

criterion_group!(
  name = benches;
  config = Criterion::default().measurement_time(Duration::from_secs(10));
  targets =
    forward_chain,
    backward_chain,
    bench_topological_sort,
    bench_gradient_accumulation,
    mlp_forward,
    mlp_backward,
);

criterion_main!(benches);
