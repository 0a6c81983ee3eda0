//! Scheduler overhead benchmarks.
//!
//! Measures the per-frame bookkeeping cost, not pipeline work:
//! - **steady_state**: every level current, `sync_state` only re-checks the live level
//! - **inline_churn**: inputs change every frame, all levels run inline
//! - **background_cycle**: launch on the pool, then `finish_all`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lod_scheduler::{
  DataPipeline, LevelOfDetail, LodObject, LodScheduler, ObjectState, RenderPipeline,
};

// =============================================================================
// Synthetic object
// =============================================================================

/// Sums `0..input * weight` so each level has a little real work.
struct SumObject {
  levels: usize,
  synchronous: bool,
}

struct SumState {
  input: u64,
}

impl ObjectState for SumState {
  type App = u64;

  fn update(&mut self, app: &u64) {
    self.input = *app;
  }
}

#[derive(Default)]
struct SumResult {
  input: Option<u64>,
  sum: u64,
}

struct SumPipeline {
  weight: u64,
  synchronous: bool,
  input: u64,
  sum: u64,
}

impl DataPipeline<SumObject> for SumPipeline {
  fn configure(&mut self, state: &SumState, _app: &u64) {
    self.input = state.input;
  }

  fn needs_update(&self, result: &SumResult) -> bool {
    result.input != Some(self.input)
  }

  fn execute(&mut self) {
    self.sum = (0..self.input * self.weight).sum();
  }

  fn export_result(&self, result: &mut SumResult) {
    result.input = Some(self.input);
    result.sum = self.sum;
  }

  fn force_synchronous(&self) -> bool {
    self.synchronous
  }
}

impl LodObject for SumObject {
  type App = u64;
  type Context = ();
  type State = SumState;
  type Result = SumResult;

  fn create_state(&self, app: &u64) -> SumState {
    SumState { input: *app }
  }

  fn create_data_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn DataPipeline<Self>>> {
    // Defined levels are the cheapest `self.levels` ones.
    if level.index() + self.levels < LevelOfDetail::COUNT {
      return None;
    }
    Some(Box::new(SumPipeline {
      weight: (LevelOfDetail::COUNT - level.index()) as u64,
      synchronous: self.synchronous,
      input: 0,
      sum: 0,
    }))
  }

  fn create_render_pipeline(&self, _level: LevelOfDetail) -> Option<Box<dyn RenderPipeline<Self>>> {
    None
  }

  fn label(&self) -> &str {
    "sum"
  }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_steady_state(c: &mut Criterion) {
  let mut group = c.benchmark_group("steady_state");

  for levels in 1..=LevelOfDetail::COUNT {
    let object = SumObject {
      levels,
      synchronous: true,
    };
    let mut scheduler = LodScheduler::with_defaults(object, &64);
    scheduler.sync_state(&64);

    group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, _| {
      b.iter(|| black_box(scheduler.sync_state(black_box(&64))))
    });
  }

  group.finish();
}

fn bench_inline_churn(c: &mut Criterion) {
  let object = SumObject {
    levels: LevelOfDetail::COUNT,
    synchronous: true,
  };
  let mut scheduler = LodScheduler::with_defaults(object, &0);
  let mut input = 0u64;

  c.bench_function("inline_churn (3 levels)", |b| {
    b.iter(|| {
      input = (input + 1) % 64;
      black_box(scheduler.sync_state(&input))
    })
  });
}

fn bench_background_cycle(c: &mut Criterion) {
  let object = SumObject {
    levels: LevelOfDetail::COUNT,
    synchronous: false,
  };
  let mut scheduler = LodScheduler::with_defaults(object, &0);
  let mut input = 0u64;

  c.bench_function("background_cycle (3 levels)", |b| {
    b.iter(|| {
      input = (input + 1) % 64;
      scheduler.sync_state(&input);
      black_box(scheduler.finish_all())
    })
  });
}

criterion_group!(
  benches,
  bench_steady_state,
  bench_inline_churn,
  bench_background_cycle
);
criterion_main!(benches);
