//! Engine-agnostic scheduler statistics.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use lod_scheduler::metrics::COLLECT_METRICS;
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let metrics = scheduler.metrics();
//! println!("hi-res avg {:.1}us", metrics.avg_execute_us(LevelOfDetail::HiRes));
//! ```

use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;

use crate::level::LevelOfDetail;

/// Runtime toggle for metrics collection.
/// Set to false to disable metrics gathering at runtime.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
  #[cfg(feature = "metrics")]
  {
    COLLECT_METRICS.load(Ordering::Relaxed)
  }
  #[cfg(not(feature = "metrics"))]
  {
    false
  }
}

/// Last `capacity` execute durations with a running sum.
#[derive(Debug, Clone)]
pub struct TimingWindow {
  samples: VecDeque<u64>,
  capacity: usize,
  sum: u64,
}

impl TimingWindow {
  pub fn new(capacity: usize) -> Self {
    Self {
      samples: VecDeque::with_capacity(capacity),
      capacity: capacity.max(1),
      sum: 0,
    }
  }

  /// Record a duration, evicting the oldest once full.
  pub fn push(&mut self, execute_us: u64) {
    if self.samples.len() == self.capacity {
      if let Some(oldest) = self.samples.pop_front() {
        self.sum -= oldest;
      }
    }
    self.samples.push_back(execute_us);
    self.sum += execute_us;
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn clear(&mut self) {
    self.samples.clear();
    self.sum = 0;
  }

  /// Mean of the held samples, 0 when empty.
  pub fn average(&self) -> f64 {
    if self.samples.is_empty() {
      0.0
    } else {
      self.sum as f64 / self.samples.len() as f64
    }
  }
}

impl Default for TimingWindow {
  fn default() -> Self {
    Self::new(64)
  }
}

/// Per-object scheduler statistics, indexed by level.
#[derive(Debug, Clone)]
pub struct SchedulerMetrics {
  /// Recent `execute` durations in microseconds (worker or inline).
  pub execute_timings: [TimingWindow; LevelOfDetail::COUNT],
  /// Background launches.
  pub launches: [u64; LevelOfDetail::COUNT],
  /// Inline (forced synchronous) runs.
  pub inline_runs: [u64; LevelOfDetail::COUNT],
  /// Background completions swept.
  pub completions: [u64; LevelOfDetail::COUNT],
  /// UpToDate -> OutOfDate demotions.
  pub demotions: [u64; LevelOfDetail::COUNT],
  /// Launches held back by the launch policy.
  pub deferrals: u64,
  /// `sync_state` calls.
  pub frames: u64,
}

impl Default for SchedulerMetrics {
  fn default() -> Self {
    Self {
      execute_timings: std::array::from_fn(|_| TimingWindow::default()),
      launches: [0; LevelOfDetail::COUNT],
      inline_runs: [0; LevelOfDetail::COUNT],
      completions: [0; LevelOfDetail::COUNT],
      demotions: [0; LevelOfDetail::COUNT],
      deferrals: 0,
      frames: 0,
    }
  }
}

impl SchedulerMetrics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Reset everything except the frame counter.
  pub fn reset(&mut self) {
    for window in &mut self.execute_timings {
      window.clear();
    }
    self.launches.fill(0);
    self.inline_runs.fill(0);
    self.completions.fill(0);
    self.demotions.fill(0);
    self.deferrals = 0;
  }

  pub fn record_frame(&mut self) {
    if is_enabled() {
      self.frames += 1;
    }
  }

  pub fn record_launch(&mut self, level: LevelOfDetail) {
    if is_enabled() {
      self.launches[level.index()] += 1;
    }
  }

  pub fn record_inline(&mut self, level: LevelOfDetail, execute_us: u64) {
    if is_enabled() {
      self.inline_runs[level.index()] += 1;
      self.execute_timings[level.index()].push(execute_us);
    }
  }

  pub fn record_completion(&mut self, level: LevelOfDetail, execute_us: u64) {
    if is_enabled() {
      self.completions[level.index()] += 1;
      self.execute_timings[level.index()].push(execute_us);
    }
  }

  pub fn record_demotion(&mut self, level: LevelOfDetail) {
    if is_enabled() {
      self.demotions[level.index()] += 1;
    }
  }

  pub fn record_deferral(&mut self) {
    if is_enabled() {
      self.deferrals += 1;
    }
  }

  /// Average execute time for a level in microseconds.
  pub fn avg_execute_us(&self, level: LevelOfDetail) -> f64 {
    self.execute_timings[level.index()].average()
  }

  /// Total background launches across all levels.
  pub fn total_launches(&self) -> u64 {
    self.launches.iter().sum()
  }
}

#[cfg(all(test, feature = "metrics"))]
mod tests {
  use super::*;

  #[test]
  fn test_timing_window_evicts_oldest() {
    let mut window = TimingWindow::new(3);
    assert!(window.is_empty());
    assert_eq!(window.average(), 0.0);

    for us in [10, 20, 30] {
      window.push(us);
    }
    assert_eq!(window.average(), 20.0);

    window.push(40);
    assert_eq!(window.average(), 30.0);

    window.clear();
    assert!(window.is_empty());
    assert_eq!(window.average(), 0.0);
  }

  #[test]
  fn test_scheduler_metrics() {
    let mut metrics = SchedulerMetrics::new();

    metrics.record_launch(LevelOfDetail::HiRes);
    metrics.record_launch(LevelOfDetail::HiRes);
    metrics.record_completion(LevelOfDetail::HiRes, 3000);
    metrics.record_completion(LevelOfDetail::HiRes, 1000);
    metrics.record_inline(LevelOfDetail::Hint, 5);
    metrics.record_demotion(LevelOfDetail::HiRes);

    assert_eq!(metrics.total_launches(), 2);
    assert_eq!(metrics.completions[LevelOfDetail::HiRes.index()], 2);
    assert_eq!(metrics.avg_execute_us(LevelOfDetail::HiRes), 2000.0);
    assert_eq!(metrics.inline_runs[LevelOfDetail::Hint.index()], 1);
    assert_eq!(metrics.demotions[LevelOfDetail::HiRes.index()], 1);

    metrics.reset();
    assert_eq!(metrics.total_launches(), 0);
    assert_eq!(metrics.avg_execute_us(LevelOfDetail::HiRes), 0.0);
  }
}
