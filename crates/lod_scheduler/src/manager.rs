//! Per-level bookkeeping.
//!
//! ```text
//!   Invalid (no pipeline, terminal)
//!
//!   OutOfDate ──launch──► Updating ──completion sweep──► UpToDate
//!       ▲  ▲                                                │
//!       │  └────────────── demote (needs_update) ───────────┘
//!       └──── run_inline / mark_up_to_date ────► UpToDate
//! ```
//!
//! While a level is `Updating` its data pipeline lives inside the background
//! task and comes back through the task's return value, so nothing on the
//! scheduler thread can reconfigure it mid-flight.

use std::fmt;
use std::panic;
use std::sync::Arc;

use tracing::{debug, error, info_span};
use web_time::Instant;

use crate::level::LevelOfDetail;
use crate::pipeline::{DataPipeline, LodObject};
use crate::progress::{ProgressHandle, ProgressSink};
use crate::threading::{panic_message, TaskExecutor, TaskHandle};

/// Readiness of one level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LodStatus {
  /// No pipeline for this level, or its `execute` panicked.
  Invalid,
  /// Result missing or stale.
  OutOfDate,
  /// A background task is computing a new result.
  Updating,
  /// Result matches the pipeline's current inputs.
  UpToDate,
}

/// What a background task hands back to the scheduler thread.
struct Finished<O: LodObject> {
  pipeline: Box<dyn DataPipeline<O>>,
  execute_us: u64,
}

/// Task and progress handle of an updating level. Both exist or neither does.
struct InFlight<O: LodObject> {
  task: TaskHandle<Finished<O>>,
  progress: ProgressHandle,
}

/// Bookkeeping for one level of one object.
pub struct LodManager<O: LodObject> {
  level: LevelOfDetail,
  status: LodStatus,
  /// Present unless the level is `Invalid` or `Updating`.
  pipeline: Option<Box<dyn DataPipeline<O>>>,
  result: O::Result,
  in_flight: Option<InFlight<O>>,
  progress_sink: Arc<dyn ProgressSink>,
}

impl<O: LodObject> LodManager<O> {
  /// Create the manager; a missing pipeline makes the level permanently `Invalid`.
  pub fn new(
    level: LevelOfDetail,
    pipeline: Option<Box<dyn DataPipeline<O>>>,
    progress_sink: Arc<dyn ProgressSink>,
  ) -> Self {
    let status = if pipeline.is_some() {
      LodStatus::OutOfDate
    } else {
      LodStatus::Invalid
    };

    Self {
      level,
      status,
      pipeline,
      result: O::Result::default(),
      in_flight: None,
      progress_sink,
    }
  }

  pub fn level(&self) -> LevelOfDetail {
    self.level
  }

  pub fn status(&self) -> LodStatus {
    self.status
  }

  pub fn is_defined(&self) -> bool {
    self.status != LodStatus::Invalid
  }

  pub fn is_updating(&self) -> bool {
    self.status == LodStatus::Updating
  }

  /// Last exported result. Only meaningful once the level has been `UpToDate`.
  pub fn result(&self) -> &O::Result {
    &self.result
  }

  /// Whether the pipeline wants to run on the scheduler thread.
  pub fn forces_synchronous(&self) -> bool {
    self
      .pipeline
      .as_ref()
      .is_some_and(|pipeline| pipeline.force_synchronous())
  }

  /// Reconfigure from the current object state and ask whether the result is stale.
  ///
  /// Must not be called while `Updating` or on an `Invalid` level.
  pub fn refresh(&mut self, state: &O::State, app: &O::App) -> bool {
    let Some(pipeline) = self.pipeline.as_mut() else {
      missing_pipeline("refresh", self.level, self.status);
    };
    pipeline.configure(state, app);
    pipeline.needs_update(&self.result)
  }

  /// UpToDate -> OutOfDate.
  pub fn demote(&mut self) {
    debug_assert_eq!(self.status, LodStatus::UpToDate);
    debug!(level = %self.level, "result stale, demoting");
    self.status = LodStatus::OutOfDate;
  }

  /// OutOfDate -> UpToDate without running: the pipeline reported nothing to do.
  pub fn mark_up_to_date(&mut self) {
    debug_assert_eq!(self.status, LodStatus::OutOfDate);
    debug!(level = %self.level, "no update needed");
    self.status = LodStatus::UpToDate;
  }

  /// Execute and export on the calling thread. Returns execute time in microseconds.
  pub fn run_inline(&mut self) -> u64 {
    assert_eq!(
      self.status,
      LodStatus::OutOfDate,
      "inline run of {} level in state {:?}",
      self.level,
      self.status
    );

    let level = self.level;
    let Some(pipeline) = self.pipeline.as_mut() else {
      missing_pipeline("run_inline", level, self.status);
    };

    let start = Instant::now();
    {
      let _span = info_span!("lod_execute", %level, inline = true).entered();
      pipeline.execute();
    }
    let execute_us = start.elapsed().as_micros() as u64;

    pipeline.export_result(&mut self.result);
    self.status = LodStatus::UpToDate;
    debug!(%level, execute_us, "inline update complete");
    self.check_invariants();
    execute_us
  }

  /// Move the pipeline onto a worker and mark the level `Updating`.
  pub fn launch(&mut self, executor: &TaskExecutor, label: &str) {
    assert_ne!(
      self.status,
      LodStatus::Updating,
      "{} level launched while a task is already in flight",
      self.level
    );
    assert_eq!(self.status, LodStatus::OutOfDate);

    let level = self.level;
    let Some(mut pipeline) = self.pipeline.take() else {
      unreachable!("out-of-date {level} level has no pipeline");
    };

    let task = executor.spawn(move || {
      let _span = info_span!("lod_execute", %level, inline = false).entered();
      let start = Instant::now();
      pipeline.execute();
      Finished {
        pipeline,
        execute_us: start.elapsed().as_micros() as u64,
      }
    });
    let progress = self.progress_sink.begin(label);

    debug!(%level, task = task.id().raw(), "launched background update");
    self.in_flight = Some(InFlight { task, progress });
    self.status = LodStatus::Updating;
    self.check_invariants();
  }

  /// Non-blocking completion check for an updating level.
  ///
  /// On completion the pipeline comes back, its result is exported and the
  /// level becomes `UpToDate`. Returns the task's execute time. A panic in
  /// `execute` leaves the level `Invalid` and is resumed here.
  pub fn poll_completion(&mut self) -> Option<u64> {
    if self.status != LodStatus::Updating {
      return None;
    }

    let in_flight = self.in_flight.as_mut()?;
    if !in_flight.task.is_done() {
      return None;
    }

    let in_flight = self.in_flight.take()?;
    Some(self.complete(in_flight))
  }

  /// Blocking variant of `poll_completion`.
  ///
  /// For shutdown and tests only; the per-frame path never waits.
  pub fn finish(&mut self) -> Option<u64> {
    if self.status != LodStatus::Updating {
      return None;
    }
    let in_flight = self.in_flight.take()?;
    Some(self.complete(in_flight))
  }

  fn complete(&mut self, in_flight: InFlight<O>) -> u64 {
    let InFlight { task, progress } = in_flight;
    self.progress_sink.end(progress);

    let Finished {
      pipeline,
      execute_us,
    } = match task.wait() {
      Ok(finished) => finished,
      Err(payload) => {
        // The pipeline unwound with the task; the level cannot run again.
        self.status = LodStatus::Invalid;
        error!(
          level = %self.level,
          "background update panicked, level disabled: {}",
          panic_message(payload.as_ref())
        );
        self.check_invariants();
        panic::resume_unwind(payload);
      }
    };

    pipeline.export_result(&mut self.result);
    self.pipeline = Some(pipeline);
    self.status = LodStatus::UpToDate;

    debug!(level = %self.level, execute_us, "background update complete");
    self.check_invariants();
    execute_us
  }

  fn check_invariants(&self) {
    debug_assert_eq!(
      self.in_flight.is_some(),
      self.status == LodStatus::Updating,
      "{} level: task presence disagrees with {:?}",
      self.level,
      self.status
    );
    debug_assert_eq!(
      self.pipeline.is_some(),
      matches!(self.status, LodStatus::OutOfDate | LodStatus::UpToDate),
      "{} level: pipeline ownership disagrees with {:?}",
      self.level,
      self.status
    );
  }
}

fn missing_pipeline(operation: &str, level: LevelOfDetail, status: LodStatus) -> ! {
  panic!("{operation} on {level} level in state {status:?}: pipeline not available")
}

impl<O: LodObject> Drop for LodManager<O> {
  /// Block until an in-flight task finishes so its pipeline is never dropped mid-run.
  fn drop(&mut self) {
    let Some(InFlight { task, progress }) = self.in_flight.take() else {
      return;
    };

    debug!(level = %self.level, "joining in-flight task on drop");
    let outcome = task.wait();
    self.progress_sink.end(progress);

    if let Err(payload) = outcome {
      error!(
        level = %self.level,
        "background update panicked during shutdown: {}",
        panic_message(payload.as_ref())
      );
    }
  }
}

impl<O: LodObject> fmt::Debug for LodManager<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LodManager")
      .field("level", &self.level)
      .field("status", &self.status)
      .field("task", &self.in_flight.as_ref().map(|in_flight| in_flight.task.id()))
      .finish()
  }
}

#[cfg(test)]
#[path = "manager_test.rs"]
mod manager_test;
