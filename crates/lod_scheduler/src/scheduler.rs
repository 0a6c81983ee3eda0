//! LodScheduler - per-frame state machine over an object's levels.
//!
//! ```text
//!  sync_state(app)                               (once per frame)
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │ 1. state.update(app)                                         │
//!  │ 2. completion sweep   best → fastest, every Updating level   │
//!  │ 3. liveness scan      best → fastest, demote stale UpToDate, │
//!  │                       stop at first level still UpToDate     │
//!  │ 4. promotion pass     live.finer() (or fastest) → best,      │
//!  │                       launch OutOfDate levels                │
//!  └──────────────────────────────────────────────────────────────┘
//!
//!  sync_render(app, ctx)                         (once per frame per context)
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │ disable every level except live_level(), then update live    │
//!  └──────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, trace, trace_span};

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::level::{LevelOfDetail, LevelSet};
use crate::manager::{LodManager, LodStatus};
use crate::metrics::SchedulerMetrics;
use crate::pipeline::{LodObject, ObjectState, RenderPipeline};
use crate::progress::{NullProgress, ProgressSink};
use crate::threading::TaskExecutor;

// =============================================================================
// ContextId
// =============================================================================

/// Atomic counter for generating unique ContextIds.
static CONTEXT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identifier of an attached rendering context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContextId(u64);

impl ContextId {
  fn next() -> Self {
    Self(CONTEXT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  /// Get the raw ID value.
  pub fn raw(&self) -> u64 {
    self.0
  }
}

// =============================================================================
// SyncReport
// =============================================================================

/// What one `sync_state` call did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
  /// Frame number (1 for the first call).
  pub frame: u64,
  /// Background tasks swept to UpToDate.
  pub completed: LevelSet,
  /// UpToDate levels demoted because their inputs changed.
  pub demoted: LevelSet,
  /// Levels executed inline on the scheduler thread.
  pub ran_inline: LevelSet,
  /// Levels launched on a worker.
  pub launched: LevelSet,
  /// OutOfDate levels whose pipeline reported nothing to do.
  pub already_current: LevelSet,
  /// Levels held back by the launch policy.
  pub deferred: LevelSet,
  /// Live level after the call.
  pub live: Option<LevelOfDetail>,
}

impl SyncReport {
  /// True if any level changed status.
  pub fn changed(&self) -> bool {
    !(self.completed.is_empty()
      && self.demoted.is_empty()
      && self.ran_inline.is_empty()
      && self.launched.is_empty()
      && self.already_current.is_empty())
  }
}

// =============================================================================
// LodScheduler
// =============================================================================

type RenderSet<O> = [Option<Box<dyn RenderPipeline<O>>>; LevelOfDetail::COUNT];

/// Asynchronous multi-LOD scheduler for one visual object.
///
/// All methods run on the scheduler thread. Only `sync_state` changes level
/// status; `sync_render` only presents what `sync_state` left behind.
pub struct LodScheduler<O: LodObject> {
  object: O,
  state: O::State,
  /// Indexed by `LevelOfDetail::index()`.
  managers: [LodManager<O>; LevelOfDetail::COUNT],
  defined: LevelSet,
  contexts: HashMap<ContextId, RenderSet<O>>,
  executor: TaskExecutor,
  config: SchedulerConfig,
  metrics: SchedulerMetrics,
  frame: u64,
}

impl<O: LodObject> LodScheduler<O> {
  /// Build the object state and one manager per level.
  pub fn new(
    object: O,
    app: &O::App,
    executor: TaskExecutor,
    progress: Arc<dyn ProgressSink>,
    config: SchedulerConfig,
  ) -> Self {
    let state = object.create_state(app);
    let managers = LevelOfDetail::ALL.map(|level| {
      LodManager::new(level, object.create_data_pipeline(level), Arc::clone(&progress))
    });
    let defined = managers
      .iter()
      .filter(|manager| manager.is_defined())
      .map(LodManager::level)
      .collect();

    debug!(object = object.label(), ?defined, "scheduler created");

    Self {
      object,
      state,
      managers,
      defined,
      contexts: HashMap::new(),
      executor,
      config,
      metrics: SchedulerMetrics::default(),
      frame: 0,
    }
  }

  /// Validate `config` and build the executor it describes.
  pub fn from_config(
    object: O,
    app: &O::App,
    progress: Arc<dyn ProgressSink>,
    config: SchedulerConfig,
  ) -> Result<Self, SchedulerError> {
    config.validate()?;
    let executor = TaskExecutor::new(config.worker_threads)?;
    Ok(Self::new(object, app, executor, progress, config))
  }

  /// Global rayon pool, no progress reporting, unbounded launches.
  pub fn with_defaults(object: O, app: &O::App) -> Self {
    Self::new(
      object,
      app,
      TaskExecutor::global(),
      Arc::new(NullProgress),
      SchedulerConfig::default(),
    )
  }

  // ---------------------------------------------------------------------------
  // Per-frame entry points
  // ---------------------------------------------------------------------------

  /// Advance every level's state machine. Never blocks.
  pub fn sync_state(&mut self, app: &O::App) -> SyncReport {
    self.frame += 1;
    let _span = trace_span!("sync_state", frame = self.frame).entered();
    self.metrics.record_frame();

    let mut report = SyncReport {
      frame: self.frame,
      ..SyncReport::default()
    };

    self.state.update(app);
    self.sweep_completions(&mut report);
    let live = self.scan_liveness(app, &mut report);
    self.promote(app, live, &mut report);

    report.live = self.live_level();
    if report.changed() {
      debug!(?report, "levels changed");
    } else {
      trace!(live = ?report.live, "no level changes");
    }
    report
  }

  /// Present the live level in `context` and hide all others.
  ///
  /// Returns the level that was presented, if any.
  pub fn sync_render(
    &mut self,
    app: &O::App,
    context_id: ContextId,
    context: &mut O::Context,
  ) -> Result<Option<LevelOfDetail>, SchedulerError> {
    let live = self.live_level();
    let renders = self
      .contexts
      .get_mut(&context_id)
      .ok_or(SchedulerError::UnknownContext(context_id))?;

    // Hide first so two levels are never enabled at once.
    for level in self.defined.best_to_fastest() {
      if Some(level) == live {
        continue;
      }
      if let Some(render) = renders[level.index()].as_mut() {
        render.disable(context);
      }
    }

    if let Some(level) = live {
      if let Some(render) = renders[level.index()].as_mut() {
        render.update(&self.state, app, context, self.managers[level.index()].result());
      }
    }

    Ok(live)
  }

  /// Build and initialise this object's render pipelines for a new context.
  pub fn attach_context(&mut self, context: &mut O::Context) -> ContextId {
    let id = ContextId::next();
    let mut renders: RenderSet<O> = std::array::from_fn(|_| None);

    for level in self.defined.best_to_fastest() {
      if let Some(mut render) = self.object.create_render_pipeline(level) {
        render.init(&self.state, context);
        renders[level.index()] = Some(render);
      }
    }

    debug!(context = id.raw(), "rendering context attached");
    self.contexts.insert(id, renders);
    id
  }

  /// Drop a context's render pipelines. Returns false if it was not attached.
  pub fn detach_context(&mut self, context_id: ContextId) -> bool {
    let removed = self.contexts.remove(&context_id).is_some();
    if removed {
      debug!(context = context_id.raw(), "rendering context detached");
    }
    removed
  }

  // ---------------------------------------------------------------------------
  // Queries
  // ---------------------------------------------------------------------------

  /// Best level whose result is current, `None` before anything completed.
  pub fn live_level(&self) -> Option<LevelOfDetail> {
    self
      .defined
      .best_to_fastest()
      .find(|level| self.managers[level.index()].status() == LodStatus::UpToDate)
  }

  /// Live level together with its result.
  pub fn live_result(&self) -> Option<(LevelOfDetail, &O::Result)> {
    let level = self.live_level()?;
    Some((level, self.managers[level.index()].result()))
  }

  pub fn status(&self, level: LevelOfDetail) -> LodStatus {
    self.managers[level.index()].status()
  }

  /// Result of `level` if it is current.
  pub fn result(&self, level: LevelOfDetail) -> Option<&O::Result> {
    let manager = &self.managers[level.index()];
    (manager.status() == LodStatus::UpToDate).then(|| manager.result())
  }

  /// Levels that have a data pipeline.
  pub fn defined_levels(&self) -> LevelSet {
    self.defined
  }

  /// Levels with a background task in flight.
  pub fn in_flight(&self) -> LevelSet {
    self
      .defined
      .best_to_fastest()
      .filter(|level| self.managers[level.index()].is_updating())
      .collect()
  }

  /// Object state. Writes through `state_mut` apply on the next `sync_state`.
  pub fn state(&self) -> &O::State {
    &self.state
  }

  pub fn state_mut(&mut self) -> &mut O::State {
    &mut self.state
  }

  pub fn object(&self) -> &O {
    &self.object
  }

  pub fn config(&self) -> &SchedulerConfig {
    &self.config
  }

  pub fn metrics(&self) -> &SchedulerMetrics {
    &self.metrics
  }

  /// Number of `sync_state` calls so far.
  pub fn frame(&self) -> u64 {
    self.frame
  }

  pub fn context_count(&self) -> usize {
    self.contexts.len()
  }

  /// Block until every in-flight task has finished and export the results.
  ///
  /// Not part of the per-frame path; for shutdown, screenshots and tests.
  pub fn finish_all(&mut self) -> LevelSet {
    let mut finished = LevelSet::EMPTY;
    for level in self.defined.best_to_fastest() {
      if let Some(execute_us) = self.managers[level.index()].finish() {
        self.metrics.record_completion(level, execute_us);
        finished.insert(level);
      }
    }
    finished
  }

  // ---------------------------------------------------------------------------
  // sync_state steps
  // ---------------------------------------------------------------------------

  /// Step 2: export every finished task, whichever level ends up live.
  fn sweep_completions(&mut self, report: &mut SyncReport) {
    for level in self.defined.best_to_fastest() {
      if let Some(execute_us) = self.managers[level.index()].poll_completion() {
        self.metrics.record_completion(level, execute_us);
        report.completed.insert(level);
      }
    }
  }

  /// Step 3: demote stale levels until the first one that is still current.
  fn scan_liveness(&mut self, app: &O::App, report: &mut SyncReport) -> Option<LevelOfDetail> {
    for level in self.defined.best_to_fastest() {
      let manager = &mut self.managers[level.index()];
      if manager.status() != LodStatus::UpToDate {
        continue;
      }

      if manager.refresh(&self.state, app) {
        manager.demote();
        self.metrics.record_demotion(level);
        report.demoted.insert(level);
      } else {
        return Some(level);
      }
    }
    None
  }

  /// Step 4: launch out-of-date levels better than the live one.
  fn promote(&mut self, app: &O::App, live: Option<LevelOfDetail>, report: &mut SyncReport) {
    let mut cursor = match live {
      Some(level) => self.defined.next_finer(level),
      None => self.defined.fastest(),
    };
    let mut in_flight = self.in_flight().len();
    let mut launched = 0;

    while let Some(level) = cursor {
      cursor = self.defined.next_finer(level);

      let manager = &mut self.managers[level.index()];
      if manager.status() != LodStatus::OutOfDate {
        continue;
      }

      if !manager.refresh(&self.state, app) {
        manager.mark_up_to_date();
        report.already_current.insert(level);
      } else if manager.forces_synchronous() {
        let execute_us = manager.run_inline();
        self.metrics.record_inline(level, execute_us);
        report.ran_inline.insert(level);
      } else if self.config.allows_launch(launched, in_flight) {
        let label = format!("{} ({})", self.object.label(), level);
        manager.launch(&self.executor, &label);
        self.metrics.record_launch(level);
        report.launched.insert(level);
        launched += 1;
        in_flight += 1;
      } else {
        self.metrics.record_deferral();
        report.deferred.insert(level);
      }
    }
  }
}

impl<O: LodObject> fmt::Debug for LodScheduler<O> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LodScheduler")
      .field("object", &self.object.label())
      .field("frame", &self.frame)
      .field("managers", &self.managers)
      .field("contexts", &self.contexts.len())
      .field("config", &self.config)
      .finish()
  }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod scheduler_test;
