//! Plug-in interfaces for a multi-LOD visual object.
//!
//! A concrete object provides one `ObjectState`, and per level a
//! `DataPipeline` (expensive, may run on a worker) plus one `RenderPipeline`
//! per rendering context (cheap, always on the scheduler thread).
//!
//! ```text
//!   host app state ──► ObjectState::update ──┐
//!                                            ▼
//!                        DataPipeline::configure (captures config)
//!                                            │
//!                        DataPipeline::execute   (worker or inline)
//!                                            │
//!                        DataPipeline::export_result ──► LOD result
//!                                                           │
//!                        RenderPipeline::update ◄───────────┘
//! ```

use crate::level::LevelOfDetail;

/// Per-object configuration snapshot, refreshed once per frame.
///
/// Only the scheduler mutates it, and only inside `sync_state`.
pub trait ObjectState {
  /// Host application state the object reads from.
  type App;

  /// Refresh this snapshot from the host application state.
  fn update(&mut self, app: &Self::App);
}

/// Family of types describing one kind of multi-LOD object.
///
/// This is the factory the scheduler calls once per level at construction
/// and once per level whenever a rendering context is attached.
pub trait LodObject: Sized + 'static {
  /// Host application state (dataset, active field, color map, ...).
  type App;
  /// Rendering context handed to render pipelines.
  type Context;
  /// Per-object state owned by the scheduler.
  type State: ObjectState<App = Self::App>;
  /// Exported snapshot of a data pipeline's output.
  ///
  /// `Default` is the empty result shown to nobody: a level only becomes
  /// renderable after its first export.
  type Result: Default;

  /// Build the initial object state.
  fn create_state(&self, app: &Self::App) -> Self::State;

  /// Build the data pipeline for `level`, or `None` if this object has no
  /// such level.
  fn create_data_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn DataPipeline<Self>>>;

  /// Build a render pipeline for `level` in a newly attached context.
  ///
  /// Only called for levels that have a data pipeline.
  fn create_render_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn RenderPipeline<Self>>>;

  /// Name used in progress notifications and logs.
  fn label(&self) -> &str {
    "lod object"
  }
}

/// The expensive transform from input + object state into one level's result.
///
/// `execute` runs on a worker thread with the pipeline moved onto it, so it
/// can only see what `configure` captured.
pub trait DataPipeline<O: LodObject>: Send {
  /// Capture the configuration the next `execute` will use.
  ///
  /// Cheap, synchronous and idempotent.
  fn configure(&mut self, state: &O::State, app: &O::App);

  /// Whether the captured configuration differs from what produced `result`.
  fn needs_update(&self, result: &O::Result) -> bool;

  /// Do the expensive work.
  fn execute(&mut self);

  /// Copy the latest output into `result`.
  ///
  /// The exported value must not share mutable state with the pipeline.
  fn export_result(&self, result: &mut O::Result);

  /// Run inline on the scheduler thread instead of on a worker.
  ///
  /// For pipelines cheap enough that the hand-off costs more than the work.
  fn force_synchronous(&self) -> bool {
    false
  }
}

/// Per-level, per-context presentation of a result.
pub trait RenderPipeline<O: LodObject> {
  /// One-time setup when a context is attached.
  fn init(&mut self, state: &O::State, context: &mut O::Context);

  /// Make this level visible and current.
  fn update(
    &mut self,
    state: &O::State,
    app: &O::App,
    context: &mut O::Context,
    result: &O::Result,
  );

  /// Hide this level without destroying it.
  fn disable(&mut self, context: &mut O::Context);
}
