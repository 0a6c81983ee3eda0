//! lod_scheduler - Engine independent multi-LOD compute/render scheduling
//!
//! Keeps an interactive frame loop responsive while expensive per-object data
//! (meshes, contours, volumes) is recomputed in the background. Each object
//! defines up to three interchangeable levels of detail; the scheduler always
//! presents the best level whose result is current and falls back to cheaper
//! ones while better ones are recomputed.
//!
//! # Features
//!
//! - **Per-level state machine**: Invalid / OutOfDate / Updating / UpToDate,
//!   advanced once per frame by `LodScheduler::sync_state`
//! - **Background execution**: data pipelines move onto a rayon pool and come
//!   back through the task result; at most one task per level
//! - **Inline fallbacks**: cheap levels can force synchronous execution so
//!   something is visible on the very first frame
//! - **Progress reporting**: one begin/end pair per background task
//! - **Launch policy**: optional per-frame and in-flight caps (TOML config)
//!
//! # Example
//!
//! ```ignore
//! use lod_scheduler::{LodScheduler, LevelOfDetail};
//!
//! let mut scheduler = LodScheduler::with_defaults(MyObject::new(), &app);
//! let context_id = scheduler.attach_context(&mut renderer);
//!
//! loop {
//!     scheduler.sync_state(&app);
//!     scheduler.sync_render(&app, context_id, &mut renderer)?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod level;
pub mod pipeline;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use level::{LevelOfDetail, LevelSet};
pub use pipeline::{DataPipeline, LodObject, ObjectState, RenderPipeline};

// Per-level state machine
pub mod manager;
pub use manager::{LodManager, LodStatus};

// Per-frame orchestration
pub mod scheduler;
pub use scheduler::{ContextId, LodScheduler, SyncReport};

// Cross-platform threading abstraction
pub mod threading;
pub use threading::{TaskExecutor, TaskHandle, TaskId};

// Background work notifications
pub mod progress;
pub use progress::{LogProgress, NullProgress, ProgressHandle, ProgressSink, ProgressTracker};

// Scheduler statistics (feature = "metrics")
pub mod metrics;
pub use metrics::SchedulerMetrics;

#[cfg(test)]
pub(crate) mod test_utils;
