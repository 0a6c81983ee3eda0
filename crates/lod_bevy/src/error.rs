use lod_scheduler::SchedulerError;
use thiserror::Error;

/// Errors from registering scheduled objects with a Bevy world.
#[derive(Debug, Error)]
pub enum LodBevyError {
  #[error("app resource `{0}` must be inserted before scheduling objects that read it")]
  MissingAppResource(&'static str),

  #[error(transparent)]
  Scheduler(#[from] SchedulerError),
}
