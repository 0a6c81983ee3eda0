//! Error types for the scheduler's host-facing API.
//!
//! Scheduling itself never fails: a panicking `execute` is re-raised when
//! its task is joined, and undefined levels are skipped silently. These
//! errors cover configuration and host misuse only.

use std::path::PathBuf;

use crate::scheduler::ContextId;

/// Errors returned by scheduler construction, config loading and rendering.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
  /// `sync_render` was called with a context that was never attached.
  #[error("no rendering context attached with id {}", .0.raw())]
  UnknownContext(ContextId),

  /// Config file could not be read.
  #[error("failed to read scheduler config {}", path.display())]
  ConfigRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// Config file is not valid TOML for `SchedulerConfig`.
  #[error("failed to parse scheduler config")]
  ConfigParse(#[from] toml::de::Error),

  /// Config parsed but holds an unusable value.
  #[error("invalid scheduler config: {0}")]
  InvalidConfig(String),

  /// Dedicated worker pool could not be created.
  #[error("failed to build worker pool")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
