//! SchedulerConfig - launch policy and worker pool settings.

use std::path::Path;

use serde::Deserialize;

use crate::error::SchedulerError;

/// Scheduler configuration.
///
/// The default reproduces the unbounded behaviour: every out-of-date level
/// finer than the live one is launched in the same frame.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
  /// Dedicated worker threads. 0 shares rayon's global pool.
  pub worker_threads: usize,

  /// Maximum background launches in a single `sync_state`.
  /// Levels over the cap stay out of date and are revisited next frame.
  pub max_launches_per_frame: Option<usize>,

  /// Maximum levels of one object updating at the same time.
  pub max_in_flight: Option<usize>,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      worker_threads: 0,
      max_launches_per_frame: None,
      max_in_flight: None,
    }
  }
}

impl SchedulerConfig {
  /// Load configuration from a TOML file.
  pub fn load(path: &Path) -> Result<Self, SchedulerError> {
    let content = std::fs::read_to_string(path).map_err(|source| SchedulerError::ConfigRead {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml_str(&content)
  }

  /// Parse and validate configuration from TOML text.
  pub fn from_toml_str(content: &str) -> Result<Self, SchedulerError> {
    let config: SchedulerConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
  }

  /// Reject caps that would stop every background launch.
  pub fn validate(&self) -> Result<(), SchedulerError> {
    if self.max_launches_per_frame == Some(0) {
      return Err(SchedulerError::InvalidConfig(
        "max_launches_per_frame must be at least 1".into(),
      ));
    }
    if self.max_in_flight == Some(0) {
      return Err(SchedulerError::InvalidConfig(
        "max_in_flight must be at least 1".into(),
      ));
    }
    Ok(())
  }

  /// Builder: cap background launches per frame.
  pub fn with_max_launches_per_frame(mut self, cap: usize) -> Self {
    self.max_launches_per_frame = Some(cap);
    self
  }

  /// Builder: cap concurrently updating levels.
  pub fn with_max_in_flight(mut self, cap: usize) -> Self {
    self.max_in_flight = Some(cap);
    self
  }

  /// Whether one more background launch fits the policy.
  #[inline]
  pub(crate) fn allows_launch(&self, launched_this_frame: usize, in_flight: usize) -> bool {
    self
      .max_launches_per_frame
      .is_none_or(|cap| launched_this_frame < cap)
      && self.max_in_flight.is_none_or(|cap| in_flight < cap)
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
