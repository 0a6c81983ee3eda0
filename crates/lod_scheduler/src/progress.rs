//! Progress notifications for background work.
//!
//! The scheduler calls `begin` when it launches a level on a worker and
//! `end` with the same handle once the result has been exported (or the
//! task was joined during shutdown). Hosts use this to show a "background
//! update in progress" indicator.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

/// Opaque token for one outstanding notification.
///
/// Not `Clone`: ending a notification consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ProgressHandle(u64);

impl ProgressHandle {
  /// Allocate a process-unique handle.
  pub fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  /// Get the raw handle value.
  pub fn raw(&self) -> u64 {
    self.0
  }
}

/// Host-side sink for progress notifications.
///
/// Shared between the scheduler and the host UI, so it must be thread-safe.
pub trait ProgressSink: Send + Sync {
  /// A background task started.
  fn begin(&self, label: &str) -> ProgressHandle;

  /// The task identified by `handle` has finished.
  fn end(&self, handle: ProgressHandle);
}

/// No-op sink for headless use.
#[derive(Debug, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
  fn begin(&self, _label: &str) -> ProgressHandle {
    ProgressHandle::next()
  }

  fn end(&self, _handle: ProgressHandle) {}
}

/// Sink that only logs.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
  fn begin(&self, label: &str) -> ProgressHandle {
    let handle = ProgressHandle::next();
    info!(handle = handle.raw(), "background update started: {label}");
    handle
  }

  fn end(&self, handle: ProgressHandle) {
    debug!(handle = handle.raw(), "background update finished");
  }
}

/// Sink that tracks outstanding notifications.
///
/// Share it as `Arc<ProgressTracker>`: one clone goes to the scheduler, the
/// host reads `outstanding()` / `labels()` for its indicator.
#[derive(Debug, Default)]
pub struct ProgressTracker {
  outstanding: Mutex<BTreeMap<u64, String>>,
  begun: AtomicUsize,
  ended: AtomicUsize,
}

impl ProgressTracker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of notifications begun but not ended.
  pub fn outstanding(&self) -> usize {
    self.lock().len()
  }

  /// True if any background work is running.
  pub fn is_busy(&self) -> bool {
    self.outstanding() > 0
  }

  /// Labels of outstanding notifications, oldest first.
  pub fn labels(&self) -> Vec<String> {
    self.lock().values().cloned().collect()
  }

  /// Total notifications begun.
  pub fn begun(&self) -> usize {
    self.begun.load(Ordering::Relaxed)
  }

  /// Total notifications ended.
  pub fn ended(&self) -> usize {
    self.ended.load(Ordering::Relaxed)
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, String>> {
    // A poisoned map is still a valid map.
    self.outstanding.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

impl ProgressSink for ProgressTracker {
  fn begin(&self, label: &str) -> ProgressHandle {
    let handle = ProgressHandle::next();
    self.lock().insert(handle.raw(), label.to_owned());
    self.begun.fetch_add(1, Ordering::Relaxed);
    handle
  }

  fn end(&self, handle: ProgressHandle) {
    if self.lock().remove(&handle.raw()).is_none() {
      warn!(handle = handle.raw(), "progress handle ended twice or never begun");
      return;
    }
    self.ended.fetch_add(1, Ordering::Relaxed);
  }
}
