//! Background task dispatch using rayon.
//!
//! Uses `rayon::spawn` (or a dedicated rayon pool) for fire-and-forget work
//! submission and a one-shot crossbeam channel per task for the result.
//!
//! # Usage
//!
//! ```ignore
//! let executor = TaskExecutor::global();
//!
//! // Queue work (non-blocking)
//! let mut task = executor.spawn(move || expensive_computation());
//!
//! // Poll each frame
//! if task.is_done() {
//!     let result = task.join(); // re-raises a panic from the worker
//! }
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{self as channel, Receiver, TryRecvError};

use crate::error::SchedulerError;

/// Unique identifier for a spawned task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

impl TaskId {
  fn next() -> Self {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    Self(COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  /// Get the raw ID value.
  pub fn raw(&self) -> u64 {
    self.0
  }
}

/// Task executor backed by rayon.
///
/// `worker_threads == 0` shares rayon's global pool; any other value builds
/// a dedicated pool of that size.
#[derive(Clone)]
pub struct TaskExecutor {
  pool: Option<Arc<rayon::ThreadPool>>,
}

impl TaskExecutor {
  /// Create an executor with `worker_threads` dedicated threads (0 = global pool).
  pub fn new(worker_threads: usize) -> Result<Self, SchedulerError> {
    if worker_threads == 0 {
      return Ok(Self::global());
    }

    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(worker_threads)
      .thread_name(|index| format!("lod-worker-{index}"))
      .build()?;

    Ok(Self {
      pool: Some(Arc::new(pool)),
    })
  }

  /// Executor that submits to rayon's global pool.
  pub fn global() -> Self {
    Self { pool: None }
  }

  /// Spawn a task (non-blocking).
  ///
  /// A panic inside `work` is caught on the worker and re-raised by
  /// `TaskHandle::join`.
  pub fn spawn<F, T>(&self, work: F) -> TaskHandle<T>
  where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
  {
    let id = TaskId::next();
    let (sender, receiver) = channel::bounded(1);

    let job = move || {
      let outcome = panic::catch_unwind(AssertUnwindSafe(work));
      // Ignore send error (handle dropped = nobody is waiting)
      let _ = sender.send(outcome);
    };

    match &self.pool {
      Some(pool) => pool.spawn(job),
      None => rayon::spawn(job),
    }

    TaskHandle {
      id,
      receiver,
      outcome: None,
    }
  }

  /// Number of worker threads work is dispatched to.
  pub fn num_threads(&self) -> usize {
    match &self.pool {
      Some(pool) => pool.current_num_threads(),
      None => rayon::current_num_threads(),
    }
  }
}

impl Default for TaskExecutor {
  fn default() -> Self {
    Self::global()
  }
}

impl fmt::Debug for TaskExecutor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskExecutor")
      .field("dedicated_pool", &self.pool.is_some())
      .field("num_threads", &self.num_threads())
      .finish()
  }
}

/// Handle to one in-flight task.
pub struct TaskHandle<T> {
  id: TaskId,
  receiver: Receiver<thread::Result<T>>,
  /// Outcome received by `is_done` but not yet joined.
  outcome: Option<thread::Result<T>>,
}

impl<T> TaskHandle<T> {
  pub fn id(&self) -> TaskId {
    self.id
  }

  /// Zero-timeout completion check.
  pub fn is_done(&mut self) -> bool {
    if self.outcome.is_some() {
      return true;
    }

    match self.receiver.try_recv() {
      Ok(outcome) => {
        self.outcome = Some(outcome);
        true
      }
      Err(TryRecvError::Empty) => false,
      // Worker went away without reporting; `wait` turns this into a panic payload.
      Err(TryRecvError::Disconnected) => true,
    }
  }

  /// Block until the task finishes and return its raw outcome.
  pub fn wait(mut self) -> thread::Result<T> {
    if let Some(outcome) = self.outcome.take() {
      return outcome;
    }

    match self.receiver.recv() {
      Ok(outcome) => outcome,
      Err(_) => Err(lost_task_payload(self.id)),
    }
  }

  /// Block until the task finishes and return its value.
  ///
  /// Panics from the worker are resumed on the calling thread.
  pub fn join(self) -> T {
    match self.wait() {
      Ok(value) => value,
      Err(payload) => panic::resume_unwind(payload),
    }
  }

  /// Join only if already finished.
  pub fn try_join(mut self) -> Result<T, Self> {
    if self.is_done() {
      Ok(self.join())
    } else {
      Err(self)
    }
  }
}

impl<T> fmt::Debug for TaskHandle<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TaskHandle")
      .field("id", &self.id)
      .field("received", &self.outcome.is_some())
      .finish()
  }
}

fn lost_task_payload(id: TaskId) -> Box<dyn Any + Send> {
  Box::new(format!("task {} ended without reporting a result", id.raw()))
}

/// Best-effort message from a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(message) = payload.downcast_ref::<&'static str>() {
    message
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message
  } else {
    "non-string panic payload"
  }
}

#[cfg(test)]
#[path = "threading_test.rs"]
mod threading_test;
