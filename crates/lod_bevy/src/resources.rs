//! Bevy resources for scheduled LOD objects.

use std::sync::Arc;

use bevy::prelude::*;
use lod_scheduler::{ContextId, LodObject, LodScheduler, ProgressTracker};

/// Background work indicator shared by every scheduler in the app.
///
/// One entry per in-flight background task; empty when the app is idle.
#[derive(Resource, Clone, Default)]
pub struct BackgroundWork {
  tracker: Arc<ProgressTracker>,
}

impl BackgroundWork {
  /// Shared tracker handed to schedulers as their progress sink.
  pub fn tracker(&self) -> Arc<ProgressTracker> {
    Arc::clone(&self.tracker)
  }

  pub fn outstanding(&self) -> usize {
    self.tracker.outstanding()
  }

  pub fn is_busy(&self) -> bool {
    self.tracker.is_busy()
  }

  /// Labels of the tasks still running, oldest first.
  pub fn labels(&self) -> Vec<String> {
    self.tracker.labels()
  }
}

/// A scheduler plus the id of its render pipelines in the Bevy world.
pub(crate) struct ScheduledObject<O: LodObject> {
  pub(crate) scheduler: LodScheduler<O>,
  /// Attached lazily on the first render sync.
  pub(crate) context: Option<ContextId>,
}

/// All scheduled objects of type `O`.
///
/// Stored as a non-send resource: render pipelines and object state are not
/// required to be `Send`.
pub struct LodSchedulers<O: LodObject> {
  pub(crate) objects: Vec<ScheduledObject<O>>,
}

impl<O: LodObject> Default for LodSchedulers<O> {
  fn default() -> Self {
    Self {
      objects: Vec::new(),
    }
  }
}

impl<O: LodObject> LodSchedulers<O> {
  pub fn push(&mut self, scheduler: LodScheduler<O>) {
    self.objects.push(ScheduledObject {
      scheduler,
      context: None,
    });
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &LodScheduler<O>> {
    self.objects.iter().map(|object| &object.scheduler)
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LodScheduler<O>> {
    self.objects.iter_mut().map(|object| &mut object.scheduler)
  }

  pub fn get(&self, index: usize) -> Option<&LodScheduler<O>> {
    self.objects.get(index).map(|object| &object.scheduler)
  }

  pub fn get_mut(&mut self, index: usize) -> Option<&mut LodScheduler<O>> {
    self.objects.get_mut(index).map(|object| &mut object.scheduler)
  }
}
