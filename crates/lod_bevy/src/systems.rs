//! Per-frame scheduler systems.
//!
//! ```text
//!  Update
//!  ┌──────────────────────┐      ┌───────────────────────────────┐
//!  │ LodSet::SyncState    │ ───► │ LodSet::SyncRender            │
//!  │ sync_state per object│      │ exclusive: attach + present   │
//!  └──────────────────────┘      └───────────────────────────────┘
//! ```

use std::any::type_name;
use std::sync::Arc;

use bevy::prelude::*;
use lod_scheduler::{LodObject, LodScheduler, ProgressSink, SchedulerConfig};

use crate::error::LodBevyError;
use crate::resources::{BackgroundWork, LodSchedulers};

/// Ordering of the scheduler systems within `Update`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum LodSet {
  /// Completion sweep, liveness scan and launches.
  SyncState,
  /// Present live levels.
  SyncRender,
}

/// Schedule `object` in `world`.
///
/// Reads the object's app resource for the initial state and reports
/// background work through the shared `BackgroundWork` resource.
pub fn add_lod_object<O>(
  world: &mut World,
  object: O,
  config: SchedulerConfig,
) -> Result<(), LodBevyError>
where
  O: LodObject<Context = World>,
  O::App: Resource,
{
  let progress: Arc<dyn ProgressSink> = world.get_resource_or_init::<BackgroundWork>().tracker();
  let app = world
    .get_resource::<O::App>()
    .ok_or(LodBevyError::MissingAppResource(type_name::<O::App>()))?;
  let label = object.label().to_owned();
  let scheduler = LodScheduler::from_config(object, app, progress, config)?;

  info!(
    "scheduled {label}: levels {:?}",
    scheduler.defined_levels()
  );

  if !world.contains_non_send::<LodSchedulers<O>>() {
    world.insert_non_send_resource(LodSchedulers::<O>::default());
  }
  world.non_send_resource_mut::<LodSchedulers<O>>().push(scheduler);
  Ok(())
}

/// Advance every scheduler of type `O`.
pub fn sync_lod_state<O>(schedulers: Option<NonSendMut<LodSchedulers<O>>>, app: Res<O::App>)
where
  O: LodObject<Context = World>,
  O::App: Resource,
{
  let Some(mut schedulers) = schedulers else {
    return;
  };

  for scheduler in schedulers.iter_mut() {
    let report = scheduler.sync_state(&app);
    if report.changed() {
      debug!(
        "{} frame {}: live {:?}, launched {:?}, completed {:?}",
        scheduler.object().label(),
        report.frame,
        report.live,
        report.launched,
        report.completed
      );
    }
  }
}

/// Present the live level of every scheduler of type `O`.
///
/// Exclusive: render pipelines spawn and edit entities directly.
pub fn sync_lod_render<O>(world: &mut World)
where
  O: LodObject<Context = World>,
  O::App: Resource,
{
  let Some(mut schedulers) = world.remove_non_send_resource::<LodSchedulers<O>>() else {
    return;
  };

  world.try_resource_scope(|world, app: Mut<O::App>| {
    for object in &mut schedulers.objects {
      let context = match object.context {
        Some(context) => context,
        None => {
          let context = object.scheduler.attach_context(world);
          object.context = Some(context);
          context
        }
      };

      if let Err(err) = object.scheduler.sync_render(&app, context, world) {
        error!("{}: render sync failed: {err}", object.scheduler.object().label());
        object.context = None;
      }
    }
  });

  world.insert_non_send_resource(schedulers);
}
