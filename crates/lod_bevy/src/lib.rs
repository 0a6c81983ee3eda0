//! Bevy presentation layer for lod_scheduler.
//!
//! This crate bridges the engine-independent scheduler with Bevy: the Bevy
//! `World` is the rendering context, an app resource drives object state,
//! and mesh levels are presented as entities.

pub mod error;
pub mod mesh;
pub mod render;
pub mod resources;
pub mod systems;

#[cfg(test)]
mod test_utils;


use std::marker::PhantomData;

use bevy::prelude::*;
use lod_scheduler::LodObject;

pub use error::LodBevyError;
pub use mesh::LodMesh;
pub use render::{LodMeshEntity, MeshLodRenderPipeline, MeshObjectState};
pub use resources::{BackgroundWork, LodSchedulers};
pub use systems::{add_lod_object, sync_lod_render, sync_lod_state, LodSet};

/// Bevy plugin driving every scheduled object of type `O`.
///
/// Objects are registered with [`add_lod_object`].
pub struct LodSchedulerPlugin<O>(PhantomData<fn() -> O>);

impl<O> Default for LodSchedulerPlugin<O> {
  fn default() -> Self {
    Self(PhantomData)
  }
}

impl<O> Plugin for LodSchedulerPlugin<O>
where
  O: LodObject<Context = World>,
  O::App: Resource,
{
  fn build(&self, app: &mut App) {
    app
      .init_resource::<BackgroundWork>()
      .configure_sets(Update, (LodSet::SyncState, LodSet::SyncRender).chain())
      .add_systems(
        Update,
        (
          systems::sync_lod_state::<O>.in_set(LodSet::SyncState),
          systems::sync_lod_render::<O>.in_set(LodSet::SyncRender),
        ),
      );
  }
}
