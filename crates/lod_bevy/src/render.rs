//! Render pipeline that presents a `LodMesh` level as a Bevy entity.
//!
//! Each attached level owns one entity, spawned hidden in `init`. The
//! scheduler guarantees at most one level per object is enabled, so the
//! entities never show two representations at once.

use std::marker::PhantomData;

use bevy::prelude::*;
use lod_scheduler::{LevelOfDetail, LodObject, ObjectState, RenderPipeline};

use crate::mesh::LodMesh;

/// Object state that mesh levels can be presented from.
pub trait MeshObjectState: ObjectState {
  /// Whether the live level should be shown at all.
  fn visible(&self) -> bool {
    true
  }

  /// Placement of the object's entities.
  fn transform(&self) -> Transform {
    Transform::IDENTITY
  }
}

/// Marks the entity presenting one level of a scheduled object.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LodMeshEntity {
  pub level: LevelOfDetail,
}

/// Presents a `LodMesh` level with a standard material.
pub struct MeshLodRenderPipeline<O> {
  level: LevelOfDetail,
  name: String,
  material: Handle<StandardMaterial>,
  entity: Option<Entity>,
  /// Generation of the mesh currently on the entity.
  uploaded: Option<u64>,
  _object: PhantomData<fn() -> O>,
}

impl<O> MeshLodRenderPipeline<O> {
  pub fn new(level: LevelOfDetail, name: impl Into<String>, material: Handle<StandardMaterial>) -> Self {
    Self {
      level,
      name: name.into(),
      material,
      entity: None,
      uploaded: None,
      _object: PhantomData,
    }
  }

  pub fn entity(&self) -> Option<Entity> {
    self.entity
  }

  fn set_visibility(&self, world: &mut World, visibility: Visibility) {
    let Some(entity) = self.entity else {
      return;
    };
    if let Some(mut current) = world.get_mut::<Visibility>(entity) {
      current.set_if_neq(visibility);
    }
  }
}

impl<O> RenderPipeline<O> for MeshLodRenderPipeline<O>
where
  O: LodObject<Context = World, Result = LodMesh>,
  O::State: MeshObjectState,
{
  fn init(&mut self, state: &O::State, world: &mut World) {
    let entity = world
      .spawn((
        Name::new(format!("{} ({})", self.name, self.level)),
        LodMeshEntity { level: self.level },
        state.transform(),
        Visibility::Hidden,
      ))
      .id();
    self.entity = Some(entity);
    self.uploaded = None;
  }

  fn update(&mut self, state: &O::State, _app: &O::App, world: &mut World, result: &LodMesh) {
    let Some(entity) = self.entity else {
      return;
    };
    if world.get_entity(entity).is_err() {
      warn!("{} ({}) entity was despawned externally", self.name, self.level);
      self.entity = None;
      return;
    }

    if self.uploaded != Some(result.generation) {
      if let Some(mut meshes) = world.get_resource_mut::<Assets<Mesh>>() {
        let handle = meshes.add(result.to_bevy_mesh());
        world
          .entity_mut(entity)
          .insert((Mesh3d(handle), MeshMaterial3d(self.material.clone())));
        self.uploaded = Some(result.generation);
        debug!(
          "{} ({}) uploaded mesh generation {} ({} triangles)",
          self.name,
          self.level,
          result.generation,
          result.triangle_count()
        );
      }
    }

    if let Some(mut transform) = world.get_mut::<Transform>(entity) {
      transform.set_if_neq(state.transform());
    }

    let visibility = if state.visible() && !result.is_empty() {
      Visibility::Inherited
    } else {
      Visibility::Hidden
    };
    self.set_visibility(world, visibility);
  }

  fn disable(&mut self, world: &mut World) {
    self.set_visibility(world, Visibility::Hidden);
  }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;
