//! Iso-surface of a scalar field as a scheduled LOD object.
//!
//! | level  | pipeline         | runs on          |
//! |--------|------------------|------------------|
//! | HiRes  | full-grid contour| worker           |
//! | LoRes  | decimated contour| worker           |
//! | Hint   | bounding box     | scheduler thread |

use std::sync::Arc;

use bevy::prelude::*;
use fast_surface_nets::SurfaceNetsBuffer;
use lod_bevy::{LodMesh, MeshLodRenderPipeline, MeshObjectState};
use lod_scheduler::{DataPipeline, LevelOfDetail, LodObject, ObjectState, RenderPipeline};

use crate::contour::{box_mesh, contour, iso_bounds};
use crate::field::ScalarField;

/// Stride of the grid the hint's bounding box is computed on.
const HINT_STRIDE: u32 = 8;

/// User-facing settings the surface follows.
#[derive(Resource, Clone, Debug, PartialEq)]
pub struct ViewerSettings {
  pub iso_value: f32,
  pub show_surface: bool,
}

impl Default for ViewerSettings {
  fn default() -> Self {
    Self {
      iso_value: 0.5,
      show_surface: true,
    }
  }
}

#[derive(Debug)]
pub struct IsoState {
  pub iso_value: f32,
  pub visible: bool,
}

impl ObjectState for IsoState {
  type App = ViewerSettings;

  fn update(&mut self, settings: &ViewerSettings) {
    self.iso_value = settings.iso_value;
    self.visible = settings.show_surface;
  }
}

impl MeshObjectState for IsoState {
  fn visible(&self) -> bool {
    self.visible
  }
}

/// The iso-surface object. Each level samples its own copy of the field.
pub struct IsoSurfaceObject {
  full: Arc<ScalarField>,
  decimated: Arc<ScalarField>,
  hint: Arc<ScalarField>,
  /// Indexed by `LevelOfDetail::index()`.
  materials: [Handle<StandardMaterial>; LevelOfDetail::COUNT],
}

impl IsoSurfaceObject {
  pub fn new(
    field: ScalarField,
    lores_stride: u32,
    materials: [Handle<StandardMaterial>; LevelOfDetail::COUNT],
  ) -> Self {
    Self {
      decimated: Arc::new(field.decimate(lores_stride)),
      hint: Arc::new(field.decimate(HINT_STRIDE)),
      full: Arc::new(field),
      materials,
    }
  }
}

impl LodObject for IsoSurfaceObject {
  type App = ViewerSettings;
  type Context = World;
  type State = IsoState;
  type Result = LodMesh;

  fn create_state(&self, settings: &ViewerSettings) -> IsoState {
    IsoState {
      iso_value: settings.iso_value,
      visible: settings.show_surface,
    }
  }

  fn create_data_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn DataPipeline<Self>>> {
    let pipeline: Box<dyn DataPipeline<Self>> = match level {
      LevelOfDetail::HiRes => Box::new(ContourPipeline::new(Arc::clone(&self.full))),
      LevelOfDetail::LoRes => Box::new(ContourPipeline::new(Arc::clone(&self.decimated))),
      LevelOfDetail::Hint => Box::new(BoundsPipeline::new(Arc::clone(&self.hint))),
    };
    Some(pipeline)
  }

  fn create_render_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn RenderPipeline<Self>>> {
    Some(Box::new(MeshLodRenderPipeline::new(
      level,
      "iso surface",
      self.materials[level.index()].clone(),
    )))
  }

  fn label(&self) -> &str {
    "iso surface"
  }
}

// =============================================================================
// Pipelines
// =============================================================================

/// Surface Nets contour of one field at the configured iso value.
pub struct ContourPipeline {
  field: Arc<ScalarField>,
  iso_value: f32,
  /// Iso value the held mesh was built for.
  built_for: Option<f32>,
  buffer: SurfaceNetsBuffer,
  mesh: LodMesh,
}

impl ContourPipeline {
  pub fn new(field: Arc<ScalarField>) -> Self {
    Self {
      field,
      iso_value: 0.0,
      built_for: None,
      buffer: SurfaceNetsBuffer::default(),
      mesh: LodMesh::default(),
    }
  }
}

impl DataPipeline<IsoSurfaceObject> for ContourPipeline {
  fn configure(&mut self, state: &IsoState, _settings: &ViewerSettings) {
    self.iso_value = state.iso_value;
  }

  fn needs_update(&self, result: &LodMesh) -> bool {
    // A fresh result has never been exported to.
    result.generation == 0 || self.built_for != Some(self.iso_value)
  }

  fn execute(&mut self) {
    contour(&self.field, self.iso_value, &mut self.buffer, &mut self.mesh);
    self.built_for = Some(self.iso_value);
  }

  fn export_result(&self, result: &mut LodMesh) {
    result.replace_with(&self.mesh);
  }
}

/// Box around the region above the iso value. Cheap enough to run inline.
pub struct BoundsPipeline {
  field: Arc<ScalarField>,
  iso_value: f32,
  built_for: Option<f32>,
  mesh: LodMesh,
}

impl BoundsPipeline {
  pub fn new(field: Arc<ScalarField>) -> Self {
    Self {
      field,
      iso_value: 0.0,
      built_for: None,
      mesh: LodMesh::default(),
    }
  }
}

impl DataPipeline<IsoSurfaceObject> for BoundsPipeline {
  fn configure(&mut self, state: &IsoState, _settings: &ViewerSettings) {
    self.iso_value = state.iso_value;
  }

  fn needs_update(&self, result: &LodMesh) -> bool {
    result.generation == 0 || self.built_for != Some(self.iso_value)
  }

  fn execute(&mut self) {
    match iso_bounds(&self.field, self.iso_value) {
      Some((min, max)) => box_mesh(min, max, &mut self.mesh),
      None => self.mesh.clear(),
    }
    self.built_for = Some(self.iso_value);
  }

  fn export_result(&self, result: &mut LodMesh) {
    result.replace_with(&self.mesh);
  }

  fn force_synchronous(&self) -> bool {
    true
  }
}

#[cfg(test)]
#[path = "iso_surface_test.rs"]
mod iso_surface_test;
