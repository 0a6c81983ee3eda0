//! Mesh-producing test object for bridge tests.

use bevy::prelude::*;
use lod_scheduler::{DataPipeline, LevelOfDetail, LodObject, ObjectState, RenderPipeline};

use crate::mesh::LodMesh;
use crate::render::{MeshLodRenderPipeline, MeshObjectState};

/// Host settings driving the test object.
#[derive(Resource, Clone, Debug)]
pub struct QuadSettings {
  pub size: f32,
  pub visible: bool,
}

impl Default for QuadSettings {
  fn default() -> Self {
    Self {
      size: 1.0,
      visible: true,
    }
  }
}

#[derive(Debug)]
pub struct QuadState {
  pub size: f32,
  pub visible: bool,
}

impl ObjectState for QuadState {
  type App = QuadSettings;

  fn update(&mut self, app: &QuadSettings) {
    self.size = app.size;
    self.visible = app.visible;
  }
}

impl MeshObjectState for QuadState {
  fn visible(&self) -> bool {
    self.visible
  }
}

/// Square of side `size` in the XY plane: HiRes as two triangles on a worker,
/// Hint as one triangle inline.
#[derive(Default)]
pub struct QuadObject;

impl LodObject for QuadObject {
  type App = QuadSettings;
  type Context = World;
  type State = QuadState;
  type Result = LodMesh;

  fn create_state(&self, app: &QuadSettings) -> QuadState {
    QuadState {
      size: app.size,
      visible: app.visible,
    }
  }

  fn create_data_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn DataPipeline<Self>>> {
    match level {
      LevelOfDetail::HiRes => Some(Box::new(QuadPipeline::new(false))),
      LevelOfDetail::LoRes => None,
      LevelOfDetail::Hint => Some(Box::new(QuadPipeline::new(true))),
    }
  }

  fn create_render_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn RenderPipeline<Self>>> {
    Some(Box::new(MeshLodRenderPipeline::new(
      level,
      "quad",
      Handle::default(),
    )))
  }

  fn label(&self) -> &str {
    "quad"
  }
}

pub struct QuadPipeline {
  inline: bool,
  size: f32,
  mesh: LodMesh,
}

impl QuadPipeline {
  fn new(inline: bool) -> Self {
    Self {
      inline,
      size: 0.0,
      mesh: LodMesh::default(),
    }
  }
}

impl DataPipeline<QuadObject> for QuadPipeline {
  fn configure(&mut self, state: &QuadState, _app: &QuadSettings) {
    self.size = state.size;
  }

  fn needs_update(&self, result: &LodMesh) -> bool {
    result.bounds().map(|(_, max)| max[1]) != Some(self.size)
  }

  fn execute(&mut self) {
    let s = self.size;
    self.mesh.positions = vec![[0.0, 0.0, 0.0], [s, 0.0, 0.0], [s, s, 0.0], [0.0, s, 0.0]];
    self.mesh.normals = vec![[0.0, 0.0, 1.0]; 4];
    self.mesh.indices = if self.inline {
      vec![0, 1, 2]
    } else {
      vec![0, 1, 2, 0, 2, 3]
    };
  }

  fn export_result(&self, result: &mut LodMesh) {
    result.replace_with(&self.mesh);
  }

  fn force_synchronous(&self) -> bool {
    self.inline
  }
}
