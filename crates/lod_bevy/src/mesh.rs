//! Triangle mesh result shared by mesh-producing levels.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;

/// Indexed triangle mesh exported by a data pipeline.
///
/// `generation` changes on every export so render pipelines can skip
/// re-uploading a mesh they already show.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LodMesh {
  pub positions: Vec<[f32; 3]>,
  pub normals: Vec<[f32; 3]>,
  pub indices: Vec<u32>,
  pub generation: u64,
}

impl LodMesh {
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.positions.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.indices.len() / 3
  }

  /// Copy geometry from `source` and bump the generation.
  pub fn replace_with(&mut self, source: &LodMesh) {
    self.positions.clone_from(&source.positions);
    self.normals.clone_from(&source.normals);
    self.indices.clone_from(&source.indices);
    self.generation = self.generation.wrapping_add(1);
  }

  /// Drop all geometry and bump the generation.
  pub fn clear(&mut self) {
    self.positions.clear();
    self.normals.clear();
    self.indices.clear();
    self.generation = self.generation.wrapping_add(1);
  }

  /// Axis-aligned bounds of the vertex positions.
  pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
    let first = *self.positions.first()?;
    Some(self.positions.iter().fold((first, first), |(mut min, mut max), p| {
      for axis in 0..3 {
        min[axis] = min[axis].min(p[axis]);
        max[axis] = max[axis].max(p[axis]);
      }
      (min, max)
    }))
  }

  /// Convert to a Bevy mesh asset.
  pub fn to_bevy_mesh(&self) -> Mesh {
    let mut mesh = Mesh::new(
      PrimitiveTopology::TriangleList,
      RenderAssetUsages::default(),
    );

    if self.is_empty() {
      return mesh;
    }

    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions.clone());
    mesh.insert_indices(Indices::U32(self.indices.clone()));
    if self.normals.len() == self.positions.len() {
      mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, self.normals.clone());
    } else {
      // Pipelines may skip normals for placeholder geometry.
      mesh.compute_smooth_normals();
    }

    mesh
  }
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
