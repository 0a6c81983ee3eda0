//! Geometry producers for the iso-surface levels.

use fast_surface_nets::ndshape::RuntimeShape;
use fast_surface_nets::{surface_nets, SurfaceNetsBuffer};
use lod_bevy::LodMesh;

use crate::field::ScalarField;

/// Extract the `iso` level set of `field` with Surface Nets.
///
/// Samples above `iso` are inside. Positions are in world space, normals
/// point outward and are unit length.
pub fn contour(field: &ScalarField, iso: f32, buffer: &mut SurfaceNetsBuffer, out: &mut LodMesh) {
  out.positions.clear();
  out.normals.clear();
  out.indices.clear();

  let dims = field.dims();
  if dims.iter().any(|&d| d < 2) {
    return;
  }

  // Negative inside: distance grows away from the dense region.
  let sdf: Vec<f32> = field.values().iter().map(|value| iso - value).collect();
  let shape = RuntimeShape::<u32, 3>::new(dims);
  surface_nets(&sdf, &shape, [0; 3], dims.map(|d| d - 1), buffer);

  out.positions.extend(buffer.positions.iter().map(|&p| field.world_position(p)));
  out.normals.extend(buffer.normals.iter().map(|&n| normalize_or_up(n)));
  out.indices.extend_from_slice(&buffer.indices);
}

/// Axis-aligned box mesh with flat face normals.
pub fn box_mesh(min: [f32; 3], max: [f32; 3], out: &mut LodMesh) {
  out.positions.clear();
  out.normals.clear();
  out.indices.clear();

  // (normal axis, sign): one quad per face.
  for axis in 0..3 {
    for positive in [false, true] {
      let u = (axis + 1) % 3;
      let v = (axis + 2) % 3;
      let plane = if positive { max[axis] } else { min[axis] };
      let mut normal = [0.0; 3];
      normal[axis] = if positive { 1.0 } else { -1.0 };

      let base = out.positions.len() as u32;
      for (du, dv) in [(false, false), (true, false), (true, true), (false, true)] {
        let mut p = [0.0; 3];
        p[axis] = plane;
        p[u] = if du { max[u] } else { min[u] };
        p[v] = if dv { max[v] } else { min[v] };
        out.positions.push(p);
        out.normals.push(normal);
      }

      // u x v == +axis, so the positive face winds counter-clockwise as is.
      if positive {
        out.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
      } else {
        out.indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
      }
    }
  }
}

/// World-space box around the samples at or above `iso`, padded by one cell.
pub fn iso_bounds(field: &ScalarField, iso: f32) -> Option<([f32; 3], [f32; 3])> {
  let (min, max) = field.bounds_above(iso)?;
  let dims = field.dims();
  let lo = min.map(|i| i.saturating_sub(1) as f32);
  let hi = [0, 1, 2].map(|axis| (max[axis] + 1).min(dims[axis] - 1) as f32);
  Some((field.world_position(lo), field.world_position(hi)))
}

fn normalize_or_up(n: [f32; 3]) -> [f32; 3] {
  let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
  if len > f32::EPSILON {
    [n[0] / len, n[1] / len, n[2] / len]
  } else {
    [0.0, 1.0, 0.0]
  }
}

#[cfg(test)]
#[path = "contour_test.rs"]
mod contour_test;
