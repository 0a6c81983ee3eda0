//! Sampled scalar fields.
//!
//! Values are stored x-fastest (`x + X * (y + Y * z)`), the same
//! linearization `fast_surface_nets` uses for its input.

/// Gaussian bump contributing to a field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
  pub center: [f32; 3],
  pub radius: f32,
  pub weight: f32,
}

impl Blob {
  pub fn value_at(&self, p: [f32; 3]) -> f32 {
    let d2: f32 = (0..3).map(|i| (p[i] - self.center[i]).powi(2)).sum();
    self.weight * (-d2 / (self.radius * self.radius)).exp()
  }
}

/// A handful of overlapping blobs in the unit cube around the origin.
pub fn default_blobs() -> Vec<Blob> {
  vec![
    Blob { center: [0.0, 0.0, 0.0], radius: 0.45, weight: 1.0 },
    Blob { center: [0.45, 0.2, -0.1], radius: 0.3, weight: 0.9 },
    Blob { center: [-0.4, -0.25, 0.3], radius: 0.35, weight: 0.8 },
    Blob { center: [0.1, 0.55, 0.35], radius: 0.2, weight: 0.7 },
    Blob { center: [-0.2, 0.4, -0.5], radius: 0.25, weight: 0.6 },
  ]
}

/// Regular grid of samples.
#[derive(Clone, Debug)]
pub struct ScalarField {
  dims: [u32; 3],
  spacing: f32,
  /// World position of sample (0, 0, 0).
  origin: [f32; 3],
  values: Vec<f32>,
}

impl ScalarField {
  /// Sample `f` at every grid point of a grid centred on the origin.
  pub fn from_fn(dims: [u32; 3], spacing: f32, f: impl Fn([f32; 3]) -> f32) -> Self {
    let origin = dims.map(|d| -((d.max(1) - 1) as f32) * spacing * 0.5);
    let len = dims.iter().map(|&d| d as usize).product();
    let mut values = Vec::with_capacity(len);
    for z in 0..dims[2] {
      for y in 0..dims[1] {
        for x in 0..dims[0] {
          values.push(f([
            origin[0] + x as f32 * spacing,
            origin[1] + y as f32 * spacing,
            origin[2] + z as f32 * spacing,
          ]));
        }
      }
    }
    Self {
      dims,
      spacing,
      origin,
      values,
    }
  }

  /// Sum of `blobs` over the cube [-1, 1]³ at `resolution` samples per axis.
  pub fn from_blobs(resolution: u32, blobs: &[Blob]) -> Self {
    let resolution = resolution.max(2);
    let spacing = 2.0 / (resolution - 1) as f32;
    Self::from_fn([resolution; 3], spacing, |p| {
      blobs.iter().map(|blob| blob.value_at(p)).sum()
    })
  }

  pub fn dims(&self) -> [u32; 3] {
    self.dims
  }

  pub fn spacing(&self) -> f32 {
    self.spacing
  }

  /// World position of sample (0, 0, 0).
  pub fn origin(&self) -> [f32; 3] {
    self.origin
  }

  pub fn values(&self) -> &[f32] {
    &self.values
  }

  #[inline]
  pub fn index(&self, x: u32, y: u32, z: u32) -> usize {
    x as usize + self.dims[0] as usize * (y as usize + self.dims[1] as usize * z as usize)
  }

  pub fn value(&self, x: u32, y: u32, z: u32) -> f32 {
    self.values[self.index(x, y, z)]
  }

  /// World position of a (possibly fractional) grid coordinate.
  pub fn world_position(&self, grid: [f32; 3]) -> [f32; 3] {
    let origin = self.origin;
    [
      origin[0] + grid[0] * self.spacing,
      origin[1] + grid[1] * self.spacing,
      origin[2] + grid[2] * self.spacing,
    ]
  }

  /// Largest sample value.
  pub fn peak(&self) -> f32 {
    self.values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
  }

  /// Keep every `stride`-th sample along each axis.
  ///
  /// The result covers the same extent when `dims - 1` is a multiple of `stride`.
  pub fn decimate(&self, stride: u32) -> ScalarField {
    let stride = stride.max(1);
    let dims = self.dims.map(|d| (d.max(1) - 1) / stride + 1);
    let mut values = Vec::with_capacity(dims.iter().map(|&d| d as usize).product());
    for z in 0..dims[2] {
      for y in 0..dims[1] {
        for x in 0..dims[0] {
          values.push(self.value(x * stride, y * stride, z * stride));
        }
      }
    }
    ScalarField {
      dims,
      spacing: self.spacing * stride as f32,
      origin: self.origin,
      values,
    }
  }

  /// Grid bounds (inclusive) of samples at or above `iso`.
  pub fn bounds_above(&self, iso: f32) -> Option<([u32; 3], [u32; 3])> {
    let mut bounds: Option<([u32; 3], [u32; 3])> = None;
    for z in 0..self.dims[2] {
      for y in 0..self.dims[1] {
        for x in 0..self.dims[0] {
          if self.value(x, y, z) < iso {
            continue;
          }
          let p = [x, y, z];
          bounds = Some(match bounds {
            None => (p, p),
            Some((min, max)) => (
              [min[0].min(x), min[1].min(y), min[2].min(z)],
              [max[0].max(x), max[1].max(y), max[2].max(z)],
            ),
          });
        }
      }
    }
    bounds
  }
}

#[cfg(test)]
#[path = "field_test.rs"]
mod field_test;
