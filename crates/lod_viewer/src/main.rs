//! lod_viewer - interactive iso-surface viewer
//!
//! Contours a synthetic scalar field at three levels of detail. The hint box
//! is shown on the first frame, the coarse and full contours replace it as
//! background tasks finish, and changing the iso value falls back to cheaper
//! levels until the better ones are recomputed.
//!
//! Controls:
//! - Up/Down: change the iso value
//! - H: hide/show the surface

mod contour;
mod field;
mod iso_surface;
mod scene;

use std::path::PathBuf;

use anyhow::{ensure, Context as _, Result};
use bevy::prelude::*;
use clap::Parser;
use lod_bevy::{add_lod_object, LodSchedulerPlugin};
use lod_scheduler::SchedulerConfig;

use field::{default_blobs, ScalarField};
use iso_surface::{IsoSurfaceObject, ViewerSettings};
use scene::{level_materials, ScenePlugin};

/// Iso-surface viewer with background level-of-detail refinement.
#[derive(Parser, Debug)]
#[command(name = "lod_viewer")]
#[command(about = "Iso-surface viewer with background level-of-detail refinement")]
struct Args {
  /// Scheduler configuration TOML file.
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Samples per axis of the full-resolution field.
  #[arg(short, long, default_value_t = 96)]
  resolution: u32,

  /// Sample stride of the lo-res contour.
  #[arg(long, default_value_t = 4)]
  lores_stride: u32,

  /// Initial iso value.
  #[arg(long, default_value_t = 0.5)]
  iso: f32,
}

fn main() -> Result<()> {
  let args = Args::parse();
  ensure!(args.resolution >= 2, "resolution must be at least 2");
  ensure!(args.lores_stride >= 1, "lores-stride must be at least 1");

  let config = match &args.config {
    Some(path) => SchedulerConfig::load(path)
      .with_context(|| format!("Failed to load scheduler config: {}", path.display()))?,
    None => SchedulerConfig::default(),
  };

  let field = ScalarField::from_blobs(args.resolution, &default_blobs());

  let mut app = App::new();
  app
    .add_plugins(DefaultPlugins.set(WindowPlugin {
      primary_window: Some(Window {
        title: "LOD Viewer - Iso Surface".into(),
        resolution: (1280, 800).into(),
        ..default()
      }),
      ..default()
    }))
    .add_plugins(LodSchedulerPlugin::<IsoSurfaceObject>::default())
    .add_plugins(ScenePlugin)
    .insert_resource(ViewerSettings {
      iso_value: args.iso,
      show_surface: true,
    });

  info!(
    "field {}³ (peak {:.2}), lo-res stride {}, scheduler {:?}",
    args.resolution,
    field.peak(),
    args.lores_stride,
    config
  );

  let materials = level_materials(&mut app.world_mut().resource_mut::<Assets<StandardMaterial>>());
  let object = IsoSurfaceObject::new(field, args.lores_stride, materials);
  add_lod_object(app.world_mut(), object, config)?;

  if let AppExit::Error(code) = app.run() {
    anyhow::bail!("viewer exited with code {code}");
  }
  Ok(())
}
