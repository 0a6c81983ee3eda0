//! Camera, lights, keyboard controls and the status line.

use bevy::prelude::*;
use lod_bevy::{BackgroundWork, LodSchedulers, LodSet};
use lod_scheduler::LevelOfDetail;

use crate::iso_surface::{IsoSurfaceObject, ViewerSettings};

const ISO_STEP: f32 = 0.05;
const ISO_RANGE: (f32, f32) = (0.05, 1.5);
/// Radians per second.
const ORBIT_SPEED: f32 = 0.2;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
  fn build(&self, app: &mut App) {
    app
      .add_plugins(ControlsPlugin)
      .add_systems(Startup, setup_scene);
  }
}

/// Keyboard controls, camera orbit and the status line.
pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
  fn build(&self, app: &mut App) {
    app.add_systems(
      Update,
      (
        // Same-frame: the scheduler must see this frame's settings.
        adjust_settings.before(LodSet::SyncState),
        orbit_camera,
        update_status,
      ),
    );
  }
}

#[derive(Component)]
pub struct ViewerCamera;

#[derive(Component)]
pub struct StatusText;

/// One material per level so the live level is recognisable on screen.
pub fn level_materials(
  materials: &mut Assets<StandardMaterial>,
) -> [Handle<StandardMaterial>; LevelOfDetail::COUNT] {
  LevelOfDetail::ALL.map(|level| {
    let base_color = match level {
      LevelOfDetail::HiRes => Color::srgb(0.9, 0.55, 0.3),
      LevelOfDetail::LoRes => Color::srgb(0.3, 0.7, 0.75),
      LevelOfDetail::Hint => Color::srgba(0.7, 0.7, 0.7, 0.35),
    };
    materials.add(StandardMaterial {
      base_color,
      perceptual_roughness: 0.6,
      double_sided: true,
      cull_mode: None,
      alpha_mode: if level == LevelOfDetail::Hint {
        AlphaMode::Blend
      } else {
        AlphaMode::Opaque
      },
      ..default()
    })
  })
}

fn setup_scene(mut commands: Commands) {
  commands.spawn((
    Camera3d::default(),
    Transform::from_xyz(0.0, 1.2, 3.2).looking_at(Vec3::ZERO, Vec3::Y),
    ViewerCamera,
  ));

  commands.spawn((
    DirectionalLight {
      illuminance: 8000.0,
      shadows_enabled: true,
      ..default()
    },
    Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.8, 0.5, 0.0)),
  ));

  commands.insert_resource(AmbientLight {
    color: Color::srgb(0.6, 0.7, 0.8),
    brightness: 200.0,
    affects_lightmapped_meshes: false,
  });

  commands.spawn((
    Text::new(""),
    Node {
      position_type: PositionType::Absolute,
      top: Val::Px(12.0),
      left: Val::Px(12.0),
      ..default()
    },
    StatusText,
  ));
}

/// Up/Down move the iso value, H toggles the surface.
fn adjust_settings(keys: Res<ButtonInput<KeyCode>>, mut settings: ResMut<ViewerSettings>) {
  let mut iso_value = settings.iso_value;
  if keys.just_pressed(KeyCode::ArrowUp) {
    iso_value += ISO_STEP;
  }
  if keys.just_pressed(KeyCode::ArrowDown) {
    iso_value -= ISO_STEP;
  }
  let iso_value = iso_value.clamp(ISO_RANGE.0, ISO_RANGE.1);
  if iso_value != settings.iso_value {
    settings.iso_value = iso_value;
    info!("iso value {iso_value:.2}");
  }

  if keys.just_pressed(KeyCode::KeyH) {
    settings.show_surface = !settings.show_surface;
    info!("surface {}", if settings.show_surface { "shown" } else { "hidden" });
  }
}

fn orbit_camera(time: Res<Time>, mut cameras: Query<&mut Transform, With<ViewerCamera>>) {
  let rotation = Quat::from_rotation_y(time.delta_secs() * ORBIT_SPEED);
  for mut transform in &mut cameras {
    transform.rotate_around(Vec3::ZERO, rotation);
  }
}

fn update_status(
  settings: Res<ViewerSettings>,
  work: Res<BackgroundWork>,
  schedulers: Option<NonSend<LodSchedulers<IsoSurfaceObject>>>,
  mut texts: Query<&mut Text, With<StatusText>>,
) {
  let live = schedulers
    .as_ref()
    .and_then(|schedulers| schedulers.get(0))
    .and_then(|scheduler| scheduler.live_level())
    .map_or("none", LevelOfDetail::label);

  let status = format!(
    "iso {:.2}{}  |  live: {live}  |  background tasks: {}\n[Up/Down] iso value  [H] hide{}",
    settings.iso_value,
    if settings.show_surface { "" } else { " (hidden)" },
    work.outstanding(),
    metrics_line(schedulers.as_deref()),
  );

  for mut text in &mut texts {
    if text.0 != status {
      text.0.clone_from(&status);
    }
  }
}

#[cfg(feature = "metrics")]
fn metrics_line(schedulers: Option<&LodSchedulers<IsoSurfaceObject>>) -> String {
  let Some(scheduler) = schedulers.and_then(|schedulers| schedulers.get(0)) else {
    return String::new();
  };
  let metrics = scheduler.metrics();
  format!(
    "\nhi-res avg {:.1} ms  |  launches {}",
    metrics.avg_execute_us(LevelOfDetail::HiRes) / 1000.0,
    metrics.total_launches()
  )
}

#[cfg(not(feature = "metrics"))]
fn metrics_line(_schedulers: Option<&LodSchedulers<IsoSurfaceObject>>) -> String {
  String::new()
}

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;
