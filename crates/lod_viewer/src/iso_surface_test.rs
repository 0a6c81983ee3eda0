use lod_scheduler::{LodScheduler, LodStatus};

use super::*;
use crate::field::default_blobs;

fn field() -> ScalarField {
  ScalarField::from_blobs(33, &default_blobs())
}

fn object() -> IsoSurfaceObject {
  IsoSurfaceObject::new(field(), 4, std::array::from_fn(|_| Handle::default()))
}

fn state(iso_value: f32) -> IsoState {
  IsoState {
    iso_value,
    visible: true,
  }
}

#[test]
fn test_contour_pipeline_tracks_iso_value() {
  let settings = ViewerSettings::default();
  let mut pipeline = ContourPipeline::new(Arc::new(field()));
  let mut result = LodMesh::default();

  pipeline.configure(&state(0.5), &settings);
  assert!(pipeline.needs_update(&result));
  pipeline.execute();
  pipeline.export_result(&mut result);
  assert!(!result.is_empty());
  assert_eq!(result.generation, 1);

  pipeline.configure(&state(0.5), &settings);
  assert!(!pipeline.needs_update(&result));

  pipeline.configure(&state(0.7), &settings);
  assert!(pipeline.needs_update(&result));
  let before = result.triangle_count();
  pipeline.execute();
  pipeline.export_result(&mut result);
  assert!(result.triangle_count() < before, "higher iso value encloses less");
}

#[test]
fn test_bounds_pipeline() {
  let settings = ViewerSettings::default();
  let mut pipeline = BoundsPipeline::new(Arc::new(field().decimate(HINT_STRIDE)));
  let mut result = LodMesh::default();
  assert!(pipeline.force_synchronous());

  pipeline.configure(&state(0.5), &settings);
  pipeline.execute();
  pipeline.export_result(&mut result);
  assert_eq!(result.triangle_count(), 12);

  // Nothing in the field reaches 100.
  pipeline.configure(&state(100.0), &settings);
  assert!(pipeline.needs_update(&result));
  pipeline.execute();
  pipeline.export_result(&mut result);
  assert!(result.is_empty());
  assert_eq!(result.generation, 2);
}

#[test]
fn test_hint_then_hires() {
  let settings = ViewerSettings::default();
  let mut scheduler = LodScheduler::with_defaults(object(), &settings);

  let report = scheduler.sync_state(&settings);
  assert_eq!(report.ran_inline, std::iter::once(LevelOfDetail::Hint).collect());
  assert_eq!(scheduler.live_level(), Some(LevelOfDetail::Hint));

  scheduler.finish_all();
  scheduler.sync_state(&settings);
  assert_eq!(scheduler.live_level(), Some(LevelOfDetail::HiRes));

  let hires = scheduler.result(LevelOfDetail::HiRes).map(LodMesh::triangle_count);
  let lores = scheduler.result(LevelOfDetail::LoRes).map(LodMesh::triangle_count);
  assert!(hires > lores, "hi-res {hires:?} vs lo-res {lores:?}");
}

#[test]
fn test_iso_change_falls_back_to_hint() {
  let mut settings = ViewerSettings::default();
  let mut scheduler = LodScheduler::with_defaults(object(), &settings);
  scheduler.sync_state(&settings);
  scheduler.finish_all();
  scheduler.sync_state(&settings);

  settings.iso_value = 0.6;
  let report = scheduler.sync_state(&settings);

  assert_eq!(report.live, Some(LevelOfDetail::Hint));
  assert!(report.ran_inline.contains(LevelOfDetail::Hint));
  assert!(report.launched.contains(LevelOfDetail::HiRes));
  assert!(report.launched.contains(LevelOfDetail::LoRes));
  assert_eq!(scheduler.status(LevelOfDetail::HiRes), LodStatus::Updating);

  scheduler.finish_all();
  let report = scheduler.sync_state(&settings);
  assert!(!report.changed());
  assert_eq!(report.live, Some(LevelOfDetail::HiRes));
}

#[test]
fn test_show_surface_is_state_only() {
  let mut settings = ViewerSettings::default();
  let mut scheduler = LodScheduler::with_defaults(object(), &settings);
  scheduler.sync_state(&settings);
  scheduler.finish_all();
  scheduler.sync_state(&settings);

  settings.show_surface = false;
  let report = scheduler.sync_state(&settings);
  assert!(!report.changed(), "hiding must not trigger recomputation");
  assert!(!scheduler.state().visible());
}
