use super::*;

#[test]
fn test_default_is_unbounded() {
  let config = SchedulerConfig::default();
  assert_eq!(config.worker_threads, 0);
  assert!(config.allows_launch(100, 100));
}

#[test]
fn test_empty_toml_uses_defaults() {
  let config = SchedulerConfig::from_toml_str("").unwrap();
  assert_eq!(config, SchedulerConfig::default());
}

#[test]
fn test_parse_full_config() {
  let config = SchedulerConfig::from_toml_str(
    r#"
      worker_threads = 3
      max_launches_per_frame = 1
      max_in_flight = 2
    "#,
  )
  .unwrap();

  assert_eq!(config.worker_threads, 3);
  assert_eq!(config.max_launches_per_frame, Some(1));
  assert_eq!(config.max_in_flight, Some(2));
}

#[test]
fn test_unknown_field_rejected() {
  let err = SchedulerConfig::from_toml_str("max_tasks = 4").unwrap_err();
  assert!(matches!(err, SchedulerError::ConfigParse(_)), "got {err:?}");
}

#[test]
fn test_zero_caps_rejected() {
  let err = SchedulerConfig::from_toml_str("max_launches_per_frame = 0").unwrap_err();
  assert!(matches!(err, SchedulerError::InvalidConfig(_)), "got {err:?}");

  let err = SchedulerConfig::from_toml_str("max_in_flight = 0").unwrap_err();
  assert!(matches!(err, SchedulerError::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn test_missing_file_reports_path() {
  let err = SchedulerConfig::load(Path::new("/nonexistent/lod_scheduler.toml")).unwrap_err();
  match err {
    SchedulerError::ConfigRead { path, .. } => {
      assert_eq!(path, Path::new("/nonexistent/lod_scheduler.toml"));
    }
    other => panic!("unexpected error {other:?}"),
  }
}

/// Per-frame cap counts launches made in this pass only.
#[test]
fn test_launch_cap_per_frame() {
  let config = SchedulerConfig::default().with_max_launches_per_frame(1);
  assert!(config.allows_launch(0, 5));
  assert!(!config.allows_launch(1, 0));
}

/// In-flight cap counts every updating level, including older launches.
#[test]
fn test_in_flight_cap() {
  let config = SchedulerConfig::default().with_max_in_flight(2);
  assert!(config.allows_launch(0, 1));
  assert!(!config.allows_launch(0, 2));
}
