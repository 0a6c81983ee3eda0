//! Test utilities for scheduler tests.
//!
//! Provides a scripted object family whose pipelines can be held back by a
//! gate, panic on demand, and report how often and how concurrently they
//! ran, plus a render pipeline that records what it was asked to show.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{self as channel, Receiver, Sender};

use crate::level::LevelOfDetail;
use crate::pipeline::{DataPipeline, LodObject, ObjectState, RenderPipeline};
use crate::scheduler::LodScheduler;
use crate::threading::TaskExecutor;

// =============================================================================
// Host-side types
// =============================================================================

/// Host application state: one parameter every sensitive level depends on.
#[derive(Clone, Debug, Default)]
pub struct TestApp {
  pub param: u32,
}

impl TestApp {
  pub fn new(param: u32) -> Self {
    Self { param }
  }
}

#[derive(Debug)]
pub struct TestState {
  pub param: u32,
  pub visible: bool,
  pub updates: usize,
}

impl ObjectState for TestState {
  type App = TestApp;

  fn update(&mut self, app: &TestApp) {
    self.param = app.param;
    self.updates += 1;
  }
}

/// Exported result: which configuration produced it and who exported it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestResult {
  pub key: Option<u32>,
  pub level: Option<LevelOfDetail>,
  pub exports: u32,
}

/// What a render pipeline was asked to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderEvent {
  Init(LevelOfDetail),
  Update(LevelOfDetail, Option<u32>),
  Disable(LevelOfDetail),
}

/// Rendering context that records events and current visibility.
#[derive(Debug, Default)]
pub struct TestContext {
  pub events: Vec<RenderEvent>,
  pub visible: [bool; LevelOfDetail::COUNT],
}

impl TestContext {
  pub fn visible_levels(&self) -> Vec<LevelOfDetail> {
    LevelOfDetail::ALL
      .into_iter()
      .filter(|level| self.visible[level.index()])
      .collect()
  }

  pub fn take_events(&mut self) -> Vec<RenderEvent> {
    std::mem::take(&mut self.events)
  }
}

// =============================================================================
// Gate
// =============================================================================

/// Holds gated `execute` calls until opened. Each `open` releases one run;
/// dropping the gate releases everything.
pub struct Gate {
  sender: Sender<()>,
  receiver: Receiver<()>,
}

impl Gate {
  pub fn new() -> Self {
    let (sender, receiver) = channel::unbounded();
    Self { sender, receiver }
  }

  /// Let one blocked (or future) execute run to completion.
  pub fn open(&self) {
    self.sender.send(()).ok();
  }

  fn receiver(&self) -> Receiver<()> {
    self.receiver.clone()
  }
}

// =============================================================================
// Counters
// =============================================================================

/// Shared counters observed by the pipelines.
#[derive(Debug, Default)]
pub struct Counters {
  pub executions: [AtomicUsize; LevelOfDetail::COUNT],
  pub configures: [AtomicUsize; LevelOfDetail::COUNT],
  running: [AtomicUsize; LevelOfDetail::COUNT],
  overlapped: AtomicBool,
}

impl Counters {
  pub fn executions(&self, level: LevelOfDetail) -> usize {
    self.executions[level.index()].load(Ordering::SeqCst)
  }

  pub fn configures(&self, level: LevelOfDetail) -> usize {
    self.configures[level.index()].load(Ordering::SeqCst)
  }

  /// True if two executes of the same level ever ran at once.
  pub fn overlapped(&self) -> bool {
    self.overlapped.load(Ordering::SeqCst)
  }
}

// =============================================================================
// Scripted object
// =============================================================================

/// Behaviour of one level.
#[derive(Clone, Debug)]
pub struct LevelPlan {
  pub synchronous: bool,
  /// Depends on `TestApp::param`; insensitive levels compute once.
  pub sensitive: bool,
  pub panic_on_execute: bool,
  gate: Option<Receiver<()>>,
}

impl LevelPlan {
  pub fn background() -> Self {
    Self {
      synchronous: false,
      sensitive: true,
      panic_on_execute: false,
      gate: None,
    }
  }

  pub fn synchronous() -> Self {
    Self {
      synchronous: true,
      ..Self::background()
    }
  }

  pub fn gated(gate: &Gate) -> Self {
    Self {
      gate: Some(gate.receiver()),
      ..Self::background()
    }
  }

  pub fn insensitive(mut self) -> Self {
    self.sensitive = false;
    self
  }

  pub fn panicking(mut self) -> Self {
    self.panic_on_execute = true;
    self
  }
}

pub struct TestObject {
  plans: [Option<LevelPlan>; LevelOfDetail::COUNT],
  counters: Arc<Counters>,
}

impl TestObject {
  /// Object with no levels defined.
  pub fn new() -> Self {
    Self {
      plans: [None, None, None],
      counters: Arc::new(Counters::default()),
    }
  }

  pub fn with_level(mut self, level: LevelOfDetail, plan: LevelPlan) -> Self {
    self.plans[level.index()] = Some(plan);
    self
  }

  pub fn counters(&self) -> Arc<Counters> {
    Arc::clone(&self.counters)
  }
}

impl LodObject for TestObject {
  type App = TestApp;
  type Context = TestContext;
  type State = TestState;
  type Result = TestResult;

  fn create_state(&self, app: &TestApp) -> TestState {
    TestState {
      param: app.param,
      visible: true,
      updates: 0,
    }
  }

  fn create_data_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn DataPipeline<Self>>> {
    let plan = self.plans[level.index()].clone()?;
    Some(Box::new(ScriptedPipeline {
      level,
      plan,
      counters: Arc::clone(&self.counters),
      configured: 0,
      computed: None,
    }))
  }

  fn create_render_pipeline(&self, level: LevelOfDetail) -> Option<Box<dyn RenderPipeline<Self>>> {
    Some(Box::new(RecordingRender { level }))
  }

  fn label(&self) -> &str {
    "test object"
  }
}

pub struct ScriptedPipeline {
  level: LevelOfDetail,
  plan: LevelPlan,
  counters: Arc<Counters>,
  configured: u32,
  computed: Option<u32>,
}

impl DataPipeline<TestObject> for ScriptedPipeline {
  fn configure(&mut self, state: &TestState, _app: &TestApp) {
    self.configured = if self.plan.sensitive { state.param } else { 0 };
    self.counters.configures[self.level.index()].fetch_add(1, Ordering::SeqCst);
  }

  fn needs_update(&self, result: &TestResult) -> bool {
    result.key != Some(self.configured)
  }

  fn execute(&mut self) {
    let index = self.level.index();
    if self.counters.running[index].fetch_add(1, Ordering::SeqCst) != 0 {
      self.counters.overlapped.store(true, Ordering::SeqCst);
    }

    if let Some(gate) = &self.plan.gate {
      // Err = gate dropped, run anyway.
      gate.recv().ok();
    }

    self.counters.running[index].fetch_sub(1, Ordering::SeqCst);
    if self.plan.panic_on_execute {
      panic!("scripted failure in {} execute", self.level);
    }

    self.computed = Some(self.configured);
    self.counters.executions[index].fetch_add(1, Ordering::SeqCst);
  }

  fn export_result(&self, result: &mut TestResult) {
    result.key = self.computed;
    result.level = Some(self.level);
    result.exports += 1;
  }

  fn force_synchronous(&self) -> bool {
    self.plan.synchronous
  }
}

pub struct RecordingRender {
  level: LevelOfDetail,
}

impl RenderPipeline<TestObject> for RecordingRender {
  fn init(&mut self, _state: &TestState, context: &mut TestContext) {
    context.events.push(RenderEvent::Init(self.level));
  }

  fn update(
    &mut self,
    state: &TestState,
    _app: &TestApp,
    context: &mut TestContext,
    result: &TestResult,
  ) {
    context.visible[self.level.index()] = state.visible;
    context.events.push(RenderEvent::Update(self.level, result.key));
  }

  fn disable(&mut self, context: &mut TestContext) {
    context.visible[self.level.index()] = false;
    context.events.push(RenderEvent::Disable(self.level));
  }
}

// =============================================================================
// Executors and polling helpers
// =============================================================================

/// Dedicated pool with one worker per level.
///
/// A task held by a closed gate occupies its worker, so gated levels must
/// never share a pool whose size depends on the host's CPU count.
pub fn gated_executor() -> TaskExecutor {
  TaskExecutor::new(LevelOfDetail::COUNT).unwrap()
}

/// Call `sync_state` until `done` holds. Panics after ~5s.
pub fn sync_until<F>(scheduler: &mut LodScheduler<TestObject>, app: &TestApp, mut done: F)
where
  F: FnMut(&LodScheduler<TestObject>) -> bool,
{
  for _ in 0..5000 {
    scheduler.sync_state(app);
    if done(scheduler) {
      return;
    }
    std::thread::sleep(Duration::from_millis(1));
  }
  panic!("scheduler did not settle: {scheduler:?}");
}
