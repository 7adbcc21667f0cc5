//! Test doubles shared by the unit tests of this crate.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::error::{EngineError, RecorderError};
use crate::models::progress::ProgressEvent;
use crate::models::state::CaptureMode;
use crate::traits::capture_engine::{CaptureEngine, EngineConfig, EngineFactory};
use crate::traits::clock::Clock;
use crate::traits::projection::{CaptureProjection, CaptureTap, ProjectionPlatform, TapDescriptor};
use crate::traits::recorder_callback::RecorderCallback;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Ordered log of side effects, shared between fakes so tests can assert
/// on cross-component ordering.
#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

// -- Projection platform --

pub struct FakeProjection {
    id: u32,
    log: EventLog,
}

impl CaptureProjection for FakeProjection {
    fn stop(&mut self) {
        self.log.push(format!("projection-stopped:{}", self.id));
    }
}

pub struct FakeTap {
    id: u32,
    log: EventLog,
}

impl CaptureTap for FakeTap {
    fn release(&mut self) {
        self.log.push(format!("tap-released:{}", self.id));
    }
}

#[derive(Clone)]
pub struct FakePlatform {
    log: EventLog,
    deny: Arc<AtomicBool>,
}

impl FakePlatform {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            deny: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn projection(&self, id: u32) -> FakeProjection {
        FakeProjection {
            id,
            log: self.log.clone(),
        }
    }

    pub fn deny_taps(&self, deny: bool) {
        self.deny.store(deny, Ordering::SeqCst);
    }
}

impl ProjectionPlatform for FakePlatform {
    type Projection = FakeProjection;
    type Tap = FakeTap;

    fn create_tap(&self, projection: &mut FakeProjection, descriptor: &TapDescriptor) -> Result<FakeTap, String> {
        assert!(!descriptor.with_surface, "system audio taps must be audio-only");
        if self.deny.load(Ordering::SeqCst) {
            return Err("tap creation denied".into());
        }
        self.log.push(format!("tap-created:{}", projection.id));
        Ok(FakeTap {
            id: projection.id,
            log: self.log.clone(),
        })
    }
}

// -- Capture engine --

/// Knobs controlling how every engine created by a [`FakeFactory`] behaves.
#[derive(Debug, Clone)]
pub struct EngineBehavior {
    pub fail_create: bool,
    pub fail_prepare: bool,
    pub fail_start: bool,
    pub fail_pause: bool,
    pub fail_resume: bool,
    pub fail_stop: bool,
    pub fail_amplitude: bool,
    pub supports_pause: bool,
    pub start_delay: Duration,
    pub amplitude: u32,
}

impl Default for EngineBehavior {
    fn default() -> Self {
        Self {
            fail_create: false,
            fail_prepare: false,
            fail_start: false,
            fail_pause: false,
            fail_resume: false,
            fail_stop: false,
            fail_amplitude: false,
            supports_pause: true,
            start_delay: Duration::ZERO,
            amplitude: 1200,
        }
    }
}

pub struct FakeEngine {
    log: EventLog,
    behavior: Arc<Mutex<EngineBehavior>>,
}

impl FakeEngine {
    fn behavior(&self) -> EngineBehavior {
        self.behavior.lock().clone()
    }
}

impl CaptureEngine for FakeEngine {
    fn prepare(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        self.log.push(format!("engine-prepare:{:?}", config.mode));
        if self.behavior().fail_prepare {
            return Err(EngineError::Io("prepare failed".into()));
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), EngineError> {
        let behavior = self.behavior();
        self.log.push("engine-start-begin");
        if !behavior.start_delay.is_zero() {
            thread::sleep(behavior.start_delay);
        }
        if behavior.fail_start {
            return Err(EngineError::Security("start refused".into()));
        }
        self.log.push("engine-start");
        Ok(())
    }

    fn supports_pause(&self) -> bool {
        self.behavior().supports_pause
    }

    fn pause(&mut self) -> Result<(), EngineError> {
        if self.behavior().fail_pause {
            return Err(EngineError::IllegalState("pause failed".into()));
        }
        self.log.push("engine-pause");
        Ok(())
    }

    fn resume(&mut self) -> Result<(), EngineError> {
        if self.behavior().fail_resume {
            return Err(EngineError::IllegalState("resume failed".into()));
        }
        self.log.push("engine-resume");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        self.log.push("engine-stop");
        if self.behavior().fail_stop {
            return Err(EngineError::Other("stop failed".into()));
        }
        Ok(())
    }

    fn release(&mut self) {
        self.log.push("engine-release");
    }

    fn max_amplitude(&mut self) -> Result<u32, EngineError> {
        let behavior = self.behavior();
        if behavior.fail_amplitude {
            return Err(EngineError::IllegalState("amplitude unavailable".into()));
        }
        Ok(behavior.amplitude)
    }
}

#[derive(Clone)]
pub struct FakeFactory {
    log: EventLog,
    behavior: Arc<Mutex<EngineBehavior>>,
    created: Arc<AtomicUsize>,
}

impl FakeFactory {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            behavior: Arc::new(Mutex::new(EngineBehavior::default())),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn configure(&self, update: impl FnOnce(&mut EngineBehavior)) {
        let mut behavior = self.behavior.lock();
        update(&mut *behavior);
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for FakeFactory {
    fn create(&self, _mode: CaptureMode) -> Result<Box<dyn CaptureEngine>, EngineError> {
        if self.behavior.lock().fail_create {
            return Err(EngineError::Other("no encoder available".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeEngine {
            log: self.log.clone(),
            behavior: Arc::clone(&self.behavior),
        }))
    }
}

// -- Clock --

#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

// -- Callback --

#[derive(Debug, Clone, PartialEq)]
pub enum CallbackEvent {
    Start(PathBuf),
    Pause,
    Resume,
    Stop(PathBuf),
    Progress(ProgressEvent),
    Error(RecorderError),
}

#[derive(Debug, Default)]
pub struct RecordingCallback {
    events: Mutex<Vec<CallbackEvent>>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CallbackEvent> {
        self.events.lock().clone()
    }

    /// Lifecycle events only, progress filtered out.
    pub fn lifecycle(&self) -> Vec<CallbackEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, CallbackEvent::Progress(_)))
            .collect()
    }

    pub fn progress(&self) -> Vec<ProgressEvent> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CallbackEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<RecorderError> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                CallbackEvent::Error(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    pub fn stop_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, CallbackEvent::Stop(_)))
            .count()
    }

    /// Poll until at least `count` progress events arrived or `timeout` passed.
    pub fn wait_for_progress(&self, count: usize, timeout: Duration) -> Vec<ProgressEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            let progress = self.progress();
            if progress.len() >= count || Instant::now() >= deadline {
                return progress;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }
}

impl RecorderCallback for RecordingCallback {
    fn on_start_record(&self, output: &Path) {
        self.events.lock().push(CallbackEvent::Start(output.to_path_buf()));
    }

    fn on_pause_record(&self) {
        self.events.lock().push(CallbackEvent::Pause);
    }

    fn on_resume_record(&self) {
        self.events.lock().push(CallbackEvent::Resume);
    }

    fn on_stop_record(&self, output: &Path) {
        self.events.lock().push(CallbackEvent::Stop(output.to_path_buf()));
    }

    fn on_record_progress(&self, progress: &ProgressEvent) {
        self.events.lock().push(CallbackEvent::Progress(*progress));
    }

    fn on_error(&self, error: &RecorderError) {
        self.events.lock().push(CallbackEvent::Error(error.clone()));
    }
}
