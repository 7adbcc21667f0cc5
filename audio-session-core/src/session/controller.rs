use std::cell::Cell;
use std::mem;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use super::active_session::ActiveSession;
use super::progress::ProgressTicker;
use crate::models::config::{PausePolicy, RecorderConfig};
use crate::models::error::RecorderError;
use crate::models::params::EncodingParams;
use crate::models::progress::ProgressEvent;
use crate::models::snapshot::SessionSnapshot;
use crate::models::state::{CaptureMode, SessionState};
use crate::resources::capture_resources::{CaptureResourceManager, ResourceLease};
use crate::resources::unsupported::Unsupported;
use crate::storage::output_target::OutputTarget;
use crate::traits::capture_engine::{CaptureEngine, EngineConfig, EngineFactory};
use crate::traits::clock::{Clock, MonotonicClock};
use crate::traits::projection::{ProjectionPlatform, TapDescriptor};
use crate::traits::recorder_callback::RecorderCallback;

type Callback = Option<Arc<dyn RecorderCallback>>;

/// Controller for hosts without system-audio capture.
pub type MicrophoneController<F> = SessionController<F, Unsupported>;

/// Arguments of [`SessionController::start`].
pub struct StartRequest<H> {
    pub mode: CaptureMode,
    pub params: EncodingParams,
    pub output_path: PathBuf,
    /// Projection grant for system-audio mode. When `None`, a handle parked
    /// with [`SessionController::park_capture_handle`] is used instead.
    pub capture_handle: Option<H>,
}

impl<H> StartRequest<H> {
    pub fn microphone(params: EncodingParams, output_path: impl Into<PathBuf>) -> Self {
        Self {
            mode: CaptureMode::Microphone,
            params,
            output_path: output_path.into(),
            capture_handle: None,
        }
    }

    pub fn system_audio(params: EncodingParams, output_path: impl Into<PathBuf>, capture_handle: Option<H>) -> Self {
        Self {
            mode: CaptureMode::SystemAudio,
            params,
            output_path: output_path.into(),
            capture_handle,
        }
    }
}

/// A callback invocation queued under the state lock.
enum Notice {
    Started(PathBuf),
    Paused,
    Resumed,
    Stopped(PathBuf),
    Progress(ProgressEvent),
    Failed(RecorderError),
}

/// Notices drained from the state, delivered once the state lock is gone.
struct Outbox {
    callback: Callback,
    notices: Vec<Notice>,
}

impl Outbox {
    /// `depth` counts nested deliveries on the owning thread.
    fn deliver(self, depth: &Cell<usize>) {
        let Some(cb) = self.callback else {
            return;
        };
        depth.set(depth.get() + 1);
        for notice in self.notices {
            match notice {
                Notice::Started(path) => cb.on_start_record(&path),
                Notice::Paused => cb.on_pause_record(),
                Notice::Resumed => cb.on_resume_record(),
                Notice::Stopped(path) => cb.on_stop_record(&path),
                Notice::Progress(progress) => cb.on_record_progress(&progress),
                Notice::Failed(err) => cb.on_error(&err),
            }
        }
        depth.set(depth.get() - 1);
    }
}

/// Mutable controller state. Everything in here is guarded by one mutex.
struct Inner<P: ProjectionPlatform> {
    session: Option<ActiveSession>,
    resources: CaptureResourceManager<P>,
    callback: Callback,
    pending: Vec<Notice>,
    /// Bumped whenever the progress loop is cancelled or restarted; a tick
    /// carrying an older value does nothing.
    generation: u64,
    ticker: Option<ProgressTicker>,
}

impl<P: ProjectionPlatform> Inner<P> {
    /// Invalidate pending ticks and detach the progress thread.
    ///
    /// The returned ticker must be joined after the locks are released.
    fn cancel_ticker(&mut self) -> Option<ProgressTicker> {
        self.generation += 1;
        let mut ticker = self.ticker.take()?;
        ticker.cancel();
        Some(ticker)
    }

    fn post(&mut self, notice: Notice) {
        self.pending.push(notice);
    }

    fn take_outbox(&mut self) -> Outbox {
        Outbox {
            callback: self.callback.clone(),
            notices: mem::take(&mut self.pending),
        }
    }
}

struct Shared<F, P: ProjectionPlatform> {
    inner: Mutex<Inner<P>>,
    /// Held across an operation and its callback delivery. Reentrant so a
    /// callback can drive the controller from the delivering thread.
    delivery: ReentrantMutex<Cell<usize>>,
    factory: F,
    clock: Arc<dyn Clock>,
    config: RecorderConfig,
}

/// Single-session audio recording controller.
///
/// Owns the capture engine of the current session and sequences the
/// system-audio resources held by its [`CaptureResourceManager`]. Construct
/// one per process and share it by reference (or `Arc`).
///
/// ```text
/// start ─▶ [resources.prepare] ─▶ [engine prepare+start] ─▶ progress loop
///   └─ any failure ─▶ engine.release + resources.release ─▶ on_error
/// stop  ─▶ cancel loop ─▶ engine stop+release ─▶ resources.release ─▶ on_stop_record
/// ```
///
/// Two locks. The delivery lock serializes operations and progress ticks
/// together with their callbacks, so callbacks arrive in transition order.
/// The state lock is only held while state changes and is released before
/// any callback runs. Engine calls happen under both, so a `stop` racing a
/// `start` runs after the start has fully completed or failed.
pub struct SessionController<F, P>
where
    F: EngineFactory + 'static,
    P: ProjectionPlatform + 'static,
{
    shared: Arc<Shared<F, P>>,
}

impl<F, P> SessionController<F, P>
where
    F: EngineFactory + 'static,
    P: ProjectionPlatform + 'static,
{
    pub fn new(factory: F, platform: P, config: RecorderConfig) -> Self {
        Self::with_clock(factory, platform, config, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(factory: F, platform: P, config: RecorderConfig, clock: Arc<dyn Clock>) -> Self {
        if let Err(reason) = config.validate() {
            log::warn!("Recorder config is invalid, progress may misbehave: {}", reason);
        }
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    session: None,
                    resources: CaptureResourceManager::new(platform),
                    callback: None,
                    pending: Vec::new(),
                    generation: 0,
                    ticker: None,
                }),
                delivery: ReentrantMutex::new(Cell::new(0)),
                factory,
                clock,
                config,
            }),
        }
    }

    pub fn set_callback(&self, callback: Arc<dyn RecorderCallback>) {
        self.shared.inner.lock().callback = Some(callback);
    }

    pub fn clear_callback(&self) {
        self.shared.inner.lock().callback = None;
    }

    /// Start a session. Transitions: idle → recording.
    ///
    /// Errors are also delivered to `on_error`. On failure nothing acquired
    /// during the attempt is still held.
    pub fn start(&self, request: StartRequest<P::Projection>) -> Result<(), RecorderError> {
        self.run(|shared, inner| {
            let result = Self::start_locked(shared, inner, request);
            if let Err(ref err) = result {
                inner.post(Notice::Failed(err.clone()));
            }
            (result, None)
        })
    }

    /// Pause the session. Transitions: recording → paused. No-op otherwise.
    pub fn pause(&self) -> Result<(), RecorderError> {
        self.run(|shared, inner| {
            let (result, ticker) = Self::pause_locked(shared, inner);
            if let Err(ref err) = result {
                inner.post(Notice::Failed(err.clone()));
            }
            (result, ticker)
        })
    }

    /// Resume the session. Transitions: paused → recording. No-op otherwise.
    ///
    /// If the engine cannot resume the session stays paused.
    pub fn resume(&self) -> Result<(), RecorderError> {
        self.run(|shared, inner| {
            let result = Self::resume_locked(shared, inner);
            if let Err(ref err) = result {
                inner.post(Notice::Failed(err.clone()));
            }
            (result, None)
        })
    }

    /// Stop the session. Transitions: recording/paused → idle. No-op when idle.
    ///
    /// Always effective: engine stop failures are logged and teardown
    /// continues.
    pub fn stop(&self) {
        self.run(|_, inner| {
            if inner.session.is_none() {
                log::debug!("Recording has already stopped or hasn't started");
                return ((), None);
            }
            ((), Self::stop_locked(inner))
        })
    }

    pub fn state(&self) -> SessionState {
        self.shared
            .inner
            .lock()
            .session
            .as_ref()
            .map_or(SessionState::Idle, |s| s.state)
    }

    /// True while a session exists, paused or not.
    pub fn is_recording(&self) -> bool {
        self.state().is_active()
    }

    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let now = self.shared.clock.now_millis();
        self.shared.inner.lock().session.as_ref().map(|s| s.snapshot(now))
    }

    /// Whether a system-audio projection + tap pair is currently held.
    pub fn has_secondary_resource(&self) -> bool {
        self.shared.inner.lock().resources.is_held()
    }

    /// Hand over a projection grant for the next system-audio start.
    ///
    /// Replaces any previously parked grant. A microphone start or any
    /// session stop clears it.
    pub fn park_capture_handle(&self, handle: P::Projection) {
        self.shared.inner.lock().resources.park(handle);
    }

    pub fn clear_capture_handle(&self) {
        self.shared.inner.lock().resources.clear_parked();
    }

    // --- Internal helpers ---

    /// Run `op` under the state lock, then deliver what it posted.
    ///
    /// A ticker returned by `op` is joined once both locks are released. When
    /// called from inside a callback an outer frame still holds the delivery
    /// lock, so the ticker is detached instead; its pending tick fails the
    /// generation check.
    fn run<R>(
        &self,
        op: impl FnOnce(&Arc<Shared<F, P>>, &mut Inner<P>) -> (R, Option<ProgressTicker>),
    ) -> R {
        let delivery = self.shared.delivery.lock();
        let (result, ticker, outbox) = {
            let mut inner = self.shared.inner.lock();
            let (result, ticker) = op(&self.shared, &mut *inner);
            (result, ticker, inner.take_outbox())
        };
        outbox.deliver(&delivery);

        if delivery.get() == 0 {
            drop(delivery);
            finish(ticker);
        }
        result
    }

    fn start_locked(
        shared: &Arc<Shared<F, P>>,
        inner: &mut Inner<P>,
        request: StartRequest<P::Projection>,
    ) -> Result<(), RecorderError> {
        let StartRequest {
            mode,
            params,
            output_path,
            capture_handle,
        } = request;

        if let Some(active) = inner.session.as_ref() {
            log::warn!("Start requested while session {} is active", active.id);
            if let Some(handle) = capture_handle {
                inner.resources.discard(handle);
            }
            return Err(RecorderError::SessionActive);
        }

        let (target, engine, lease) = if mode.requires_secondary_resource() {
            Self::prepare_system_audio(shared, inner, params, output_path, capture_handle)?
        } else {
            if let Some(handle) = capture_handle {
                inner.resources.discard(handle);
            }
            Self::prepare_microphone(shared, inner, params, output_path)?
        };

        let session = ActiveSession::new(mode, params, target, engine, lease, shared.clock.now_millis());
        let path = session.target.path().to_path_buf();
        inner.session = Some(session);

        if let Err(err) = Self::spawn_ticker(shared, inner) {
            if let Some(session) = inner.session.take() {
                Self::teardown(inner, session);
            }
            return Err(err);
        }

        log::info!("Recording session started: {:?} -> {}", mode, path.display());
        inner.post(Notice::Started(path));
        Ok(())
    }

    fn prepare_microphone(
        shared: &Shared<F, P>,
        inner: &mut Inner<P>,
        params: EncodingParams,
        output_path: PathBuf,
    ) -> Result<(OutputTarget, Box<dyn CaptureEngine>, Option<ResourceLease>), RecorderError> {
        // Never let a microphone session run next to a leftover system audio
        // tap or a stale grant.
        inner.resources.release_all();

        params.validate()?;
        let target = OutputTarget::existing(output_path)?;
        let engine = Self::launch_engine(shared, CaptureMode::Microphone, params, &target)?;
        Ok((target, engine, None))
    }

    fn prepare_system_audio(
        shared: &Shared<F, P>,
        inner: &mut Inner<P>,
        params: EncodingParams,
        output_path: PathBuf,
        capture_handle: Option<P::Projection>,
    ) -> Result<(OutputTarget, Box<dyn CaptureEngine>, Option<ResourceLease>), RecorderError> {
        let Some(projection) = capture_handle.or_else(|| inner.resources.take_parked()) else {
            log::error!("System audio capture requested without a capture handle");
            return Err(RecorderError::CaptureInit("capture handle is missing".into()));
        };

        let target = match params.validate().and_then(|()| OutputTarget::create(output_path)) {
            Ok(target) => target,
            Err(err) => {
                inner.resources.discard(projection);
                return Err(err);
            }
        };

        let descriptor = TapDescriptor::audio_only(shared.config.tap_name.clone());
        let lease = inner.resources.prepare(projection, &descriptor)?;

        match Self::launch_engine(shared, CaptureMode::SystemAudio, params, &target) {
            Ok(engine) => Ok((target, engine, Some(lease))),
            Err(err) => {
                inner.resources.release(Some(lease));
                Err(err)
            }
        }
    }

    /// Create, prepare and start an engine. A failed engine is released
    /// before returning.
    fn launch_engine(
        shared: &Shared<F, P>,
        mode: CaptureMode,
        params: EncodingParams,
        target: &OutputTarget,
    ) -> Result<Box<dyn CaptureEngine>, RecorderError> {
        let mut engine = shared.factory.create(mode).map_err(|e| {
            log::error!("Failed to create capture engine: {}", e);
            RecorderError::from(e)
        })?;

        let config = EngineConfig {
            mode,
            params,
            output_path: target.path().to_path_buf(),
        };

        if let Err(e) = engine.prepare(&config).and_then(|()| engine.start()) {
            log::error!("Capture engine failed to start: {}", e);
            engine.release();
            return Err(e.into());
        }
        Ok(engine)
    }

    fn pause_locked(
        shared: &Arc<Shared<F, P>>,
        inner: &mut Inner<P>,
    ) -> (Result<(), RecorderError>, Option<ProgressTicker>) {
        let now = shared.clock.now_millis();
        let Some(session) = inner.session.as_mut() else {
            log::debug!("Pause ignored: no active session");
            return (Ok(()), None);
        };
        if !session.state.is_recording() {
            return (Ok(()), None);
        }

        if !session.engine.supports_pause() {
            return match shared.config.pause_policy {
                PausePolicy::Reject => {
                    log::warn!("Capture engine cannot pause; session {} keeps recording", session.id);
                    (Err(RecorderError::PauseUnsupported), None)
                }
                PausePolicy::StopSession => {
                    log::warn!("Capture engine cannot pause; stopping session {}", session.id);
                    (Ok(()), Self::stop_locked(inner))
                }
            };
        }

        if let Err(e) = session.engine.pause() {
            log::error!("Failed to pause capture engine: {}", e);
            return (Err(e.into()), None);
        }

        session.flush(now);
        session.state = SessionState::Paused;
        log::debug!("Session {} paused at {} ms", session.id, session.elapsed_millis);

        let ticker = inner.cancel_ticker();
        inner.post(Notice::Paused);
        (Ok(()), ticker)
    }

    fn resume_locked(shared: &Arc<Shared<F, P>>, inner: &mut Inner<P>) -> Result<(), RecorderError> {
        let now = shared.clock.now_millis();
        let Some(session) = inner.session.as_mut() else {
            log::debug!("Resume ignored: no active session");
            return Ok(());
        };
        if !session.state.is_paused() {
            return Ok(());
        }

        if let Err(e) = session.engine.resume() {
            log::error!("Failed to resume capture engine: {}", e);
            return Err(e.into());
        }
        session.last_tick = now;
        session.state = SessionState::Recording;

        if let Err(err) = Self::spawn_ticker(shared, inner) {
            // Without a progress loop the session cannot run; fall back to paused.
            if let Some(session) = inner.session.as_mut() {
                if let Err(e) = session.engine.pause() {
                    log::error!("Failed to re-pause capture engine: {}", e);
                }
                session.state = SessionState::Paused;
            }
            return Err(err);
        }

        log::debug!("Session resumed");
        inner.post(Notice::Resumed);
        Ok(())
    }

    /// Tear down the session, if any. Returns the cancelled ticker for the
    /// caller to join once the locks are released.
    fn stop_locked(inner: &mut Inner<P>) -> Option<ProgressTicker> {
        let ticker = inner.cancel_ticker();
        if let Some(session) = inner.session.take() {
            let path = Self::teardown(inner, session);
            inner.post(Notice::Stopped(path));
        }
        ticker
    }

    /// Stop and release the engine, then the secondary resource.
    fn teardown(inner: &mut Inner<P>, mut session: ActiveSession) -> PathBuf {
        if let Err(e) = session.engine.stop() {
            log::error!("Capture engine stop failed, continuing teardown: {}", e);
        }
        session.engine.release();
        inner.resources.release(session.lease);

        log::info!(
            "Recording session {} stopped after {} ms",
            session.id,
            session.elapsed_millis
        );
        session.target.path().to_path_buf()
    }

    fn spawn_ticker(shared: &Arc<Shared<F, P>>, inner: &mut Inner<P>) -> Result<(), RecorderError> {
        // Detach any leftover loop; its ticks are invalidated by the new generation.
        drop(inner.cancel_ticker());
        let generation = inner.generation;
        let weak = Arc::downgrade(shared);

        let ticker = ProgressTicker::spawn(shared.config.visualization_interval(), move || {
            Self::tick(&weak, generation)
        })
        .map_err(|e| {
            log::error!("Failed to spawn progress thread: {}", e);
            RecorderError::CaptureInit(format!("progress loop unavailable: {}", e))
        })?;
        inner.ticker = Some(ticker);
        Ok(())
    }

    /// One progress-loop iteration. Returns whether the loop should continue.
    fn tick(weak: &Weak<Shared<F, P>>, generation: u64) -> bool {
        let Some(shared) = weak.upgrade() else {
            return false;
        };
        let delivery = shared.delivery.lock();

        let (outbox, keep_going) = {
            let mut inner = shared.inner.lock();
            if inner.generation != generation {
                return false;
            }

            let now = shared.clock.now_millis();
            let Some(session) = inner.session.as_mut() else {
                return false;
            };
            if !session.state.is_recording() {
                return false;
            }

            session.flush(now);
            let elapsed_millis = session.elapsed_millis;
            let amplitude = session.engine.max_amplitude();
            let limit_reached = shared
                .config
                .max_duration_ms
                .is_some_and(|max| elapsed_millis >= max);

            match amplitude {
                Ok(amplitude) => inner.post(Notice::Progress(ProgressEvent {
                    elapsed_millis,
                    amplitude,
                })),
                Err(e) => log::warn!("Failed to read capture amplitude: {}", e),
            }

            if limit_reached {
                log::info!("Recording session reached its maximum duration");
                // The returned ticker is this thread, which exits once we return.
                drop(Self::stop_locked(&mut inner));
            }
            (inner.take_outbox(), !limit_reached)
        };

        outbox.deliver(&delivery);
        keep_going
    }
}

impl<F, P> Drop for SessionController<F, P>
where
    F: EngineFactory + 'static,
    P: ProjectionPlatform + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

fn finish(ticker: Option<ProgressTicker>) {
    if let Some(ticker) = ticker {
        ticker.join();
    }
}
