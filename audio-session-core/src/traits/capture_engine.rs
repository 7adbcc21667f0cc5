use std::path::PathBuf;

use crate::models::error::EngineError;
use crate::models::params::EncodingParams;
use crate::models::state::CaptureMode;

/// Everything an engine needs to encode one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub mode: CaptureMode,
    pub params: EncodingParams,
    pub output_path: PathBuf,
}

/// Opaque audio encoder driven by the session controller.
///
/// The controller calls these methods while holding its session lock, so
/// every call must return in bounded time. Implementations:
/// - Platform recorders (AAC/MPEG-4, WAV, ...) supplied by the host
/// - Test doubles in `test_support`
pub trait CaptureEngine: Send {
    /// Apply the output path and encoding parameters and allocate the encoder.
    fn prepare(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Begin writing audio to the output path.
    fn start(&mut self) -> Result<(), EngineError>;

    /// Whether `pause`/`resume` are natively supported.
    fn supports_pause(&self) -> bool {
        true
    }

    fn pause(&mut self) -> Result<(), EngineError>;

    fn resume(&mut self) -> Result<(), EngineError>;

    /// Stop writing and finalize the output.
    fn stop(&mut self) -> Result<(), EngineError>;

    /// Free the encoder. Called exactly once per engine, after `stop` or after
    /// a failed start. Must not fail.
    fn release(&mut self);

    /// Peak amplitude (0–32767) since the previous call.
    fn max_amplitude(&mut self) -> Result<u32, EngineError>;
}

/// Creates a fresh engine for each session.
pub trait EngineFactory: Send + Sync {
    fn create(&self, mode: CaptureMode) -> Result<Box<dyn CaptureEngine>, EngineError>;
}
