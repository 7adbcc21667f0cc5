//! # audio-session-core
//!
//! Single-session audio recording controller.
//!
//! Owns the lifecycle of one capture engine at a time (microphone or system
//! audio loopback), sequences the projection + tap pair that system-audio
//! capture needs, and reports progress while a session records. The encoder
//! itself is opaque: hosts plug one in through the `CaptureEngine` trait.
//!
//! ## Architecture
//!
//! ```text
//! audio-session-core (this crate)
//! ├── traits/       ← CaptureEngine, RecorderCallback, ProjectionPlatform, Clock
//! ├── models/       ← RecorderError, SessionState, EncodingParams, RecorderConfig, etc.
//! ├── resources/    ← CaptureResourceManager (projection + tap ownership)
//! ├── session/      ← SessionController (state machine, progress loop)
//! └── storage/      ← OutputTarget validation
//! ```

pub mod models;
pub mod resources;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::{PausePolicy, RecorderConfig};
pub use models::error::{EngineError, ErrorKind, RecorderError};
pub use models::params::EncodingParams;
pub use models::progress::ProgressEvent;
pub use models::snapshot::SessionSnapshot;
pub use models::state::{CaptureMode, SessionState};
pub use resources::capture_resources::{CaptureResourceManager, ResourceLease};
pub use resources::unsupported::Unsupported;
pub use session::controller::{MicrophoneController, SessionController, StartRequest};
pub use storage::output_target::OutputTarget;
pub use traits::capture_engine::{CaptureEngine, EngineConfig, EngineFactory};
pub use traits::clock::{Clock, MonotonicClock};
pub use traits::projection::{CaptureProjection, CaptureTap, ProjectionPlatform, TapDescriptor};
pub use traits::recorder_callback::RecorderCallback;
