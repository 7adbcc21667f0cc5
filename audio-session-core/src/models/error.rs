use thiserror::Error;

/// Errors surfaced by the session controller.
///
/// Every failure at a platform boundary is normalized into one of these
/// kinds and reported exactly once through `RecorderCallback::on_error`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    /// Output target is missing, not a regular file, not writable, or
    /// could not be created.
    #[error("invalid output target: {0}")]
    InvalidOutputTarget(String),

    /// Capture engine could not be configured, prepared, started or resumed.
    #[error("capture init failed: {0}")]
    CaptureInit(String),

    /// The platform refused to create the system-audio tap.
    #[error("resource acquisition failed: {0}")]
    ResourceAcquisition(String),

    /// The engine has no native pause and the policy rejects degradation.
    #[error("pause not supported by capture engine")]
    PauseUnsupported,

    /// A session is already recording or paused.
    #[error("a recording session is already active")]
    SessionActive,
}

/// Category of a [`RecorderError`], for consumers that only branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidOutputTarget,
    CaptureInit,
    ResourceAcquisition,
    PauseUnsupported,
    SessionActive,
}

impl RecorderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidOutputTarget(_) => ErrorKind::InvalidOutputTarget,
            Self::CaptureInit(_) => ErrorKind::CaptureInit,
            Self::ResourceAcquisition(_) => ErrorKind::ResourceAcquisition,
            Self::PauseUnsupported => ErrorKind::PauseUnsupported,
            Self::SessionActive => ErrorKind::SessionActive,
        }
    }
}

/// Failure reported by a capture engine.
///
/// Mirrors the platform failure classes an encoder can raise. All of them
/// share one recovery path, so they collapse into
/// [`RecorderError::CaptureInit`] at the controller boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("i/o error: {0}")]
    Io(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error("security error: {0}")]
    Security(String),

    #[error("{0}")]
    Other(String),
}

impl From<EngineError> for RecorderError {
    fn from(err: EngineError) -> Self {
        RecorderError::CaptureInit(err.to_string())
    }
}
