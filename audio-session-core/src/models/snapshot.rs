use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::params::EncodingParams;
use super::state::{CaptureMode, SessionState};

/// Point-in-time view of the active session.
///
/// Serializable so a service layer can forward it to a UI as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub mode: CaptureMode,
    pub state: SessionState,
    pub elapsed_millis: u64,
    pub output_path: PathBuf,
    pub params: EncodingParams,
    pub started_at: DateTime<Utc>,
}
