use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::params::EncodingParams;
use crate::models::snapshot::SessionSnapshot;
use crate::models::state::{CaptureMode, SessionState};
use crate::resources::capture_resources::ResourceLease;
use crate::storage::output_target::OutputTarget;
use crate::traits::capture_engine::CaptureEngine;

/// The one live recording context. Exists only while recording or paused.
pub(super) struct ActiveSession {
    pub id: Uuid,
    pub mode: CaptureMode,
    pub state: SessionState,
    pub target: OutputTarget,
    pub params: EncodingParams,
    pub engine: Box<dyn CaptureEngine>,
    pub lease: Option<ResourceLease>,
    pub elapsed_millis: u64,
    pub last_tick: u64,
    pub started_at: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(
        mode: CaptureMode,
        params: EncodingParams,
        target: OutputTarget,
        engine: Box<dyn CaptureEngine>,
        lease: Option<ResourceLease>,
        now: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode,
            state: SessionState::Recording,
            target,
            params,
            engine,
            lease,
            elapsed_millis: 0,
            last_tick: now,
            started_at: Utc::now(),
        }
    }

    /// Fold the time since the last tick into the elapsed duration.
    pub fn flush(&mut self, now: u64) {
        self.elapsed_millis += now.saturating_sub(self.last_tick);
        self.last_tick = now;
    }

    /// Elapsed duration as of `now`, without mutating the session.
    pub fn elapsed_at(&self, now: u64) -> u64 {
        match self.state {
            SessionState::Recording => self.elapsed_millis + now.saturating_sub(self.last_tick),
            _ => self.elapsed_millis,
        }
    }

    pub fn snapshot(&self, now: u64) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            mode: self.mode,
            state: self.state,
            elapsed_millis: self.elapsed_at(now),
            output_path: self.target.path().to_path_buf(),
            params: self.params,
            started_at: self.started_at,
        }
    }
}
