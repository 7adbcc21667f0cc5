use serde::{Deserialize, Serialize};

/// Session state machine.
///
/// State transitions:
/// ```text
/// idle ──start──▶ recording ◀──resume── paused
///   ▲                 │ pause ──────────▶  │
///   └──────stop───────┴──────────stop──────┘
/// ```
/// Stopping is not a resting state; a stopped session collapses back to idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
    Paused,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Recording or paused: a session exists and owns the engine.
    pub fn is_active(&self) -> bool {
        !self.is_idle()
    }
}

/// What a session captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Microphone input. Needs no secondary resource.
    Microphone,
    /// System playback audio. Needs a projection handle and an audio tap.
    SystemAudio,
}

impl CaptureMode {
    pub fn requires_secondary_resource(&self) -> bool {
        matches!(self, Self::SystemAudio)
    }
}
