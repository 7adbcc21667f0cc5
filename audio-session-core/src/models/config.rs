use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Progress-loop period used when the config does not set one.
pub const DEFAULT_VISUALIZATION_INTERVAL_MS: u64 = 50;

/// Name given to the audio-only tap created for system-audio capture.
pub const DEFAULT_TAP_NAME: &str = "SystemAudioRecorder";

/// What `pause()` does when the capture engine has no native pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Report `PauseUnsupported` and keep recording.
    #[default]
    Reject,
    /// Stop the session entirely. Resume is impossible afterwards.
    StopSession,
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Period of the progress loop in milliseconds.
    pub visualization_interval_ms: u64,

    /// Behaviour of `pause()` on engines without a pause primitive.
    pub pause_policy: PausePolicy,

    /// Stop automatically once this much active time is recorded (None = unlimited).
    pub max_duration_ms: Option<u64>,

    /// Name of the system-audio tap.
    pub tap_name: String,
}

impl RecorderConfig {
    pub fn visualization_interval(&self) -> Duration {
        Duration::from_millis(self.visualization_interval_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.visualization_interval_ms == 0 {
            return Err("visualization interval must be positive".into());
        }
        if self.max_duration_ms == Some(0) {
            return Err("max duration must be positive when set".into());
        }
        if self.tap_name.trim().is_empty() {
            return Err("tap name must not be empty".into());
        }
        Ok(())
    }

    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("failed to parse recorder config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &Path) -> Result<Self, String> {
        let json = fs::read_to_string(path)
            .map_err(|e| format!("failed to read recorder config {}: {}", path.display(), e))?;
        Self::from_json_str(&json)
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            visualization_interval_ms: DEFAULT_VISUALIZATION_INTERVAL_MS,
            pause_policy: PausePolicy::default(),
            max_duration_ms: None,
            tap_name: DEFAULT_TAP_NAME.to_string(),
        }
    }
}
