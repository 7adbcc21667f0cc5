use serde::{Deserialize, Serialize};

use super::error::RecorderError;

/// Encoder parameters, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingParams {
    /// Number of channels (1 = mono, 2 = stereo).
    pub channel_count: u16,

    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

impl EncodingParams {
    pub fn new(channel_count: u16, sample_rate: u32, bitrate: u32) -> Self {
        Self {
            channel_count,
            sample_rate,
            bitrate,
        }
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.channel_count == 0 {
            return Err(RecorderError::CaptureInit("channel count must be at least 1".into()));
        }
        if self.sample_rate == 0 {
            return Err(RecorderError::CaptureInit("sample rate must be positive".into()));
        }
        if self.bitrate == 0 {
            return Err(RecorderError::CaptureInit("bitrate must be positive".into()));
        }
        Ok(())
    }
}

impl Default for EncodingParams {
    fn default() -> Self {
        Self {
            channel_count: 1,
            sample_rate: 44100,
            bitrate: 128_000,
        }
    }
}
