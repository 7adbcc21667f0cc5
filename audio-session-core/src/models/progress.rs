/// Full-scale value reported by capture engines for their max amplitude.
pub const MAX_AMPLITUDE: u32 = 32767;

/// One progress-loop sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Accumulated active recording time in milliseconds.
    pub elapsed_millis: u64,

    /// Peak amplitude observed by the engine since the previous read.
    pub amplitude: u32,
}

impl ProgressEvent {
    /// Amplitude scaled to 0.0–1.0 for meters.
    pub fn level(&self) -> f32 {
        (self.amplitude.min(MAX_AMPLITUDE) as f32) / MAX_AMPLITUDE as f32
    }
}
