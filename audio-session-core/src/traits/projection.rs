/// Platform grant that allows tapping system playback audio.
///
/// Obtained by the host after the user consents to capture; handed to the
/// controller when a system-audio session starts.
pub trait CaptureProjection: Send {
    /// Revoke the grant. Called at most once.
    fn stop(&mut self);
}

/// Audio tap derived from a projection. Only valid while its projection is.
pub trait CaptureTap: Send {
    /// Tear down the tap. Called at most once, always before the owning
    /// projection is stopped.
    fn release(&mut self);
}

/// Shape of the tap to create. System-audio capture needs no visual output,
/// so taps are always as small as the platform allows and have no surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapDescriptor {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub density_dpi: u32,
    pub auto_mirror: bool,
    pub with_surface: bool,
}

impl TapDescriptor {
    /// Minimal audio-only tap: 1×1 at 1 dpi, mirrored, no render surface.
    pub fn audio_only(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            density_dpi: 1,
            auto_mirror: true,
            with_surface: false,
        }
    }
}

/// Platform factory for system-audio taps.
pub trait ProjectionPlatform: Send + Sync {
    type Projection: CaptureProjection;
    type Tap: CaptureTap;

    /// Create an audio tap on `projection`.
    ///
    /// Returns a human-readable reason when the platform denies creation.
    fn create_tap(
        &self,
        projection: &mut Self::Projection,
        descriptor: &TapDescriptor,
    ) -> Result<Self::Tap, String>;
}
