//! Projection platform for hosts that cannot capture system audio.
//!
//! No projection value can ever be constructed, so a controller typed with
//! [`Unsupported`] can only run microphone sessions; a system-audio start
//! fails with `CaptureInit` for lack of a capture handle.

use crate::traits::projection::{CaptureProjection, CaptureTap, ProjectionPlatform, TapDescriptor};

/// Uninhabited projection handle.
#[derive(Debug)]
pub enum NoProjection {}

impl CaptureProjection for NoProjection {
    fn stop(&mut self) {
        match *self {}
    }
}

/// Uninhabited tap.
#[derive(Debug)]
pub enum NoTap {}

impl CaptureTap for NoTap {
    fn release(&mut self) {
        match *self {}
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl ProjectionPlatform for Unsupported {
    type Projection = NoProjection;
    type Tap = NoTap;

    fn create_tap(&self, projection: &mut NoProjection, _descriptor: &TapDescriptor) -> Result<NoTap, String> {
        match *projection {}
    }
}
