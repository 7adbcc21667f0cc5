use crate::models::error::RecorderError;
use crate::traits::projection::{CaptureProjection, CaptureTap, ProjectionPlatform, TapDescriptor};

/// Proof that a particular secondary resource was acquired.
///
/// The session controller keeps only this token. Releasing with a lease that
/// no longer matches the held resource is a no-op, so a late teardown from
/// one session can never release a resource acquired by a later one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceLease(u64);

/// A projection and the tap created on it. Held together or not at all.
struct SecondaryCaptureResource<P: ProjectionPlatform> {
    lease: ResourceLease,
    projection: P::Projection,
    tap: P::Tap,
}

impl<P: ProjectionPlatform> SecondaryCaptureResource<P> {
    fn release(mut self) {
        // Tap first: it is only valid while the projection is.
        self.tap.release();
        self.projection.stop();
    }
}

/// Owns every system-audio capture resource in the process.
///
/// Two slots:
/// - `active`: the projection + tap pair backing the current system-audio
///   session.
/// - `parked`: a granted projection the host handed over ahead of time,
///   consumed by the next system-audio start. This is the only ambient
///   handle reference; nothing outside this type can read or clear it.
///
/// Every method is infallible on the release side and safe to call from any
/// error path without preconditions.
pub struct CaptureResourceManager<P: ProjectionPlatform> {
    platform: P,
    active: Option<SecondaryCaptureResource<P>>,
    parked: Option<P::Projection>,
    next_lease: u64,
}

impl<P: ProjectionPlatform> CaptureResourceManager<P> {
    pub fn new(platform: P) -> Self {
        Self {
            platform,
            active: None,
            parked: None,
            next_lease: 1,
        }
    }

    /// Create an audio-only tap on `projection` and hold both.
    ///
    /// On failure the projection is stopped and nothing is held.
    pub fn prepare(
        &mut self,
        mut projection: P::Projection,
        descriptor: &TapDescriptor,
    ) -> Result<ResourceLease, RecorderError> {
        if self.active.is_some() {
            log::warn!("Releasing stale system audio resource before acquiring a new one");
            self.release_active();
        }

        match self.platform.create_tap(&mut projection, descriptor) {
            Ok(tap) => {
                let lease = ResourceLease(self.next_lease);
                self.next_lease += 1;
                self.active = Some(SecondaryCaptureResource {
                    lease,
                    projection,
                    tap,
                });
                log::debug!("System audio tap '{}' created ({:?})", descriptor.name, lease);
                Ok(lease)
            }
            Err(reason) => {
                log::error!("System audio tap '{}' denied: {}", descriptor.name, reason);
                projection.stop();
                Err(RecorderError::ResourceAcquisition(reason))
            }
        }
    }

    /// Release the resource identified by `lease` and clear the parked handle.
    ///
    /// `None`, an already-released lease, or a lease from an earlier session
    /// leave the held resource alone.
    pub fn release(&mut self, lease: Option<ResourceLease>) {
        match (lease, self.active_lease()) {
            (Some(requested), Some(held)) if requested == held => self.release_active(),
            (Some(requested), _) => log::debug!("Ignoring release of stale {:?}", requested),
            (None, _) => {}
        }
        self.clear_parked();
    }

    /// Release whatever is held, regardless of which session acquired it.
    pub fn release_all(&mut self) {
        self.release_active();
        self.clear_parked();
    }

    /// Stop a projection that never made it into a resource.
    pub fn discard(&mut self, mut projection: P::Projection) {
        projection.stop();
        log::debug!("Discarded unused capture projection");
    }

    /// Hold a granted projection for the next system-audio start, replacing
    /// (and stopping) any previously parked one.
    pub fn park(&mut self, projection: P::Projection) {
        self.clear_parked();
        self.parked = Some(projection);
    }

    pub fn take_parked(&mut self) -> Option<P::Projection> {
        self.parked.take()
    }

    /// Stop and forget the parked projection, if any.
    pub fn clear_parked(&mut self) {
        if let Some(mut projection) = self.parked.take() {
            projection.stop();
            log::debug!("Cleared parked capture projection");
        }
    }

    pub fn is_held(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_parked(&self) -> bool {
        self.parked.is_some()
    }

    pub fn active_lease(&self) -> Option<ResourceLease> {
        self.active.as_ref().map(|resource| resource.lease)
    }

    fn release_active(&mut self) {
        if let Some(resource) = self.active.take() {
            let lease = resource.lease;
            resource.release();
            log::debug!("System audio resources released ({:?})", lease);
        }
    }
}

impl<P: ProjectionPlatform> Drop for CaptureResourceManager<P> {
    fn drop(&mut self) {
        self.release_all();
    }
}
