use std::path::Path;

use crate::models::error::RecorderError;
use crate::models::progress::ProgressEvent;

/// Outbound notifications from the session controller.
///
/// Methods run on the calling thread for `start`/`pause`/`resume`/`stop` and
/// on the progress thread for ticks, after the controller has released its
/// state lock. Deliveries are serialized, so events arrive in transition
/// order, and a callback may call back into the controller (for example
/// `stop()` from `on_record_progress`).
///
/// Exactly one of `on_stop_record` / `on_error` terminates each failed or
/// stopped lifecycle transition. Progress only fires between a successful
/// start or resume and the next pause or stop.
pub trait RecorderCallback: Send + Sync {
    fn on_start_record(&self, output: &Path);

    fn on_pause_record(&self);

    fn on_resume_record(&self);

    fn on_stop_record(&self, output: &Path);

    fn on_record_progress(&self, progress: &ProgressEvent);

    fn on_error(&self, error: &RecorderError);
}
