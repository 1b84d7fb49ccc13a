//! Progress reporting for pipeline stages.
//!
//! The pipeline reports stage-level progress through [`ProgressCallback`]
//! so that rendering (terminal progress bars, silence in tests and in the
//! server) is chosen by the caller.

use std::sync::Arc;

/// Receives progress updates from a pipeline run.
pub trait ProgressCallback: Send + Sync {
    /// Sets the total number of stages.
    fn set_total(&self, total: u64);

    /// Advances by `delta` stages.
    fn inc(&self, delta: u64);

    /// Updates the message shown next to the progress indicator.
    fn set_message(&self, msg: String);

    /// Marks the run as complete with a final message.
    fn finish(&self, msg: String);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
