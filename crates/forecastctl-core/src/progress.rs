//! Progress tracking for lifecycle waits.
//!
//! The waiters in [`crate::lifecycle`] poll a resource until it reaches a
//! terminal state. This module carries the events they emit along the way so
//! the caller can surface them however it likes (log lines, spinners) without
//! the engine knowing about presentation.

use std::time::Duration;

/// Progress events emitted while waiting on a resource
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// The wait has started
    Started { name: String },
    /// Polling iteration with the current in-progress status
    Polling {
        name: String,
        status: String,
        remaining_minutes: Option<i64>,
        elapsed: Duration,
    },
    /// The resource became usable
    Active { name: String },
    /// The resource is fully removed
    Deleted { name: String },
    /// The wait ended in a terminal failure
    Failed { name: String, error: String },
}

/// Callback type for progress updates
///
/// The CLI uses this to emit its status log lines. Callers that do not care
/// pass `None`.
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Helper to emit progress events
pub(crate) fn emit(callback: &Option<ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(event);
    }
}
