//! Progress reporting port for UI integration.

use crate::domain::SampleReport;

/// Events emitted while walking a dataset split.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Loading started for a sample.
    Started {
        /// Source path of the sample (the face image for masked datasets).
        path: String,
        /// Position in the split (0-based).
        index: usize,
        /// Number of samples that will be visited.
        total: Option<usize>,
    },
    /// A sample loaded and transformed successfully.
    Completed {
        /// The sample report.
        report: SampleReport,
    },
    /// A sample failed to load.
    Skipped {
        /// Source path of the sample.
        path: String,
        /// Reason for skipping.
        reason: String,
    },
    /// The walk is over.
    Finished {
        /// Samples loaded successfully.
        processed: usize,
        /// Samples that failed.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}
