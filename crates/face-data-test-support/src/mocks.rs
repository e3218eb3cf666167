//! Mock implementations of core port traits.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use face_data_core::ports::{ImageLister, ProgressEvent, ProgressSink, ResultOutput};
use face_data_core::{DatasetError, Result, SampleReport};

/// Mock implementation of `ImageLister` for testing.
///
/// Returns pre-registered listings and records which directories were asked for.
#[derive(Default)]
pub struct MockImageLister {
    listings: HashMap<PathBuf, Vec<PathBuf>>,
    requests: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockImageLister {
    /// Creates a lister that knows no directories.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the listing returned for `dir`, in the order given.
    #[must_use]
    pub fn with_listing(mut self, dir: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        self.listings.insert(dir.into(), files);
        self
    }

    /// Directories requested so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PathBuf> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ImageLister for MockImageLister {
    fn list_images(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.to_path_buf());
        self.listings
            .get(dir)
            .cloned()
            .ok_or_else(|| DatasetError::MissingDirectory(dir.to_path_buf()))
    }
}

/// Mock implementation of `ResultOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockResultOutput {
    reports: Arc<Mutex<Vec<SampleReport>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockResultOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<SampleReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockResultOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultOutput for MockResultOutput {
    fn write(&self, report: &SampleReport) -> std::io::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> std::io::Result<()> {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Completed` events.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Completed { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { processed, skipped } => Some((*processed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
