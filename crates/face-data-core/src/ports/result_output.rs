//! Result output port for writing sample reports.

use crate::domain::SampleReport;

/// Port for outputting sample reports.
pub trait ResultOutput: Send + Sync {
    /// Writes a single report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write(&self, report: &SampleReport) -> std::io::Result<()>;

    /// Flushes any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    fn flush(&self) -> std::io::Result<()>;
}
