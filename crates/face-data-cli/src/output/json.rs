//! JSON output adapter.

use face_data_core::{ResultOutput, SampleReport};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// JSON output adapter.
///
/// Writes one object per line, or collects the reports and writes them as a
/// single array on `flush`.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    array: Option<Mutex<ArrayState>>,
}

struct ArrayState {
    pending: Vec<SampleReport>,
    pretty: bool,
    emitted: bool,
}

impl JsonOutput {
    /// JSON Lines on stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// JSON Lines on the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            array: None,
        }
    }

    /// A single JSON array on the given writer, written on `flush`.
    #[must_use]
    pub fn array(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            array: Some(Mutex::new(ArrayState {
                pending: Vec::new(),
                pretty,
                emitted: false,
            })),
        }
    }

    /// Writes any serializable value as one JSON document.
    pub fn write_value<T: serde::Serialize>(&self, value: &T, pretty: bool) -> io::Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        self.write_line(&json)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{line}")
    }
}

impl ResultOutput for JsonOutput {
    fn write(&self, report: &SampleReport) -> io::Result<()> {
        match &self.array {
            Some(state) => {
                state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pending
                    .push(report.clone());
                Ok(())
            }
            None => {
                let json = serde_json::to_string(report)?;
                self.write_line(&json)
            }
        }
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(state) = &self.array {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            // An empty split still yields `[]`, once.
            if !state.pending.is_empty() || !state.emitted {
                let reports = std::mem::take(&mut state.pending);
                self.write_value(&reports, state.pretty)?;
                state.emitted = true;
            }
        }
        self.writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}
