//! Progress bar adapter using indicatif.

use face_data_core::{ProgressEvent, ProgressSink, SampleReport};
use indicatif::{ProgressBar as IndicatifBar, ProgressStyle};
use tracing::debug;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {wide_msg}";

enum Mode {
    /// Nothing at all, not even skip warnings.
    Quiet,
    /// Skip warnings only; loaded samples go to the debug log.
    Plain,
    /// Live bar on stderr.
    Bar(IndicatifBar),
}

/// Progress adapter for the `check` walk over a split.
pub struct ProgressBar {
    mode: Mode,
}

impl ProgressBar {
    /// Creates the adapter.
    ///
    /// `quiet` wins over `show_bar`. Without a bar, skipped samples are
    /// still reported on stderr.
    #[must_use]
    pub fn new(total: Option<u64>, quiet: bool, show_bar: bool) -> Self {
        let mode = match (quiet, show_bar) {
            (true, _) => Mode::Quiet,
            (false, false) => Mode::Plain,
            (false, true) => {
                let bar = total.map_or_else(IndicatifBar::new_spinner, IndicatifBar::new);
                if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE) {
                    bar.set_style(style.progress_chars("#>-"));
                }
                Mode::Bar(bar)
            }
        };
        Self { mode }
    }

    fn bar(&self) -> Option<&IndicatifBar> {
        match &self.mode {
            Mode::Bar(bar) => Some(bar),
            Mode::Quiet | Mode::Plain => None,
        }
    }
}

fn describe(report: &SampleReport) -> String {
    match &report.mask {
        Some(mask) => format!(
            "sample {}: image {:?}, mask {:?}",
            report.index, report.image.shape, mask.shape
        ),
        None => format!("sample {}: image {:?}", report.index, report.image.shape),
    }
}

impl ProgressSink for ProgressBar {
    fn on_event(&self, event: ProgressEvent) {
        if matches!(self.mode, Mode::Quiet) {
            return;
        }

        match event {
            ProgressEvent::Started { path, index, total } => {
                if let Some(bar) = self.bar() {
                    if let Some(t) = total {
                        bar.set_length(t as u64);
                    }
                    bar.set_position(index as u64);
                    bar.set_message(path);
                }
            }
            ProgressEvent::Completed { report } => match self.bar() {
                Some(bar) => bar.inc(1),
                None => debug!("Loaded {}", describe(&report)),
            },
            ProgressEvent::Skipped { path, reason } => {
                let line = format!("WARN: Skipping {path}: {reason}");
                match self.bar() {
                    Some(bar) => {
                        bar.println(line);
                        bar.inc(1);
                    }
                    None => eprintln!("{line}"),
                }
            }
            ProgressEvent::Finished { processed, skipped } => {
                if let Some(bar) = self.bar() {
                    bar.finish_with_message(format!("{processed} loaded, {skipped} failed"));
                }
            }
        }
    }
}
