//! Progress reporting for long-running aggregations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStep {
    Tutors,
    Patients,
    Sales,
    ClinicalHistory,
    Prescriptions,
    Expirables,
    Complete,
}

impl ProgressStep {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStep::Tutors => "tutors",
            ProgressStep::Patients => "patients",
            ProgressStep::Sales => "sales",
            ProgressStep::ClinicalHistory => "clinical history",
            ProgressStep::Prescriptions => "prescriptions",
            ProgressStep::Expirables => "expirables",
            ProgressStep::Complete => "complete",
        }
    }
}

/// Advisory progress event; `progress` is a 0-100 percentage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEvent {
    pub step: ProgressStep,
    pub progress: u8,
    pub message: String,
}

pub type ProgressCallback = dyn Fn(ProgressEvent) + Send + Sync;

/// Slice of the 0-100 scale owned by one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSpan {
    pub base: u8,
    pub span: u8,
}

impl ProgressSpan {
    pub const fn new(base: u8, span: u8) -> Self {
        Self { base, span }
    }

    /// Position after `done` of `total` units.
    pub fn at(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.base.saturating_add(self.span);
        }
        let fraction = done.min(total) as f64 / total as f64;
        let value = self.base as f64 + self.span as f64 * fraction;
        value.round().min(100.0) as u8
    }
}

/// Forwards events to an optional callback, never letting progress go backwards.
pub struct ProgressReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    last: AtomicU8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            last: AtomicU8::new(0),
        }
    }

    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn report(&self, step: ProgressStep, progress: u8, message: impl Into<String>) {
        let progress = progress.min(100);
        let progress = self.last.fetch_max(progress, Ordering::SeqCst).max(progress);
        let message = message.into();
        tracing::debug!(?step, progress, "{}", message);

        if let Some(callback) = self.callback {
            callback(ProgressEvent {
                step,
                progress,
                message,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_span_scaling() {
        let span = ProgressSpan::new(20, 30);
        assert_eq!(span.at(0, 4), 20);
        assert_eq!(span.at(2, 4), 35);
        assert_eq!(span.at(4, 4), 50);
        assert_eq!(span.at(0, 0), 50);
    }

    #[test]
    fn test_reporter_is_monotonic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback = move |event: ProgressEvent| sink.lock().unwrap().push(event.progress);
        let reporter = ProgressReporter::new(Some(&callback));

        reporter.report(ProgressStep::Tutors, 10, "tutors");
        reporter.report(ProgressStep::Patients, 5, "late event");
        reporter.report(ProgressStep::Complete, 100, "done");

        assert_eq!(*seen.lock().unwrap(), vec![10, 10, 100]);
    }
}
