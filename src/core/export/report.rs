//! Export report
//!
//! The coordinator accumulates per-tour outcomes in a [`ReportBuilder`] and
//! hands back an immutable [`ExportReport`] once the job completes.

use crate::domain::{TourId, WaymarkError, WriteErrorKind};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Classification of a per-tour failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TourErrorKind {
    /// Tour vanished between listing and detail fetch
    NotFound,
    /// Detail fetch kept failing after retries
    TransientFetch,
    /// Payload or generated document did not hold a valid track
    MalformedData,
    /// Session was rejected while fetching the detail
    Auth,
    /// Storage backend rejected the document (or could not be opened)
    Write(WriteErrorKind),
    /// Anything else
    Other,
}

impl From<&WaymarkError> for TourErrorKind {
    fn from(err: &WaymarkError) -> Self {
        match err {
            WaymarkError::NotFound(_) => TourErrorKind::NotFound,
            WaymarkError::TransientFetch(_) => TourErrorKind::TransientFetch,
            WaymarkError::MalformedData(_) => TourErrorKind::MalformedData,
            WaymarkError::Auth(_) => TourErrorKind::Auth,
            WaymarkError::Write(write) => TourErrorKind::Write(write.kind),
            _ => TourErrorKind::Other,
        }
    }
}

impl fmt::Display for TourErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourErrorKind::NotFound => f.write_str("not found"),
            TourErrorKind::TransientFetch => f.write_str("transient fetch"),
            TourErrorKind::MalformedData => f.write_str("malformed data"),
            TourErrorKind::Auth => f.write_str("auth"),
            TourErrorKind::Write(kind) => write!(f, "write: {kind}"),
            TourErrorKind::Other => f.write_str("other"),
        }
    }
}

/// One tour that could not be exported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourFailure {
    pub tour_id: TourId,
    pub kind: TourErrorKind,
    pub message: String,
}

impl TourFailure {
    pub fn new(tour_id: TourId, kind: TourErrorKind, message: impl Into<String>) -> Self {
        Self {
            tour_id,
            kind,
            message: message.into(),
        }
    }

    /// Classify an error raised while processing `tour_id`
    pub fn from_error(tour_id: TourId, err: &WaymarkError) -> Self {
        let message = match err {
            WaymarkError::Write(write) => write.message.clone(),
            other => other.to_string(),
        };
        Self::new(tour_id, TourErrorKind::from(err), message)
    }
}

/// One document that was written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedDocument {
    pub tour_id: TourId,
    /// Document file name
    pub name: String,
    /// Backend-specific location (path, `s3://` or `smb://` URL)
    pub location: String,
    pub point_count: usize,
}

/// Final, immutable result of an export job
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    succeeded: usize,
    failed: usize,
    failures: Vec<TourFailure>,
    documents: Vec<ExportedDocument>,
    duration_ms: u64,
}

impl ExportReport {
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of tours that passed the filters
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Per-tour failures in listing order
    pub fn failures(&self) -> &[TourFailure] {
        &self.failures
    }

    /// Written documents in listing order
    pub fn documents(&self) -> &[ExportedDocument] {
        &self.documents
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Whether every tour was exported
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Log the report
    pub fn log_summary(&self) {
        crate::log_export_complete!(self.succeeded, self.failed, self.duration());

        if !self.failures.is_empty() {
            tracing::warn!(
                failure_count = self.failures.len(),
                "Export completed with tour failures"
            );
        }
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📊 Export Report\n");
        summary.push_str(&format!("  Tours matched: {}\n", self.total()));
        summary.push_str(&format!("  ✅ Exported: {}\n", self.succeeded));
        summary.push_str(&format!("  ❌ Failed: {}\n", self.failed));
        summary.push_str(&format!(
            "  Duration: {:.2}s\n",
            self.duration().as_secs_f64()
        ));

        if !self.failures.is_empty() {
            summary.push_str("\n❌ Failures:\n");
            for failure in &self.failures {
                summary.push_str(&format!(
                    "  - {} [{}]: {}\n",
                    failure.tour_id, failure.kind, failure.message
                ));
            }
        }

        summary
    }
}

/// Incremental builder for [`ExportReport`]
#[derive(Debug, Default)]
pub struct ReportBuilder {
    failures: Vec<TourFailure>,
    documents: Vec<ExportedDocument>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, document: ExportedDocument) {
        self.documents.push(document);
    }

    pub fn record_failure(&mut self, failure: TourFailure) {
        crate::log_tour_failure!(failure.tour_id, failure.kind, failure.message);
        self.failures.push(failure);
    }

    /// Seal the report
    pub fn finish(self, duration: Duration) -> ExportReport {
        ExportReport {
            succeeded: self.documents.len(),
            failed: self.failures.len(),
            failures: self.failures,
            documents: self.documents,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
