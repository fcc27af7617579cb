//! Export orchestration and reporting
//!
//! - [`coordinator`]: runs one job end to end
//! - [`report`]: per-tour outcomes and the final report

pub mod coordinator;
pub mod report;

pub use coordinator::{ExportCoordinator, JobState};
pub use report::{ExportReport, ExportedDocument, ReportBuilder, TourErrorKind, TourFailure};
