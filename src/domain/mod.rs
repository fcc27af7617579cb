//! Domain models and types for Waymark.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TourId`], [`ExportName`])
//! - **Tour models** ([`TourSummary`], [`TourPayload`], [`TourDetail`], [`TrackDocument`])
//! - **Job description** ([`ExportJob`], [`TourFilter`], [`BackendDescriptor`])
//! - **Error types** ([`WaymarkError`], [`WriteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a tour id cannot be passed where an
//! export name is expected:
//!
//! ```rust
//! use waymark::domain::{ExportName, TourId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tour_id = TourId::new("1234567890")?;
//! let export_name = ExportName::new("summer-2026");
//!
//! // This won't compile - type safety prevents mixing IDs
//! // let wrong: TourId = export_name;
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod errors;
pub mod ids;
pub mod job;
pub mod result;
pub mod tour;

// Re-export commonly used types for convenience
pub use credentials::Credentials;
pub use errors::{WaymarkError, WriteError, WriteErrorKind};
pub use ids::{ExportName, TourId};
pub use job::{BackendDescriptor, DateRange, ExportJob, TourFilter, MAX_CONCURRENCY};
pub use result::Result;
pub use tour::{
    RawPoint, TourDetail, TourPayload, TourStatus, TourSummary, TrackDocument, TrackPoint,
};
