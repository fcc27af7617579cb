//! Core export pipeline for Waymark.
//!
//! # Modules
//!
//! - [`export`] - Job orchestration and the export report
//! - [`transform`] - Tour payload to GPX conversion
//! - [`verification`] - Optional read-back check of generated documents
//!
//! # Export Workflow
//!
//! 1. **Authenticate** against the tour source
//! 2. **Open** the storage backend (validated once per job)
//! 3. **List** tours and apply the date, sport and completion filters
//! 4. **Convert** each tour's detail into a GPX document
//! 5. **Write** the document through the storage backend
//! 6. **Report** successes and per-tour failures
//!
//! # Example
//!
//! ```rust,no_run
//! use waymark::config::load_config;
//! use waymark::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("waymark.toml")?;
//! let coordinator = ExportCoordinator::from_config(&config)?;
//!
//! let report = coordinator.run(&config.to_job()?, config.credentials()?).await?;
//!
//! println!("Exported: {}", report.succeeded());
//! println!("Failed: {}", report.failed());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod transform;
pub mod verification;
