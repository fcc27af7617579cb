// Waymark - Komoot tour to GPX storage exporter
// Copyright (c) 2026 Waymark Contributors
// Licensed under the MIT License

//! # Waymark - Komoot tour to GPX storage exporter
//!
//! Waymark signs in to a Komoot account, lists the tours that match a filter,
//! converts each tour's recorded track to a GPX 1.1 document and writes the
//! documents to S3-compatible object storage, a local or NFS directory, or an
//! SMB share.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export orchestration, GPX conversion and verification
//! - [`adapters`] - Komoot API client and storage backends
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waymark::config::load_config;
//! use waymark::core::export::ExportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("waymark.toml")?;
//! let job = config.to_job()?;
//! let credentials = config.credentials()?;
//!
//! let coordinator = ExportCoordinator::from_config(&config)?;
//! let report = coordinator.run(&job, credentials).await?;
//!
//! println!("{}", report.format_summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! Failures that make the whole job pointless (bad configuration, rejected
//! credentials, a listing that cannot be fetched) end the job with a
//! [`domain::WaymarkError`]. Anything that goes wrong with a single tour is
//! recorded in the [`core::export::ExportReport`] and the job moves on.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
