//! Export command implementation
//!
//! This module implements the `export` command: load and override the
//! configuration, run one export job and render its report.

use crate::config::{load_config_unvalidated, WaymarkConfig};
use crate::core::export::{ExportCoordinator, ExportReport};
use crate::domain::{Credentials, WaymarkError};
use clap::Args;
use tokio::sync::watch;

/// Exit code for a completed job without failures
pub const EXIT_SUCCESS: i32 = 0;
/// Job completed but some tours failed
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_AUTH: i32 = 3;
/// Listing failed (network, rate limiting, 5xx)
pub const EXIT_TRANSIENT: i32 = 4;
pub const EXIT_FATAL: i32 = 5;
pub const EXIT_INTERRUPTED: i32 = 130;

/// Arguments for the export command
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Override the first day to export (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub start_date: Option<String>,

    /// Override the last day to export (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub end_date: Option<String>,

    /// Override the sport filter (exact match, e.g. hike)
    #[arg(long)]
    pub sport: Option<String>,

    /// Override the export name used as document prefix
    #[arg(long)]
    pub name: Option<String>,

    /// Only export recorded tours
    #[arg(long)]
    pub complete_only: bool,

    /// Override the number of tours processed at once (1-8)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Parse every document back before writing it
    #[arg(long)]
    pub verify: bool,

    /// Komoot credentials as `email:password`, instead of the config file
    #[arg(long, env = "WAYMARK_KOMOOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config_unvalidated(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        self.apply_overrides(&mut config);

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let prepared = config.to_job().and_then(|job| {
            let credentials = self.credentials(&config)?;
            let coordinator = ExportCoordinator::from_config(&config)?;
            Ok((job, credentials, coordinator))
        });
        let (job, credentials, coordinator) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                eprintln!("{e}");
                return Ok(exit_code_for(&e));
            }
        };

        // Confirmation prompt (unless --yes)
        if !self.yes {
            println!("Export Configuration:");
            println!(
                "  Name: {}",
                if job.export_name.is_empty() {
                    "(none)"
                } else {
                    job.export_name.as_str()
                }
            );
            println!("  Dates: {}", job.filter.date_range);
            println!(
                "  Sport: {}",
                job.filter.sport.as_deref().unwrap_or("all")
            );
            println!("  Completed only: {}", job.filter.complete_only);
            println!("  Storage: {}", job.backend.kind_name());
            println!();
            print!("Proceed with export? [y/N]: ");
            use std::io::{self, Write};
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Export cancelled.");
                return Ok(EXIT_SUCCESS);
            }
        }

        if !self.json {
            println!("🚀 Starting export...");
            println!();
        }

        let outcome = tokio::select! {
            outcome = coordinator.run(&job, credentials) => outcome,
            _ = interrupted(&mut shutdown_signal) => {
                tracing::warn!("Export interrupted by user signal");
                eprintln!();
                eprintln!("⚠️  Export interrupted. Documents already written are kept.");
                return Ok(EXIT_INTERRUPTED);
            }
        };

        match outcome {
            Ok(report) => self.render(&report),
            Err(e) => {
                eprintln!("Export failed: {e}");
                Ok(exit_code_for(&e))
            }
        }
    }

    fn apply_overrides(&self, config: &mut WaymarkConfig) {
        if let Some(start) = &self.start_date {
            tracing::info!(start_date = %start, "Overriding start date from CLI");
            config.export.start_date = Some(start.clone());
        }
        if let Some(end) = &self.end_date {
            tracing::info!(end_date = %end, "Overriding end date from CLI");
            config.export.end_date = Some(end.clone());
        }
        if let Some(sport) = &self.sport {
            tracing::info!(sport = %sport, "Overriding sport filter from CLI");
            config.export.sport = Some(sport.clone());
        }
        if let Some(name) = &self.name {
            config.export.name = name.clone();
        }
        if self.complete_only {
            config.export.complete_only = true;
        }
        if let Some(concurrency) = self.concurrency {
            config.export.concurrency = concurrency;
        }
        if self.verify {
            config.export.verify_documents = true;
        }
    }

    fn credentials(&self, config: &WaymarkConfig) -> crate::domain::Result<Credentials> {
        match &self.api_key {
            Some(api_key) => Credentials::from_api_key(api_key),
            None => config.credentials(),
        }
    }

    fn render(&self, report: &ExportReport) -> anyhow::Result<i32> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            println!("{}", report.format_summary());
            if report.is_successful() {
                println!("✅ Export completed successfully!");
            } else {
                println!("⚠️  Export completed with failures");
            }
        }

        Ok(if report.is_successful() {
            EXIT_SUCCESS
        } else {
            EXIT_PARTIAL
        })
    }
}

/// Resolves once the shutdown flag is set; never resolves if the sender is gone
async fn interrupted(signal: &mut watch::Receiver<bool>) {
    while !*signal.borrow() {
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Map a job-fatal error to the process exit code
pub fn exit_code_for(err: &WaymarkError) -> i32 {
    match err {
        WaymarkError::Configuration(_) => EXIT_CONFIG,
        WaymarkError::Auth(_) => EXIT_AUTH,
        WaymarkError::TransientFetch(_) => EXIT_TRANSIENT,
        _ => EXIT_FATAL,
    }
}
