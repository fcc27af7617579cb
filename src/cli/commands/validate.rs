//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Waymark configuration file.

use crate::adapters::storage::BackendFactory;
use crate::config::{load_config_unvalidated, WaymarkConfig};
use crate::domain::BackendDescriptor;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config_unvalidated(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let checked = config
            .validate()
            .map_err(|e| e.to_string())
            .and_then(|()| config.to_job().map_err(|e| e.to_string()))
            .and_then(|job| {
                BackendFactory::from_config(&config)
                    .ensure_permitted(&job.backend)
                    .map_err(|e| e.to_string())
            });

        match checked {
            Ok(()) => {
                println!("✅ Configuration is valid");
                println!();
                print_summary(&config);
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2)
            }
        }
    }
}

fn print_summary(config: &WaymarkConfig) {
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!("  Komoot API: {}", config.komoot.base_url);
    println!(
        "  Komoot Account: {}",
        config.komoot.email.as_deref().unwrap_or("(from --api-key)")
    );
    println!(
        "  Export Name: {}",
        if config.export.name.is_empty() {
            "(none)"
        } else {
            config.export.name.as_str()
        }
    );
    println!(
        "  Date Range: {} .. {}",
        config.export.start_date.as_deref().unwrap_or("*"),
        config.export.end_date.as_deref().unwrap_or("*")
    );
    println!(
        "  Sport: {}",
        config.export.sport.as_deref().unwrap_or("all")
    );
    println!("  Completed Only: {}", config.export.complete_only);
    println!("  Concurrency: {}", config.export.concurrency);

    match &config.storage.backend {
        BackendDescriptor::ObjectStorage {
            endpoint,
            bucket,
            use_export_folder,
            ..
        } => {
            println!("  Storage: S3 ({endpoint})");
            println!("  Bucket: {bucket}");
            println!("  Export Folder: {use_export_folder}");
        }
        BackendDescriptor::FilesystemPath { path } => {
            println!("  Storage: Filesystem ({})", path.display());
        }
        BackendDescriptor::NetworkShare {
            server,
            share,
            subfolder,
            ..
        } => {
            println!("  Storage: SMB (//{server}/{share})");
            println!("  Subfolder: {}", subfolder.as_deref().unwrap_or("(root)"));
        }
    }
    println!("  I/O Timeout: {}s", config.storage.io_timeout_seconds);
}
