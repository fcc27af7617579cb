//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Waymark using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Waymark - Komoot tour to GPX storage exporter
#[derive(Parser, Debug)]
#[command(name = "waymark")]
#[command(version, about, long_about = None)]
#[command(author = "Waymark Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "waymark.toml", env = "WAYMARK_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "WAYMARK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export tours as GPX to the configured storage backend
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
