//! Configuration schema types
//!
//! This module defines the TOML configuration structure for Waymark.

use crate::config::SecretString;
use crate::domain::{
    BackendDescriptor, Credentials, DateRange, ExportJob, ExportName, Result, TourFilter,
    WaymarkError, MAX_CONCURRENCY,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main Waymark configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaymarkConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Komoot API connection
    #[serde(default)]
    pub komoot: KomootConfig,

    /// Export selection and naming
    #[serde(default)]
    pub export: ExportConfig,

    /// Storage destination
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WaymarkConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.application.validate()?;
        self.komoot.validate()?;
        self.export.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Builds the export job described by the `[export]` and `[storage]` sections
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Configuration`] if dates cannot be parsed or the
    /// date range is inverted
    pub fn to_job(&self) -> Result<ExportJob> {
        let date_range = self
            .export
            .date_range()
            .map_err(WaymarkError::Configuration)?;

        let filter = TourFilter {
            date_range,
            sport: self.export.sport.clone().filter(|s| !s.is_empty()),
            complete_only: self.export.complete_only,
        };

        Ok(
            ExportJob::new(ExportName::new(&self.export.name), self.storage.backend.clone())
                .with_filter(filter)
                .with_concurrency(self.export.concurrency)
                .with_verification(self.export.verify_documents),
        )
    }

    /// Builds credentials from `komoot.email` and `komoot.password`
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Configuration`] if either value is missing
    pub fn credentials(&self) -> Result<Credentials> {
        match (&self.komoot.email, &self.komoot.password) {
            (Some(email), Some(password)) => Credentials::new(email.clone(), password.clone()),
            _ => Err(WaymarkError::Configuration(
                "komoot.email and komoot.password are required (or pass --api-key)".to_string(),
            )),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Allow the filesystem backend; it exposes the host filesystem, so it is
    /// off unless the deployment opts in
    #[serde(default)]
    pub allow_local_paths: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            allow_local_paths: false,
        }
    }
}

/// Retry configuration for transient Komoot API failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay_ms = (self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent))
            .min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_retries > 3 {
            return Err(format!(
                "komoot.retry.max_retries must be between 0 and 3, got {}",
                self.max_retries
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err("komoot.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        if self.initial_delay_ms > self.max_delay_ms {
            return Err("komoot.retry.initial_delay_ms must not exceed max_delay_ms".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Komoot API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KomootConfig {
    /// Base URL of the Komoot API
    #[serde(default = "default_komoot_base_url")]
    pub base_url: String,

    /// Account email (optional here, may come from the CLI instead)
    #[serde(default)]
    pub email: Option<String>,

    /// Account password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Tours requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl KomootConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("komoot.base_url must start with http:// or https://".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("komoot.timeout_seconds must be > 0".to_string());
        }

        if !(1..=100).contains(&self.page_size) {
            return Err(format!(
                "komoot.page_size must be between 1 and 100, got {}",
                self.page_size
            ));
        }

        self.retry.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for KomootConfig {
    fn default() -> Self {
        Self {
            base_url: default_komoot_base_url(),
            email: None,
            password: None,
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
            retry: RetryConfig::default(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Export name, used as document prefix and storage folder
    #[serde(default)]
    pub name: String,

    /// First day to export (YYYY-MM-DD, inclusive)
    #[serde(default)]
    pub start_date: Option<String>,

    /// Last day to export (YYYY-MM-DD, inclusive)
    #[serde(default)]
    pub end_date: Option<String>,

    /// Sport type filter (exact match, empty = all)
    #[serde(default)]
    pub sport: Option<String>,

    /// Only export recorded tours, skipping planned ones
    #[serde(default)]
    pub complete_only: bool,

    /// Tours processed at once (1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Parse each generated document back before writing it
    #[serde(default)]
    pub verify_documents: bool,
}

impl ExportConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(format!(
                "export.concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, self.concurrency
            ));
        }
        self.date_range().map(|_| ())
    }

    /// Parses the configured dates into a [`DateRange`]
    pub fn date_range(&self) -> std::result::Result<DateRange, String> {
        let start = parse_date("export.start_date", self.start_date.as_deref())?;
        let end = parse_date("export.end_date", self.end_date.as_deref())?;
        DateRange::new(start, end).map_err(|e| format!("Invalid export date range: {e}"))
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            start_date: None,
            end_date: None,
            sport: None,
            complete_only: false,
            concurrency: default_concurrency(),
            verify_documents: false,
        }
    }
}

/// Storage configuration: the backend descriptor plus I/O limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend selected by the `type` key
    #[serde(flatten)]
    pub backend: BackendDescriptor,

    /// Timeout for opening the backend and for each write
    #[serde(default = "default_io_timeout_seconds")]
    pub io_timeout_seconds: u64,
}

impl StorageConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.io_timeout_seconds == 0 {
            return Err("storage.io_timeout_seconds must be > 0".to_string());
        }
        self.backend.validate()
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local_enabled".to_string());
        }

        Ok(())
    }

    /// Console-only logging, used before a configuration file is available
    pub fn console_only() -> Self {
        Self {
            local_enabled: false,
            ..Self::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn parse_date(field: &str, value: Option<&str>) -> std::result::Result<Option<NaiveDate>, String> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|e| format!("{field} must be YYYY-MM-DD, got '{v}': {e}")),
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_komoot_base_url() -> String {
    "https://api.komoot.de".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_page_size() -> usize {
    30
}

fn default_max_retries() -> usize {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_concurrency() -> usize {
    1
}

fn default_io_timeout_seconds() -> u64 {
    60
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
