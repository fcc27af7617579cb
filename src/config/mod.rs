//! Configuration management for Waymark.
//!
//! Waymark uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `WAYMARK_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation before any network call is made
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level and the local-path capability flag
//! - [`KomootConfig`] - API endpoint, account, timeouts and retry policy
//! - [`ExportConfig`] - export name, date/sport/completion filters, concurrency
//! - [`StorageConfig`] - the storage backend (`type = "s3" | "filesystem" | "smb"`)
//! - [`LoggingConfig`] - optional JSON file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [komoot]
//! email = "rider@example.com"
//! password = "${KOMOOT_PASSWORD}"
//!
//! [export]
//! name = "summer-2026"
//! start_date = "2026-06-01"
//! end_date = "2026-08-31"
//! complete_only = true
//!
//! [storage]
//! type = "s3"
//! endpoint = "https://s3.eu-central-1.amazonaws.com"
//! bucket = "tour-archive"
//! access_key = "${S3_ACCESS_KEY}"
//! secret_key = "${S3_SECRET_KEY}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_unvalidated};
pub use schema::{
    ApplicationConfig, ExportConfig, KomootConfig, LoggingConfig, RetryConfig, StorageConfig,
    WaymarkConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
