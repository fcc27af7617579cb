//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - human-readable console output on stderr
//! - optional JSON file logging with rotation
//! - helper macros that keep field names consistent across the pipeline
//!
//! # Example
//!
//! ```no_run
//! use waymark::logging::init_logging;
//! use waymark::config::LoggingConfig;
//!
//! let config = LoggingConfig::console_only();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(backend = "s3", "Export started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export job
///
/// # Example
///
/// ```no_run
/// use waymark::log_export_start;
///
/// log_export_start!("summer-2026", "s3");
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($export_name:expr, $backend:expr) => {
        tracing::info!(
            export_name = %$export_name,
            backend = %$backend,
            "Starting export"
        );
    };
}

/// Log the completion of an export job
///
/// # Example
///
/// ```no_run
/// use waymark::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!(12, 1, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($succeeded:expr, $failed:expr, $duration:expr) => {
        tracing::info!(
            succeeded = $succeeded,
            failed = $failed,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log a tour that was recorded as failed
///
/// # Example
///
/// ```no_run
/// use waymark::log_tour_failure;
///
/// log_tour_failure!("1234567890", "not_found", "tour vanished");
/// ```
#[macro_export]
macro_rules! log_tour_failure {
    ($tour_id:expr, $kind:expr, $message:expr) => {
        tracing::warn!(
            tour_id = %$tour_id,
            error_kind = %$kind,
            message = %$message,
            "Tour export failed"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use waymark::log_retry_attempt;
///
/// log_retry_attempt!(1, 1, "HTTP 503");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
