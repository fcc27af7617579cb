//! Domain error types
//!
//! This module defines the error hierarchy for Waymark. Errors are domain-specific
//! and don't expose third-party HTTP or storage client types.

use std::fmt;
use thiserror::Error;

/// Main Waymark error type
///
/// Job-fatal failures (authentication, listing, configuration) surface as one of
/// these variants. Per-tour failures are caught by the export coordinator and
/// recorded in the report instead of propagating.
#[derive(Debug, Error)]
pub enum WaymarkError {
    /// Configuration-related errors, including a storage backend that the
    /// deployment does not permit
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Rejected credentials or an unreachable authentication endpoint
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network failure, timeout, rate limiting or 5xx against the source API
    #[error("Transient fetch error: {0}")]
    TransientFetch(String),

    /// Tour vanished between listing and detail fetch
    #[error("Tour not found: {0}")]
    NotFound(String),

    /// Tour payload could not be parsed into a track
    #[error("Malformed tour data: {0}")]
    MalformedData(String),

    /// Storage backend rejected a document
    #[error(transparent)]
    Write(#[from] WriteError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl WaymarkError {
    /// Whether retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, WaymarkError::TransientFetch(_))
    }
}

/// Classification of storage write failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteErrorKind {
    /// Bad credentials for the backend
    AuthFailure,
    /// Network, DNS or connection failure (including timeouts)
    Unreachable,
    /// Path not writable or insufficient rights
    PermissionDenied,
    /// Backend rejected the write for capacity reasons
    QuotaOrSpace,
    /// Anything else
    Other,
}

impl fmt::Display for WriteErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteErrorKind::AuthFailure => "auth failure",
            WriteErrorKind::Unreachable => "unreachable",
            WriteErrorKind::PermissionDenied => "permission denied",
            WriteErrorKind::QuotaOrSpace => "quota or space exhausted",
            WriteErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Storage write error
///
/// Returned by every storage backend, both when opening the backend for a job and
/// when writing a single document.
#[derive(Debug, Clone, Error)]
#[error("Write failed ({kind}): {message}")]
pub struct WriteError {
    /// Failure classification
    pub kind: WriteErrorKind,

    /// Human-readable detail
    pub message: String,
}

impl WriteError {
    /// Creates a new write error
    pub fn new(kind: WriteErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(WriteErrorKind::AuthFailure, message)
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(WriteErrorKind::Unreachable, message)
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(WriteErrorKind::PermissionDenied, message)
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::new(WriteErrorKind::QuotaOrSpace, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(WriteErrorKind::Other, message)
    }

    /// Classifies a filesystem error
    ///
    /// `ENOSPC` (28) and `EDQUOT` (122 on Linux) map to [`WriteErrorKind::QuotaOrSpace`],
    /// `EROFS` (30) to [`WriteErrorKind::PermissionDenied`].
    pub fn from_io(err: &std::io::Error, context: &str) -> Self {
        use std::io::ErrorKind;

        let message = format!("{context}: {err}");
        match err.raw_os_error() {
            Some(28) | Some(122) => return Self::quota(message),
            Some(30) => return Self::permission_denied(message),
            Some(101) | Some(113) => return Self::unreachable(message),
            _ => {}
        }
        match err.kind() {
            ErrorKind::PermissionDenied | ErrorKind::NotFound => Self::permission_denied(message),
            ErrorKind::TimedOut
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected => Self::unreachable(message),
            _ => Self::other(message),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for WaymarkError {
    fn from(err: std::io::Error) -> Self {
        WaymarkError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for WaymarkError {
    fn from(err: serde_json::Error) -> Self {
        WaymarkError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for WaymarkError {
    fn from(err: toml::de::Error) -> Self {
        WaymarkError::Configuration(format!("TOML parse error: {err}"))
    }
}
