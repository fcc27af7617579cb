//! Export job description
//!
//! An [`ExportJob`] is the complete, validated input of one export run apart from
//! the credentials: which tours to pick, how to name their documents and where
//! to write them.

use crate::config::SecretString;
use crate::domain::ids::ExportName;
use crate::domain::tour::TourSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Upper bound for per-job tour concurrency
pub const MAX_CONCURRENCY: usize = 8;

/// Inclusive date range; an absent bound is unbounded on that side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl DateRange {
    /// Creates a date range, rejecting `start > end`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use waymark::domain::DateRange;
    ///
    /// let feb = NaiveDate::from_ymd_opt(2026, 2, 1);
    /// let dec = NaiveDate::from_ymd_opt(2026, 12, 1);
    /// assert!(DateRange::new(feb, dec).is_ok());
    /// assert!(DateRange::new(dec, feb).is_err());
    /// ```
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, String> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Err(format!("start date {s} is after end date {e}"));
            }
        }
        Ok(Self { start, end })
    }

    /// Unbounded range
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    /// Whether `date` falls inside the range (both bounds inclusive)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all dates"),
            (Some(s), None) => write!(f, "from {s}"),
            (None, Some(e)) => write!(f, "until {e}"),
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
        }
    }
}

/// Listing filter applied before any detail fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TourFilter {
    /// Date range on the tour's local recorded date
    pub date_range: DateRange,

    /// Exact, case-sensitive sport type; `None` or empty matches every sport
    pub sport: Option<String>,

    /// Only keep completed (recorded) tours
    pub complete_only: bool,
}

impl TourFilter {
    /// Whether a listed tour passes the date, sport and completion filters
    ///
    /// A tour without a date is not date-filtered.
    pub fn matches(&self, tour: &TourSummary) -> bool {
        if let Some(date) = tour.local_date() {
            if !self.date_range.contains(date) {
                return false;
            }
        }

        if let Some(sport) = self.sport.as_deref().filter(|s| !s.is_empty()) {
            if tour.sport != sport {
                return false;
            }
        }

        !self.complete_only || tour.status.is_completed()
    }
}

/// Storage destination for one job; exactly one variant is active
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendDescriptor {
    /// S3-compatible object storage
    #[serde(rename = "s3")]
    ObjectStorage {
        /// Endpoint URL, e.g. `https://s3.eu-central-1.amazonaws.com` or a MinIO URL
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: SecretString,
        #[serde(default = "default_region")]
        region: String,
        /// Prefix object keys with the export name as a pseudo-folder
        #[serde(default = "default_true")]
        use_export_folder: bool,
    },

    /// Local directory or mounted network filesystem (NFS)
    #[serde(rename = "filesystem", alias = "nfs")]
    FilesystemPath { path: PathBuf },

    /// SMB/CIFS network share
    #[serde(rename = "smb")]
    NetworkShare {
        server: String,
        share: String,
        username: String,
        password: SecretString,
        #[serde(default)]
        subfolder: Option<String>,
        #[serde(default)]
        workgroup: Option<String>,
    },
}

impl BackendDescriptor {
    /// Short backend name used in logs and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            BackendDescriptor::ObjectStorage { .. } => "s3",
            BackendDescriptor::FilesystemPath { .. } => "filesystem",
            BackendDescriptor::NetworkShare { .. } => "smb",
        }
    }

    /// Validates the shape of the descriptor
    ///
    /// # Errors
    ///
    /// Returns a description of the first empty or malformed field
    pub fn validate(&self) -> Result<(), String> {
        use secrecy::ExposeSecret;

        match self {
            BackendDescriptor::ObjectStorage {
                endpoint,
                bucket,
                access_key,
                secret_key,
                ..
            } => {
                if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                    return Err("storage.endpoint must start with http:// or https://".to_string());
                }
                if bucket.trim().is_empty() {
                    return Err("storage.bucket cannot be empty".to_string());
                }
                if access_key.is_empty() || secret_key.expose_secret().is_empty() {
                    return Err(
                        "storage.access_key and storage.secret_key are required for s3"
                            .to_string(),
                    );
                }
            }
            BackendDescriptor::FilesystemPath { path } => {
                if path.as_os_str().is_empty() {
                    return Err("storage.path cannot be empty".to_string());
                }
            }
            BackendDescriptor::NetworkShare {
                server,
                share,
                username,
                ..
            } => {
                if server.trim().is_empty() {
                    return Err("storage.server cannot be empty".to_string());
                }
                if share.trim().is_empty() {
                    return Err("storage.share cannot be empty".to_string());
                }
                if username.trim().is_empty() {
                    return Err("storage.username cannot be empty".to_string());
                }
            }
        }
        Ok(())
    }
}

/// One export request
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub filter: TourFilter,

    /// Sanitized prefix for document names and storage folders
    pub export_name: ExportName,

    pub backend: BackendDescriptor,

    /// Number of tours processed at once (1 = sequential)
    pub concurrency: usize,

    /// Parse every converted document back before writing it
    pub verify_documents: bool,
}

impl ExportJob {
    /// Creates a sequential job with no filters
    pub fn new(export_name: ExportName, backend: BackendDescriptor) -> Self {
        Self {
            filter: TourFilter::default(),
            export_name,
            backend,
            concurrency: 1,
            verify_documents: false,
        }
    }

    pub fn with_filter(mut self, filter: TourFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the concurrency, clamped to `1..=MAX_CONCURRENCY`
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_documents = verify;
        self
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}
