//! S3-compatible object storage backend
//!
//! Built on `object_store`'s Amazon S3 client, which also talks to MinIO,
//! Ceph RGW and other S3-compatible services through a custom endpoint.

use super::traits::{DestinationHint, StorageBackend};
use crate::domain::{TrackDocument, WriteError};
use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::client::{HttpError, HttpErrorKind};
use object_store::path::Path;
use object_store::{Attribute, ClientOptions, ObjectStore, PutOptions, RetryConfig};
use std::sync::Arc;
use std::time::Duration;

/// MIME type stored with every document
pub const GPX_CONTENT_TYPE: &str = "application/gpx+xml";

/// Connection settings for [`ObjectStorageBackend::open`]
#[derive(Debug, Clone)]
pub struct ObjectStorageSettings {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub use_export_folder: bool,
    pub io_timeout: Duration,
}

/// Object storage backend
pub struct ObjectStorageBackend {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    use_export_folder: bool,
    io_timeout: Duration,
}

impl ObjectStorageBackend {
    /// Build the S3 client and verify the bucket is reachable
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] if the client cannot be built or the bucket
    /// listing fails.
    pub async fn open(settings: ObjectStorageSettings) -> Result<Self, WriteError> {
        let store = AmazonS3Builder::new()
            .with_endpoint(&settings.endpoint)
            .with_bucket_name(&settings.bucket)
            .with_access_key_id(&settings.access_key)
            .with_secret_access_key(&settings.secret_key)
            .with_region(&settings.region)
            .with_client_options(
                ClientOptions::new()
                    .with_allow_http(settings.endpoint.starts_with("http://"))
                    .with_timeout(settings.io_timeout)
                    .with_connect_timeout(settings.io_timeout.min(Duration::from_secs(10))),
            )
            .with_retry(RetryConfig {
                max_retries: 1,
                retry_timeout: settings.io_timeout,
                ..RetryConfig::default()
            })
            .build()
            .map_err(|e| WriteError::other(format!("Invalid object storage settings: {e}")))?;

        Self::from_store(
            Arc::new(store),
            settings.bucket,
            settings.use_export_folder,
            settings.io_timeout,
        )
        .await
    }

    /// Wrap an existing store, running the same reachability check as [`open`](Self::open)
    pub async fn from_store(
        store: Arc<dyn ObjectStore>,
        bucket: impl Into<String>,
        use_export_folder: bool,
        io_timeout: Duration,
    ) -> Result<Self, WriteError> {
        let bucket = bucket.into();

        tokio::time::timeout(io_timeout, store.list_with_delimiter(None))
            .await
            .map_err(|_| {
                WriteError::unreachable(format!(
                    "Bucket '{bucket}' did not answer within {}s",
                    io_timeout.as_secs()
                ))
            })?
            .map_err(|e| classify(e, None, &format!("Bucket '{bucket}' is not accessible")))?;

        tracing::info!(bucket = %bucket, use_export_folder, "Object storage reachable");

        Ok(Self {
            store,
            bucket,
            use_export_folder,
            io_timeout,
        })
    }

    /// Object key for a document
    fn object_key(&self, document: &TrackDocument, hint: &DestinationHint) -> String {
        if self.use_export_folder && !hint.export_name.is_empty() {
            format!("{}/{}", hint.export_name, document.name())
        } else {
            document.name().to_string()
        }
    }
}

#[async_trait]
impl StorageBackend for ObjectStorageBackend {
    fn kind(&self) -> &'static str {
        "s3"
    }

    async fn write(
        &self,
        document: &TrackDocument,
        hint: &DestinationHint,
    ) -> Result<String, WriteError> {
        let key = self.object_key(document, hint);
        let path = Path::from(key.as_str());

        let mut opts = PutOptions::default();
        opts.attributes
            .insert(Attribute::ContentType, GPX_CONTENT_TYPE.into());

        tokio::time::timeout(
            self.io_timeout,
            self.store
                .put_opts(&path, document.content().clone().into(), opts),
        )
        .await
        .map_err(|_| {
            WriteError::unreachable(format!(
                "Upload of '{key}' timed out after {}s",
                self.io_timeout.as_secs()
            ))
        })?
        .map_err(|e| classify(e, Some(&key), &format!("Upload of '{key}' failed")))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %key,
            bytes = document.len(),
            "Uploaded document"
        );

        Ok(format!("s3://{}/{}", self.bucket, path))
    }
}

/// S3 error codes that mean the credentials themselves were rejected
const CREDENTIAL_CODES: &[&str] = &[
    "invalidaccesskeyid",
    "signaturedoesnotmatch",
    "expiredtoken",
    "invalidtoken",
];

const PERMISSION_CODES: &[&str] = &["accessdenied", "allaccessdisabled"];

const QUOTA_CODES: &[&str] = &[
    "quotaexceeded",
    "entitytoolarge",
    "insufficient storage",
    "payload too large",
];

const UNREACHABLE_PHRASES: &[&str] = &[
    "error sending request",
    "dns error",
    "connection refused",
    "connection reset",
    "connection closed",
    "timed out",
    "service unavailable",
];

/// Map an `object_store` error onto the write error taxonomy
///
/// Only the service's own words decide the kind: the object key and any
/// request URL are removed before matching, so a key like
/// `trip-1234507890.gpx` cannot turn into a quota error.
fn classify(err: object_store::Error, key: Option<&str>, context: &str) -> WriteError {
    let message = format!("{context}: {err}");

    if transport_failed(&err) {
        return WriteError::unreachable(message);
    }

    let text = service_text(&err.to_string(), key);
    match err {
        object_store::Error::Unauthenticated { .. } => WriteError::auth(message),
        // S3 answers 403 for both bad keys and missing grants
        object_store::Error::PermissionDenied { .. } if mentions(&text, CREDENTIAL_CODES) => {
            WriteError::auth(message)
        }
        object_store::Error::PermissionDenied { .. } => WriteError::permission_denied(message),
        object_store::Error::NotFound { .. } => WriteError::other(message),
        _ => classify_service_text(&text, message),
    }
}

/// True when the HTTP client never got a response
fn transport_failed(err: &object_store::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(current) = source {
        if let Some(http) = current.downcast_ref::<HttpError>() {
            return matches!(
                http.kind(),
                HttpErrorKind::Connect | HttpErrorKind::Timeout | HttpErrorKind::Interrupted
            );
        }
        source = current.source();
    }
    false
}

/// Lowercased error text without the object key or URLs
fn service_text(raw: &str, key: Option<&str>) -> String {
    let without_key = match key.filter(|k| !k.is_empty()) {
        Some(key) => raw.replace(key, " "),
        None => raw.to_string(),
    };
    without_key
        .split_whitespace()
        .filter(|word| !word.contains("://"))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn mentions(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| text.contains(needle))
}

/// S3 services report most failures as generic errors with the service code in
/// the text
fn classify_service_text(text: &str, message: String) -> WriteError {
    if mentions(text, CREDENTIAL_CODES) {
        WriteError::auth(message)
    } else if mentions(text, PERMISSION_CODES) {
        WriteError::permission_denied(message)
    } else if mentions(text, QUOTA_CODES) {
        WriteError::quota(message)
    } else if mentions(text, UNREACHABLE_PHRASES) {
        WriteError::unreachable(message)
    } else {
        WriteError::other(message)
    }
}
