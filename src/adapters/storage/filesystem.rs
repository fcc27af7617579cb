//! Filesystem backend
//!
//! Writes documents into a local directory or a mounted network filesystem
//! (NFS). Only available when the deployment sets `allow_local_paths`.

use super::traits::{DestinationHint, StorageBackend};
use crate::domain::{TrackDocument, WriteError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Filesystem backend rooted at one directory
#[derive(Debug)]
pub struct FilesystemBackend {
    root: PathBuf,
    io_timeout: Duration,
}

impl FilesystemBackend {
    /// Validate the target directory and return a backend for it
    ///
    /// The directory must exist, be a directory and accept a scratch file.
    ///
    /// # Errors
    ///
    /// Any validation failure is reported as
    /// [`WriteErrorKind::PermissionDenied`](crate::domain::WriteErrorKind::PermissionDenied),
    /// a timeout as `Unreachable`.
    pub async fn open(root: impl Into<PathBuf>, io_timeout: Duration) -> Result<Self, WriteError> {
        let root = root.into();

        tokio::time::timeout(io_timeout, validate_directory(&root))
            .await
            .map_err(|_| {
                WriteError::unreachable(format!(
                    "{} did not respond within {}s",
                    root.display(),
                    io_timeout.as_secs()
                ))
            })??;

        tracing::info!(path = %root.display(), "Filesystem target is writable");

        Ok(Self { root, io_timeout })
    }
}

async fn validate_directory(root: &Path) -> Result<(), WriteError> {
    let metadata = tokio::fs::metadata(root).await.map_err(|e| {
        WriteError::permission_denied(format!("{} is not accessible: {e}", root.display()))
    })?;

    if !metadata.is_dir() {
        return Err(WriteError::permission_denied(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let scratch = root.join(format!(".waymark-check-{}", uuid::Uuid::new_v4()));
    tokio::fs::write(&scratch, b"waymark").await.map_err(|e| {
        WriteError::permission_denied(format!("{} is not writable: {e}", root.display()))
    })?;

    if let Err(e) = tokio::fs::remove_file(&scratch).await {
        tracing::warn!(path = %scratch.display(), error = %e, "Failed to remove scratch file");
    }

    Ok(())
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    fn kind(&self) -> &'static str {
        "filesystem"
    }

    async fn write(
        &self,
        document: &TrackDocument,
        _hint: &DestinationHint,
    ) -> Result<String, WriteError> {
        let target = self.root.join(document.name());

        tokio::time::timeout(
            self.io_timeout,
            tokio::fs::write(&target, document.content()),
        )
        .await
        .map_err(|_| {
            WriteError::unreachable(format!(
                "Writing {} timed out after {}s",
                target.display(),
                self.io_timeout.as_secs()
            ))
        })?
        .map_err(|e| WriteError::from_io(&e, &format!("Writing {}", target.display())))?;

        tracing::debug!(path = %target.display(), bytes = document.len(), "Wrote document");

        Ok(target.display().to_string())
    }
}
