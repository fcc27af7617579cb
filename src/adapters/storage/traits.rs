//! Storage backend traits
//!
//! This module defines the write contract every storage destination implements.

use crate::domain::{ExportName, TrackDocument, WriteError};
use async_trait::async_trait;

/// Where a document should land, relative to the backend's root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationHint {
    /// Sanitized export name; backends may use it as a folder or key prefix
    pub export_name: ExportName,
}

impl DestinationHint {
    pub fn new(export_name: ExportName) -> Self {
        Self { export_name }
    }
}

/// Storage backend trait
///
/// A backend is opened once per job (opening performs any validation such as a
/// bucket listing or a trial write) and then receives one `write` call per
/// converted tour. Writing a document whose name already exists overwrites it.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Short backend name used in logs (`s3`, `filesystem`, `smb`)
    fn kind(&self) -> &'static str;

    /// Persist one document
    ///
    /// Returns a human-readable location of the written document.
    ///
    /// # Errors
    ///
    /// Returns a [`WriteError`] classified by
    /// [`WriteErrorKind`](crate::domain::WriteErrorKind).
    async fn write(
        &self,
        document: &TrackDocument,
        hint: &DestinationHint,
    ) -> Result<String, WriteError>;

    /// Release any held connection
    ///
    /// Called once at the end of a job. The default does nothing.
    async fn close(&self) {}
}
