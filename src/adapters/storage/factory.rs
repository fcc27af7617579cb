//! Storage backend factory
//!
//! Selects and opens the adapter for a [`BackendDescriptor`]. The choice is a
//! pure function of the descriptor variant plus the deployment's capability
//! flags.

use super::filesystem::FilesystemBackend;
use super::network_share::{NetworkShareBackend, ShareConnector, ShareTarget};
use super::object_storage::{ObjectStorageBackend, ObjectStorageSettings};
use super::traits::StorageBackend;
use crate::config::WaymarkConfig;
use crate::domain::{BackendDescriptor, Result, WaymarkError, WriteError};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

/// Opens storage backends for export jobs
#[derive(Clone)]
pub struct BackendFactory {
    allow_local_paths: bool,
    io_timeout: Duration,
    share_connector: Option<Arc<dyn ShareConnector>>,
}

impl BackendFactory {
    /// Creates a factory
    ///
    /// With the `smb` feature enabled the libsmbclient connector is installed;
    /// without it, SMB descriptors are rejected unless a connector is supplied
    /// through [`with_share_connector`](Self::with_share_connector).
    pub fn new(allow_local_paths: bool, io_timeout: Duration) -> Self {
        Self {
            allow_local_paths,
            io_timeout,
            share_connector: default_share_connector(),
        }
    }

    /// Factory configured from `application.allow_local_paths` and
    /// `storage.io_timeout_seconds`
    pub fn from_config(config: &WaymarkConfig) -> Self {
        Self::new(
            config.application.allow_local_paths,
            config.storage.io_timeout(),
        )
    }

    pub fn with_share_connector(mut self, connector: Arc<dyn ShareConnector>) -> Self {
        self.share_connector = Some(connector);
        self
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Reject descriptors this deployment cannot serve
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Configuration`] for a filesystem target while
    /// `allow_local_paths` is off, or an SMB target without a share connector.
    pub fn ensure_permitted(&self, descriptor: &BackendDescriptor) -> Result<()> {
        match descriptor {
            BackendDescriptor::FilesystemPath { .. } if !self.allow_local_paths => {
                Err(WaymarkError::Configuration(
                    "Filesystem storage is disabled; set application.allow_local_paths = true"
                        .to_string(),
                ))
            }
            BackendDescriptor::NetworkShare { .. } if self.share_connector.is_none() => {
                Err(WaymarkError::Configuration(
                    "SMB storage is not available in this build (enable the `smb` feature)"
                        .to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Open the backend for one job
    ///
    /// # Errors
    ///
    /// Returns the adapter's [`WriteError`] when validation at open fails.
    pub async fn open(
        &self,
        descriptor: &BackendDescriptor,
    ) -> std::result::Result<Arc<dyn StorageBackend>, WriteError> {
        self.ensure_permitted(descriptor)
            .map_err(|e| WriteError::other(e.to_string()))?;

        tracing::debug!(backend = descriptor.kind_name(), "Opening storage backend");

        match descriptor {
            BackendDescriptor::ObjectStorage {
                endpoint,
                bucket,
                access_key,
                secret_key,
                region,
                use_export_folder,
            } => {
                let backend = ObjectStorageBackend::open(ObjectStorageSettings {
                    endpoint: endpoint.clone(),
                    bucket: bucket.clone(),
                    access_key: access_key.clone(),
                    secret_key: secret_key.expose_secret().as_ref().to_string(),
                    region: region.clone(),
                    use_export_folder: *use_export_folder,
                    io_timeout: self.io_timeout,
                })
                .await?;
                Ok(Arc::new(backend))
            }
            BackendDescriptor::FilesystemPath { path } => {
                let backend = FilesystemBackend::open(path.clone(), self.io_timeout).await?;
                Ok(Arc::new(backend))
            }
            BackendDescriptor::NetworkShare {
                server,
                share,
                username,
                password,
                subfolder,
                workgroup,
            } => {
                let connector = self
                    .share_connector
                    .clone()
                    .ok_or_else(|| WriteError::other("No share connector available"))?;
                let target = ShareTarget {
                    server: server.clone(),
                    share: share.clone(),
                    username: username.clone(),
                    password: password.clone(),
                    workgroup: workgroup.clone(),
                    subfolder: ShareTarget::normalize_subfolder(subfolder.as_deref()),
                };
                let backend = NetworkShareBackend::open(connector, target, self.io_timeout).await?;
                Ok(Arc::new(backend))
            }
        }
    }
}

#[cfg(feature = "smb")]
fn default_share_connector() -> Option<Arc<dyn ShareConnector>> {
    Some(Arc::new(super::smb::PavaoConnector))
}

#[cfg(not(feature = "smb"))]
fn default_share_connector() -> Option<Arc<dyn ShareConnector>> {
    None
}
