//! Storage backends
//!
//! Every destination implements [`StorageBackend`]:
//! - [`ObjectStorageBackend`]: S3-compatible object storage
//! - [`FilesystemBackend`]: local directory or NFS mount
//! - [`NetworkShareBackend`]: SMB/CIFS share (libsmbclient connector behind
//!   the `smb` feature)
//!
//! [`BackendFactory`] picks the adapter for a job's descriptor.

pub mod factory;
pub mod filesystem;
pub mod network_share;
pub mod object_storage;
#[cfg(feature = "smb")]
pub mod smb;
pub mod traits;

pub use factory::BackendFactory;
pub use filesystem::FilesystemBackend;
pub use network_share::{NetworkShareBackend, ShareConnector, ShareSession, ShareTarget};
pub use object_storage::{ObjectStorageBackend, ObjectStorageSettings, GPX_CONTENT_TYPE};
pub use traits::{DestinationHint, StorageBackend};
