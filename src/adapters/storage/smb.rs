//! libsmbclient-backed share connector
//!
//! Requires the `smb` feature and libsmbclient on the host.

use super::network_share::{ShareConnector, ShareSession, ShareTarget};
use crate::domain::WriteError;
use pavao::{SmbClient, SmbCredentials, SmbMode, SmbOpenOptions, SmbOptions};
use secrecy::ExposeSecret;
use std::io::Write;

/// [`ShareConnector`] using `pavao`
#[derive(Debug, Default, Clone, Copy)]
pub struct PavaoConnector;

impl ShareConnector for PavaoConnector {
    fn connect(&self, target: &ShareTarget) -> Result<Box<dyn ShareSession>, WriteError> {
        let server = if target.server.starts_with("smb://") {
            target.server.clone()
        } else {
            format!("smb://{}", target.server)
        };
        let share = format!("/{}", target.share.trim_matches('/'));

        let mut credentials = SmbCredentials::default()
            .server(server)
            .share(share)
            .username(target.username.as_str())
            .password(target.password.expose_secret().as_ref());
        if let Some(workgroup) = target.workgroup.as_deref() {
            credentials = credentials.workgroup(workgroup);
        }

        let client = SmbClient::new(credentials, SmbOptions::default().one_share_per_server(true))
            .map_err(|e| classify(&e.to_string(), "Connecting to share"))?;

        // libsmbclient connects lazily; stat the share root to surface logon
        // and share-name failures here instead of on the first write.
        client
            .stat("/")
            .map_err(|e| classify(&e.to_string(), "Opening share"))?;

        Ok(Box::new(PavaoSession {
            client: Some(client),
        }))
    }
}

/// Lives on the share worker thread for its whole life
struct PavaoSession {
    client: Option<SmbClient>,
}

impl PavaoSession {
    fn client(&self) -> Result<&SmbClient, WriteError> {
        self.client
            .as_ref()
            .ok_or_else(|| WriteError::other("Share connection already closed"))
    }
}

impl ShareSession for PavaoSession {
    fn create_dir_all(&mut self, path: &str) -> Result<(), WriteError> {
        let client = self.client()?;
        let mut current = String::new();

        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);

            if client.stat(current.as_str()).is_ok() {
                continue;
            }
            if let Err(e) = client.mkdir(current.as_str(), SmbMode::from(0o755)) {
                // Lost a race with another writer
                if client.stat(current.as_str()).is_err() {
                    return Err(classify(&e.to_string(), &format!("Creating {current}")));
                }
            }
        }
        Ok(())
    }

    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), WriteError> {
        let client = self.client()?;
        let remote = format!("/{}", path.trim_start_matches('/'));

        let mut file = client
            .open_with(
                remote.as_str(),
                SmbOpenOptions::default()
                    .create(true)
                    .write(true)
                    .truncate(true),
            )
            .map_err(|e| classify(&e.to_string(), &format!("Opening {remote}")))?;

        file.write_all(content)
            .and_then(|()| file.flush())
            .map_err(|e| WriteError::from_io(&e, &format!("Writing {remote}")))
    }

    fn disconnect(&mut self) {
        if self.client.take().is_some() {
            tracing::debug!("SMB context freed");
        }
    }
}

impl Drop for PavaoSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// libsmbclient reports errno-style messages
fn classify(message: &str, context: &str) -> WriteError {
    let lower = message.to_lowercase();
    let full = format!("{context}: {message}");

    if lower.contains("logon") {
        WriteError::auth(full)
    } else if lower.contains("permission denied") || lower.contains("access denied") {
        WriteError::permission_denied(full)
    } else if lower.contains("no space") || lower.contains("quota") {
        WriteError::quota(full)
    } else if lower.contains("connection")
        || lower.contains("timed out")
        || lower.contains("unreachable")
        || lower.contains("no route")
    {
        WriteError::unreachable(full)
    } else {
        WriteError::other(full)
    }
}
