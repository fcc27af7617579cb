//! SMB/CIFS network share backend
//!
//! The backend holds exactly one share connection for the whole job. The
//! connection itself sits behind [`ShareConnector`]/[`ShareSession`]: SMB
//! client libraries are blocking and their contexts are bound to one thread, so
//! a dedicated worker thread opens the session, owns it for the job and serves
//! writes sent over a channel. Every request is bounded by the storage I/O
//! timeout.

use super::traits::{DestinationHint, StorageBackend};
use crate::config::SecretString;
use crate::domain::{TrackDocument, WriteError};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Share coordinates and credentials for one job
#[derive(Debug, Clone)]
pub struct ShareTarget {
    pub server: String,
    pub share: String,
    pub username: String,
    pub password: SecretString,
    pub workgroup: Option<String>,
    /// Folder below the share root, `/` separated, no leading or trailing slash
    pub subfolder: String,
}

impl ShareTarget {
    /// Normalizes a user-supplied subfolder (`\\a\\b\\` → `a/b`)
    pub fn normalize_subfolder(raw: Option<&str>) -> String {
        raw.unwrap_or_default()
            .replace('\\', "/")
            .split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Share-relative path of a document
    pub fn document_path(&self, name: &str) -> String {
        if self.subfolder.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.subfolder, name)
        }
    }
}

/// Opens share connections
///
/// `connect` runs on the share worker thread; the returned session never
/// leaves that thread.
pub trait ShareConnector: Send + Sync {
    /// Connect and authenticate against the share
    fn connect(&self, target: &ShareTarget) -> Result<Box<dyn ShareSession>, WriteError>;
}

/// One live share connection
///
/// All methods block. The session is created, used and dropped on a single
/// thread, so implementations need not be `Send`.
pub trait ShareSession {
    /// Create `path` and all missing parents; existing folders are not an error
    fn create_dir_all(&mut self, path: &str) -> Result<(), WriteError>;

    /// Create or truncate `path` and write `content` to it
    fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), WriteError>;

    /// Tear down the connection; must be safe to call more than once
    fn disconnect(&mut self);
}

/// Requests served by the share worker
enum ShareCommand {
    Write {
        path: String,
        content: Bytes,
        reply: oneshot::Sender<Result<(), WriteError>>,
    },
    Disconnect {
        done: Option<oneshot::Sender<()>>,
    },
}

/// Network share backend
pub struct NetworkShareBackend {
    target: ShareTarget,
    commands: mpsc::UnboundedSender<ShareCommand>,
    io_timeout: Duration,
}

impl NetworkShareBackend {
    /// Connect once and make sure the subfolder exists
    ///
    /// # Errors
    ///
    /// Returns the connector's [`WriteError`], or `Unreachable` on timeout.
    pub async fn open(
        connector: Arc<dyn ShareConnector>,
        target: ShareTarget,
        io_timeout: Duration,
    ) -> Result<Self, WriteError> {
        let (commands, inbox) = mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = oneshot::channel();

        let worker_target = target.clone();
        std::thread::Builder::new()
            .name("waymark-share".to_string())
            .spawn(move || serve(connector.as_ref(), &worker_target, ready_tx, inbox))
            .map_err(|e| WriteError::other(format!("Failed to start share worker: {e}")))?;

        // On timeout the ready receiver is dropped and a late connection
        // disconnects itself
        tokio::time::timeout(io_timeout, ready_rx)
            .await
            .map_err(|_| {
                WriteError::unreachable(format!(
                    "Connecting to share timed out after {}s",
                    io_timeout.as_secs()
                ))
            })?
            .map_err(|_| WriteError::other("Share worker stopped while connecting"))??;

        tracing::info!(
            server = %target.server,
            share = %target.share,
            subfolder = %target.subfolder,
            "Connected to network share"
        );

        Ok(Self {
            target,
            commands,
            io_timeout,
        })
    }

    fn location(&self, path: &str) -> String {
        format!(
            "smb://{}/{}/{}",
            self.target.server.trim_start_matches("smb://"),
            self.target.share.trim_matches('/'),
            path
        )
    }
}

#[async_trait]
impl StorageBackend for NetworkShareBackend {
    fn kind(&self) -> &'static str {
        "smb"
    }

    async fn write(
        &self,
        document: &TrackDocument,
        _hint: &DestinationHint,
    ) -> Result<String, WriteError> {
        let path = self.target.document_path(document.name());
        let (reply, response) = oneshot::channel();

        self.commands
            .send(ShareCommand::Write {
                path: path.clone(),
                content: document.content().clone(),
                reply,
            })
            .map_err(|_| WriteError::other("Share connection already closed"))?;

        tokio::time::timeout(self.io_timeout, response)
            .await
            .map_err(|_| {
                WriteError::unreachable(format!(
                    "Writing {path} to share timed out after {}s",
                    self.io_timeout.as_secs()
                ))
            })?
            .map_err(|_| WriteError::other("Share worker stopped during write"))??;

        tracing::debug!(path = %path, bytes = document.len(), "Wrote document to share");

        Ok(self.location(&path))
    }

    async fn close(&self) {
        let (done, closed) = oneshot::channel();
        if self
            .commands
            .send(ShareCommand::Disconnect { done: Some(done) })
            .is_err()
        {
            return;
        }
        if tokio::time::timeout(self.io_timeout, closed).await.is_err() {
            tracing::warn!("Share connection did not close in time");
        }
    }
}

impl Drop for NetworkShareBackend {
    fn drop(&mut self) {
        // Worker disconnects on its own thread; nothing blocks here
        let _ = self.commands.send(ShareCommand::Disconnect { done: None });
    }
}

/// Share worker: connect, report readiness, then serve commands until told to
/// disconnect or every sender is gone
fn serve(
    connector: &dyn ShareConnector,
    target: &ShareTarget,
    ready: oneshot::Sender<Result<(), WriteError>>,
    mut inbox: mpsc::UnboundedReceiver<ShareCommand>,
) {
    let mut session = match open_session(connector, target) {
        Ok(session) => session,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    if ready.send(Ok(())).is_err() {
        // Caller gave up waiting
        session.disconnect();
        return;
    }

    let mut done = None;
    while let Some(command) = inbox.blocking_recv() {
        match command {
            ShareCommand::Write {
                path,
                content,
                reply,
            } => {
                let _ = reply.send(session.write_file(&path, &content));
            }
            ShareCommand::Disconnect { done: notify } => {
                done = notify;
                break;
            }
        }
    }

    drop(inbox);
    session.disconnect();
    drop(session);
    tracing::debug!("Share connection released");
    if let Some(done) = done {
        let _ = done.send(());
    }
}

fn open_session(
    connector: &dyn ShareConnector,
    target: &ShareTarget,
) -> Result<Box<dyn ShareSession>, WriteError> {
    let mut session = connector.connect(target)?;
    if !target.subfolder.is_empty() {
        if let Err(e) = session.create_dir_all(&target.subfolder) {
            session.disconnect();
            return Err(e);
        }
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::domain::{TourId, WriteErrorKind};
    use std::sync::Mutex;
    use std::thread::ThreadId;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        threads: Mutex<Vec<ThreadId>>,
    }

    impl Recorder {
        fn push(&self, call: String) {
            self.threads
                .lock()
                .unwrap()
                .push(std::thread::current().id());
            self.calls.lock().unwrap().push(call);
        }

        fn threads(&self) -> Vec<ThreadId> {
            self.threads.lock().unwrap().clone()
        }

        async fn wait_for(&self, call: &str) -> bool {
            for _ in 0..100 {
                if self.calls().iter().any(|c| c == call) {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            false
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    struct FakeConnector {
        recorder: Arc<Recorder>,
        fail_with: Option<WriteError>,
    }

    impl ShareConnector for FakeConnector {
        fn connect(&self, target: &ShareTarget) -> Result<Box<dyn ShareSession>, WriteError> {
            if let Some(err) = &self.fail_with {
                return Err(err.clone());
            }
            self.recorder
                .push(format!("connect {}/{}", target.server, target.share));
            Ok(Box::new(FakeSession {
                recorder: Arc::clone(&self.recorder),
                connected: true,
            }))
        }
    }

    struct FakeSession {
        recorder: Arc<Recorder>,
        connected: bool,
    }

    impl ShareSession for FakeSession {
        fn create_dir_all(&mut self, path: &str) -> Result<(), WriteError> {
            self.recorder.push(format!("mkdir {path}"));
            Ok(())
        }

        fn write_file(&mut self, path: &str, content: &[u8]) -> Result<(), WriteError> {
            self.recorder
                .push(format!("write {path} ({} bytes)", content.len()));
            Ok(())
        }

        fn disconnect(&mut self) {
            if self.connected {
                self.connected = false;
                self.recorder.push("disconnect".to_string());
            }
        }
    }

    fn target(subfolder: Option<&str>) -> ShareTarget {
        ShareTarget {
            server: "nas.local".to_string(),
            share: "tours".to_string(),
            username: "rider".to_string(),
            password: secret_string("pw".to_string()),
            workgroup: None,
            subfolder: ShareTarget::normalize_subfolder(subfolder),
        }
    }

    fn document(name: &str) -> TrackDocument {
        TrackDocument::new(name, TourId::new("1").unwrap(), b"<gpx/>".to_vec(), 1)
    }

    fn connector(recorder: &Arc<Recorder>) -> Arc<dyn ShareConnector> {
        Arc::new(FakeConnector {
            recorder: Arc::clone(recorder),
            fail_with: None,
        })
    }

    #[test]
    fn test_normalize_subfolder() {
        assert_eq!(ShareTarget::normalize_subfolder(None), "");
        assert_eq!(ShareTarget::normalize_subfolder(Some("/")), "");
        assert_eq!(
            ShareTarget::normalize_subfolder(Some("\\exports\\komoot\\")),
            "exports/komoot"
        );
        assert_eq!(
            ShareTarget::normalize_subfolder(Some("/a//b/")),
            "a/b"
        );
    }

    #[tokio::test]
    async fn test_one_connection_for_many_writes() {
        let recorder = Arc::new(Recorder::default());
        let backend = NetworkShareBackend::open(
            connector(&recorder),
            target(Some("gpx")),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let hint = DestinationHint::default();
        let location = backend.write(&document("a.gpx"), &hint).await.unwrap();
        backend.write(&document("b.gpx"), &hint).await.unwrap();
        backend.close().await;

        assert_eq!(location, "smb://nas.local/tours/gpx/a.gpx");
        assert_eq!(
            recorder.calls(),
            vec![
                "connect nas.local/tours",
                "mkdir gpx",
                "write gpx/a.gpx (6 bytes)",
                "write gpx/b.gpx (6 bytes)",
                "disconnect",
            ]
        );
    }

    #[tokio::test]
    async fn test_no_mkdir_without_subfolder() {
        let recorder = Arc::new(Recorder::default());
        let backend =
            NetworkShareBackend::open(connector(&recorder), target(None), Duration::from_secs(5))
                .await
                .unwrap();

        backend
            .write(&document("a.gpx"), &DestinationHint::default())
            .await
            .unwrap();

        assert_eq!(
            recorder.calls(),
            vec!["connect nas.local/tours", "write a.gpx (6 bytes)"]
        );
    }

    #[tokio::test]
    async fn test_drop_releases_connection() {
        let recorder = Arc::new(Recorder::default());
        let backend =
            NetworkShareBackend::open(connector(&recorder), target(None), Duration::from_secs(5))
                .await
                .unwrap();
        drop(backend);

        assert!(recorder.wait_for("disconnect").await);
        assert_eq!(
            recorder.calls().last().map(String::as_str),
            Some("disconnect")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_session_stays_on_one_thread() {
        let recorder = Arc::new(Recorder::default());
        let backend = NetworkShareBackend::open(
            connector(&recorder),
            target(Some("gpx")),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let hint = DestinationHint::default();
        for name in ["a.gpx", "b.gpx", "c.gpx", "d.gpx"] {
            tokio::task::yield_now().await;
            backend.write(&document(name), &hint).await.unwrap();
        }
        backend.close().await;

        let threads = recorder.threads();
        assert_eq!(threads.len(), 7);
        assert!(threads.iter().all(|id| *id == threads[0]));
        assert_ne!(threads[0], std::thread::current().id());
    }

    #[tokio::test]
    async fn test_drop_does_not_block() {
        let recorder = Arc::new(Recorder::default());
        let backend =
            NetworkShareBackend::open(connector(&recorder), target(None), Duration::from_secs(5))
                .await
                .unwrap();

        // Dropping on the current-thread runtime must not wait for the worker
        let started = std::time::Instant::now();
        drop(backend);
        assert!(started.elapsed() < Duration::from_millis(50));
        assert!(recorder.wait_for("disconnect").await);
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let recorder = Arc::new(Recorder::default());
        let backend =
            NetworkShareBackend::open(connector(&recorder), target(None), Duration::from_secs(5))
                .await
                .unwrap();
        backend.close().await;

        let err = backend
            .write(&document("a.gpx"), &DestinationHint::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, WriteErrorKind::Other);
    }

    #[tokio::test]
    async fn test_connect_failure_propagates() {
        let connector: Arc<dyn ShareConnector> = Arc::new(FakeConnector {
            recorder: Arc::new(Recorder::default()),
            fail_with: Some(WriteError::auth("logon failure")),
        });

        let err = NetworkShareBackend::open(connector, target(None), Duration::from_secs(5))
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind, WriteErrorKind::AuthFailure);
    }
}
