//! End-to-end export tests with a scripted tour source
//!
//! The source is in memory; storage goes through the real backend factory into
//! a temporary directory or a fake SMB connector.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use waymark::adapters::storage::{BackendFactory, ShareConnector, ShareSession, ShareTarget};
use waymark::adapters::tours::{Session, TourSource};
use waymark::config::secret_string;
use waymark::core::export::{ExportCoordinator, TourErrorKind};
use waymark::core::transform::parse_track_points;
use waymark::domain::ids::TourId;
use waymark::domain::{
    BackendDescriptor, Credentials, DateRange, ExportJob, ExportName, RawPoint, Result, TourFilter,
    TourPayload, TourStatus, TourSummary, WaymarkError, WriteError, WriteErrorKind,
};

enum Detail {
    Track { points: usize, delay: Duration },
    Missing,
    NoPoints,
}

#[derive(Default)]
struct ScriptedSource {
    reject_login: bool,
    listing_fails: bool,
    tours: Vec<(TourSummary, Option<Detail>)>,
    logins: AtomicUsize,
    fetches: AtomicUsize,
    released: AtomicBool,
}

const DEFAULT_DATE: &str = "2026-03-01T08:00:00+01:00";

impl ScriptedSource {
    fn push(
        mut self,
        id: &str,
        sport: &str,
        status: TourStatus,
        date: &str,
        detail: Detail,
    ) -> Self {
        let summary = TourSummary {
            id: TourId::new(id).unwrap(),
            name: format!("Tour {id}"),
            date: Some(DateTime::parse_from_rfc3339(date).unwrap()),
            sport: sport.to_string(),
            status,
        };
        self.tours.push((summary, Some(detail)));
        self
    }

    fn with_tour(self, id: &str, sport: &str, status: TourStatus, detail: Detail) -> Self {
        self.push(id, sport, status, DEFAULT_DATE, detail)
    }

    fn recorded(self, id: &str, detail: Detail) -> Self {
        self.with_tour(id, "hike", TourStatus::Recorded, detail)
    }

    fn recorded_on(self, id: &str, date: &str, detail: Detail) -> Self {
        self.push(id, "hike", TourStatus::Recorded, date, detail)
    }
}

fn payload(summary: &TourSummary, points: usize) -> TourPayload {
    TourPayload {
        id: summary.id.clone(),
        name: summary.name.clone(),
        sport: summary.sport.clone(),
        recorded_at: summary.date.map(|date| date.to_rfc3339()),
        points: Some(
            (0..points)
                .map(|i| RawPoint {
                    lat: 47.0 + i as f64 * 0.001,
                    lng: 11.0 + i as f64 * 0.001,
                    alt: Some(800.0 + i as f64),
                    t: Some(i as i64 * 1000),
                })
                .collect(),
        ),
    }
}

#[async_trait]
impl TourSource for ScriptedSource {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.reject_login {
            return Err(WaymarkError::Auth("wrong password".to_string()));
        }
        Ok(Session::new(
            credentials.identity(),
            secret_string("token".to_string()),
        ))
    }

    fn list_tours<'a>(
        &'a self,
        _session: &'a Session,
        filter: &'a TourFilter,
    ) -> BoxStream<'a, Result<TourSummary>> {
        if self.listing_fails {
            return stream::iter(vec![Err(WaymarkError::TransientFetch(
                "HTTP 503".to_string(),
            ))])
            .boxed();
        }
        let tours: Vec<Result<TourSummary>> = self
            .tours
            .iter()
            .map(|(summary, _)| summary.clone())
            .filter(|summary| filter.matches(summary))
            .map(Ok)
            .collect();
        stream::iter(tours).boxed()
    }

    async fn fetch_detail(&self, _session: &Session, tour_id: &TourId) -> Result<TourPayload> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .tours
            .iter()
            .find(|(summary, _)| &summary.id == tour_id);

        match entry {
            Some((summary, Some(Detail::Track { points, delay }))) => {
                tokio::time::sleep(*delay).await;
                Ok(payload(summary, *points))
            }
            Some((summary, Some(Detail::NoPoints))) => Ok(TourPayload {
                points: None,
                ..payload(summary, 0)
            }),
            _ => Err(WaymarkError::NotFound(format!("tour {tour_id} is gone"))),
        }
    }

    async fn release(&self, session: Session) {
        self.released.store(true, Ordering::SeqCst);
        drop(session);
    }
}

fn credentials() -> Credentials {
    Credentials::from_api_key("rider@example.com:secret").unwrap()
}

fn filesystem_job(path: &Path) -> ExportJob {
    ExportJob::new(
        ExportName::new("test"),
        BackendDescriptor::FilesystemPath {
            path: path.to_path_buf(),
        },
    )
}

fn coordinator(source: &Arc<ScriptedSource>, allow_local_paths: bool) -> ExportCoordinator {
    ExportCoordinator::new(
        source.clone(),
        BackendFactory::new(allow_local_paths, Duration::from_secs(5)),
    )
}

fn written_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn track(points: usize) -> Detail {
    Detail::Track {
        points,
        delay: Duration::ZERO,
    }
}

#[tokio::test]
async fn test_exports_every_tour_to_filesystem() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .recorded("1", track(3))
            .recorded("2", track(5)),
    );

    let report = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 0);
    assert!(report.is_successful());
    assert!(source.released.load(Ordering::SeqCst));

    assert_eq!(
        written_files(dir.path()),
        vec!["test-2026-03-01-1.gpx", "test-2026-03-01-2.gpx"]
    );

    let content = std::fs::read(dir.path().join("test-2026-03-01-2.gpx")).unwrap();
    let points = parse_track_points(&content).unwrap();
    assert_eq!(points.len(), 5);
    assert_eq!(report.documents()[1].point_count, 5);
}

#[tokio::test]
async fn test_auth_failure_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(ScriptedSource {
        reject_login: true,
        ..ScriptedSource::default().recorded("1", track(3))
    });

    let err = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, WaymarkError::Auth(_)));
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    assert!(written_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_listing_failure_aborts_job() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(ScriptedSource {
        listing_fails: true,
        ..ScriptedSource::default()
    });

    let err = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, WaymarkError::TransientFetch(_)));
    // The session is released on the abort path too
    assert!(source.released.load(Ordering::SeqCst));
    assert!(written_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_vanished_tour_is_recorded_and_others_continue() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .recorded("1", track(2))
            .recorded("2", Detail::Missing)
            .recorded("3", track(2)),
    );

    let report = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.total(), 3);
    assert_eq!(report.failures()[0].tour_id.as_str(), "2");
    assert_eq!(report.failures()[0].kind, TourErrorKind::NotFound);
    assert!(!report.is_successful());
    assert_eq!(written_files(dir.path()).len(), 2);
}

#[tokio::test]
async fn test_tour_without_points_is_malformed() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .recorded("1", Detail::NoPoints)
            .recorded("2", track(4)),
    );

    let report = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failures()[0].kind, TourErrorKind::MalformedData);
    assert_eq!(written_files(dir.path()), vec!["test-2026-03-01-2.gpx"]);
}

#[tokio::test]
async fn test_unwritable_target_fails_every_tour() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("does-not-exist");
    let source = Arc::new(
        ScriptedSource::default()
            .recorded("1", track(2))
            .recorded("2", track(2)),
    );

    let report = coordinator(&source, true)
        .run(&filesystem_job(&missing), credentials())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 0);
    assert_eq!(report.failed(), 2);
    for failure in report.failures() {
        assert_eq!(
            failure.kind,
            TourErrorKind::Write(WriteErrorKind::PermissionDenied)
        );
    }
    // No detail fetch is wasted on a backend that cannot be opened
    assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_listing_gives_empty_report() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(ScriptedSource::default());

    let report = coordinator(&source, true)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap();

    assert_eq!(report.total(), 0);
    assert!(report.is_successful());
    assert!(written_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_disallowed_filesystem_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(ScriptedSource::default().recorded("1", track(2)));

    let err = coordinator(&source, false)
        .run(&filesystem_job(dir.path()), credentials())
        .await
        .unwrap_err();

    assert!(matches!(err, WaymarkError::Configuration(_)));
    assert_eq!(source.logins.load(Ordering::SeqCst), 0);
    assert!(written_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_filters_are_applied_before_fetching() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .with_tour("1", "hike", TourStatus::Recorded, track(2))
            .with_tour("2", "mtb", TourStatus::Recorded, track(2))
            .with_tour("3", "hike", TourStatus::Planned, track(2)),
    );
    let job = filesystem_job(dir.path()).with_filter(TourFilter {
        sport: Some("hike".to_string()),
        complete_only: true,
        ..TourFilter::default()
    });

    let report = coordinator(&source, true)
        .run(&job, credentials())
        .await
        .unwrap();

    assert_eq!(report.total(), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(written_files(dir.path()), vec!["test-2026-03-01-1.gpx"]);
}

#[tokio::test]
async fn test_date_range_limits_exported_tours() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .recorded_on("1", "2026-01-01T09:00:00+01:00", track(2))
            .recorded_on("2", "2026-06-15T09:00:00+02:00", track(2))
            .recorded_on("3", "2026-12-31T09:00:00+01:00", track(2)),
    );
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2026, 2, 1),
        NaiveDate::from_ymd_opt(2026, 12, 1),
    )
    .unwrap();
    let job = filesystem_job(dir.path()).with_filter(TourFilter {
        date_range: range,
        ..TourFilter::default()
    });

    let report = coordinator(&source, true)
        .run(&job, credentials())
        .await
        .unwrap();

    assert_eq!(report.total(), 1);
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    assert_eq!(written_files(dir.path()), vec!["test-2026-06-15-2.gpx"]);
}

#[tokio::test]
async fn test_rerun_overwrites_same_document() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(ScriptedSource::default().recorded("abc123", track(3)));
    let job = ExportJob::new(
        ExportName::new("myexport"),
        BackendDescriptor::FilesystemPath {
            path: dir.path().to_path_buf(),
        },
    );

    let first = coordinator(&source, true)
        .run(&job, credentials())
        .await
        .unwrap();
    let before = std::fs::read(dir.path().join("myexport-2026-03-01-abc123.gpx")).unwrap();

    let second = coordinator(&source, true)
        .run(&job, credentials())
        .await
        .unwrap();
    let after = std::fs::read(dir.path().join("myexport-2026-03-01-abc123.gpx")).unwrap();

    assert_eq!(first.succeeded(), 1);
    assert_eq!(second.succeeded(), 1);
    assert_eq!(
        written_files(dir.path()),
        vec!["myexport-2026-03-01-abc123.gpx"]
    );
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_concurrent_run_keeps_listing_order() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        ScriptedSource::default()
            .recorded(
                "1",
                Detail::Track {
                    points: 2,
                    delay: Duration::from_millis(80),
                },
            )
            .recorded("2", track(2))
            .recorded(
                "3",
                Detail::Track {
                    points: 2,
                    delay: Duration::from_millis(20),
                },
            ),
    );
    let job = filesystem_job(dir.path())
        .with_concurrency(3)
        .with_verification(true);

    let report = coordinator(&source, true)
        .run(&job, credentials())
        .await
        .unwrap();

    let order: Vec<&str> = report
        .documents()
        .iter()
        .map(|d| d.tour_id.as_str())
        .collect();
    assert_eq!(order, vec!["1", "2", "3"]);
    assert_eq!(report.succeeded(), 3);
}

#[derive(Default)]
struct ShareLog {
    dirs: Mutex<Vec<String>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    connects: AtomicUsize,
}

struct FakeConnector(Arc<ShareLog>);

struct FakeSession(Arc<ShareLog>);

impl ShareConnector for FakeConnector {
    fn connect(
        &self,
        target: &ShareTarget,
    ) -> std::result::Result<Box<dyn ShareSession>, WriteError> {
        if target.username == "intruder" {
            return Err(WriteError::auth("logon failure"));
        }
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession(self.0.clone())))
    }
}

impl ShareSession for FakeSession {
    fn create_dir_all(&mut self, path: &str) -> std::result::Result<(), WriteError> {
        self.0.dirs.lock().unwrap().push(path.to_string());
        Ok(())
    }

    fn write_file(&mut self, path: &str, content: &[u8]) -> std::result::Result<(), WriteError> {
        self.0
            .files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    fn disconnect(&mut self) {}
}

fn share_job(username: &str) -> ExportJob {
    ExportJob::new(
        ExportName::new("test"),
        BackendDescriptor::NetworkShare {
            server: "nas.local".to_string(),
            share: "tours".to_string(),
            username: username.to_string(),
            password: secret_string("pw".to_string()),
            subfolder: Some("\\komoot\\2026\\".to_string()),
            workgroup: None,
        },
    )
}

#[tokio::test]
async fn test_exports_to_network_share() {
    let log = Arc::new(ShareLog::default());
    let source = Arc::new(
        ScriptedSource::default()
            .recorded("1", track(2))
            .recorded("2", track(3)),
    );
    let factory = BackendFactory::new(false, Duration::from_secs(5))
        .with_share_connector(Arc::new(FakeConnector(log.clone())));

    let report = ExportCoordinator::new(source, factory)
        .run(&share_job("rider"), credentials())
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(log.connects.load(Ordering::SeqCst), 1);
    assert_eq!(*log.dirs.lock().unwrap(), vec!["komoot/2026".to_string()]);

    let files = log.files.lock().unwrap();
    assert!(files.contains_key("komoot/2026/test-2026-03-01-1.gpx"));
    assert!(files.contains_key("komoot/2026/test-2026-03-01-2.gpx"));
    assert!(report.documents()[0]
        .location
        .starts_with("smb://nas.local/tours/komoot/2026/"));
}

#[tokio::test]
async fn test_share_logon_failure_fails_every_tour() {
    let log = Arc::new(ShareLog::default());
    let source = Arc::new(ScriptedSource::default().recorded("1", track(2)));
    let factory = BackendFactory::new(false, Duration::from_secs(5))
        .with_share_connector(Arc::new(FakeConnector(log.clone())));

    let report = ExportCoordinator::new(source, factory)
        .run(&share_job("intruder"), credentials())
        .await
        .unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(
        report.failures()[0].kind,
        TourErrorKind::Write(WriteErrorKind::AuthFailure)
    );
    assert!(log.files.lock().unwrap().is_empty());
}
