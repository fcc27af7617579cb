//! Export coordinator - main orchestrator for the export process
//!
//! Drives one job through `Authenticating → Listing → Iterating →
//! Completed | Aborted`. Authentication and listing failures abort the job;
//! everything that goes wrong for a single tour is recorded in the report and
//! the remaining tours are still processed.

use crate::adapters::storage::{BackendFactory, DestinationHint, StorageBackend};
use crate::adapters::tours::{KomootClient, Session, TourSource};
use crate::config::WaymarkConfig;
use crate::core::export::report::{ExportReport, ExportedDocument, ReportBuilder, TourFailure};
use crate::core::transform::{parse_detail, to_document};
use crate::core::verification::verify_document;
use crate::domain::{Credentials, ExportJob, Result, TourSummary, WaymarkError};
use crate::log_export_start;
use futures::{stream, StreamExt, TryStreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Lifecycle state of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Authenticating,
    Listing,
    Iterating,
    Completed,
    Aborted,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Authenticating => "authenticating",
            JobState::Listing => "listing",
            JobState::Iterating => "iterating",
            JobState::Completed => "completed",
            JobState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

fn enter(state: JobState) {
    tracing::debug!(state = %state, "Export job state changed");
}

/// Export coordinator
pub struct ExportCoordinator {
    source: Arc<dyn TourSource>,
    backends: BackendFactory,
}

impl ExportCoordinator {
    pub fn new(source: Arc<dyn TourSource>, backends: BackendFactory) -> Self {
        Self { source, backends }
    }

    /// Coordinator backed by the Komoot API
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Configuration`] if the Komoot client cannot be
    /// built.
    pub fn from_config(config: &WaymarkConfig) -> Result<Self> {
        let client = KomootClient::new(&config.komoot)?;
        Ok(Self::new(
            Arc::new(client),
            BackendFactory::from_config(config),
        ))
    }

    /// Run one export job
    ///
    /// Credentials are consumed: they are dropped as soon as authentication
    /// has finished.
    ///
    /// # Errors
    ///
    /// Returns a job-fatal error: `Configuration` for a backend this
    /// deployment does not permit, `Auth` when authentication fails, or the
    /// listing error (`TransientFetch`/`Auth`) when enumeration fails. Per-tour
    /// failures never surface here; they are in the report.
    pub async fn run(&self, job: &ExportJob, credentials: Credentials) -> Result<ExportReport> {
        let started = Instant::now();

        self.backends.ensure_permitted(&job.backend)?;
        log_export_start!(job.export_name, job.backend.kind_name());

        enter(JobState::Authenticating);
        let session = self.source.authenticate(&credentials).await;
        drop(credentials);

        let session = match session {
            Ok(session) => session,
            Err(e) => {
                enter(JobState::Aborted);
                tracing::error!(error = %e, "Authentication failed");
                return Err(e);
            }
        };

        let outcome = self.run_with_session(job, &session, started).await;
        self.source.release(session).await;

        match &outcome {
            Ok(report) => {
                enter(JobState::Completed);
                report.log_summary();
            }
            Err(e) => {
                enter(JobState::Aborted);
                tracing::error!(error = %e, "Export aborted");
            }
        }
        outcome
    }

    async fn run_with_session(
        &self,
        job: &ExportJob,
        session: &Session,
        started: Instant,
    ) -> Result<ExportReport> {
        let backend = self.backends.open(&job.backend).await;
        if let Err(e) = &backend {
            tracing::error!(
                backend = job.backend.kind_name(),
                error = %e,
                "Storage backend could not be opened"
            );
        }

        enter(JobState::Listing);
        let tours: Vec<TourSummary> = match self
            .source
            .list_tours(session, &job.filter)
            .try_collect()
            .await
        {
            Ok(tours) => tours,
            Err(e) => {
                if let Ok(backend) = &backend {
                    backend.close().await;
                }
                return Err(e);
            }
        };

        tracing::info!(matched = tours.len(), "Tours matched filters");

        let mut report = ReportBuilder::new();

        let backend = match backend {
            Ok(backend) => backend,
            Err(open_error) => {
                // No detail fetches: every tour fails with the open error
                let error = WaymarkError::from(open_error);
                for tour in &tours {
                    report.record_failure(TourFailure::from_error(tour.id.clone(), &error));
                }
                return Ok(report.finish(started.elapsed()));
            }
        };

        enter(JobState::Iterating);
        let hint = DestinationHint::new(job.export_name.clone());
        let outcomes: Vec<std::result::Result<ExportedDocument, TourFailure>> =
            stream::iter(&tours)
                .map(|tour| self.process_tour(session, backend.as_ref(), job, &hint, tour))
                .buffered(job.concurrency.max(1))
                .collect()
                .await;

        backend.close().await;

        for outcome in outcomes {
            match outcome {
                Ok(document) => report.record_success(document),
                Err(failure) => report.record_failure(failure),
            }
        }

        Ok(report.finish(started.elapsed()))
    }

    /// Fetch, convert, optionally verify and write one tour
    async fn process_tour(
        &self,
        session: &Session,
        backend: &dyn StorageBackend,
        job: &ExportJob,
        hint: &DestinationHint,
        tour: &TourSummary,
    ) -> std::result::Result<ExportedDocument, TourFailure> {
        let result = async {
            let payload = self.source.fetch_detail(session, &tour.id).await?;
            let detail = parse_detail(payload)?;
            let document = to_document(&detail, &job.export_name)?;

            if job.verify_documents {
                verify_document(&document, &detail)?;
            }

            let location = backend.write(&document, hint).await?;

            tracing::info!(
                tour_id = %tour.id,
                document = %document.name(),
                points = document.point_count(),
                location = %location,
                "Tour exported"
            );

            Ok::<_, WaymarkError>(ExportedDocument {
                tour_id: document.tour_id().clone(),
                name: document.name().to_string(),
                location,
                point_count: document.point_count(),
            })
        }
        .await;

        result.map_err(|e| TourFailure::from_error(tour.id.clone(), &e))
    }
}
