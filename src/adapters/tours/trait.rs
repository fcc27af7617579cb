//! Tour source trait definition
//!
//! `TourSource` abstracts the fitness-tracking API the tours come from. The
//! export coordinator only talks to the API through this trait, which keeps the
//! pipeline testable with scripted in-memory sources.

use crate::config::SecretString;
use crate::domain::ids::TourId;
use crate::domain::{Credentials, Result, TourFilter, TourPayload, TourSummary};
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Authenticated API session
///
/// Lives only as long as one export job. The token is zeroized when the session
/// is dropped and redacted from `Debug` output.
#[derive(Debug)]
pub struct Session {
    user_id: String,
    token: SecretString,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: SecretString) -> Self {
        Self {
            user_id: user_id.into(),
            token,
        }
    }

    /// API-side user identifier
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }
}

/// Trait for tour source implementations
///
/// # Example
///
/// ```no_run
/// use futures::TryStreamExt;
/// use waymark::adapters::tours::{KomootClient, TourSource};
/// use waymark::config::KomootConfig;
/// use waymark::domain::{Credentials, TourFilter};
///
/// # async fn example() -> waymark::domain::Result<()> {
/// let client = KomootClient::new(&KomootConfig::default())?;
/// let credentials = Credentials::from_api_key("rider@example.com:secret")?;
///
/// let session = client.authenticate(&credentials).await?;
/// let filter = TourFilter::default();
/// let tours: Vec<_> = client.list_tours(&session, &filter).try_collect().await?;
/// for tour in &tours {
///     let payload = client.fetch_detail(&session, &tour.id).await?;
///     println!("{} has {:?} points", payload.name, payload.points.map(|p| p.len()));
/// }
/// client.release(session).await;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TourSource: Send + Sync {
    /// Authenticate and open a session
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Auth`](crate::domain::WaymarkError::Auth) when the
    /// credentials are rejected or the service cannot be reached.
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session>;

    /// Lazily page through the user's tours, yielding those that pass `filter`
    ///
    /// The stream is finite and not restartable. An error item ends the
    /// enumeration; transient page failures are retried before they surface.
    fn list_tours<'a>(
        &'a self,
        session: &'a Session,
        filter: &'a TourFilter,
    ) -> BoxStream<'a, Result<TourSummary>>;

    /// Fetch one tour's raw detail payload
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the tour no longer exists, `TransientFetch` for
    /// network failures and `MalformedData` for an undecodable body.
    async fn fetch_detail(&self, session: &Session, tour_id: &TourId) -> Result<TourPayload>;

    /// End the session
    ///
    /// Called on every exit path of a job. The default implementation drops the
    /// session, which zeroizes the token.
    async fn release(&self, session: Session) {
        tracing::debug!(user_id = %session.user_id(), "Session released");
        drop(session);
    }
}
