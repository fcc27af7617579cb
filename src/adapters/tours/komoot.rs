//! Komoot API client
//!
//! Implements [`TourSource`] against the public Komoot API:
//!
//! - `GET /v006/account/email/{email}/` (login, Basic email:password)
//! - `GET /v007/users/{user}/tours/` (paged listing, Basic user:token)
//! - `GET /v007/tours/{id}` (detail with embedded coordinates)

use super::models::{AccountResponse, KomootTour, ToursPage, TourDetailResponse};
use super::{Session, TourSource};
use crate::config::{secret_string, KomootConfig, RetryConfig};
use crate::domain::ids::TourId;
use crate::domain::{Credentials, Result, TourFilter, TourPayload, TourSummary, WaymarkError};
use crate::log_retry_attempt;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures::stream::{self, BoxStream};
use futures::{future, StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;
use url::Url;

/// Komoot API client
///
/// One client can serve many jobs; all per-job state lives in the [`Session`].
pub struct KomootClient {
    base_url: Url,
    client: Client,
    page_size: usize,
    retry: RetryConfig,
}

impl KomootClient {
    /// Create a new Komoot client
    ///
    /// # Errors
    ///
    /// Returns [`WaymarkError::Configuration`] if the base URL is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &KomootConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            WaymarkError::Configuration(format!(
                "Invalid komoot.base_url '{}': {e}",
                config.base_url
            ))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(WaymarkError::Configuration(format!(
                "komoot.base_url '{}' cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(10)))
            .user_agent(concat!("waymark/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                WaymarkError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            client,
            page_size: config.page_size,
            retry: config.retry.clone(),
        })
    }

    /// Build an endpoint URL from path segments, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                WaymarkError::Configuration("komoot.base_url cannot carry a path".to_string())
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a Basic authorization header value
    fn basic_auth_value(user: &str, secret: &str) -> String {
        let encoded = general_purpose::STANDARD.encode(format!("{user}:{secret}"));
        format!("Basic {encoded}")
    }

    fn session_auth_value(session: &Session) -> String {
        Self::basic_auth_value(session.user_id(), session.token().expose_secret().as_ref())
    }

    /// Retry a request with exponential backoff
    ///
    /// Only transient failures are retried, at most `retry.max_retries` times.
    async fn retry_request<F, T, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    log_retry_attempt!(attempt, max_retries, e);
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch one listing page (zero-based)
    async fn fetch_page(&self, session: &Session, page: usize) -> Result<ToursPage> {
        let mut url = self.endpoint(&["v007", "users", session.user_id(), "tours", ""])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("sort_field", "date")
            .append_pair("sort_direction", "desc");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, Self::session_auth_value(session))
            .header(ACCEPT, "application/hal+json")
            .send()
            .await
            .map_err(|e| transport_error("listing page", &e))?;

        let response = check_status(response, "listing page").await?;

        response.json::<ToursPage>().await.map_err(|e| {
            WaymarkError::TransientFetch(format!("Undecodable listing page {page}: {e}"))
        })
    }

    async fn fetch_detail_once(&self, session: &Session, tour_id: &TourId) -> Result<TourPayload> {
        let mut url = self.endpoint(&["v007", "tours", tour_id.as_str()])?;
        url.query_pairs_mut()
            .append_pair("_embedded", "coordinates")
            .append_pair("format", "coordinate_array");

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, Self::session_auth_value(session))
            .header(ACCEPT, "application/hal+json")
            .send()
            .await
            .map_err(|e| transport_error("tour detail", &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(WaymarkError::NotFound(format!(
                "Tour {tour_id} returned HTTP {status}"
            )));
        }
        let response = check_status(response, "tour detail").await?;

        let detail = response.json::<TourDetailResponse>().await.map_err(|e| {
            WaymarkError::MalformedData(format!("Undecodable detail for tour {tour_id}: {e}"))
        })?;

        Ok(detail.into())
    }
}

#[async_trait]
impl TourSource for KomootClient {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Session> {
        let url = self.endpoint(&["v006", "account", "email", credentials.identity(), ""])?;

        tracing::info!(base_url = %self.base_url, "Authenticating with Komoot");

        let response = self
            .client
            .get(url)
            .header(
                AUTHORIZATION,
                Self::basic_auth_value(
                    credentials.identity(),
                    credentials.secret().expose_secret().as_ref(),
                ),
            )
            .send()
            .await
            .map_err(|e| WaymarkError::Auth(format!("Komoot is unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let reason = match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    "wrong password".to_string()
                }
                StatusCode::NOT_FOUND => "unknown email address".to_string(),
                StatusCode::TOO_MANY_REQUESTS => "rate limited, try again later".to_string(),
                other => format!("login failed with HTTP {other}"),
            };
            return Err(WaymarkError::Auth(reason));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| WaymarkError::Auth(format!("Unexpected login response: {e}")))?;

        let display_name = account
            .user
            .as_ref()
            .and_then(|u| u.displayname.as_deref())
            .unwrap_or("");
        tracing::info!(
            user_id = %account.username,
            display_name,
            "Authenticated with Komoot"
        );

        Ok(Session::new(account.username, secret_string(account.password)))
    }

    fn list_tours<'a>(
        &'a self,
        session: &'a Session,
        filter: &'a TourFilter,
    ) -> BoxStream<'a, Result<TourSummary>> {
        let pages = stream::try_unfold(Some(0usize), move |state| async move {
            let Some(page) = state else {
                return Ok::<_, WaymarkError>(None);
            };

            let response = self
                .retry_request(|| self.fetch_page(session, page))
                .await?;
            let total_pages = response.total_pages();
            let tours: Vec<KomootTour> = response.into_tours();
            let fetched = tours.len();

            let last_page = fetched < self.page_size
                || total_pages.map_or(false, |total| page + 1 >= total);

            tracing::debug!(page, fetched, last_page, "Fetched tour listing page");

            let items = tours
                .into_iter()
                .map(|tour| Ok::<_, WaymarkError>(tour.into_summary()));
            let next = if last_page { None } else { Some(page + 1) };
            Ok::<_, WaymarkError>(Some((stream::iter(items), next)))
        });

        pages
            .try_flatten()
            .try_filter(move |tour| future::ready(filter.matches(tour)))
            .boxed()
    }

    async fn fetch_detail(&self, session: &Session, tour_id: &TourId) -> Result<TourPayload> {
        self.retry_request(|| self.fetch_detail_once(session, tour_id))
            .await
    }
}

/// Classify a reqwest transport failure
fn transport_error(context: &str, err: &reqwest::Error) -> WaymarkError {
    if err.is_timeout() {
        WaymarkError::TransientFetch(format!("{context} timed out: {err}"))
    } else {
        WaymarkError::TransientFetch(format!("{context} request failed: {err}"))
    }
}

/// Map non-success statuses shared by listing and detail calls
async fn check_status(response: Response, context: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            WaymarkError::Auth(format!("{context}: session rejected (HTTP {status})"))
        }
        s if s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error() => {
            WaymarkError::TransientFetch(format!("{context}: HTTP {status} {body}"))
        }
        _ => WaymarkError::Other(format!("{context}: unexpected HTTP {status} {body}")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(base_url: &str) -> KomootClient {
        let config = KomootConfig {
            base_url: base_url.to_string(),
            ..KomootConfig::default()
        };
        KomootClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_keeps_trailing_slash() {
        let client = client_for("https://api.komoot.de");
        let url = client
            .endpoint(&["v006", "account", "email", "rider@example.com", ""])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.komoot.de/v006/account/email/rider@example.com/"
        );
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let client = client_for("http://localhost:8080/komoot/");
        let url = client.endpoint(&["v007", "tours", "42"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/komoot/v007/tours/42");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client_for("https://api.komoot.de");
        let url = client.endpoint(&["v007", "tours", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.komoot.de/v007/tours/a%2Fb");
    }

    #[test]
    fn test_basic_auth_value() {
        assert_eq!(
            KomootClient::basic_auth_value("user", "pass"),
            "Basic dXNlcjpwYXNz"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let config = KomootConfig {
            base_url: "not a url".to_string(),
            ..KomootConfig::default()
        };
        assert!(matches!(
            KomootClient::new(&config),
            Err(WaymarkError::Configuration(_))
        ));
    }
}
