//! Komoot API models
//!
//! Wire structures for the Komoot v006/v007 endpoints. They stay separate from
//! the domain models and are converted at the client boundary.

use crate::domain::ids::TourId;
use crate::domain::{RawPoint, TourPayload, TourStatus, TourSummary};
use chrono::DateTime;
use serde::Deserialize;

/// Response of `GET /v006/account/email/{email}/`
///
/// Komoot returns the numeric user id as `username` and the session token as
/// `password`.
#[derive(Deserialize)]
pub struct AccountResponse {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub user: Option<AccountUser>,
}

#[derive(Debug, Deserialize)]
pub struct AccountUser {
    #[serde(default)]
    pub displayname: Option<String>,
}

/// One page of `GET /v007/users/{user}/tours/`
#[derive(Debug, Default, Deserialize)]
pub struct ToursPage {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<EmbeddedTours>,

    #[serde(default)]
    pub page: Option<PageInfo>,
}

impl ToursPage {
    pub fn into_tours(self) -> Vec<KomootTour> {
        self.embedded.map(|e| e.tours).unwrap_or_default()
    }

    pub fn total_pages(&self) -> Option<usize> {
        self.page.as_ref().and_then(|p| p.total_pages)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EmbeddedTours {
    #[serde(default)]
    pub tours: Vec<KomootTour>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub total_elements: Option<usize>,
    #[serde(default)]
    pub total_pages: Option<usize>,
    #[serde(default)]
    pub number: Option<usize>,
}

/// Tour entry of a listing page
#[derive(Debug, Deserialize)]
pub struct KomootTour {
    pub id: TourId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sport: String,
    #[serde(rename = "type", default)]
    pub tour_type: Option<TourStatus>,
}

impl KomootTour {
    /// Converts to the domain summary
    ///
    /// An unparseable date is dropped rather than failing the listing; the tour
    /// then bypasses the date filter.
    pub fn into_summary(self) -> TourSummary {
        let date = self.date.as_deref().and_then(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map_err(|e| {
                    tracing::debug!(
                        tour_id = %self.id,
                        date = %raw,
                        error = %e,
                        "Ignoring unparseable tour date"
                    );
                })
                .ok()
        });

        TourSummary {
            id: self.id,
            name: self.name,
            date,
            sport: self.sport,
            status: self.tour_type.unwrap_or(TourStatus::Unknown),
        }
    }
}

/// Response of `GET /v007/tours/{id}` with embedded coordinates
#[derive(Debug, Deserialize)]
pub struct TourDetailResponse {
    pub id: TourId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<DetailEmbedded>,
}

#[derive(Debug, Deserialize)]
pub struct DetailEmbedded {
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub items: Vec<RawPoint>,
}

impl From<TourDetailResponse> for TourPayload {
    fn from(response: TourDetailResponse) -> Self {
        TourPayload {
            id: response.id,
            name: response.name,
            sport: response.sport,
            recorded_at: response.date,
            points: response
                .embedded
                .and_then(|e| e.coordinates)
                .map(|c| c.items),
        }
    }
}
