//! Tour domain models
//!
//! A tour flows through four shapes during one export:
//! [`TourSummary`] (listing) → [`TourPayload`] (raw detail) → [`TourDetail`]
//! (validated track) → [`TrackDocument`] (serialized GPX). None of them is
//! cached across tours or jobs.

use crate::domain::ids::TourId;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Completion status of a tour as reported by the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourStatus {
    /// Recorded (completed) tour, `tour_recorded` on the wire
    #[serde(rename = "tour_recorded")]
    Recorded,
    /// Planned tour that was never recorded, `tour_planned` on the wire
    #[serde(rename = "tour_planned")]
    Planned,
    /// Any other type the API may introduce
    #[serde(other)]
    Unknown,
}

impl TourStatus {
    /// Whether the tour counts as completed for the completion filter
    pub fn is_completed(self) -> bool {
        matches!(self, TourStatus::Recorded)
    }
}

impl fmt::Display for TourStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TourStatus::Recorded => "recorded",
            TourStatus::Planned => "planned",
            TourStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Tour as it appears in the listing, used for filtering before any detail fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourSummary {
    /// Unique tour identifier
    pub id: TourId,

    /// Display name
    pub name: String,

    /// Recorded date with the tour's own UTC offset, if the listing carries one
    pub date: Option<DateTime<FixedOffset>>,

    /// Sport type (e.g. `hike`, `touringbicycle`)
    pub sport: String,

    /// Completion status
    pub status: TourStatus,
}

impl TourSummary {
    /// Calendar date of the tour in its own offset
    pub fn local_date(&self) -> Option<NaiveDate> {
        self.date.map(|d| d.date_naive())
    }
}

/// One point of a raw detail payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub alt: Option<f64>,
    /// Milliseconds since the tour's recorded start
    #[serde(default)]
    pub t: Option<i64>,
}

/// Unvalidated tour detail as returned by the source client
///
/// The converter is the only consumer and the only place that interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct TourPayload {
    pub id: TourId,
    pub name: String,
    pub sport: String,
    /// Recorded start timestamp as sent by the API (RFC 3339 expected)
    pub recorded_at: Option<String>,
    /// Track points, `None` when the payload carried no coordinate data at all
    pub points: Option<Vec<RawPoint>>,
}

/// Validated geographic point of a track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    /// Elevation in metres, absent when the source had none
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
}

/// Validated tour detail, ready to serialize
#[derive(Debug, Clone, PartialEq)]
pub struct TourDetail {
    pub id: TourId,
    pub name: String,
    pub sport: String,
    pub recorded_at: DateTime<FixedOffset>,
    /// Points in the order received from the API
    pub points: Vec<TrackPoint>,
}

/// Serialized track-log document for one tour
///
/// Immutable once built; the name is deterministic for a given export name,
/// tour date and tour id.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDocument {
    name: String,
    tour_id: TourId,
    content: Bytes,
    point_count: usize,
}

impl TrackDocument {
    /// Creates a new track document
    pub fn new(
        name: impl Into<String>,
        tour_id: TourId,
        content: impl Into<Bytes>,
        point_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            tour_id,
            content: content.into(),
            point_count,
        }
    }

    /// Document file name, e.g. `myexport-2026-03-01-abc123.gpx`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tour_id(&self) -> &TourId {
        &self.tour_id
    }

    /// Serialized bytes (cheap to clone)
    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
