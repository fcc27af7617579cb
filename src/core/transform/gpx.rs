//! GPX conversion
//!
//! Converts a raw tour payload into a GPX 1.1 document. Conversion is pure: no
//! I/O, no clock, and the output depends only on the payload and export name.

use crate::domain::{
    ExportName, RawPoint, Result, TourDetail, TourPayload, TrackDocument, TrackPoint,
    WaymarkError,
};
use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, Utc};
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Metadata, Track, TrackSegment, Waypoint};
use time::OffsetDateTime;

/// Value of the `creator` attribute on generated documents
pub const GPX_CREATOR: &str = concat!("waymark ", env!("CARGO_PKG_VERSION"));

/// Validate a raw payload into a [`TourDetail`]
///
/// Points keep the order they were received in; none are dropped, merged or
/// resampled.
///
/// # Errors
///
/// Returns [`WaymarkError::MalformedData`] when the payload has no points, the
/// recorded timestamp is missing or unparseable, a point timestamp overflows,
/// or a coordinate is out of range.
pub fn parse_detail(payload: TourPayload) -> Result<TourDetail> {
    let TourPayload {
        id,
        name,
        sport,
        recorded_at,
        points,
    } = payload;

    let raw_points = match points {
        Some(points) if !points.is_empty() => points,
        _ => {
            return Err(WaymarkError::MalformedData(format!(
                "Tour {id} has no track points"
            )))
        }
    };

    let recorded_at = recorded_at
        .as_deref()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| {
            WaymarkError::MalformedData(format!("Tour {id} has no recorded timestamp"))
        })?;
    let recorded_at = DateTime::parse_from_rfc3339(recorded_at).map_err(|e| {
        WaymarkError::MalformedData(format!(
            "Tour {id} has an unparseable recorded timestamp '{recorded_at}': {e}"
        ))
    })?;

    let points = raw_points
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_point(raw, recorded_at, index))
        .collect::<std::result::Result<Vec<_>, String>>()
        .map_err(|reason| WaymarkError::MalformedData(format!("Tour {id}: {reason}")))?;

    Ok(TourDetail {
        id,
        name,
        sport,
        recorded_at,
        points,
    })
}

fn parse_point(
    raw: &RawPoint,
    recorded_at: DateTime<FixedOffset>,
    index: usize,
) -> std::result::Result<TrackPoint, String> {
    if !raw.lat.is_finite() || !(-90.0..=90.0).contains(&raw.lat) {
        return Err(format!("point {index} has latitude {} out of range", raw.lat));
    }
    if !raw.lng.is_finite() || !(-180.0..=180.0).contains(&raw.lng) {
        return Err(format!("point {index} has longitude {} out of range", raw.lng));
    }
    if let Some(alt) = raw.alt {
        if !alt.is_finite() {
            return Err(format!("point {index} has non-finite elevation"));
        }
    }

    let time = raw
        .t
        .map(|offset_ms| {
            ChronoDuration::try_milliseconds(offset_ms)
                .and_then(|offset| recorded_at.with_timezone(&Utc).checked_add_signed(offset))
                .filter(|t| to_offset_datetime(*t).is_some())
                .ok_or_else(|| {
                    format!("point {index} has unrepresentable time offset {offset_ms}ms")
                })
        })
        .transpose()?;

    Ok(TrackPoint {
        lat: raw.lat,
        lon: raw.lng,
        elevation: raw.alt,
        time,
    })
}

/// Deterministic document name: `{export}-{YYYY-MM-DD}-{tourId}.gpx`
///
/// The date is the recorded date in the tour's own UTC offset. An empty export
/// name drops the prefix.
///
/// ```
/// use waymark::core::transform::gpx::document_name;
/// use waymark::domain::{ExportName, TourId};
/// use chrono::DateTime;
///
/// let recorded = DateTime::parse_from_rfc3339("2026-03-01T23:30:00-02:00").unwrap();
/// let id = TourId::new("abc123").unwrap();
///
/// assert_eq!(
///     document_name(&ExportName::new("myexport"), &id, &recorded),
///     "myexport-2026-03-01-abc123.gpx"
/// );
/// assert_eq!(
///     document_name(&ExportName::default(), &id, &recorded),
///     "2026-03-01-abc123.gpx"
/// );
/// ```
pub fn document_name(
    export_name: &ExportName,
    tour_id: &crate::domain::TourId,
    recorded_at: &DateTime<FixedOffset>,
) -> String {
    let date = recorded_at.format("%Y-%m-%d");
    if export_name.is_empty() {
        format!("{date}-{tour_id}.gpx")
    } else {
        format!("{export_name}-{date}-{tour_id}.gpx")
    }
}

/// Serialize a validated tour as GPX 1.1
///
/// # Errors
///
/// Returns [`WaymarkError::Serialization`] if the GPX writer fails.
pub fn render_gpx(detail: &TourDetail) -> Result<Vec<u8>> {
    let mut waypoints = Vec::with_capacity(detail.points.len());
    for point in &detail.points {
        let mut waypoint = Waypoint::new(Point::new(point.lon, point.lat));
        waypoint.elevation = point.elevation;
        waypoint.time = point
            .time
            .and_then(to_offset_datetime)
            .map(gpx::Time::from);
        waypoints.push(waypoint);
    }

    let mut track = Track::new();
    track.name = Some(detail.name.clone());
    track.type_ = Some(detail.sport.clone()).filter(|s| !s.is_empty());
    track.segments = vec![TrackSegment { points: waypoints }];

    let metadata = Metadata {
        name: Some(detail.name.clone()),
        time: to_offset_datetime(detail.recorded_at.with_timezone(&Utc))
            .map(gpx::Time::from),
        ..Default::default()
    };

    let document = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some(GPX_CREATOR.to_string()),
        metadata: Some(metadata),
        tracks: vec![track],
        ..Default::default()
    };

    let mut buffer = Vec::new();
    gpx::write(&document, &mut buffer).map_err(|e| {
        WaymarkError::Serialization(format!("Failed to write GPX for tour {}: {e}", detail.id))
    })?;
    Ok(buffer)
}

/// Render an already validated tour into a named document
pub fn to_document(detail: &TourDetail, export_name: &ExportName) -> Result<TrackDocument> {
    let content = render_gpx(detail)?;
    let name = document_name(export_name, &detail.id, &detail.recorded_at);
    Ok(TrackDocument::new(
        name,
        detail.id.clone(),
        content,
        detail.points.len(),
    ))
}

/// Read track points back out of a GPX document
///
/// Points of all tracks and segments are returned in document order.
///
/// # Errors
///
/// Returns [`WaymarkError::MalformedData`] if the bytes are not valid GPX or a
/// timestamp cannot be represented.
pub fn parse_track_points(content: &[u8]) -> Result<Vec<TrackPoint>> {
    let document = gpx::read(std::io::BufReader::new(content))
        .map_err(|e| WaymarkError::MalformedData(format!("Invalid GPX document: {e}")))?;

    let mut points = Vec::new();
    for track in &document.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                let point = waypoint.point();
                let time = match waypoint.time {
                    Some(t) => Some(from_offset_datetime(OffsetDateTime::from(t)).ok_or_else(
                        || WaymarkError::MalformedData("GPX point time out of range".to_string()),
                    )?),
                    None => None,
                };
                points.push(TrackPoint {
                    lat: point.y(),
                    lon: point.x(),
                    elevation: waypoint.elevation,
                    time,
                });
            }
        }
    }
    Ok(points)
}

fn to_offset_datetime(value: DateTime<Utc>) -> Option<OffsetDateTime> {
    let nanos = i128::from(value.timestamp()) * 1_000_000_000
        + i128::from(value.timestamp_subsec_nanos());
    OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

fn from_offset_datetime(value: OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.unix_timestamp(), value.nanosecond())
}
