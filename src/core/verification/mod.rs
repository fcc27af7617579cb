//! Document verification
//!
//! Optional check run between conversion and write: the serialized document is
//! parsed back and compared point by point with the validated tour.

use crate::core::transform::parse_track_points;
use crate::domain::{Result, TourDetail, TrackDocument, TrackPoint, WaymarkError};

/// Coordinates and elevations must survive serialization to within this delta
const TOLERANCE: f64 = 1e-9;

/// Verify that `document` encodes exactly the points of `detail`
///
/// # Errors
///
/// Returns [`WaymarkError::MalformedData`] describing the first mismatch.
pub fn verify_document(document: &TrackDocument, detail: &TourDetail) -> Result<()> {
    let parsed = parse_track_points(document.content())?;

    if parsed.len() != detail.points.len() {
        return Err(WaymarkError::MalformedData(format!(
            "{} holds {} points, expected {}",
            document.name(),
            parsed.len(),
            detail.points.len()
        )));
    }

    for (index, (actual, expected)) in parsed.iter().zip(&detail.points).enumerate() {
        if let Some(reason) = mismatch(actual, expected) {
            return Err(WaymarkError::MalformedData(format!(
                "{} point {index}: {reason}",
                document.name()
            )));
        }
    }

    tracing::debug!(document = %document.name(), points = parsed.len(), "Document verified");
    Ok(())
}

fn mismatch(actual: &TrackPoint, expected: &TrackPoint) -> Option<String> {
    if (actual.lat - expected.lat).abs() > TOLERANCE
        || (actual.lon - expected.lon).abs() > TOLERANCE
    {
        return Some(format!(
            "position ({}, {}) != ({}, {})",
            actual.lat, actual.lon, expected.lat, expected.lon
        ));
    }

    match (actual.elevation, expected.elevation) {
        (Some(a), Some(e)) if (a - e).abs() <= TOLERANCE => {}
        (None, None) => {}
        (a, e) => return Some(format!("elevation {a:?} != {e:?}")),
    }

    if actual.time != expected.time {
        return Some(format!("time {:?} != {:?}", actual.time, expected.time));
    }

    None
}
