//! Track conversion
//!
//! Turns raw tour payloads into GPX track-log documents. See [`gpx`] for the
//! conversion rules and document naming.

pub mod gpx;

pub use self::gpx::{
    document_name, parse_detail, parse_track_points, render_gpx, to_document,
    GPX_CREATOR,
};
