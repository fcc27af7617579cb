//! Tour source adapters
//!
//! The [`TourSource`] trait defines how the export pipeline authenticates,
//! lists and fetches tours; [`KomootClient`] implements it for the Komoot API.

pub mod komoot;
pub mod models;
mod r#trait;

pub use komoot::KomootClient;
pub use r#trait::{Session, TourSource};
