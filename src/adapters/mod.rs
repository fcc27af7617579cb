//! External system adapters
//!
//! - [`tours`]: source API clients (Komoot)
//! - [`storage`]: destinations for converted documents

pub mod storage;
pub mod tours;
