//! Domain identifier types with validation
//!
//! Newtype wrappers for tour identifiers and export names. Each type keeps the
//! raw string form that ends up in document names and storage keys.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a sanitized export name, in characters
pub const MAX_EXPORT_NAME_LEN: usize = 200;

/// Tour identifier newtype wrapper
///
/// Komoot serves tour ids as JSON numbers in listings and as strings in some
/// detail payloads; both forms deserialize into the same `TourId`.
///
/// # Examples
///
/// ```
/// use waymark::domain::ids::TourId;
/// use std::str::FromStr;
///
/// let id = TourId::from_str("1234567890").unwrap();
/// assert_eq!(id.as_str(), "1234567890");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TourId(String);

impl TourId {
    /// Creates a new TourId from a string
    ///
    /// # Arguments
    ///
    /// * `id` - The tour identifier string
    ///
    /// # Returns
    ///
    /// Returns `Ok(TourId)` if the ID is non-empty, `Err` otherwise
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Tour ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the tour ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TourId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TourId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TourId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for TourId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n.to_string(),
            Raw::Text(s) => s,
        };
        TourId::new(raw).map_err(serde::de::Error::custom)
    }
}

/// Sanitized export name used as a document name prefix and storage folder
///
/// Characters that are unsafe in file names or object keys (`<>:"/\|?*` and
/// control characters) are replaced with `_`, and the name is capped at
/// [`MAX_EXPORT_NAME_LEN`] characters. An empty name is allowed and means
/// "no prefix".
///
/// # Examples
///
/// ```
/// use waymark::domain::ids::ExportName;
///
/// let name = ExportName::new("alps/2026: summer");
/// assert_eq!(name.as_str(), "alps_2026_ summer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct ExportName(String);

impl ExportName {
    /// Creates a new export name, sanitizing the input
    pub fn new(name: impl AsRef<str>) -> Self {
        let sanitized: String = name
            .as_ref()
            .trim()
            .chars()
            .map(|c| match c {
                '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .take(MAX_EXPORT_NAME_LEN)
            .collect();

        // "." and ".." would resolve to a parent directory on filesystem backends
        if !sanitized.is_empty() && sanitized.chars().all(|c| c == '.') {
            return Self("_".repeat(sanitized.chars().count()));
        }

        Self(sanitized)
    }

    /// Returns the export name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name is empty (no prefix)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ExportName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ExportName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ExportName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(ExportName::new)
    }
}
