//! Result type alias for Waymark

use super::errors::WaymarkError;

/// Result type alias for Waymark operations
///
/// # Examples
///
/// ```
/// use waymark::domain::result::Result;
/// use waymark::domain::errors::WaymarkError;
///
/// fn parse_page_size(raw: &str) -> Result<usize> {
///     raw.parse()
///         .map_err(|_| WaymarkError::Configuration(format!("invalid page size: {raw}")))
/// }
///
/// assert_eq!(parse_page_size("30").unwrap(), 30);
/// assert!(parse_page_size("thirty").is_err());
/// ```
pub type Result<T> = std::result::Result<T, WaymarkError>;
