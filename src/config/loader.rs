//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::WaymarkConfig;
use super::secret::secret_string;
use crate::domain::errors::WaymarkError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`WaymarkConfig`]
/// 4. Applies environment variable overrides (`WAYMARK_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`WaymarkError::Configuration`] if the file is missing or unreadable,
/// a referenced environment variable is unset, the TOML is invalid, or
/// validation fails.
///
/// # Examples
///
/// ```no_run
/// use waymark::config::loader::load_config;
///
/// let config = load_config("waymark.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<WaymarkConfig> {
    let config = load_config_unvalidated(path)?;

    config.validate().map_err(|e| {
        WaymarkError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Loads configuration without running validation
///
/// Used where validation must happen after CLI overrides are applied.
pub fn load_config_unvalidated(path: impl AsRef<Path>) -> Result<WaymarkConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(WaymarkError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        WaymarkError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: WaymarkConfig = toml::from_str(&contents)
        .map_err(|e| WaymarkError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. All missing variables are reported in a
/// single error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| WaymarkError::Other(format!("invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &regex::Captures<'_>| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                    String::new()
                }
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(WaymarkError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `WAYMARK_` prefix
///
/// Variables follow the pattern `WAYMARK_<SECTION>_<KEY>`, for example
/// `WAYMARK_KOMOOT_EMAIL` or `WAYMARK_EXPORT_CONCURRENCY`. Values that fail to
/// parse are ignored and the file value is kept.
fn apply_env_overrides(config: &mut WaymarkConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("WAYMARK_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("WAYMARK_APPLICATION_ALLOW_LOCAL_PATHS") {
        if let Ok(allow) = val.parse() {
            config.application.allow_local_paths = allow;
        }
    }

    // Komoot overrides
    if let Ok(val) = std::env::var("WAYMARK_KOMOOT_BASE_URL") {
        config.komoot.base_url = val;
    }
    if let Ok(val) = std::env::var("WAYMARK_KOMOOT_EMAIL") {
        config.komoot.email = Some(val);
    }
    if let Ok(val) = std::env::var("WAYMARK_KOMOOT_PASSWORD") {
        config.komoot.password = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("WAYMARK_KOMOOT_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.komoot.timeout_seconds = secs;
        }
    }
    if let Ok(val) = std::env::var("WAYMARK_KOMOOT_RETRY_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.komoot.retry.max_retries = retries;
        }
    }

    // Export overrides
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_NAME") {
        config.export.name = val;
    }
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_START_DATE") {
        config.export.start_date = Some(val);
    }
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_END_DATE") {
        config.export.end_date = Some(val);
    }
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_SPORT") {
        config.export.sport = Some(val);
    }
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_COMPLETE_ONLY") {
        if let Ok(complete_only) = val.parse() {
            config.export.complete_only = complete_only;
        }
    }
    if let Ok(val) = std::env::var("WAYMARK_EXPORT_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.export.concurrency = concurrency;
        }
    }

    // Storage overrides
    if let Ok(val) = std::env::var("WAYMARK_STORAGE_IO_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.storage.io_timeout_seconds = secs;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("WAYMARK_LOGGING_LOCAL_ENABLED") {
        if let Ok(enabled) = val.parse() {
            config.logging.local_enabled = enabled;
        }
    }
    if let Ok(val) = std::env::var("WAYMARK_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("WAYMARK_TEST_SUB_VAR", "test_value");
        let input = "password = \"${WAYMARK_TEST_SUB_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("WAYMARK_TEST_SUB_VAR");
    }

    #[test]
    fn test_substitute_env_vars_reports_all_missing() {
        std::env::remove_var("WAYMARK_TEST_MISSING_A");
        std::env::remove_var("WAYMARK_TEST_MISSING_B");
        let input = "a = \"${WAYMARK_TEST_MISSING_A}\"\nb = \"${WAYMARK_TEST_MISSING_B}\"";
        let err = substitute_env_vars(input).unwrap_err().to_string();
        assert!(err.contains("WAYMARK_TEST_MISSING_A"));
        assert!(err.contains("WAYMARK_TEST_MISSING_B"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("WAYMARK_TEST_COMMENTED");
        let input = "# secret_key = \"${WAYMARK_TEST_COMMENTED}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-waymark.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let file = write_config(
            r#"
[komoot]
email = "rider@example.com"
password = "pw"

[export]
name = "summer"
start_date = "2026-06-01"

[storage]
type = "s3"
endpoint = "http://localhost:9000"
bucket = "tours"
access_key = "minio"
secret_key = "minio123"
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.komoot.base_url, "https://api.komoot.de");
        assert_eq!(config.komoot.page_size, 30);
        assert_eq!(config.export.name, "summer");
        assert_eq!(
            config.komoot.password.as_ref().unwrap().expose_secret(),
            "pw"
        );
        assert!(!config.application.allow_local_paths);
    }

    #[test]
    fn test_load_config_invalid_storage() {
        let file = write_config(
            r#"
[storage]
type = "tape"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, WaymarkError::Configuration(_)));
    }
}
