//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;
use waymark::config::load_config;
use waymark::domain::{BackendDescriptor, WaymarkError};

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("WAYMARK_APPLICATION_LOG_LEVEL");
    std::env::remove_var("WAYMARK_EXPORT_SPORT");
    std::env::remove_var("WAYMARK_EXPORT_CONCURRENCY");
    std::env::remove_var("WAYMARK_EXPORT_START_DATE");
    std::env::remove_var("TEST_KOMOOT_PASSWORD");
    std::env::remove_var("TEST_S3_SECRET");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const S3_CONFIG: &str = r#"
[application]
log_level = "debug"

[komoot]
email = "rider@example.com"
password = "${TEST_KOMOOT_PASSWORD}"
page_size = 50

[komoot.retry]
max_retries = 2

[export]
name = "alps/2026"
start_date = "2026-01-01"
end_date = "2026-06-30"
sport = "hike"
complete_only = true
concurrency = 4

[storage]
type = "s3"
endpoint = "http://localhost:9000"
bucket = "tours"
access_key = "minio"
secret_key = "${TEST_S3_SECRET}"
use_export_folder = false

[logging]
local_enabled = false
"#;

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_KOMOOT_PASSWORD", "hunter2");
    std::env::set_var("TEST_S3_SECRET", "minio-secret");

    let file = write_config(S3_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(!config.application.allow_local_paths);
    assert_eq!(config.komoot.page_size, 50);
    assert_eq!(config.komoot.retry.max_retries, 2);
    assert!(config.komoot.password.as_ref().unwrap().expose_secret() == "hunter2");

    match &config.storage.backend {
        BackendDescriptor::ObjectStorage {
            bucket,
            secret_key,
            region,
            use_export_folder,
            ..
        } => {
            assert_eq!(bucket, "tours");
            assert!(secret_key.expose_secret() == "minio-secret");
            assert_eq!(region, "us-east-1");
            assert!(!use_export_folder);
        }
        other => panic!("expected s3 backend, got {other:?}"),
    }

    let job = config.to_job().unwrap();
    assert_eq!(job.export_name.as_str(), "alps_2026");
    assert_eq!(job.concurrency, 4);
    assert_eq!(job.filter.sport.as_deref(), Some("hike"));
    assert!(job.filter.complete_only);
    assert_eq!(job.filter.date_range.to_string(), "2026-01-01 to 2026-06-30");

    let credentials = config.credentials().unwrap();
    assert_eq!(credentials.identity(), "rider@example.com");

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(S3_CONFIG);
    let err = load_config(file.path()).unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, WaymarkError::Configuration(_)));
    assert!(message.contains("TEST_KOMOOT_PASSWORD"));
    assert!(message.contains("TEST_S3_SECRET"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_KOMOOT_PASSWORD", "hunter2");
    std::env::set_var("TEST_S3_SECRET", "minio-secret");
    std::env::set_var("WAYMARK_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("WAYMARK_EXPORT_SPORT", "mtb");
    std::env::set_var("WAYMARK_EXPORT_CONCURRENCY", "2");

    let file = write_config(S3_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.export.sport.as_deref(), Some("mtb"));
    assert_eq!(config.export.concurrency, 2);

    cleanup_env_vars();
}

#[test]
fn test_inverted_date_range_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_KOMOOT_PASSWORD", "hunter2");
    std::env::set_var("TEST_S3_SECRET", "minio-secret");
    std::env::set_var("WAYMARK_EXPORT_START_DATE", "2026-12-01");

    let file = write_config(S3_CONFIG);
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, WaymarkError::Configuration(_)));

    cleanup_env_vars();
}

#[test]
fn test_filesystem_and_nfs_alias() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for kind in ["filesystem", "nfs"] {
        let file = write_config(&format!(
            r#"
[application]
allow_local_paths = true

[storage]
type = "{kind}"
path = "/mnt/nas/tours"
"#
        ));
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.storage.backend.kind_name(), "filesystem");
        assert_eq!(config.export.concurrency, 1);
        assert!(!config.export.complete_only);
    }
}

#[test]
fn test_smb_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[storage]
type = "smb"
server = "nas.local"
share = "tours"
username = "rider"
password = "pw"
subfolder = "komoot"
io_timeout_seconds = 15
"#,
    );
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.storage.io_timeout_seconds, 15);
    match &config.storage.backend {
        BackendDescriptor::NetworkShare {
            server,
            subfolder,
            workgroup,
            ..
        } => {
            assert_eq!(server, "nas.local");
            assert_eq!(subfolder.as_deref(), Some("komoot"));
            assert_eq!(workgroup, &None);
        }
        other => panic!("expected smb backend, got {other:?}"),
    }
}

#[test]
fn test_invalid_values_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let cases = [
        // unknown storage type
        "[storage]\ntype = \"ftp\"\npath = \"/x\"\n",
        // concurrency out of range
        "[export]\nconcurrency = 0\n[storage]\ntype = \"filesystem\"\npath = \"/x\"\n",
        // bad date
        "[export]\nstart_date = \"01.02.2026\"\n[storage]\ntype = \"filesystem\"\npath = \"/x\"\n",
        // s3 without bucket
        "[storage]\ntype = \"s3\"\nendpoint = \"https://s3\"\nbucket = \"\"\naccess_key = \"a\"\nsecret_key = \"b\"\n",
        // bad log level
        "[application]\nlog_level = \"loud\"\n[storage]\ntype = \"filesystem\"\npath = \"/x\"\n",
    ];

    for case in cases {
        let file = write_config(case);
        assert!(
            matches!(
                load_config(file.path()),
                Err(WaymarkError::Configuration(_))
            ),
            "expected configuration error for:\n{case}"
        );
    }
}

#[test]
fn test_missing_file() {
    let err = load_config("/definitely/not/here/waymark.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
