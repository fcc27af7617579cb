//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "waymark.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Waymark configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Pick a storage type: s3, filesystem or smb");
                println!("  3. Create a .env file with your credentials:");
                println!("     - Set KOMOOT_EMAIL and KOMOOT_PASSWORD");
                println!("     - Set S3_ACCESS_KEY and S3_SECRET_KEY (if using S3)");
                println!("  4. Validate configuration: waymark validate-config");
                println!("  5. Run export: waymark export");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Waymark Configuration File
# Komoot tour to GPX storage exporter

[application]
log_level = "info"
allow_local_paths = false

[komoot]
email = "${KOMOOT_EMAIL}"
password = "${KOMOOT_PASSWORD}"

[export]
name = "komoot"
complete_only = true

[storage]
type = "s3"
endpoint = "https://s3.eu-central-1.amazonaws.com"
bucket = "my-tours"
access_key = "${S3_ACCESS_KEY}"
secret_key = "${S3_SECRET_KEY}"

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Waymark Configuration File
# Komoot tour to GPX storage exporter
#
# Values of the form ${VAR} are substituted from the environment (or a .env
# file). Any key can also be overridden with WAYMARK_<SECTION>_<KEY>, e.g.
# WAYMARK_EXPORT_START_DATE=2026-01-01.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Allow the filesystem storage type. It writes to the host filesystem, so
# shared deployments should leave it off.
allow_local_paths = false

# ============================================================================
# Komoot Account
# ============================================================================
[komoot]
base_url = "https://api.komoot.de"

# Account credentials; can also be passed as --api-key email:password
email = "${KOMOOT_EMAIL}"
password = "${KOMOOT_PASSWORD}"

# Per-request timeout in seconds
timeout_seconds = 30

# Tours per listing page (1-100)
page_size = 30

[komoot.retry]
# Retries for network errors, 429 and 5xx responses (0-3)
max_retries = 1
initial_delay_ms = 500
max_delay_ms = 5000
backoff_multiplier = 2.0

# ============================================================================
# Export Selection
# ============================================================================
[export]
# Prefix for document names and storage folder; empty = no prefix
name = "komoot"

# Inclusive date range (YYYY-MM-DD); omit a bound to leave it open
# start_date = "2026-01-01"
# end_date = "2026-12-31"

# Sport type, exact match (e.g. hike, touringbicycle, mtb); omit for all
# sport = "hike"

# Only export recorded tours, skipping planned ones
complete_only = true

# Tours processed at once (1-8)
concurrency = 1

# Parse every generated GPX back before writing it
verify_documents = false

# ============================================================================
# Storage (choose ONE type)
# ============================================================================
[storage]
# Timeout for opening the backend and for each write
io_timeout_seconds = 60

# ----------------------------------------------------------------------------
# Option 1: S3-compatible object storage (AWS, MinIO, Ceph, ...)
# ----------------------------------------------------------------------------
type = "s3"
endpoint = "https://s3.eu-central-1.amazonaws.com"
bucket = "my-tours"
access_key = "${S3_ACCESS_KEY}"
secret_key = "${S3_SECRET_KEY}"
region = "eu-central-1"
# Store documents under <export name>/ in the bucket
use_export_folder = true

# ----------------------------------------------------------------------------
# Option 2: Local directory or NFS mount (needs allow_local_paths = true)
# ----------------------------------------------------------------------------
# type = "filesystem"
# path = "/mnt/nas/tours"

# ----------------------------------------------------------------------------
# Option 3: SMB/CIFS share (needs a build with the `smb` feature)
# ----------------------------------------------------------------------------
# type = "smb"
# server = "nas.local"
# share = "tours"
# username = "${SMB_USERNAME}"
# password = "${SMB_PASSWORD}"
# subfolder = "komoot"
# workgroup = "WORKGROUP"

# ============================================================================
# Logging Configuration
# ============================================================================
[logging]
# Enable local JSON file logging
local_enabled = false

# Local log directory
local_path = "./logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}
