//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use tracing::warn;

use crate::cache::{DEFAULT_CONTENT_CAPACITY, DEFAULT_METADATA_CAPACITY};

/// Placeholder key shipped in sample environments.
pub const PLACEHOLDER_API_KEY: &str = "your-super-secret-api-key";

/// Slack on top of the file size limit for multipart framing.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Server configuration parameters.
///
/// Everything except the API key has a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub port: u16,
    /// Static key required on write routes
    pub api_key: String,
    /// Root directory for stored files
    pub upload_dir: PathBuf,
    /// Metadata database location
    pub database_url: String,
    /// Maximum upload size in bytes
    pub max_file_size: usize,
    /// Accepted upload media types; empty accepts everything
    pub allowed_mime_types: Vec<String>,
    /// Entry capacity of the metadata cache
    pub metadata_cache_capacity: usize,
    /// Byte capacity of the content cache
    pub content_cache_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 2007)
    /// - `API_KEY` - Required
    /// - `UPLOAD_DIR` - Storage root (default: ./uploads)
    /// - `DATABASE_URL` - Metadata store (default: sqlite://storage.db)
    /// - `MAX_FILE_SIZE_MB` - Upload limit in MiB (default: 10)
    /// - `ALLOWED_MIME_TYPES` - Comma-separated allow list (default: any)
    /// - `METADATA_CACHE_CAPACITY` - Cached records (default: 200)
    /// - `CONTENT_CACHE_BYTES` - Cached content budget (default: 256 MiB)
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let api_key = env::var("API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .context("Missing required environment variable: API_KEY")?;
        if api_key == PLACEHOLDER_API_KEY {
            warn!("Default API_KEY is used. Please generate a secure key for production!");
        }

        let config = Self {
            port: parse_var("PORT", defaults.port),
            api_key,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            max_file_size: megabytes(parse_var("MAX_FILE_SIZE_MB", 10))?,
            allowed_mime_types: env::var("ALLOWED_MIME_TYPES")
                .map(|value| parse_mime_types(&value))
                .unwrap_or_default(),
            metadata_cache_capacity: parse_var(
                "METADATA_CACHE_CAPACITY",
                defaults.metadata_cache_capacity,
            ),
            content_cache_bytes: parse_var("CONTENT_CACHE_BYTES", defaults.content_cache_bytes),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.metadata_cache_capacity == 0 {
            bail!("METADATA_CACHE_CAPACITY must be at least 1");
        }
        if self.content_cache_bytes == 0 {
            bail!("CONTENT_CACHE_BYTES must be at least 1");
        }
        Ok(())
    }

    /// Whether an upload of this media type is accepted.
    pub fn is_mime_allowed(&self, mimetype: &str) -> bool {
        self.allowed_mime_types.is_empty()
            || self
                .allowed_mime_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(mimetype))
    }

    /// Request body limit for upload routes.
    pub fn body_limit(&self) -> usize {
        self.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 2007,
            api_key: String::new(),
            upload_dir: PathBuf::from("./uploads"),
            database_url: "sqlite://storage.db".to_string(),
            max_file_size: 10 * 1024 * 1024,
            allowed_mime_types: Vec::new(),
            metadata_cache_capacity: DEFAULT_METADATA_CAPACITY,
            content_cache_bytes: DEFAULT_CONTENT_CAPACITY,
        }
    }
}

/// Converts a MiB count to bytes, rejecting values that overflow.
fn megabytes(mb: usize) -> anyhow::Result<usize> {
    match mb.checked_mul(1024 * 1024) {
        Some(bytes) => Ok(bytes),
        None => bail!("MAX_FILE_SIZE_MB is too large: {}", mb),
    }
}

fn parse_var<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated list, trimming items and dropping empty ones.
pub fn parse_mime_types(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
