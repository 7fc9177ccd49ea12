//! Response DTOs for the storage server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use sysinfo::{ProcessesToUpdate, System};

use crate::cache::CacheStats;
use crate::files::FileRecord;

/// Response body for POST /files/upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    /// Stored filename, the identifier to fetch the file by
    pub filename: String,
    /// Absolute URL the file is served from
    pub url: String,
    /// Size in bytes
    pub size: i64,
}

impl UploadResponse {
    pub fn new(record: &FileRecord, base_url: &str) -> Self {
        Self {
            success: true,
            message: "file uploaded successfully".to_string(),
            filename: record.stored_filename.clone(),
            url: format!(
                "{}/files/{}",
                base_url.trim_end_matches('/'),
                record.stored_filename
            ),
            size: record.size,
        }
    }
}

/// Response body for DELETE /files/:filename
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    /// The stored filename that was deleted
    pub filename: String,
}

impl DeleteResponse {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            success: true,
            message: "file deleted successfully".to_string(),
            filename: filename.into(),
        }
    }
}

/// Statistics for one cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rejections: u64,
    pub total_entries: usize,
    pub current_cost: usize,
    pub capacity: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            rejections: stats.rejections,
            total_entries: stats.total_entries,
            current_cost: stats.current_cost,
            capacity: stats.capacity,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Entry-count bounded metadata cache
    pub metadata_cache: CacheStatsResponse,
    /// Byte bounded content cache
    pub content_cache: CacheStatsResponse,
}

impl StatsResponse {
    pub fn new(metadata: CacheStats, content: CacheStats) -> Self {
        Self {
            metadata_cache: metadata.into(),
            content_cache: content.into(),
        }
    }
}

/// Process and host memory figures, formatted in MB
#[derive(Debug, Clone, Serialize)]
pub struct MemoryUsage {
    /// Resident set size of this process
    pub rss: String,
    /// Virtual memory of this process
    pub virtual_memory: String,
    pub system_total: String,
    pub system_free: String,
}

impl MemoryUsage {
    /// Refreshes `system` and reads the current figures.
    pub fn sample(system: &mut System) -> Self {
        system.refresh_memory();

        let (rss, virtual_memory) = match sysinfo::get_current_pid() {
            Ok(pid) => {
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                system
                    .process(pid)
                    .map(|process| (process.memory(), process.virtual_memory()))
                    .unwrap_or_default()
            }
            Err(_) => (0, 0),
        };

        Self {
            rss: format_mb(rss),
            virtual_memory: format_mb(virtual_memory),
            system_total: format_mb(system.total_memory()),
            system_free: format_mb(system.free_memory()),
        }
    }
}

fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status, always "ok" while the process answers
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Seconds since the server started
    pub uptime_seconds: u64,
    /// "ok" or "error" depending on whether the metadata store answers
    pub database: String,
    pub memory: MemoryUsage,
}

impl HealthResponse {
    pub fn new(database_ok: bool, uptime_seconds: u64, memory: MemoryUsage) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_seconds,
            database: if database_ok { "ok" } else { "error" }.to_string(),
            memory,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
