//! Request and Response models for the storage server API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! parsing uploads and serializing HTTP response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::UploadForm;
pub use responses::{
    CacheStatsResponse, DeleteResponse, ErrorResponse, HealthResponse, MemoryUsage,
    StatsResponse, UploadResponse,
};
