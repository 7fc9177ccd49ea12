//! API Handlers
//!
//! HTTP request handlers for each storage server endpoint.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use sysinfo::System;
use tokio::sync::RwLock;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};

use super::auth::RequireApiKey;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::files::{FileRepository, FileService, FileStorage};
use crate::models::{
    DeleteResponse, HealthResponse, MemoryUsage, StatsResponse, UploadForm, UploadResponse,
};

/// Stored files never change under the same identifier.
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000";

/// Application state shared across all handlers.
///
/// The caches inside the file service are process-wide, shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub files: FileService,
    pub started_at: Instant,
    /// Memory probe reused across health checks
    pub system: Arc<RwLock<System>>,
}

impl AppState {
    /// Creates a new AppState around an existing file service.
    pub fn new(config: Config, files: FileService) -> Self {
        Self {
            config: Arc::new(config),
            files,
            started_at: Instant::now(),
            system: Arc::new(RwLock::new(System::new())),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects and migrates the metadata store, prepares the upload
    /// directory and sizes both caches.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let repository = FileRepository::connect(&config.database_url)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_url))?;
        repository
            .migrate()
            .await
            .context("Failed to migrate database")?;

        let storage = FileStorage::new(&config.upload_dir);
        storage.ensure_dir().await.with_context(|| {
            format!(
                "Failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

        let files = FileService::new(
            repository,
            storage,
            config.metadata_cache_capacity,
            config.content_cache_bytes,
        );
        Ok(Self::new(config, files))
    }
}

/// Handler for POST /files/upload
///
/// Stores the multipart `file` part and returns its identifier and URL.
pub async fn upload_handler(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let file = UploadForm::from_multipart(&mut multipart)
        .await?
        .validate(&state.config)?;

    let record = state.files.store_file(file).await?;

    Ok(Json(UploadResponse::new(&record, &base_url(&headers))))
}

/// Handler for GET /files/:filename
///
/// Serves the raw bytes with the recorded media type.
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let record = state
        .files
        .get_metadata(&filename)
        .await?
        .ok_or_else(|| ApiError::NotFound("file not found".to_string()))?;

    let data = state.files.get_content(&record).await?;

    let headers = [
        (header::CONTENT_TYPE, record.mimetype),
        (header::CONTENT_LENGTH, data.len().to_string()),
        (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL.to_string()),
    ];
    Ok((headers, data).into_response())
}

/// Handler for DELETE /files/:filename
pub async fn delete_file_handler(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    Path(filename): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let record = state.files.delete_file(&filename).await?;

    Ok(Json(DeleteResponse::new(record.stored_filename)))
}

/// Handler for GET /health
///
/// Reports uptime, memory usage and whether the metadata store answers.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ok = state.files.database_healthy().await;
    let memory = MemoryUsage::sample(&mut *state.system.write().await);

    Json(HealthResponse::new(
        database_ok,
        state.started_at.elapsed().as_secs(),
        memory,
    ))
}

/// Handler for GET /stats
///
/// Returns statistics of the metadata and content caches.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let (metadata, content) = state.files.cache_stats().await;

    Json(StatsResponse::new(metadata, content))
}

/// Fallback for unknown routes
pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}

/// Origin the client used to reach us, for building file URLs.
fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    format!("{}://{}", scheme, host)
}
