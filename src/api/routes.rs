//! API Routes
//!
//! Configures the Axum router with all storage server endpoints.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::auth::API_KEY_HEADER;
use super::handlers::{
    delete_file_handler, get_file_handler, health_handler, not_found_handler, stats_handler,
    upload_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `POST /files/upload` - Store a file (API key)
/// - `GET /files/:filename` - Download a file
/// - `DELETE /files/:filename` - Delete a file (API key)
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Cache statistics
///
/// # Middleware
/// - CORS: Allows any origin
/// - Body limit: Sized from the upload limit
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(API_KEY_HEADER),
        ]);

    Router::new()
        .route("/files/upload", post(upload_handler))
        .route(
            "/files/:filename",
            get(get_file_handler).delete(delete_file_handler),
        )
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
