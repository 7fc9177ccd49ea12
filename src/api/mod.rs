//! API Module
//!
//! HTTP handlers and routing for the storage server REST API.
//!
//! # Endpoints
//! - `POST /files/upload` - Store a file
//! - `GET /files/:filename` - Download a file
//! - `DELETE /files/:filename` - Delete a file
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics

pub mod auth;
pub mod handlers;
pub mod routes;

pub use auth::{RequireApiKey, API_KEY_HEADER};
pub use handlers::*;
pub use routes::create_router;
