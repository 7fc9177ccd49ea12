//! Mini Storage - A minimal HTTP file-storage server
//!
//! Upload, fetch and delete files by generated identifier, with metadata in
//! SQLite and LRU caches in front of metadata lookups and file content.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod files;
pub mod models;

pub use api::AppState;
pub use config::Config;
