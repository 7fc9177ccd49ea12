//! Files Module
//!
//! Metadata persistence, on-disk storage and the service tying them to the caches.

mod repository;
mod service;
mod storage;

pub use repository::{FileRecord, FileRepository, NewFile};
pub use service::{FileService, IncomingFile};
pub use storage::{generate_stored_filename, FileStorage};
