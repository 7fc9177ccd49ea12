//! File Service
//!
//! Orchestrates uploads, lookups and deletions across the metadata
//! repository, the storage backend and the two in-memory caches.
//!
//! Cache locks are only held for the in-memory operation itself; they are
//! always released before awaiting the repository or the filesystem.

use std::path::Path;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::cache::{self, CacheStats, ContentCache, MetadataCache, SharedCache};
use crate::error::{ApiError, Result};
use crate::files::repository::{FileRecord, FileRepository, NewFile};
use crate::files::storage::{generate_stored_filename, FileStorage};

const MISSING_FROM_STORAGE: &str =
    "File is missing from storage, please contact an administrator.";

/// An upload that passed validation and is ready to be stored.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_filename: String,
    pub mimetype: String,
    pub data: Bytes,
}

#[derive(Clone)]
pub struct FileService {
    repository: FileRepository,
    storage: FileStorage,
    metadata_cache: SharedCache<MetadataCache>,
    content_cache: SharedCache<ContentCache>,
}

impl FileService {
    pub fn new(
        repository: FileRepository,
        storage: FileStorage,
        metadata_capacity: usize,
        content_capacity: usize,
    ) -> Self {
        Self {
            repository,
            storage,
            metadata_cache: cache::shared(MetadataCache::new(metadata_capacity)),
            content_cache: cache::shared(ContentCache::new(content_capacity)),
        }
    }

    pub fn repository(&self) -> &FileRepository {
        &self.repository
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn metadata_cache(&self) -> &SharedCache<MetadataCache> {
        &self.metadata_cache
    }

    pub fn content_cache(&self) -> &SharedCache<ContentCache> {
        &self.content_cache
    }

    // == Store ==
    /// Writes the bytes to disk under a fresh identifier and records the metadata.
    ///
    /// The written file is removed again if the record cannot be inserted.
    pub async fn store_file(&self, file: IncomingFile) -> Result<FileRecord> {
        let stored_filename = generate_stored_filename(&file.original_filename);
        let path = self.storage.write(&stored_filename, &file.data).await?;

        let new_file = NewFile {
            original_filename: file.original_filename,
            stored_filename,
            mimetype: file.mimetype,
            size: file.data.len() as i64,
            path: path.to_string_lossy().into_owned(),
        };

        match self.repository.create(&new_file).await {
            Ok(record) => {
                info!(
                    "Stored '{}' as {} ({} bytes)",
                    record.original_filename, record.stored_filename, record.size
                );
                Ok(record)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&path).await {
                    warn!("Failed to remove orphaned file {}: {}", path.display(), cleanup);
                }
                Err(err.into())
            }
        }
    }

    // == Metadata Lookup ==
    /// Looks up a record, consulting the metadata cache before the repository.
    pub async fn get_metadata(&self, stored_filename: &str) -> Result<Option<FileRecord>> {
        let cached = self
            .metadata_cache
            .write()
            .await
            .get(stored_filename)
            .cloned();
        if let Some(record) = cached {
            debug!("Metadata cache hit for {}", stored_filename);
            return Ok(Some(record));
        }

        debug!("Metadata cache miss for {}", stored_filename);
        let record = self
            .repository
            .find_by_stored_filename(stored_filename)
            .await?;

        if let Some(record) = &record {
            self.metadata_cache
                .write()
                .await
                .set(stored_filename.to_string(), record.clone());
        }

        Ok(record)
    }

    // == Content Lookup ==
    /// Returns the bytes of a stored file, consulting the content cache first.
    ///
    /// Files larger than the content cache budget are served without caching.
    pub async fn get_content(&self, record: &FileRecord) -> Result<Bytes> {
        let cached = self
            .content_cache
            .write()
            .await
            .get(&record.stored_filename)
            .cloned();
        if let Some(data) = cached {
            debug!("Content cache hit for {}", record.stored_filename);
            return Ok(data);
        }

        let data = match self.storage.read(Path::new(&record.path)).await? {
            Some(data) => data,
            None => return Err(self.missing_bytes(record).await),
        };

        let admitted = self
            .content_cache
            .write()
            .await
            .set(record.stored_filename.clone(), data.clone());
        if !admitted {
            debug!(
                "{} ({} bytes) is too large for the content cache",
                record.stored_filename,
                data.len()
            );
        }

        Ok(data)
    }

    /// Resolves a record whose bytes are gone from disk.
    ///
    /// The cached record may be stale after a concurrent delete, so it is
    /// dropped and the repository asked again: a vanished row is a plain
    /// not-found, a surviving row means storage lost the file.
    async fn missing_bytes(&self, record: &FileRecord) -> ApiError {
        self.invalidate(&record.stored_filename).await;

        match self
            .repository
            .find_by_stored_filename(&record.stored_filename)
            .await
        {
            Ok(None) => {
                debug!("Dropped stale cache entry for {}", record.stored_filename);
                ApiError::NotFound("file not found".to_string())
            }
            Ok(Some(_)) => {
                error!(
                    "File {} has a record but is missing at {}",
                    record.stored_filename, record.path
                );
                ApiError::Internal(MISSING_FROM_STORAGE.to_string())
            }
            Err(err) => err.into(),
        }
    }

    // == Delete ==
    /// Deletes the record, invalidates both caches, then removes the bytes.
    ///
    /// Bytes go last: if the record cannot be deleted the file is left whole
    /// and still served.
    pub async fn delete_file(&self, stored_filename: &str) -> Result<FileRecord> {
        let Some(record) = self
            .repository
            .find_by_stored_filename(stored_filename)
            .await?
        else {
            self.invalidate(stored_filename).await;
            return Err(ApiError::NotFound(format!("File not found: {}", stored_filename)));
        };

        self.repository
            .delete_by_stored_filename(stored_filename)
            .await?;
        self.invalidate(stored_filename).await;

        match self.storage.remove(Path::new(&record.path)).await {
            Ok(true) => {}
            Ok(false) => warn!(
                "File {} was already missing from {}",
                stored_filename, record.path
            ),
            // The record is gone, so the file is unreachable either way
            Err(err) => warn!(
                "Failed to remove {} from {}: {}",
                stored_filename, record.path, err
            ),
        }

        info!("Deleted {}", stored_filename);
        Ok(record)
    }

    /// Drops any cached state for a file.
    pub async fn invalidate(&self, stored_filename: &str) {
        self.metadata_cache.write().await.delete(stored_filename);
        self.content_cache.write().await.delete(stored_filename);
    }

    // == Health ==
    pub async fn database_healthy(&self) -> bool {
        match self.repository.ping().await {
            Ok(()) => true,
            Err(err) => {
                error!("Health check failed to connect to the database: {}", err);
                false
            }
        }
    }

    // == Stats ==
    /// Snapshots of the metadata and content cache statistics.
    pub async fn cache_stats(&self) -> (CacheStats, CacheStats) {
        let metadata = self.metadata_cache.read().await.stats();
        let content = self.content_cache.read().await.stats();
        (metadata, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service(dir: &tempfile::TempDir, content_capacity: usize) -> FileService {
        let repository = FileRepository::connect_in_memory().await.unwrap();
        repository.migrate().await.unwrap();
        let storage = FileStorage::new(dir.path());
        FileService::new(repository, storage, 2, content_capacity)
    }

    fn incoming(name: &str, data: &'static [u8]) -> IncomingFile {
        IncomingFile {
            original_filename: name.to_string(),
            mimetype: "text/plain".to_string(),
            data: Bytes::from_static(data),
        }
    }

    #[tokio::test]
    async fn test_store_then_fetch_populates_caches() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("notes.txt", b"hello")).await.unwrap();
        assert!(record.stored_filename.ends_with(".txt"));
        assert_eq!(record.size, 5);
        assert!(!service.metadata_cache().read().await.contains(&record.stored_filename));

        let fetched = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, record);
        assert!(service.metadata_cache().read().await.contains(&record.stored_filename));

        let data = service.get_content(&fetched).await.unwrap();
        assert_eq!(&data[..], b"hello");
        assert!(service.content_cache().read().await.contains(&record.stored_filename));
    }

    #[tokio::test]
    async fn test_metadata_served_from_cache_after_first_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("a.txt", b"a")).await.unwrap();
        service.get_metadata(&record.stored_filename).await.unwrap();

        // Remove the row behind the cache's back; the snapshot still answers
        service
            .repository()
            .delete_by_stored_filename(&record.stored_filename)
            .await
            .unwrap();
        let cached = service.get_metadata(&record.stored_filename).await.unwrap();
        assert_eq!(cached, Some(record));

        let (metadata, _) = service.cache_stats().await;
        assert_eq!(metadata.hits, 1);
        assert_eq!(metadata.misses, 1);
    }

    #[tokio::test]
    async fn test_unknown_file_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        assert!(service.get_metadata("missing.txt").await.unwrap().is_none());
        assert!(service.metadata_cache().read().await.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_content_is_served_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 4).await;

        let record = service.store_file(incoming("big.bin", b"0123456789")).await.unwrap();
        let data = service.get_content(&record).await.unwrap();

        assert_eq!(data.len(), 10);
        let content = service.content_cache().read().await;
        assert!(content.is_empty());
        assert_eq!(content.stats().rejections, 1);
    }

    #[tokio::test]
    async fn test_missing_bytes_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("lost.txt", b"lost")).await.unwrap();
        std::fs::remove_file(&record.path).unwrap();

        let result = service.get_content(&record).await;
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[tokio::test]
    async fn test_stale_cached_record_resolves_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("race.txt", b"race")).await.unwrap();
        service.get_metadata(&record.stored_filename).await.unwrap();

        // A delete that finished while this lookup still held the old record
        service
            .repository()
            .delete_by_stored_filename(&record.stored_filename)
            .await
            .unwrap();
        std::fs::remove_file(&record.path).unwrap();

        let stale = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        let result = service.get_content(&stale).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        assert!(!service.metadata_cache().read().await.contains(&record.stored_filename));
        assert!(service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_invalidates_everything() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("bye.txt", b"bye")).await.unwrap();
        let fetched = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        service.get_content(&fetched).await.unwrap();

        let deleted = service.delete_file(&record.stored_filename).await.unwrap();
        assert_eq!(deleted.stored_filename, record.stored_filename);

        assert!(!Path::new(&record.path).exists());
        assert!(service.metadata_cache().read().await.is_empty());
        assert!(service.content_cache().read().await.is_empty());
        assert!(service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_failed_record_delete_keeps_file_served() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let record = service.store_file(incoming("keep.txt", b"secret")).await.unwrap();
        let fetched = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        service.get_content(&fetched).await.unwrap();

        sqlx::query(
            "CREATE TRIGGER refuse_delete BEFORE DELETE ON files \
             BEGIN SELECT RAISE(ABORT, 'store down'); END",
        )
        .execute(service.repository().pool())
        .await
        .unwrap();

        let result = service.delete_file(&record.stored_filename).await;
        assert!(matches!(result, Err(ApiError::Database(_))));

        // Nothing changed: the bytes are on disk and every lookup still agrees
        assert!(Path::new(&record.path).exists());
        let fetched = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        let data = service.get_content(&fetched).await.unwrap();
        assert_eq!(&data[..], b"secret");

        service.invalidate(&record.stored_filename).await;
        let fetched = service
            .get_metadata(&record.stored_filename)
            .await
            .unwrap()
            .unwrap();
        let data = service.get_content(&fetched).await.unwrap();
        assert_eq!(&data[..], b"secret");
    }

    #[tokio::test]
    async fn test_delete_unknown_file() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        let result = service.delete_file("ghost.txt").await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_database_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(&dir, 1024).await;

        assert!(service.database_healthy().await);
    }
}
