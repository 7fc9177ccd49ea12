//! File Storage Backend
//!
//! Reads, writes and deletes raw file bytes under the upload directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    pub fn path_for(&self, stored_filename: &str) -> PathBuf {
        self.root.join(stored_filename)
    }

    /// Writes `data` as `stored_filename` and returns the full path.
    pub async fn write(&self, stored_filename: &str, data: &[u8]) -> std::io::Result<PathBuf> {
        self.ensure_dir().await?;
        let path = self.path_for(stored_filename);
        fs::write(&path, data).await?;
        Ok(path)
    }

    /// Reads a file, returning None when it no longer exists.
    pub async fn read(&self, path: &Path) -> std::io::Result<Option<Bytes>> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Removes a file. A file that is already gone is not an error.
    pub async fn remove(&self, path: &Path) -> std::io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

/// Generates a unique stored filename, keeping the original extension.
pub fn generate_stored_filename(original_filename: &str) -> String {
    let id = Uuid::new_v4();
    match Path::new(original_filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
    {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("uploads"));

        let path = storage.write("a.txt", b"hello").await.unwrap();
        assert_eq!(path, storage.path_for("a.txt"));

        let data = storage.read(&path).await.unwrap();
        assert_eq!(data, Some(Bytes::from_static(b"hello")));

        assert!(storage.remove(&path).await.unwrap());
        assert!(!storage.remove(&path).await.unwrap());
        assert_eq!(storage.read(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("a").join("b"));

        storage.ensure_dir().await.unwrap();
        assert!(storage.root().is_dir());
    }

    #[test]
    fn test_stored_filename_keeps_extension() {
        let name = generate_stored_filename("photo.final.JPG");
        assert!(name.ends_with(".JPG"));
        assert!(Uuid::parse_str(name.trim_end_matches(".JPG")).is_ok());
    }

    #[test]
    fn test_stored_filename_without_extension() {
        let name = generate_stored_filename("README");
        assert!(Uuid::parse_str(&name).is_ok());
    }

    #[test]
    fn test_stored_filenames_are_unique() {
        assert_ne!(
            generate_stored_filename("a.txt"),
            generate_stored_filename("a.txt")
        );
    }
}
