//! File Metadata Repository
//!
//! Durable records describing stored files, kept in SQLite through sqlx.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

// == File Record ==
/// Metadata row for one stored file.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct FileRecord {
    pub id: i64,
    /// Name the client uploaded the file under
    pub original_filename: String,
    /// Generated, globally unique identifier used in URLs
    pub stored_filename: String,
    pub mimetype: String,
    /// Size in bytes
    pub size: i64,
    /// Location on disk
    pub path: String,
    pub created_at: DateTime<Utc>,
}

/// Values needed to insert a new record.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_filename: String,
    pub stored_filename: String,
    pub mimetype: String,
    pub size: i64,
    pub path: String,
}

const SELECT_COLUMNS: &str =
    "id, original_filename, stored_filename, mimetype, size, path, created_at";

// == Repository ==
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: SqlitePool,
}

impl FileRepository {
    /// Opens a pool on `url`, creating the database file if needed.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Opens a private in-memory database.
    ///
    /// A single long-lived connection keeps the database alive for the pool's lifetime.
    pub async fn connect_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the files table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_filename TEXT NOT NULL,
                stored_filename TEXT NOT NULL UNIQUE,
                mimetype TEXT NOT NULL,
                size INTEGER NOT NULL,
                path TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create(&self, new_file: &NewFile) -> Result<FileRecord, sqlx::Error> {
        let sql = format!(
            "INSERT INTO files (original_filename, stored_filename, mimetype, size, path, created_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {SELECT_COLUMNS}"
        );

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(&new_file.original_filename)
            .bind(&new_file.stored_filename)
            .bind(&new_file.mimetype)
            .bind(new_file.size)
            .bind(&new_file.path)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
    }

    pub async fn find_by_stored_filename(
        &self,
        stored_filename: &str,
    ) -> Result<Option<FileRecord>, sqlx::Error> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM files WHERE stored_filename = ?");

        sqlx::query_as::<_, FileRecord>(&sql)
            .bind(stored_filename)
            .fetch_optional(&self.pool)
            .await
    }

    /// Deletes a record. Returns whether a row was removed.
    pub async fn delete_by_stored_filename(&self, stored_filename: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM files WHERE stored_filename = ?")
            .bind(stored_filename)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Round-trips a trivial query to check the database is reachable.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repository() -> FileRepository {
        let repository = FileRepository::connect_in_memory().await.unwrap();
        repository.migrate().await.unwrap();
        repository
    }

    fn new_file(stored_filename: &str) -> NewFile {
        NewFile {
            original_filename: "report.pdf".to_string(),
            stored_filename: stored_filename.to_string(),
            mimetype: "application/pdf".to_string(),
            size: 2048,
            path: format!("/tmp/uploads/{}", stored_filename),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repository = repository().await;

        let created = repository.create(&new_file("abc.pdf")).await.unwrap();
        assert_eq!(created.stored_filename, "abc.pdf");
        assert_eq!(created.original_filename, "report.pdf");
        assert_eq!(created.size, 2048);

        let found = repository
            .find_by_stored_filename("abc.pdf")
            .await
            .unwrap()
            .expect("record should exist");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_find_missing() {
        let repository = repository().await;

        let found = repository.find_by_stored_filename("nope.txt").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_stored_filename_is_unique() {
        let repository = repository().await;

        repository.create(&new_file("dup.pdf")).await.unwrap();
        assert!(repository.create(&new_file("dup.pdf")).await.is_err());
    }

    #[tokio::test]
    async fn test_delete() {
        let repository = repository().await;

        repository.create(&new_file("gone.pdf")).await.unwrap();
        assert!(repository.delete_by_stored_filename("gone.pdf").await.unwrap());
        assert!(!repository.delete_by_stored_filename("gone.pdf").await.unwrap());
        assert!(repository
            .find_by_stored_filename("gone.pdf")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let repository = repository().await;
        repository.migrate().await.unwrap();
        repository.ping().await.unwrap();
    }
}
