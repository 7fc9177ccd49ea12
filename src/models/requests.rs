//! Request DTOs for the storage server API
//!
//! Parses and validates multipart upload bodies.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::files::IncomingFile;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";
const MISSING_FILE: &str = "No file uploaded or invalid form data.";

/// Upload body for POST /files/upload
///
/// # Fields
/// - `file`: the part named `file` carrying a filename, if one was sent
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<IncomingFile>,
}

impl UploadForm {
    /// Reads the multipart stream, keeping the first `file` part that has a filename.
    ///
    /// Other parts are skipped.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if form.file.is_some() || field.name() != Some("file") {
                continue;
            }
            let Some(original_filename) = field.file_name().map(str::to_string) else {
                continue;
            };

            let mimetype = field
                .content_type()
                .filter(|ct| !ct.is_empty())
                .unwrap_or(DEFAULT_MIMETYPE)
                .to_string();
            let data = field.bytes().await.map_err(multipart_error)?;

            form.file = Some(IncomingFile {
                original_filename,
                mimetype,
                data,
            });
        }

        Ok(form)
    }

    /// Validates the upload against the configured size limit and media type allow list.
    pub fn validate(self, config: &Config) -> Result<IncomingFile> {
        let file = self
            .file
            .ok_or_else(|| ApiError::BadRequest(MISSING_FILE.to_string()))?;

        if file.data.len() > config.max_file_size {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds maximum size of {} bytes",
                config.max_file_size
            )));
        }

        if !config.is_mime_allowed(&file.mimetype) {
            return Err(ApiError::UnsupportedMediaType(format!(
                "File type '{}' is not allowed",
                file.mimetype
            )));
        }

        Ok(file)
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(MISSING_FILE.to_string())
    }
}
