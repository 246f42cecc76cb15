use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::StatusCode;
use lms_core::file_storage::{FileStorage, StorageError, upload_key, validate_image};
use lms_core::{AppError, error_codes};
use tracing::{debug, error, instrument};

use crate::metrics::track_file_stored;

/// One file part of a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// A multipart body split into its text parts and its file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub texts: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

impl MultipartForm {
    /// Files sent under `field`, in upload order.
    pub fn files_of<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a UploadedFile> + 'a {
        self.files.iter().filter(move |f| f.field == field)
    }

    pub fn take_file(&mut self, field: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.field == field)?;
        Some(self.files.remove(index))
    }
}

fn bad_request(code: &str, detail: impl std::fmt::Display) -> AppError {
    AppError::coded(StatusCode::BAD_REQUEST, code, detail)
}

pub struct FileService;

impl FileService {
    /// Reads every part of the body. A part with a file name is a file,
    /// anything else is a text field.
    pub async fn read_multipart(mut multipart: Multipart) -> Result<MultipartForm, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| bad_request(error_codes::INVALID_FORM, e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);

            match file_name {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| bad_request(error_codes::INVALID_FORM, e.body_text()))?;
                    form.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| bad_request(error_codes::INVALID_FORM, e.body_text()))?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Image-only check with the size limit of the field.
    pub fn check(file: &UploadedFile, max_bytes: usize) -> Result<(), AppError> {
        let content_type = file
            .content_type
            .as_deref()
            .ok_or_else(|| bad_request(error_codes::UNKNOWN_FILE_FORMAT, &file.file_name))?;

        validate_image(content_type, file.bytes.len(), max_bytes)
            .map_err(|e| Self::storage_error(&file.file_name, e))
    }

    /// Rejects more than `max_count` files under one field.
    pub fn check_count(form: &MultipartForm, field: &str, max_count: usize) -> Result<(), AppError> {
        let count = form.files_of(field).count();
        if count > max_count {
            return Err(bad_request(
                error_codes::INVALID_FORM,
                format!("{} accepts at most {} file(s), got {}", field, max_count, count),
            ));
        }
        Ok(())
    }

    /// Writes the file and returns its storage key.
    #[instrument(skip(storage, file), fields(file.field = %file.field, file.size = file.bytes.len()))]
    pub async fn save<S: FileStorage>(
        storage: &S,
        field: &'static str,
        file: &UploadedFile,
    ) -> Result<String, AppError> {
        let key = upload_key(field, &file.file_name);
        let key = storage
            .save(&key, &file.bytes)
            .await
            .map_err(|e| Self::storage_error(&file.file_name, e))?;

        track_file_stored(field, file.bytes.len());
        debug!(file.key = %key, "File stored");
        Ok(key)
    }

    /// Saves `file` and removes the file it replaces, if any.
    pub async fn replace<S: FileStorage>(
        storage: &S,
        field: &'static str,
        file: &UploadedFile,
        previous: Option<&str>,
    ) -> Result<String, AppError> {
        let key = Self::save(storage, field, file).await?;

        if let Some(previous) = previous {
            // the new file is already referenced by the caller, so a stale
            // file left behind is only logged
            if let Err(e) = storage.delete(previous).await {
                error!(error = %e, file.key = %previous, "Failed to delete replaced file");
            }
        }

        Ok(key)
    }

    pub async fn delete_all<S: FileStorage>(storage: &S, keys: &[String]) {
        for key in keys {
            if let Err(e) = storage.delete(key).await {
                error!(error = %e, file.key = %key, "Failed to delete file");
            }
        }
    }

    pub fn storage_error(file_name: &str, err: StorageError) -> AppError {
        match err {
            StorageError::InvalidMimeType { received } => bad_request(
                error_codes::INVALID_FILE_FORMAT,
                format!("{} ({})", file_name, received),
            ),
            StorageError::InvalidFileSize { max_bytes } => bad_request(
                error_codes::INVALID_FILE_SIZE,
                format!("{} exceeds {} bytes", file_name, max_bytes),
            ),
            other => AppError::internal(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(field: &str, content_type: Option<&str>, size: usize) -> UploadedFile {
        UploadedFile {
            field: field.to_string(),
            file_name: "cover.png".to_string(),
            content_type: content_type.map(str::to_string),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn test_check_rejects_non_images_and_large_files() {
        assert!(FileService::check(&file("avatar", Some("image/png"), 10), 100).is_ok());

        let err = FileService::check(&file("avatar", Some("text/plain"), 10), 100).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message().starts_with("errors.invalid-file-format: cover.png"));

        let err = FileService::check(&file("avatar", Some("image/png"), 101), 100).unwrap_err();
        assert!(err.message().starts_with("errors.invalid-file-size: cover.png"));

        let err = FileService::check(&file("avatar", None, 10), 100).unwrap_err();
        assert_eq!(err.message(), "errors.unknown-file-format: cover.png");
    }

    #[test]
    fn test_check_count() {
        let form = MultipartForm {
            texts: HashMap::new(),
            files: vec![file("testFile", Some("image/png"), 1), file("testFile", Some("image/png"), 1)],
        };
        assert!(FileService::check_count(&form, "testFile", 2).is_ok());
        let err = FileService::check_count(&form, "testFile", 1).unwrap_err();
        assert_eq!(
            err.message(),
            "errors.invalid-form: testFile accepts at most 1 file(s), got 2"
        );
    }

    #[test]
    fn test_take_file() {
        let mut form = MultipartForm {
            texts: HashMap::new(),
            files: vec![file("avatar", Some("image/png"), 1)],
        };
        assert!(form.take_file("testFile").is_none());
        assert!(form.take_file("avatar").is_some());
        assert!(form.files.is_empty());
    }
}
