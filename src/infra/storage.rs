//! Local media storage.
//!
//! Uploads are written under `{media_root}/{upload_dir}/` and served
//! under the configured media URL:
//! ```text
//! {media_root}/
//!   evidence_images/
//!     3f9a1c2e_site-photo.png
//! ```

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::config::{Config, MAX_UPLOAD_BYTES};
use crate::domain::{StoredFile, UploadDir};
use crate::errors::{AppError, AppResult};

/// Longest stored path, matching the file columns
const MAX_STORED_PATH_LEN: usize = 100;

/// A file received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn size(&self) -> i64 {
        self.bytes.len() as i64
    }

    /// Declared content type, or a generic binary type.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Filesystem-backed store for uploaded media
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl AsRef<Path>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.media_root, config.media_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL of a stored file
    pub fn url(&self, file: &StoredFile) -> String {
        file.url(&self.base_url)
    }

    fn path_for(&self, file: &StoredFile) -> PathBuf {
        self.root.join(file.path())
    }

    /// Store an upload under the given directory and return its stored path.
    pub async fn save(&self, dir: UploadDir, upload: &Upload) -> AppResult<StoredFile> {
        if upload.bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(AppError::validation(format!(
                "Uploaded file exceeds {} bytes",
                MAX_UPLOAD_BYTES
            )));
        }

        let file = StoredFile::in_dir(dir, &unique_file_name(dir, &upload.file_name));
        let path = self.path_for(&file);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        // Write to a temp file and rename so readers never see partial files
        let temp_path = path.with_extension("part");
        fs::write(&temp_path, &upload.bytes).await.map_err(io_error)?;
        fs::rename(&temp_path, &path).await.map_err(io_error)?;

        tracing::debug!(path = %file.path(), size = upload.bytes.len(), "Stored upload");
        Ok(file)
    }

    /// Remove a stored file. Missing files are ignored.
    pub async fn delete(&self, file: &StoredFile) -> AppResult<()> {
        match fs::remove_file(self.path_for(file)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %file.path(), "Stored file already missing");
                Ok(())
            }
            Err(e) => Err(io_error(e)),
        }
    }

    pub async fn exists(&self, file: &StoredFile) -> bool {
        fs::try_exists(self.path_for(file)).await.unwrap_or(false)
    }
}

fn io_error(e: std::io::Error) -> AppError {
    AppError::internal(format!("Media storage error: {}", e))
}

/// `{8 hex}_{sanitized name}`, trimmed so the stored path fits its column.
fn unique_file_name(dir: UploadDir, original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_start_matches('.').to_string();
    sanitized = if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    };

    let prefix = &Uuid::new_v4().simple().to_string()[..8];
    let budget = MAX_STORED_PATH_LEN - dir.as_str().len() - prefix.len() - 1;
    if sanitized.len() > budget {
        // Keep the extension when truncating
        let ext = Path::new(&sanitized)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .filter(|e| e.len() < budget / 2)
            .unwrap_or_default();
        let stem_len = budget - ext.len();
        sanitized = format!("{}{}", &sanitized[..stem_len], ext);
    }

    format!("{}_{}", prefix, sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn upload(name: &str, bytes: &[u8]) -> Upload {
        Upload {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_save_writes_under_upload_dir() {
        let temp = TempDir::new().unwrap();
        let storage = MediaStorage::new(temp.path(), "/media/");

        let file = storage
            .save(UploadDir::EvidenceImages, &upload("site photo.png", b"png-bytes"))
            .await
            .unwrap();

        assert!(file.path().starts_with("evidence_images/"));
        assert!(file.path().ends_with("_site_photo.png"));
        assert!(storage.exists(&file).await);
        let written = std::fs::read(temp.path().join(file.path())).unwrap();
        assert_eq!(written, b"png-bytes");
        assert_eq!(storage.url(&file), format!("/media/{}", file.path()));
    }

    #[tokio::test]
    async fn test_save_rejects_empty_upload() {
        let temp = TempDir::new().unwrap();
        let storage = MediaStorage::new(temp.path(), "/media/");

        let result = storage.save(UploadDir::ProjectImages, &upload("a.png", b"")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let storage = MediaStorage::new(temp.path(), "/media/");
        let file = storage
            .save(UploadDir::ProjectDocuments, &upload("plan.pdf", b"%PDF"))
            .await
            .unwrap();

        storage.delete(&file).await.unwrap();
        assert!(!storage.exists(&file).await);
        storage.delete(&file).await.unwrap();
    }

    #[test]
    fn test_unique_file_name_strips_paths_and_fits_column() {
        let name = unique_file_name(UploadDir::EvidenceRevisions, "../../etc/passwd");
        assert!(name.ends_with("_passwd"));

        let long = format!("{}.pdf", "x".repeat(300));
        let name = unique_file_name(UploadDir::EvidenceRevisions, &long);
        assert!(UploadDir::EvidenceRevisions.as_str().len() + name.len() <= MAX_STORED_PATH_LEN);
        assert!(name.ends_with(".pdf"));

        let name = unique_file_name(UploadDir::ProjectImages, ".hidden");
        assert!(name.ends_with("_hidden"));
    }

    #[test]
    fn test_upload_mime_type_defaults() {
        let mut up = upload("a.bin", b"x");
        up.content_type = None;
        assert_eq!(up.mime_type(), "application/octet-stream");
        assert_eq!(up.size(), 1);
    }
}
