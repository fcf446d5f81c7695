//! Stored file references and upload locations.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::{
    UPLOAD_DIR_EVIDENCE_DOCUMENTS, UPLOAD_DIR_EVIDENCE_IMAGES, UPLOAD_DIR_EVIDENCE_REVISIONS,
    UPLOAD_DIR_EVIDENCE_VIDEOS, UPLOAD_DIR_PROJECT_DOCUMENTS, UPLOAD_DIR_PROJECT_IMAGES,
};

/// Directory an upload is filed under, relative to the media root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadDir {
    EvidenceDocuments,
    EvidenceImages,
    EvidenceVideos,
    EvidenceRevisions,
    ProjectImages,
    ProjectDocuments,
}

impl UploadDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadDir::EvidenceDocuments => UPLOAD_DIR_EVIDENCE_DOCUMENTS,
            UploadDir::EvidenceImages => UPLOAD_DIR_EVIDENCE_IMAGES,
            UploadDir::EvidenceVideos => UPLOAD_DIR_EVIDENCE_VIDEOS,
            UploadDir::EvidenceRevisions => UPLOAD_DIR_EVIDENCE_REVISIONS,
            UploadDir::ProjectImages => UPLOAD_DIR_PROJECT_IMAGES,
            UploadDir::ProjectDocuments => UPLOAD_DIR_PROJECT_DOCUMENTS,
        }
    }
}

/// Path of an uploaded file relative to the media root, e.g. `evidence_images/a1b2.png`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct StoredFile(String);

impl StoredFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Build the stored path for a file name inside an upload directory.
    pub fn in_dir(dir: UploadDir, file_name: &str) -> Self {
        Self(format!("{}{}", dir.as_str(), file_name))
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Public URL of the file under the given media URL prefix.
    pub fn url(&self, media_url: &str) -> String {
        format!(
            "{}/{}",
            media_url.trim_end_matches('/'),
            self.0.trim_start_matches('/')
        )
    }
}

impl From<String> for StoredFile {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Map an optional, possibly empty database column to a stored file.
pub fn stored_file(column: Option<String>) -> Option<StoredFile> {
    column.filter(|p| !p.is_empty()).map(StoredFile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_dir_uses_upload_convention() {
        let file = StoredFile::in_dir(UploadDir::EvidenceImages, "site.png");
        assert_eq!(file.path(), "evidence_images/site.png");
        assert_eq!(file.file_name(), "site.png");
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let file = StoredFile::new("project_documents/plan.pdf");
        assert_eq!(file.url("/media/"), "/media/project_documents/plan.pdf");
        assert_eq!(
            file.url("https://cdn.example.com/media"),
            "https://cdn.example.com/media/project_documents/plan.pdf"
        );
    }

    #[test]
    fn test_empty_column_is_no_file() {
        assert_eq!(stored_file(Some(String::new())), None);
        assert_eq!(stored_file(None), None);
        assert_eq!(
            stored_file(Some("evidence_videos/v.mp4".into())),
            Some(StoredFile::new("evidence_videos/v.mp4"))
        );
    }
}
