//! Multipart form extractor for file uploads.
//!
//! The file travels in the `file` part; every other part is read as text.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
};
use std::collections::HashMap;

use crate::errors::{AppError, AppResult};
use crate::infra::Upload;

const FILE_FIELD: &str = "file";

/// Parsed multipart upload: one optional file plus text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<Upload>,
    pub fields: HashMap<String, String>,
}

#[async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.file = Some(Upload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }
}

impl UploadForm {
    /// The uploaded file, required
    pub fn take_file(&mut self) -> AppResult<Upload> {
        self.file
            .take()
            .ok_or_else(|| AppError::validation("A file is required"))
    }

    /// Trimmed text field, empty when absent
    pub fn text(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    /// Checkbox-style flag: `true`, `1` or `on`
    pub fn flag(&self, name: &str) -> bool {
        matches!(
            self.fields.get(name).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("true" | "1" | "on")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_and_text() {
        let mut form = UploadForm::default();
        form.fields.insert("is_primary".into(), " ON ".into());
        form.fields.insert("caption".into(), "  Canopy  ".into());

        assert!(form.flag("is_primary"));
        assert!(!form.flag("missing"));
        assert_eq!(form.text("caption"), "Canopy");
        assert_eq!(form.text("missing"), "");
    }

    #[test]
    fn test_missing_file_is_a_validation_error() {
        let mut form = UploadForm::default();
        assert!(matches!(form.take_file(), Err(AppError::Validation(_))));
    }
}
