//! Evidence submitted against projects, with review comments and revisions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::account::UserRole;
use super::choices::choice_enum;
use super::media::{StoredFile, UploadDir};
use crate::errors::{AppError, AppResult};

choice_enum! {
    /// Kind of evidence
    EvidenceType("evidence type") {
        Document => ("document", "Document"),
        Image => ("image", "Image"),
        Video => ("video", "Video"),
        Report => ("report", "Report"),
        Certificate => ("certificate", "Certificate"),
    }
}

choice_enum! {
    /// Review status of a piece of evidence
    EvidenceStatus("evidence status") {
        Pending => ("pending", "Pending Review"),
        Approved => ("approved", "Approved"),
        Rejected => ("rejected", "Rejected"),
        RequiresRevision => ("requires_revision", "Requires Revision"),
    }
}

impl Default for EvidenceStatus {
    fn default() -> Self {
        EvidenceStatus::Pending
    }
}

impl EvidenceStatus {
    /// Statuses a reviewer may hand down
    pub fn is_review_outcome(&self) -> bool {
        !matches!(self, EvidenceStatus::Pending)
    }
}

/// One of the three file attachment slots on an evidence record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSlot {
    Document,
    Image,
    Video,
}

impl FileSlot {
    pub fn upload_dir(&self) -> UploadDir {
        match self {
            FileSlot::Document => UploadDir::EvidenceDocuments,
            FileSlot::Image => UploadDir::EvidenceImages,
            FileSlot::Video => UploadDir::EvidenceVideos,
        }
    }
}

impl EvidenceType {
    /// Slot holding this type's file. Reports and certificates carry no file slot.
    pub fn file_slot(&self) -> Option<FileSlot> {
        match self {
            EvidenceType::Document => Some(FileSlot::Document),
            EvidenceType::Image => Some(FileSlot::Image),
            EvidenceType::Video => Some(FileSlot::Video),
            EvidenceType::Report | EvidenceType::Certificate => None,
        }
    }
}

/// Evidence record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub evidence_type: EvidenceType,
    pub status: EvidenceStatus,
    pub project_id: Uuid,
    pub submitted_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub document_file: Option<StoredFile>,
    pub image_file: Option<StoredFile>,
    pub video_file: Option<StoredFile>,
    /// Size of the attached file in bytes
    pub file_size: Option<i64>,
    pub mime_type: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub location_accuracy: Option<Decimal>,
    pub review_notes: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Evidence {
    fn slot(&self, slot: FileSlot) -> Option<&StoredFile> {
        match slot {
            FileSlot::Document => self.document_file.as_ref(),
            FileSlot::Image => self.image_file.as_ref(),
            FileSlot::Video => self.video_file.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: FileSlot) -> &mut Option<StoredFile> {
        match slot {
            FileSlot::Document => &mut self.document_file,
            FileSlot::Image => &mut self.image_file,
            FileSlot::Video => &mut self.video_file,
        }
    }

    /// The attached file matching the evidence type, if any.
    pub fn file(&self) -> Option<&StoredFile> {
        self.evidence_type.file_slot().and_then(|slot| self.slot(slot))
    }

    /// URL of the attached file matching the evidence type, if any.
    pub fn get_file_url(&self, media_url: &str) -> Option<String> {
        self.file().map(|file| file.url(media_url))
    }

    /// Slot a new upload for this evidence goes into.
    pub fn upload_slot(&self) -> AppResult<FileSlot> {
        self.evidence_type.file_slot().ok_or_else(|| {
            AppError::validation(format!(
                "{} evidence does not take file attachments",
                self.evidence_type.label()
            ))
        })
    }

    /// Put a file into the slot matching the type. Returns the file it replaced.
    pub fn attach_file(
        &mut self,
        file: StoredFile,
        size: i64,
        mime_type: String,
    ) -> AppResult<Option<StoredFile>> {
        let slot = self.upload_slot()?;
        let replaced = self.slot_mut(slot).replace(file);
        self.file_size = Some(size);
        self.mime_type = mime_type;
        self.updated_at = Utc::now();
        Ok(replaced)
    }

    /// Record a verifier's decision on pending evidence.
    pub fn review(
        &mut self,
        reviewer: Uuid,
        outcome: EvidenceStatus,
        notes: String,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !outcome.is_review_outcome() {
            return Err(AppError::validation(
                "Review outcome must be approved, rejected or requires_revision",
            ));
        }
        if self.status != EvidenceStatus::Pending {
            return Err(AppError::invalid_transition("evidence", self.status, outcome));
        }

        self.status = outcome;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
        self.updated_at = now;
        Ok(())
    }

    /// Send evidence back to the review queue after a revision.
    pub fn reopen(&mut self) {
        self.status = EvidenceStatus::Pending;
        self.updated_at = Utc::now();
    }

    pub fn apply(&mut self, changes: EvidenceChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if changes.latitude.is_some() {
            self.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            self.longitude = changes.longitude;
        }
        if changes.location_accuracy.is_some() {
            self.location_accuracy = changes.location_accuracy;
        }
        self.updated_at = Utc::now();
    }

    /// Every file currently attached, in any slot.
    pub fn files(&self) -> Vec<StoredFile> {
        [&self.document_file, &self.image_file, &self.video_file]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Submitters may edit until a reviewer has decided.
    pub fn is_editable(&self) -> bool {
        matches!(
            self.status,
            EvidenceStatus::Pending | EvidenceStatus::RequiresRevision
        )
    }
}

/// Data required to submit evidence
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub title: String,
    pub description: String,
    pub evidence_type: EvidenceType,
    pub project_id: Uuid,
    pub submitted_by: Uuid,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub location_accuracy: Option<Decimal>,
}

/// Editable evidence fields
#[derive(Debug, Clone, Default)]
pub struct EvidenceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub location_accuracy: Option<Decimal>,
}

/// Comment in an evidence review thread
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvidenceComment {
    pub id: Uuid,
    pub evidence_id: Uuid,
    pub author_id: Uuid,
    pub comment: String,
    /// Internal comments are hidden from proponents
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvidenceComment {
    pub fn is_visible_to(&self, role: UserRole) -> bool {
        !self.is_internal || role.can_review()
    }
}

/// Recorded file change on a piece of evidence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRevision {
    pub id: Uuid,
    pub evidence_id: Uuid,
    /// Unique per evidence, starting at 1
    pub revision_number: i32,
    pub changes_description: String,
    pub old_file: Option<StoredFile>,
    pub new_file: StoredFile,
    pub requested_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Data required to record a revision
#[derive(Debug, Clone)]
pub struct NewRevision {
    pub evidence_id: Uuid,
    pub revision_number: i32,
    pub changes_description: String,
    pub old_file: Option<StoredFile>,
    pub new_file: StoredFile,
    pub requested_by: Uuid,
}

/// Revision number following the highest one recorded so far.
pub fn next_revision_number(latest: Option<i32>) -> i32 {
    latest.map_or(1, |n| n + 1)
}

/// Evidence response with resolved file URL
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EvidenceResponse {
    pub id: Uuid,
    #[schema(example = "Drone survey, plot 4")]
    pub title: String,
    pub description: String,
    pub evidence_type: EvidenceType,
    pub status: EvidenceStatus,
    pub project_id: Uuid,
    pub submitted_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    /// URL of the file matching the evidence type
    #[schema(example = "/media/evidence_images/plot4.png")]
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: String,
    #[schema(value_type = Option<String>)]
    pub latitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub longitude: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub location_accuracy: Option<Decimal>,
    pub review_notes: String,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EvidenceResponse {
    pub fn new(evidence: Evidence, media_url: &str) -> Self {
        Self {
            file_url: evidence.get_file_url(media_url),
            id: evidence.id,
            title: evidence.title,
            description: evidence.description,
            evidence_type: evidence.evidence_type,
            status: evidence.status,
            project_id: evidence.project_id,
            submitted_by: evidence.submitted_by,
            reviewed_by: evidence.reviewed_by,
            file_size: evidence.file_size,
            mime_type: evidence.mime_type,
            latitude: evidence.latitude,
            longitude: evidence.longitude,
            location_accuracy: evidence.location_accuracy,
            review_notes: evidence.review_notes,
            reviewed_at: evidence.reviewed_at,
            submitted_at: evidence.submitted_at,
            updated_at: evidence.updated_at,
        }
    }
}

/// Revision response with resolved file URLs
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevisionResponse {
    pub id: Uuid,
    pub evidence_id: Uuid,
    #[schema(example = 2)]
    pub revision_number: i32,
    pub changes_description: String,
    pub old_file_url: Option<String>,
    pub new_file_url: String,
    pub requested_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RevisionResponse {
    pub fn new(revision: EvidenceRevision, media_url: &str) -> Self {
        Self {
            id: revision.id,
            evidence_id: revision.evidence_id,
            revision_number: revision.revision_number,
            changes_description: revision.changes_description,
            old_file_url: revision.old_file.map(|f| f.url(media_url)),
            new_file_url: revision.new_file.url(media_url),
            requested_by: revision.requested_by,
            created_at: revision.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_evidence(evidence_type: EvidenceType) -> Evidence {
        let now = Utc::now();
        Evidence {
            id: Uuid::new_v4(),
            title: "Drone survey".into(),
            description: String::new(),
            evidence_type,
            status: EvidenceStatus::Pending,
            project_id: Uuid::new_v4(),
            submitted_by: Uuid::new_v4(),
            reviewed_by: None,
            document_file: None,
            image_file: None,
            video_file: None,
            file_size: None,
            mime_type: String::new(),
            latitude: None,
            longitude: None,
            location_accuracy: None,
            review_notes: String::new(),
            reviewed_at: None,
            submitted_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_file_url_follows_type() {
        let mut evidence = sample_evidence(EvidenceType::Image);
        evidence.document_file = Some(StoredFile::new("evidence_documents/a.pdf"));
        evidence.image_file = Some(StoredFile::new("evidence_images/b.png"));

        assert_eq!(
            evidence.get_file_url("/media/").as_deref(),
            Some("/media/evidence_images/b.png")
        );

        evidence.evidence_type = EvidenceType::Document;
        assert_eq!(
            evidence.get_file_url("/media/").as_deref(),
            Some("/media/evidence_documents/a.pdf")
        );

        evidence.evidence_type = EvidenceType::Video;
        assert_eq!(evidence.get_file_url("/media/"), None);
    }

    #[test]
    fn test_report_and_certificate_have_no_file_url() {
        for kind in [EvidenceType::Report, EvidenceType::Certificate] {
            let mut evidence = sample_evidence(kind);
            evidence.document_file = Some(StoredFile::new("evidence_documents/a.pdf"));
            assert_eq!(evidence.get_file_url("/media/"), None);
            assert!(evidence.upload_slot().is_err());
        }
    }

    #[test]
    fn test_attach_file_returns_replaced() {
        let mut evidence = sample_evidence(EvidenceType::Video);
        let first = StoredFile::new("evidence_videos/1.mp4");
        let second = StoredFile::new("evidence_videos/2.mp4");

        assert_eq!(evidence.attach_file(first.clone(), 10, "video/mp4".into()).unwrap(), None);
        assert_eq!(
            evidence.attach_file(second.clone(), 20, "video/mp4".into()).unwrap(),
            Some(first)
        );
        assert_eq!(evidence.video_file, Some(second));
        assert_eq!(evidence.file_size, Some(20));
    }

    #[test]
    fn test_review_only_from_pending() {
        let reviewer = Uuid::new_v4();
        let mut evidence = sample_evidence(EvidenceType::Document);

        assert!(evidence
            .review(reviewer, EvidenceStatus::Pending, String::new(), Utc::now())
            .is_err());

        evidence
            .review(reviewer, EvidenceStatus::RequiresRevision, "blurry".into(), Utc::now())
            .unwrap();
        assert_eq!(evidence.reviewed_by, Some(reviewer));
        assert!(evidence.reviewed_at.is_some());

        let err = evidence
            .review(reviewer, EvidenceStatus::Approved, String::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));

        evidence.reopen();
        assert!(evidence
            .review(reviewer, EvidenceStatus::Approved, String::new(), Utc::now())
            .is_ok());
    }

    #[test]
    fn test_internal_comment_visibility() {
        let now = Utc::now();
        let comment = EvidenceComment {
            id: Uuid::new_v4(),
            evidence_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            comment: "check coordinates".into(),
            is_internal: true,
            created_at: now,
            updated_at: now,
        };
        assert!(!comment.is_visible_to(UserRole::ProjectDeveloper));
        assert!(!comment.is_visible_to(UserRole::CreditBuyer));
        assert!(comment.is_visible_to(UserRole::Verifier));
        assert!(comment.is_visible_to(UserRole::Administrator));
    }

    #[test]
    fn test_next_revision_number() {
        assert_eq!(next_revision_number(None), 1);
        assert_eq!(next_revision_number(Some(3)), 4);
    }
}
