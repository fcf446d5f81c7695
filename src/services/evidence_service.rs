//! Evidence service - Submission, file attachment, review threads and revisions.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::Actor;
use crate::domain::{
    next_revision_number, Evidence, EvidenceChanges, EvidenceComment, EvidenceRevision,
    EvidenceStatus, NewEvidence, NewRevision, StoredFile, UploadDir,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{EvidenceFilter, MediaStorage, UnitOfWork, Upload};
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Replacement file for a piece of evidence
#[derive(Debug, Clone)]
pub struct RevisionUpload {
    pub changes_description: String,
    pub upload: Upload,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EvidenceService: Send + Sync {
    /// Submit evidence for a project the actor owns
    async fn submit(&self, actor: Actor, evidence: NewEvidence) -> AppResult<Evidence>;

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<Evidence>;

    /// Reviewers see all evidence, everyone else only their own submissions
    async fn list(
        &self,
        actor: Actor,
        filter: EvidenceFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Evidence>>;

    async fn update(&self, actor: Actor, id: Uuid, changes: EvidenceChanges) -> AppResult<Evidence>;

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    /// Attach a file to the slot matching the evidence type
    async fn upload_file(&self, actor: Actor, id: Uuid, upload: Upload) -> AppResult<Evidence>;

    /// Record a verifier decision
    async fn review(
        &self,
        actor: Actor,
        id: Uuid,
        outcome: EvidenceStatus,
        notes: String,
    ) -> AppResult<Evidence>;

    async fn add_comment(
        &self,
        actor: Actor,
        id: Uuid,
        comment: String,
        is_internal: bool,
    ) -> AppResult<EvidenceComment>;

    /// Comments visible to the actor, oldest first
    async fn comments(&self, actor: Actor, id: Uuid) -> AppResult<Vec<EvidenceComment>>;

    /// Replace the attached file, keeping the old one in the revision history
    async fn add_revision(
        &self,
        actor: Actor,
        id: Uuid,
        revision: RevisionUpload,
    ) -> AppResult<EvidenceRevision>;

    /// Revision history, newest first
    async fn revisions(&self, actor: Actor, id: Uuid) -> AppResult<Vec<EvidenceRevision>>;
}

pub struct EvidenceManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: MediaStorage,
}

impl<U: UnitOfWork> EvidenceManager<U> {
    pub fn new(uow: Arc<U>, storage: MediaStorage) -> Self {
        Self { uow, storage }
    }

    /// Load evidence the actor may see: the submitter, the project's
    /// proponent, verifiers and admins.
    async fn load_visible(&self, actor: Actor, id: Uuid) -> AppResult<Evidence> {
        let evidence = self.uow.evidence().find_by_id(id).await?.ok_or_not_found()?;
        if actor.can_review() || evidence.submitted_by == actor.id {
            return Ok(evidence);
        }

        let project = self
            .uow
            .projects()
            .find_by_id(evidence.project_id)
            .await?
            .ok_or_not_found()?;
        if project.is_owned_by(actor.id) {
            Ok(evidence)
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Load evidence the actor submitted and may still edit
    async fn load_editable(&self, actor: Actor, id: Uuid) -> AppResult<Evidence> {
        let evidence = self.uow.evidence().find_by_id(id).await?.ok_or_not_found()?;
        actor.require_owner_or_admin(evidence.submitted_by)?;
        if !evidence.is_editable() && !actor.is_admin() {
            return Err(AppError::validation(format!(
                "{} evidence can no longer be changed",
                evidence.status.label()
            )));
        }
        Ok(evidence)
    }

    async fn discard_file(&self, file: &StoredFile) {
        if let Err(e) = self.storage.delete(file).await {
            tracing::warn!(path = %file.path(), error = %e, "Failed to remove media file");
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> EvidenceService for EvidenceManager<U> {
    async fn submit(&self, actor: Actor, mut evidence: NewEvidence) -> AppResult<Evidence> {
        let project = self
            .uow
            .projects()
            .find_by_id(evidence.project_id)
            .await?
            .ok_or_not_found()?;
        actor.require_owner_or_admin(project.proponent_id)?;

        evidence.submitted_by = actor.id;
        let evidence = self.uow.evidence().create(evidence).await?;
        tracing::info!(
            evidence_id = %evidence.id,
            project_id = %project.id,
            kind = %evidence.evidence_type,
            "Evidence submitted"
        );
        Ok(evidence)
    }

    async fn get(&self, actor: Actor, id: Uuid) -> AppResult<Evidence> {
        self.load_visible(actor, id).await
    }

    async fn list(
        &self,
        actor: Actor,
        mut filter: EvidenceFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Evidence>> {
        if !actor.can_review() {
            filter.submitted_by = Some(actor.id);
        }
        let (evidence, total) = self.uow.evidence().list(filter, params.clone()).await?;
        Ok(Paginated::from_page(evidence, total, &params))
    }

    async fn update(
        &self,
        actor: Actor,
        id: Uuid,
        changes: EvidenceChanges,
    ) -> AppResult<Evidence> {
        let mut evidence = self.load_editable(actor, id).await?;
        evidence.apply(changes);
        self.uow.evidence().save(evidence).await
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        let evidence = self.load_editable(actor, id).await?;
        let revisions = self.uow.evidence().revisions(id).await?;
        self.uow.evidence().delete(id).await?;

        tracing::info!(evidence_id = %id, by = %actor.id, "Evidence deleted");
        let mut files = evidence.files();
        for revision in revisions {
            files.push(revision.new_file);
            files.extend(revision.old_file);
        }
        files.sort_by(|a, b| a.path().cmp(b.path()));
        files.dedup();
        for file in &files {
            self.discard_file(file).await;
        }
        Ok(())
    }

    async fn upload_file(&self, actor: Actor, id: Uuid, upload: Upload) -> AppResult<Evidence> {
        let mut evidence = self.load_editable(actor, id).await?;
        let slot = evidence.upload_slot()?;

        let file = self.storage.save(slot.upload_dir(), &upload).await?;
        let replaced = evidence.attach_file(file.clone(), upload.size(), upload.mime_type())?;

        match self.uow.evidence().save(evidence).await {
            Ok(saved) => {
                if let Some(old) = replaced {
                    self.discard_file(&old).await;
                }
                Ok(saved)
            }
            Err(e) => {
                self.discard_file(&file).await;
                Err(e)
            }
        }
    }

    async fn review(
        &self,
        actor: Actor,
        id: Uuid,
        outcome: EvidenceStatus,
        notes: String,
    ) -> AppResult<Evidence> {
        actor.require_reviewer()?;
        let mut evidence = self.uow.evidence().find_by_id(id).await?.ok_or_not_found()?;
        evidence.review(actor.id, outcome, notes, Utc::now())?;

        let evidence = self.uow.evidence().save(evidence).await?;
        tracing::info!(evidence_id = %id, %outcome, reviewer = %actor.id, "Evidence reviewed");
        Ok(evidence)
    }

    async fn add_comment(
        &self,
        actor: Actor,
        id: Uuid,
        comment: String,
        is_internal: bool,
    ) -> AppResult<EvidenceComment> {
        if is_internal {
            actor.require_reviewer()?;
        }
        if comment.trim().is_empty() {
            return Err(AppError::validation("Comment cannot be empty"));
        }
        self.load_visible(actor, id).await?;

        let now = Utc::now();
        self.uow
            .evidence()
            .add_comment(EvidenceComment {
                id: Uuid::new_v4(),
                evidence_id: id,
                author_id: actor.id,
                comment,
                is_internal,
                created_at: now,
                updated_at: now,
            })
            .await
    }

    async fn comments(&self, actor: Actor, id: Uuid) -> AppResult<Vec<EvidenceComment>> {
        self.load_visible(actor, id).await?;
        let comments = self.uow.evidence().comments(id).await?;
        Ok(comments
            .into_iter()
            .filter(|c| c.is_visible_to(actor.role))
            .collect())
    }

    async fn add_revision(
        &self,
        actor: Actor,
        id: Uuid,
        revision: RevisionUpload,
    ) -> AppResult<EvidenceRevision> {
        let evidence = self.uow.evidence().find_by_id(id).await?.ok_or_not_found()?;
        actor.require_owner_or_admin(evidence.submitted_by)?;
        evidence.upload_slot()?;

        let file = self
            .storage
            .save(UploadDir::EvidenceRevisions, &revision.upload)
            .await?;
        let new_file = file.clone();
        let size = revision.upload.size();
        let mime_type = revision.upload.mime_type();
        let changes_description = revision.changes_description;

        // Serializable so concurrent revisions cannot claim the same number
        let result = self
            .uow
            .transaction_serializable(move |ctx| {
                Box::pin(async move {
                    let repo = ctx.evidence();
                    let mut evidence = repo.find_for_update(id).await?.ok_or_not_found()?;
                    let revision_number =
                        next_revision_number(repo.latest_revision_number(id).await?);

                    let old_file = evidence.attach_file(new_file.clone(), size, mime_type)?;
                    evidence.reopen();
                    repo.save(evidence).await?;

                    repo.add_revision(NewRevision {
                        evidence_id: id,
                        revision_number,
                        changes_description,
                        old_file,
                        new_file,
                        requested_by: actor.id,
                    })
                    .await
                })
            })
            .await;

        match &result {
            Ok(rev) => tracing::info!(
                evidence_id = %id,
                revision = rev.revision_number,
                "Evidence revision recorded"
            ),
            Err(_) => self.discard_file(&file).await,
        }
        result
    }

    async fn revisions(&self, actor: Actor, id: Uuid) -> AppResult<Vec<EvidenceRevision>> {
        self.load_visible(actor, id).await?;
        self.uow.evidence().revisions(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::evidence::tests::sample_evidence;
    use crate::domain::project::tests::sample_project;
    use crate::domain::{EvidenceType, UserRole};
    use crate::infra::repositories::{MockEvidenceRepository, MockProjectRepository};
    use crate::infra::testing::{
        evidence_model, postgres, revision_model, sql_log, unique_violation,
    };
    use crate::infra::Persistence;
    use crate::services::testing::{actor, TestUnitOfWork};
    use sea_orm::{DatabaseConnection, Value};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn manager(
        uow: TestUnitOfWork,
        media: &TempDir,
    ) -> EvidenceManager<TestUnitOfWork> {
        EvidenceManager::new(Arc::new(uow), MediaStorage::new(media.path(), "/media/"))
    }

    fn stored(evidence: Evidence) -> MockEvidenceRepository {
        let mut repo = MockEvidenceRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(evidence.clone())));
        repo
    }

    fn comment(evidence_id: Uuid, is_internal: bool) -> EvidenceComment {
        let now = Utc::now();
        EvidenceComment {
            id: Uuid::new_v4(),
            evidence_id,
            author_id: Uuid::new_v4(),
            comment: "coordinates look off".into(),
            is_internal,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_submit_requires_project_owner() {
        let media = TempDir::new().unwrap();
        let project = sample_project(100, 0);
        let project_id = project.id;
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_by_id()
            .returning(move |_| Ok(Some(project.clone())));

        let service = manager(TestUnitOfWork::default().with_projects(projects), &media);
        let result = service
            .submit(
                actor(UserRole::ProjectDeveloper),
                NewEvidence {
                    title: "Survey".into(),
                    description: String::new(),
                    evidence_type: EvidenceType::Image,
                    project_id,
                    submitted_by: Uuid::nil(),
                    latitude: None,
                    longitude: None,
                    location_accuracy: None,
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_list_scopes_non_reviewers_to_own_submissions() {
        let media = TempDir::new().unwrap();
        let dev = actor(UserRole::ProjectDeveloper);
        let mut repo = MockEvidenceRepository::new();
        repo.expect_list()
            .withf(move |filter, _| filter.submitted_by == Some(dev.id))
            .returning(|_, _| Ok((vec![], 0)));

        let service = manager(TestUnitOfWork::default().with_evidence(repo), &media);
        let page = service
            .list(dev, EvidenceFilter::default(), PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(page.meta.total, 0);
    }

    #[tokio::test]
    async fn test_internal_comments_hidden_from_proponents() {
        let media = TempDir::new().unwrap();
        let evidence = sample_evidence(EvidenceType::Document);
        let submitter = Actor::new(evidence.submitted_by, UserRole::ProjectDeveloper);
        let id = evidence.id;

        let mut repo = stored(evidence);
        repo.expect_comments()
            .returning(|evidence_id| {
                Ok(vec![comment(evidence_id, true), comment(evidence_id, false)])
            });
        let service = manager(TestUnitOfWork::default().with_evidence(repo), &media);

        let visible = service.comments(submitter, id).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert!(!visible[0].is_internal);

        let all = service.comments(actor(UserRole::Verifier), id).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_internal_comment_requires_reviewer() {
        let media = TempDir::new().unwrap();
        let evidence = sample_evidence(EvidenceType::Document);
        let submitter = Actor::new(evidence.submitted_by, UserRole::ProjectDeveloper);
        let id = evidence.id;

        let service = manager(TestUnitOfWork::default().with_evidence(stored(evidence)), &media);
        let result = service
            .add_comment(submitter, id, "note to self".into(), true)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_strangers_cannot_read_evidence() {
        let media = TempDir::new().unwrap();
        let evidence = sample_evidence(EvidenceType::Document);
        let id = evidence.id;
        let mut projects = MockProjectRepository::new();
        projects
            .expect_find_by_id()
            .returning(|_| Ok(Some(sample_project(10, 0))));

        let uow = TestUnitOfWork::default()
            .with_evidence(stored(evidence))
            .with_projects(projects);
        let result = manager(uow, &media)
            .get(actor(UserRole::CreditBuyer), id)
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_review_records_reviewer() {
        let media = TempDir::new().unwrap();
        let evidence = sample_evidence(EvidenceType::Image);
        let id = evidence.id;
        let verifier = actor(UserRole::Verifier);

        let mut repo = stored(evidence);
        repo.expect_save().returning(Ok);
        let service = manager(TestUnitOfWork::default().with_evidence(repo), &media);

        let reviewed = service
            .review(verifier, id, EvidenceStatus::Approved, "Looks good".into())
            .await
            .unwrap();
        assert_eq!(reviewed.status, EvidenceStatus::Approved);
        assert_eq!(reviewed.reviewed_by, Some(verifier.id));

        let result = service
            .review(
                actor(UserRole::ProjectDeveloper),
                id,
                EvidenceStatus::Approved,
                String::new(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn test_upload_replaces_file_in_type_slot() {
        let media = TempDir::new().unwrap();
        let storage = MediaStorage::new(media.path(), "/media/");
        let old = storage
            .save(
                UploadDir::EvidenceImages,
                &Upload {
                    file_name: "old.png".into(),
                    content_type: None,
                    bytes: b"old".to_vec(),
                },
            )
            .await
            .unwrap();

        let mut evidence = sample_evidence(EvidenceType::Image);
        evidence.image_file = Some(old.clone());
        let submitter = Actor::new(evidence.submitted_by, UserRole::ProjectDeveloper);
        let id = evidence.id;

        let mut repo = stored(evidence);
        repo.expect_save().returning(Ok);
        let service = manager(TestUnitOfWork::default().with_evidence(repo), &media);

        let updated = service
            .upload_file(
                submitter,
                id,
                Upload {
                    file_name: "new.png".into(),
                    content_type: Some("image/png".into()),
                    bytes: b"new-bytes".to_vec(),
                },
            )
            .await
            .unwrap();

        let new_file = updated.image_file.clone().unwrap();
        assert!(new_file.path().starts_with("evidence_images/"));
        assert_eq!(updated.file_size, Some(9));
        assert_eq!(updated.mime_type, "image/png");
        assert!(storage.exists(&new_file).await);
        assert!(!storage.exists(&old).await);
    }

    #[tokio::test]
    async fn test_report_evidence_rejects_uploads() {
        let media = TempDir::new().unwrap();
        let evidence = sample_evidence(EvidenceType::Report);
        let submitter = Actor::new(evidence.submitted_by, UserRole::ProjectDeveloper);
        let id = evidence.id;

        let service = manager(TestUnitOfWork::default().with_evidence(stored(evidence)), &media);
        let result = service
            .add_revision(
                submitter,
                id,
                RevisionUpload {
                    changes_description: "v2".into(),
                    upload: Upload {
                        file_name: "report.pdf".into(),
                        content_type: None,
                        bytes: b"%PDF".to_vec(),
                    },
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_approved_evidence_is_locked_for_submitter() {
        let media = TempDir::new().unwrap();
        let mut evidence = sample_evidence(EvidenceType::Document);
        evidence.status = EvidenceStatus::Approved;
        let submitter = Actor::new(evidence.submitted_by, UserRole::ProjectDeveloper);
        let id = evidence.id;

        let service = manager(TestUnitOfWork::default().with_evidence(stored(evidence)), &media);
        let result = service
            .update(submitter, id, EvidenceChanges::default())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    fn revision_upload() -> RevisionUpload {
        RevisionUpload {
            changes_description: "Sharper photo".into(),
            upload: Upload {
                file_name: "survey.png".into(),
                content_type: Some("image/png".into()),
                bytes: b"png-bytes".to_vec(),
            },
        }
    }

    /// Database primed for one revision: lookup, locked reload, latest
    /// number 2, then the evidence save. The revision insert is up to the caller.
    fn revision_db(id: Uuid, submitter: Uuid) -> sea_orm::MockDatabase {
        let stored = evidence_model(id, submitter);
        let mut reopened = stored.clone();
        reopened.status = "pending".into();
        let latest = BTreeMap::from([("latest", Value::Int(Some(2)))]);

        postgres()
            .append_query_results([[stored.clone()], [stored.clone()]])
            .append_query_results([[latest]])
            .append_query_results([[stored], [reopened]])
    }

    fn persisted(db: &DatabaseConnection, media: &TempDir) -> EvidenceManager<Persistence> {
        EvidenceManager::new(
            Arc::new(Persistence::new(db.clone())),
            MediaStorage::new(media.path(), "/media/"),
        )
    }

    #[tokio::test]
    async fn test_revision_takes_next_number_and_reopens_evidence() {
        let media = TempDir::new().unwrap();
        let (id, submitter) = (Uuid::new_v4(), Uuid::new_v4());
        let db = revision_db(id, submitter)
            .append_query_results([[revision_model(id, 3)]])
            .into_connection();

        let revision = persisted(&db, &media)
            .add_revision(
                Actor::new(submitter, UserRole::ProjectDeveloper),
                id,
                revision_upload(),
            )
            .await
            .unwrap();
        assert_eq!(revision.revision_number, 3);

        let log = sql_log(db);
        assert_eq!(log.len(), 2);
        let txn = &log[1];
        assert!(txn.contains("FOR UPDATE"));
        assert!(txn.contains(r#"UPDATE "evidence""#));
        assert!(txn.contains(r#"String(Some("pending"))"#));
        assert!(txn.contains(r#"INSERT INTO "evidence_revisions""#));
        assert!(txn.contains("Int(Some(3))"));
        assert!(txn.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_duplicate_revision_number_discards_upload() {
        let media = TempDir::new().unwrap();
        let (id, submitter) = (Uuid::new_v4(), Uuid::new_v4());
        let db = revision_db(id, submitter)
            .append_query_errors([unique_violation("uq_evidence_revision_number")])
            .into_connection();

        let result = persisted(&db, &media)
            .add_revision(
                Actor::new(submitter, UserRole::ProjectDeveloper),
                id,
                revision_upload(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let log = sql_log(db);
        assert!(log[1].contains("ROLLBACK"));
        let kept = std::fs::read_dir(media.path().join("evidence_revisions"))
            .unwrap()
            .count();
        assert_eq!(kept, 0);
    }
}
