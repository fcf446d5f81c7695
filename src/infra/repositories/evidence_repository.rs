//! Evidence repository with comments and revision history.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, map_page};
use super::entities::{evidence, evidence_comment, evidence_revision};
use crate::domain::{
    Evidence, EvidenceComment, EvidenceRevision, EvidenceStatus, EvidenceType, NewEvidence,
    NewRevision,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Optional narrowing for evidence listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvidenceFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<EvidenceStatus>,
    pub evidence_type: Option<EvidenceType>,
    pub submitted_by: Option<Uuid>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Evidence>>;

    /// Evidence matching the filter, most recently submitted first
    async fn list(
        &self,
        filter: EvidenceFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Evidence>, u64)>;

    async fn create(&self, evidence: NewEvidence) -> AppResult<Evidence>;

    async fn save(&self, evidence: Evidence) -> AppResult<Evidence>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Comment thread, oldest first
    async fn comments(&self, evidence_id: Uuid) -> AppResult<Vec<EvidenceComment>>;

    async fn add_comment(&self, comment: EvidenceComment) -> AppResult<EvidenceComment>;

    /// Revision history, highest revision number first
    async fn revisions(&self, evidence_id: Uuid) -> AppResult<Vec<EvidenceRevision>>;
}

pub struct EvidenceStore {
    db: DatabaseConnection,
}

impl EvidenceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EvidenceRepository for EvidenceStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Evidence>> {
        find_evidence(&self.db, id, false).await
    }

    async fn list(
        &self,
        filter: EvidenceFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Evidence>, u64)> {
        let mut query = evidence::Entity::find();
        if let Some(project_id) = filter.project_id {
            query = query.filter(evidence::Column::ProjectId.eq(project_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(evidence::Column::Status.eq(status.as_str()));
        }
        if let Some(evidence_type) = filter.evidence_type {
            query = query.filter(evidence::Column::EvidenceType.eq(evidence_type.as_str()));
        }
        if let Some(submitted_by) = filter.submitted_by {
            query = query.filter(evidence::Column::SubmittedBy.eq(submitted_by));
        }
        let query = query.order_by_desc(evidence::Column::SubmittedAt);

        Ok(map_page(fetch_page(&self.db, query, &params).await?))
    }

    async fn create(&self, new: NewEvidence) -> AppResult<Evidence> {
        let now = Utc::now();
        let active_model = evidence::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title),
            description: Set(new.description),
            evidence_type: Set(new.evidence_type.into()),
            status: Set(EvidenceStatus::default().into()),
            project_id: Set(new.project_id),
            submitted_by: Set(new.submitted_by),
            reviewed_by: Set(None),
            document_file: Set(None),
            image_file: Set(None),
            video_file: Set(None),
            file_size: Set(None),
            mime_type: Set(String::new()),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            location_accuracy: Set(new.location_accuracy),
            review_notes: Set(String::new()),
            reviewed_at: Set(None),
            submitted_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Evidence::from(model))
    }

    async fn save(&self, evidence: Evidence) -> AppResult<Evidence> {
        save_evidence(&self.db, evidence).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = evidence::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn comments(&self, evidence_id: Uuid) -> AppResult<Vec<EvidenceComment>> {
        let models = evidence_comment::Entity::find()
            .filter(evidence_comment::Column::EvidenceId.eq(evidence_id))
            .order_by_asc(evidence_comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(EvidenceComment::from).collect())
    }

    async fn add_comment(&self, comment: EvidenceComment) -> AppResult<EvidenceComment> {
        let active_model = evidence_comment::ActiveModel {
            id: Set(comment.id),
            evidence_id: Set(comment.evidence_id),
            author_id: Set(comment.author_id),
            comment: Set(comment.comment),
            is_internal: Set(comment.is_internal),
            created_at: Set(comment.created_at),
            updated_at: Set(comment.updated_at),
        };
        let model = active_model.insert(&self.db).await?;
        Ok(EvidenceComment::from(model))
    }

    async fn revisions(&self, evidence_id: Uuid) -> AppResult<Vec<EvidenceRevision>> {
        let models = evidence_revision::Entity::find()
            .filter(evidence_revision::Column::EvidenceId.eq(evidence_id))
            .order_by_desc(evidence_revision::Column::RevisionNumber)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(EvidenceRevision::from).collect())
    }
}

/// Load evidence, optionally taking a row lock for the rest of the transaction.
pub(crate) async fn find_evidence<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
    for_update: bool,
) -> AppResult<Option<Evidence>> {
    let mut query = evidence::Entity::find_by_id(id);
    if for_update {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?.map(Evidence::from))
}

pub(crate) async fn save_evidence<C: ConnectionTrait>(
    conn: &C,
    evidence: Evidence,
) -> AppResult<Evidence> {
    let existing = evidence::Entity::find_by_id(evidence.id)
        .one(conn)
        .await?
        .ok_or_not_found()?;

    let mut active: evidence::ActiveModel = existing.into();
    active.title = Set(evidence.title);
    active.description = Set(evidence.description);
    active.status = Set(evidence.status.into());
    active.reviewed_by = Set(evidence.reviewed_by);
    active.document_file = Set(evidence.document_file.map(|f| f.into_string()));
    active.image_file = Set(evidence.image_file.map(|f| f.into_string()));
    active.video_file = Set(evidence.video_file.map(|f| f.into_string()));
    active.file_size = Set(evidence.file_size);
    active.mime_type = Set(evidence.mime_type);
    active.latitude = Set(evidence.latitude);
    active.longitude = Set(evidence.longitude);
    active.location_accuracy = Set(evidence.location_accuracy);
    active.review_notes = Set(evidence.review_notes);
    active.reviewed_at = Set(evidence.reviewed_at);
    active.updated_at = Set(evidence.updated_at);

    let model = active.update(conn).await?;
    Ok(Evidence::from(model))
}

/// Highest revision number recorded for the evidence, if any.
pub(crate) async fn latest_revision_number<C: ConnectionTrait>(
    conn: &C,
    evidence_id: Uuid,
) -> AppResult<Option<i32>> {
    let latest = evidence_revision::Entity::find()
        .select_only()
        .column_as(evidence_revision::Column::RevisionNumber.max(), "latest")
        .filter(evidence_revision::Column::EvidenceId.eq(evidence_id))
        .into_tuple::<Option<i32>>()
        .one(conn)
        .await?;
    Ok(latest.flatten())
}

/// Insert a revision. A duplicate `(evidence, revision_number)` is a conflict.
pub(crate) async fn insert_revision<C: ConnectionTrait>(
    conn: &C,
    revision: NewRevision,
) -> AppResult<EvidenceRevision> {
    let active_model = evidence_revision::ActiveModel {
        id: Set(Uuid::new_v4()),
        evidence_id: Set(revision.evidence_id),
        revision_number: Set(revision.revision_number),
        changes_description: Set(revision.changes_description),
        old_file: Set(revision.old_file.map(|f| f.into_string())),
        new_file: Set(revision.new_file.into_string()),
        requested_by: Set(revision.requested_by),
        created_at: Set(Utc::now()),
    };
    let model = active_model
        .insert(conn)
        .await
        .map_err(|e| AppError::from_db_unique(e, "Revision"))?;
    Ok(EvidenceRevision::from(model))
}
