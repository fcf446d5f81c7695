//! Evidence database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::choice;
use crate::domain::media::stored_file;
use crate::domain::{Evidence, EvidenceStatus, EvidenceType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "evidence")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub evidence_type: String,
    pub status: String,
    pub project_id: Uuid,
    pub submitted_by: Uuid,
    pub reviewed_by: Option<Uuid>,
    pub document_file: Option<String>,
    pub image_file: Option<String>,
    pub video_file: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: String,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub latitude: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub longitude: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((6, 2)))", nullable)]
    pub location_accuracy: Option<Decimal>,
    #[sea_orm(column_type = "Text")]
    pub review_notes: String,
    pub reviewed_at: Option<DateTimeUtc>,
    pub submitted_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SubmittedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Submitter,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReviewedBy",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Reviewer,
    #[sea_orm(has_many = "super::evidence_comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::evidence_revision::Entity")]
    Revisions,
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl Related<super::evidence_comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::evidence_revision::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Revisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Evidence {
    fn from(model: Model) -> Self {
        Evidence {
            id: model.id,
            title: model.title,
            description: model.description,
            evidence_type: choice(
                "evidence.evidence_type",
                &model.evidence_type,
                EvidenceType::Document,
            ),
            status: choice("evidence.status", &model.status, EvidenceStatus::default()),
            project_id: model.project_id,
            submitted_by: model.submitted_by,
            reviewed_by: model.reviewed_by,
            document_file: stored_file(model.document_file),
            image_file: stored_file(model.image_file),
            video_file: stored_file(model.video_file),
            file_size: model.file_size,
            mime_type: model.mime_type,
            latitude: model.latitude,
            longitude: model.longitude,
            location_accuracy: model.location_accuracy,
            review_notes: model.review_notes,
            reviewed_at: model.reviewed_at,
            submitted_at: model.submitted_at,
            updated_at: model.updated_at,
        }
    }
}
