use sea_orm::entity::prelude::*;

use crate::domain::media::stored_file;
use crate::domain::{EvidenceRevision, StoredFile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "evidence_revisions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub evidence_id: Uuid,
    pub revision_number: i32,
    #[sea_orm(column_type = "Text")]
    pub changes_description: String,
    pub old_file: Option<String>,
    pub new_file: String,
    pub requested_by: Uuid,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::evidence::Entity",
        from = "Column::EvidenceId",
        to = "super::evidence::Column::Id",
        on_delete = "Cascade"
    )]
    Evidence,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RequestedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    RequestedBy,
}

impl Related<super::evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EvidenceRevision {
    fn from(model: Model) -> Self {
        EvidenceRevision {
            id: model.id,
            evidence_id: model.evidence_id,
            revision_number: model.revision_number,
            changes_description: model.changes_description,
            old_file: stored_file(model.old_file),
            new_file: StoredFile::new(model.new_file),
            requested_by: model.requested_by,
            created_at: model.created_at,
        }
    }
}
