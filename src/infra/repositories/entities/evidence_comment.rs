use sea_orm::entity::prelude::*;

use crate::domain::EvidenceComment;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "evidence_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub evidence_id: Uuid,
    pub author_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub comment: String,
    pub is_internal: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl Related<super::evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for EvidenceComment {
    fn from(model: Model) -> Self {
        EvidenceComment {
            id: model.id,
            evidence_id: model.evidence_id,
            author_id: model.author_id,
            comment: model.comment,
            is_internal: model.is_internal,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
