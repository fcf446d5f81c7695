use sea_orm::entity::prelude::*;

use crate::domain::{ProjectDocument, StoredFile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "project_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub document: String,
    pub document_type: String,
    pub uploaded_at: DateTimeUtc,
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
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ProjectDocument {
    fn from(model: Model) -> Self {
        ProjectDocument {
            id: model.id,
            project_id: model.project_id,
            title: model.title,
            document: StoredFile::new(model.document),
            document_type: model.document_type,
            uploaded_at: model.uploaded_at,
        }
    }
}
