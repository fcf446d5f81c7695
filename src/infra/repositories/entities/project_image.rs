use sea_orm::entity::prelude::*;

use crate::domain::{ProjectImage, StoredFile};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "project_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub image: String,
    pub caption: String,
    pub is_primary: bool,
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

impl From<Model> for ProjectImage {
    fn from(model: Model) -> Self {
        ProjectImage {
            id: model.id,
            project_id: model.project_id,
            image: StoredFile::new(model.image),
            caption: model.caption,
            is_primary: model.is_primary,
            uploaded_at: model.uploaded_at,
        }
    }
}
