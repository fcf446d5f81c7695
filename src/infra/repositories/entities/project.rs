//! Project database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::choice;
use crate::domain::{Project, ProjectCategory, ProjectStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub proponent_id: Uuid,
    pub location: String,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub latitude: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((9, 6)))", nullable)]
    pub longitude: Option<Decimal>,
    pub estimated_credits: i64,
    pub current_credits: i64,
    pub start_date: Date,
    pub end_date: Date,
    pub status: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_cost: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub funding_received: Decimal,
    pub verifier_id: Option<Uuid>,
    pub verification_date: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ProponentId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Proponent,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VerifierId",
        to = "super::user::Column::Id",
        on_delete = "SetNull"
    )]
    Verifier,
    #[sea_orm(has_many = "super::project_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::project_document::Entity")]
    Documents,
    #[sea_orm(has_many = "super::evidence::Entity")]
    Evidence,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Proponent.def()
    }
}

impl Related<super::project_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::project_document::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Documents.def()
    }
}

impl Related<super::evidence::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Evidence.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Project {
            id: model.id,
            title: model.title,
            description: model.description,
            category: choice("projects.category", &model.category, ProjectCategory::Other),
            proponent_id: model.proponent_id,
            location: model.location,
            latitude: model.latitude,
            longitude: model.longitude,
            estimated_credits: model.estimated_credits,
            current_credits: model.current_credits,
            start_date: model.start_date,
            end_date: model.end_date,
            status: choice("projects.status", &model.status, ProjectStatus::default()),
            total_cost: model.total_cost,
            funding_received: model.funding_received,
            verifier_id: model.verifier_id,
            verification_date: model.verification_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
