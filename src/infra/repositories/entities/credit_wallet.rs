use sea_orm::entity::prelude::*;

use crate::domain::CreditWallet;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub total_credits: i64,
    pub available_credits: i64,
    pub retired_credits: i64,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_invested: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_earned: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::credit_holding::Entity")]
    Holdings,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::credit_holding::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Holdings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CreditWallet {
    fn from(model: Model) -> Self {
        CreditWallet {
            id: model.id,
            user_id: model.user_id,
            total_credits: model.total_credits,
            available_credits: model.available_credits,
            retired_credits: model.retired_credits,
            total_invested: model.total_invested,
            total_earned: model.total_earned,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
