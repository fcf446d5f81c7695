use sea_orm::entity::prelude::*;

use crate::domain::CreditHolding;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credit_holdings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub purchase_price: Decimal,
    pub purchase_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::credit_wallet::Entity",
        from = "Column::WalletId",
        to = "super::credit_wallet::Column::Id",
        on_delete = "Cascade"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::project::Entity",
        from = "Column::ProjectId",
        to = "super::project::Column::Id",
        on_delete = "Cascade"
    )]
    Project,
}

impl Related<super::credit_wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CreditHolding {
    fn from(model: Model) -> Self {
        CreditHolding {
            id: model.id,
            wallet_id: model.wallet_id,
            project_id: model.project_id,
            credit_amount: model.credit_amount,
            purchase_price: model.purchase_price,
            purchase_date: model.purchase_date,
        }
    }
}
