//! Transaction database entity for SeaORM.

use sea_orm::entity::prelude::*;

use super::choice;
use crate::domain::{Transaction, TransactionId, TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub transaction_id: String,
    pub transaction_type: String,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price_per_credit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    pub status: String,
    pub transaction_date: DateTimeUtc,
    pub completed_at: Option<DateTimeUtc>,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub blockchain_tx_hash: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BuyerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Buyer,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::SellerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Seller,
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

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Transaction {
            id: model.id,
            transaction_id: TransactionId::from_stored(model.transaction_id),
            transaction_type: choice(
                "transactions.transaction_type",
                &model.transaction_type,
                TransactionType::Buy,
            ),
            buyer_id: model.buyer_id,
            seller_id: model.seller_id,
            project_id: model.project_id,
            credit_amount: model.credit_amount,
            price_per_credit: model.price_per_credit,
            total_amount: model.total_amount,
            status: choice("transactions.status", &model.status, TransactionStatus::default()),
            transaction_date: model.transaction_date,
            completed_at: model.completed_at,
            notes: model.notes,
            blockchain_tx_hash: model.blockchain_tx_hash,
        }
    }
}
