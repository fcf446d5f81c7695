//! Transaction repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, map_page};
use super::entities::transaction::{self, ActiveModel, Entity as TransactionEntity};
use crate::domain::{NewTransaction, Transaction, TransactionStatus, TransactionType};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Optional narrowing for transaction listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Buyer or seller
    pub participant_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub transaction_type: Option<TransactionType>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Transaction>>;

    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Transaction>>;

    /// Transactions matching the filter, most recent first
    async fn list(
        &self,
        filter: TransactionFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Transaction>, u64)>;

    /// Insert a transaction. A taken `transaction_id` is a conflict.
    async fn create(&self, transaction: NewTransaction) -> AppResult<Transaction>;

    /// Persist status, completion time and notes. Amounts are never rewritten.
    async fn save_status(&self, transaction: Transaction) -> AppResult<Transaction>;
}

pub struct TransactionStore {
    db: DatabaseConnection,
}

impl TransactionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TransactionRepository for TransactionStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Transaction>> {
        let result = TransactionEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Transaction::from))
    }

    async fn find_by_transaction_id(&self, transaction_id: &str) -> AppResult<Option<Transaction>> {
        let result = TransactionEntity::find()
            .filter(transaction::Column::TransactionId.eq(transaction_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Transaction::from))
    }

    async fn list(
        &self,
        filter: TransactionFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Transaction>, u64)> {
        let mut query = TransactionEntity::find();
        if let Some(user_id) = filter.participant_id {
            query = query.filter(
                Condition::any()
                    .add(transaction::Column::BuyerId.eq(user_id))
                    .add(transaction::Column::SellerId.eq(user_id)),
            );
        }
        if let Some(project_id) = filter.project_id {
            query = query.filter(transaction::Column::ProjectId.eq(project_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(transaction::Column::Status.eq(status.as_str()));
        }
        if let Some(kind) = filter.transaction_type {
            query = query.filter(transaction::Column::TransactionType.eq(kind.as_str()));
        }
        let query = query.order_by_desc(transaction::Column::TransactionDate);

        Ok(map_page(fetch_page(&self.db, query, &params).await?))
    }

    async fn create(&self, new: NewTransaction) -> AppResult<Transaction> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_id: Set(new.transaction_id.into_string()),
            transaction_type: Set(new.transaction_type.into()),
            buyer_id: Set(new.buyer_id),
            seller_id: Set(new.seller_id),
            project_id: Set(new.project_id),
            credit_amount: Set(new.credit_amount),
            price_per_credit: Set(new.price_per_credit),
            total_amount: Set(new.total_amount),
            status: Set(TransactionStatus::default().into()),
            transaction_date: Set(Utc::now()),
            completed_at: Set(None),
            notes: Set(new.notes),
            blockchain_tx_hash: Set(new.blockchain_tx_hash),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| AppError::from_db_unique(e, "Transaction"))?;
        Ok(Transaction::from(model))
    }

    async fn save_status(&self, txn: Transaction) -> AppResult<Transaction> {
        let existing = TransactionEntity::find_by_id(txn.id)
            .one(&self.db)
            .await?
            .ok_or_not_found()?;

        let mut active: ActiveModel = existing.into();
        active.status = Set(txn.status.into());
        active.completed_at = Set(txn.completed_at);
        active.notes = Set(txn.notes);
        active.blockchain_tx_hash = Set(txn.blockchain_tx_hash);

        let model = active.update(&self.db).await?;
        Ok(Transaction::from(model))
    }
}
