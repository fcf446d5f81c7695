//! Transaction service - Recording credit movements and settling them.
//!
//! Completion only changes the transaction row. Wallet balances and
//! holdings are updated through the wallet service.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use super::Actor;
use crate::config::MAX_TRANSACTION_ID_ATTEMPTS;
use crate::domain::{NewTransaction, Transaction, TransactionDraft, TransactionStatus};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{TransactionFilter, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Requested status update
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: TransactionStatus,
    pub notes: Option<String>,
    pub blockchain_tx_hash: Option<String>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait TransactionService: Send + Sync {
    /// Record a transaction; a missing id or total is filled in
    async fn create(&self, actor: Actor, draft: TransactionDraft) -> AppResult<Transaction>;

    /// Find by row id or by public `TXN-…` reference
    async fn get(&self, actor: Actor, key: String) -> AppResult<Transaction>;

    /// Admins see everything, others only transactions they take part in
    async fn list(
        &self,
        actor: Actor,
        filter: TransactionFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Transaction>>;

    async fn update_status(
        &self,
        actor: Actor,
        id: Uuid,
        change: StatusChange,
    ) -> AppResult<Transaction>;
}

pub struct TransactionManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> TransactionManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Insert, drawing a fresh generated id on collision.
    async fn insert(&self, mut transaction: NewTransaction) -> AppResult<Transaction> {
        let repo = self.uow.transactions();
        let mut attempt = 1;
        loop {
            match repo.create(transaction.clone()).await {
                Err(AppError::Conflict(_))
                    if attempt < MAX_TRANSACTION_ID_ATTEMPTS && transaction.regenerate_id() =>
                {
                    tracing::debug!(attempt, "Transaction id collision, regenerating");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[async_trait]
impl<U: UnitOfWork> TransactionService for TransactionManager<U> {
    async fn create(&self, actor: Actor, draft: TransactionDraft) -> AppResult<Transaction> {
        if !actor.is_admin() && actor.id != draft.buyer_id && actor.id != draft.seller_id {
            return Err(AppError::Forbidden);
        }

        let new = NewTransaction::new(draft)?;
        self.uow
            .projects()
            .find_by_id(new.project_id)
            .await?
            .ok_or_else(|| AppError::validation("Unknown project"))?;
        for user_id in [new.buyer_id, new.seller_id] {
            self.uow
                .accounts()
                .find_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::validation(format!("Unknown account {}", user_id)))?;
        }

        let transaction = self.insert(new).await?;
        tracing::info!(
            transaction_id = %transaction.transaction_id,
            kind = %transaction.transaction_type,
            credits = transaction.credit_amount,
            total = %transaction.total_amount,
            "Transaction recorded"
        );
        Ok(transaction)
    }

    async fn get(&self, actor: Actor, key: String) -> AppResult<Transaction> {
        let repo = self.uow.transactions();
        let transaction = match Uuid::parse_str(&key) {
            Ok(id) => repo.find_by_id(id).await?,
            Err(_) => repo.find_by_transaction_id(key.trim()).await?,
        }
        .ok_or_not_found()?;

        if !actor.is_admin() && !transaction.involves(actor.id) {
            return Err(AppError::Forbidden);
        }
        Ok(transaction)
    }

    async fn list(
        &self,
        actor: Actor,
        mut filter: TransactionFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Transaction>> {
        if !actor.is_admin() {
            filter.participant_id = Some(actor.id);
        }
        let (transactions, total) = self.uow.transactions().list(filter, params.clone()).await?;
        Ok(Paginated::from_page(transactions, total, &params))
    }

    async fn update_status(
        &self,
        actor: Actor,
        id: Uuid,
        change: StatusChange,
    ) -> AppResult<Transaction> {
        let repo = self.uow.transactions();
        let mut transaction = repo.find_by_id(id).await?.ok_or_not_found()?;

        // Participants may only withdraw; settlement is an admin action
        let allowed = actor.is_admin()
            || (transaction.involves(actor.id) && change.status == TransactionStatus::Cancelled);
        if !allowed {
            return Err(AppError::Forbidden);
        }

        let from = transaction.status;
        transaction.transition_to(change.status, Utc::now())?;
        if let Some(notes) = change.notes {
            transaction.notes = notes;
        }
        if let Some(hash) = change.blockchain_tx_hash.filter(|h| !h.is_empty()) {
            transaction.blockchain_tx_hash = Some(hash);
        }

        let transaction = repo.save_status(transaction).await?;
        tracing::info!(
            transaction_id = %transaction.transaction_id,
            %from,
            to = %transaction.status,
            by = %actor.id,
            "Transaction status changed"
        );
        Ok(transaction)
    }
}
