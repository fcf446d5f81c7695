//! Wallet service - Balances, the holdings ledger and retirement.
//!
//! Every balance change runs in one database transaction that locks the
//! wallet row, so concurrent purchases and retirements serialize.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::Actor;
use crate::domain::{CreditHolding, CreditWallet};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::with_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Result of booking a purchase
#[derive(Debug, Clone)]
pub struct HoldingReceipt {
    pub wallet: CreditWallet,
    pub holding: CreditHolding,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Wallet of `user_id`, created empty on first access
    async fn wallet(&self, actor: Actor, user_id: Uuid) -> AppResult<CreditWallet>;

    /// Holdings of `user_id`, most recent first
    async fn holdings(&self, actor: Actor, user_id: Uuid) -> AppResult<Vec<CreditHolding>>;

    /// Book purchased credits: append a holding and credit the wallet (admin only)
    async fn record_holding(
        &self,
        actor: Actor,
        user_id: Uuid,
        project_id: Uuid,
        credit_amount: i64,
        purchase_price: Decimal,
    ) -> AppResult<HoldingReceipt>;

    /// Book sold credits and their proceeds (admin only)
    async fn record_sale(
        &self,
        actor: Actor,
        user_id: Uuid,
        credit_amount: i64,
        proceeds: Decimal,
    ) -> AppResult<CreditWallet>;

    /// Permanently retire available credits
    async fn retire(
        &self,
        actor: Actor,
        user_id: Uuid,
        credit_amount: i64,
    ) -> AppResult<CreditWallet>;
}

pub struct WalletManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> WalletManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> WalletService for WalletManager<U> {
    async fn wallet(&self, actor: Actor, user_id: Uuid) -> AppResult<CreditWallet> {
        actor.require_owner_or_admin(user_id)?;
        if let Some(wallet) = self.uow.wallets().find_by_user(user_id).await? {
            return Ok(wallet);
        }
        with_transaction!(self.uow, |ctx| ctx
            .wallets()
            .get_or_create_for_update(user_id)
            .await)
    }

    async fn holdings(&self, actor: Actor, user_id: Uuid) -> AppResult<Vec<CreditHolding>> {
        actor.require_owner_or_admin(user_id)?;
        let wallets = self.uow.wallets();
        match wallets.find_by_user(user_id).await? {
            Some(wallet) => wallets.holdings(wallet.id).await,
            None => Ok(Vec::new()),
        }
    }

    async fn record_holding(
        &self,
        actor: Actor,
        user_id: Uuid,
        project_id: Uuid,
        credit_amount: i64,
        purchase_price: Decimal,
    ) -> AppResult<HoldingReceipt> {
        actor.require_admin()?;
        if self.uow.projects().find_by_id(project_id).await?.is_none() {
            return Err(AppError::validation("Unknown project"));
        }
        // Validate before opening a transaction
        CreditHolding::new(Uuid::nil(), project_id, credit_amount, purchase_price)?.cost()?;

        let receipt = with_transaction!(self.uow, |ctx| {
            let wallets = ctx.wallets();
            let mut wallet = wallets.get_or_create_for_update(user_id).await?;
            let holding = CreditHolding::new(wallet.id, project_id, credit_amount, purchase_price)?;
            wallet.credit(holding.credit_amount, holding.cost()?)?;

            let holding = wallets.add_holding(holding).await?;
            let wallet = wallets.save(wallet).await?;
            Ok::<_, AppError>(HoldingReceipt { wallet, holding })
        })?;

        tracing::info!(
            %user_id,
            %project_id,
            credits = credit_amount,
            available = receipt.wallet.available_credits,
            "Holding recorded"
        );
        Ok(receipt)
    }

    async fn record_sale(
        &self,
        actor: Actor,
        user_id: Uuid,
        credit_amount: i64,
        proceeds: Decimal,
    ) -> AppResult<CreditWallet> {
        actor.require_admin()?;
        let wallet = with_transaction!(self.uow, |ctx| {
            let wallets = ctx.wallets();
            let mut wallet = wallets.get_or_create_for_update(user_id).await?;
            wallet.debit(credit_amount, proceeds)?;
            wallets.save(wallet).await
        })?;

        tracing::info!(%user_id, credits = credit_amount, %proceeds, "Sale recorded");
        Ok(wallet)
    }

    async fn retire(
        &self,
        actor: Actor,
        user_id: Uuid,
        credit_amount: i64,
    ) -> AppResult<CreditWallet> {
        actor.require_owner_or_admin(user_id)?;
        if credit_amount <= 0 {
            return Err(AppError::validation("Credit amount must be positive"));
        }

        let wallet = with_transaction!(self.uow, |ctx| {
            let wallets = ctx.wallets();
            let mut wallet = wallets.get_or_create_for_update(user_id).await?;
            wallet.retire(credit_amount)?;
            wallets.save(wallet).await
        })?;

        tracing::info!(
            %user_id,
            credits = credit_amount,
            retired = wallet.retired_credits,
            "Credits retired"
        );
        Ok(wallet)
    }
}
