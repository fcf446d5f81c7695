//! Credit wallet and holdings repository.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use super::entities::{credit_holding, credit_wallet};
use crate::domain::{CreditHolding, CreditWallet};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Read side of wallets. Balance changes go through the unit of work.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<CreditWallet>>;

    /// Holdings of a wallet, most recent purchase first
    async fn holdings(&self, wallet_id: Uuid) -> AppResult<Vec<CreditHolding>>;
}

pub struct WalletStore {
    db: DatabaseConnection,
}

impl WalletStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl WalletRepository for WalletStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<CreditWallet>> {
        find_wallet(&self.db, user_id, false).await
    }

    async fn holdings(&self, wallet_id: Uuid) -> AppResult<Vec<CreditHolding>> {
        let models = credit_holding::Entity::find()
            .filter(credit_holding::Column::WalletId.eq(wallet_id))
            .order_by_desc(credit_holding::Column::PurchaseDate)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(CreditHolding::from).collect())
    }
}

pub(crate) async fn find_wallet<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    for_update: bool,
) -> AppResult<Option<CreditWallet>> {
    let mut query = credit_wallet::Entity::find().filter(credit_wallet::Column::UserId.eq(user_id));
    if for_update {
        query = query.lock_exclusive();
    }
    Ok(query.one(conn).await?.map(CreditWallet::from))
}

/// Insert an empty wallet unless the user already has one.
///
/// Returns whether a row was written. A concurrent insert for the same
/// user is absorbed by `ON CONFLICT DO NOTHING` instead of failing.
pub(crate) async fn insert_wallet_if_missing<C: ConnectionTrait>(
    conn: &C,
    wallet: CreditWallet,
) -> AppResult<bool> {
    let active_model = credit_wallet::ActiveModel {
        id: Set(wallet.id),
        user_id: Set(wallet.user_id),
        total_credits: Set(wallet.total_credits),
        available_credits: Set(wallet.available_credits),
        retired_credits: Set(wallet.retired_credits),
        total_invested: Set(wallet.total_invested),
        total_earned: Set(wallet.total_earned),
        created_at: Set(wallet.created_at),
        updated_at: Set(wallet.updated_at),
    };
    let inserted = credit_wallet::Entity::insert(active_model)
        .on_conflict(
            OnConflict::column(credit_wallet::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(inserted > 0)
}

pub(crate) async fn save_wallet<C: ConnectionTrait>(
    conn: &C,
    wallet: CreditWallet,
) -> AppResult<CreditWallet> {
    if !wallet.is_consistent() {
        return Err(AppError::internal(format!(
            "Refusing to save inconsistent wallet {}",
            wallet.id
        )));
    }

    let existing = credit_wallet::Entity::find_by_id(wallet.id)
        .one(conn)
        .await?
        .ok_or_not_found()?;

    let mut active: credit_wallet::ActiveModel = existing.into();
    active.total_credits = Set(wallet.total_credits);
    active.available_credits = Set(wallet.available_credits);
    active.retired_credits = Set(wallet.retired_credits);
    active.total_invested = Set(wallet.total_invested);
    active.total_earned = Set(wallet.total_earned);
    active.updated_at = Set(wallet.updated_at);

    let model = active.update(conn).await?;
    Ok(CreditWallet::from(model))
}

pub(crate) async fn insert_holding<C: ConnectionTrait>(
    conn: &C,
    holding: CreditHolding,
) -> AppResult<CreditHolding> {
    let active_model = credit_holding::ActiveModel {
        id: Set(holding.id),
        wallet_id: Set(holding.wallet_id),
        project_id: Set(holding.project_id),
        credit_amount: Set(holding.credit_amount),
        purchase_price: Set(holding.purchase_price),
        purchase_date: Set(holding.purchase_date),
    };
    let model = active_model.insert(conn).await?;
    Ok(CreditHolding::from(model))
}
