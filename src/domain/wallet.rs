//! Credit wallets and the holdings ledger.
//!
//! Balances only change through the wallet methods below, which keep
//! `total_credits == available_credits + retired_credits`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::money::{add_money, ensure_money};
use crate::config::{PRICE_MAX_DIGITS, WALLET_MONEY_MAX_DIGITS};
use crate::errors::{AppError, AppResult};

/// Per-account credit balances and money totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditWallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_credits: i64,
    pub available_credits: i64,
    pub retired_credits: i64,
    pub total_invested: Decimal,
    pub total_earned: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CreditWallet {
    /// Empty wallet for an account
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            total_credits: 0,
            available_credits: 0,
            retired_credits: 0,
            total_invested: Decimal::ZERO,
            total_earned: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn net_worth(&self) -> Decimal {
        self.total_earned - self.total_invested
    }

    pub fn is_consistent(&self) -> bool {
        self.available_credits >= 0
            && self.retired_credits >= 0
            && self.available_credits.checked_add(self.retired_credits) == Some(self.total_credits)
    }

    /// Add purchased credits and the money spent on them.
    pub fn credit(&mut self, amount: i64, cost: Decimal) -> AppResult<()> {
        ensure_positive(amount)?;
        ensure_money("Cost", cost, WALLET_MONEY_MAX_DIGITS)?;
        let next = Self {
            available_credits: checked(self.available_credits.checked_add(amount))?,
            total_credits: checked(self.total_credits.checked_add(amount))?,
            total_invested: add_money(
                "Total invested",
                self.total_invested,
                cost,
                WALLET_MONEY_MAX_DIGITS,
            )?,
            ..self.clone()
        };
        self.commit(next)
    }

    /// Remove sold or transferred credits and book the proceeds.
    pub fn debit(&mut self, amount: i64, proceeds: Decimal) -> AppResult<()> {
        ensure_positive(amount)?;
        ensure_money("Proceeds", proceeds, WALLET_MONEY_MAX_DIGITS)?;
        self.ensure_available(amount)?;
        let next = Self {
            available_credits: self.available_credits - amount,
            total_credits: self.total_credits - amount,
            total_earned: add_money(
                "Total earned",
                self.total_earned,
                proceeds,
                WALLET_MONEY_MAX_DIGITS,
            )?,
            ..self.clone()
        };
        self.commit(next)
    }

    /// Permanently retire available credits. The total is unchanged.
    pub fn retire(&mut self, amount: i64) -> AppResult<()> {
        ensure_positive(amount)?;
        self.ensure_available(amount)?;
        let next = Self {
            available_credits: self.available_credits - amount,
            retired_credits: checked(self.retired_credits.checked_add(amount))?,
            ..self.clone()
        };
        self.commit(next)
    }

    fn ensure_available(&self, amount: i64) -> AppResult<()> {
        if amount > self.available_credits {
            return Err(AppError::validation(format!(
                "Insufficient available credits: requested {}, available {}",
                amount, self.available_credits
            )));
        }
        Ok(())
    }

    /// Replace the balances with `next`, leaving them untouched on error.
    fn commit(&mut self, next: Self) -> AppResult<()> {
        if !next.is_consistent() {
            return Err(AppError::internal(format!(
                "Wallet {} balance invariant broken",
                self.id
            )));
        }
        *self = Self {
            updated_at: Utc::now(),
            ..next
        };
        Ok(())
    }
}

fn ensure_positive(amount: i64) -> AppResult<()> {
    if amount <= 0 {
        return Err(AppError::validation("Credit amount must be positive"));
    }
    Ok(())
}

fn checked(value: Option<i64>) -> AppResult<i64> {
    value.ok_or_else(|| AppError::validation("Credit amount is too large"))
}

/// A recorded purchase of credits from one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreditHolding {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    /// Price per credit at purchase time
    #[schema(value_type = String, example = "5.00")]
    pub purchase_price: Decimal,
    pub purchase_date: DateTime<Utc>,
}

impl CreditHolding {
    pub fn new(
        wallet_id: Uuid,
        project_id: Uuid,
        credit_amount: i64,
        purchase_price: Decimal,
    ) -> AppResult<Self> {
        ensure_positive(credit_amount)?;
        ensure_money("Purchase price", purchase_price, PRICE_MAX_DIGITS)?;
        Ok(Self {
            id: Uuid::new_v4(),
            wallet_id,
            project_id,
            credit_amount,
            purchase_price,
            purchase_date: Utc::now(),
        })
    }

    /// Money spent on this holding
    pub fn cost(&self) -> AppResult<Decimal> {
        Decimal::from(self.credit_amount)
            .checked_mul(self.purchase_price)
            .ok_or_else(|| AppError::validation("Holding cost is too large"))
    }
}

/// Wallet response with derived net worth
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub total_credits: i64,
    pub available_credits: i64,
    pub retired_credits: i64,
    #[schema(value_type = String, example = "500.00")]
    pub total_invested: Decimal,
    #[schema(value_type = String, example = "120.00")]
    pub total_earned: Decimal,
    #[schema(value_type = String, example = "-380.00")]
    pub net_worth: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<CreditWallet> for WalletResponse {
    fn from(wallet: CreditWallet) -> Self {
        Self {
            net_worth: wallet.net_worth(),
            id: wallet.id,
            user_id: wallet.user_id,
            total_credits: wallet.total_credits,
            available_credits: wallet.available_credits,
            retired_credits: wallet.retired_credits,
            total_invested: wallet.total_invested,
            total_earned: wallet.total_earned,
            updated_at: wallet.updated_at,
        }
    }
}
