//! Credit transactions between accounts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::choices::choice_enum;
use super::money::ensure_money;
use crate::config::{
    AMOUNT_MAX_DIGITS, MIN_CREDIT_AMOUNT, PRICE_MAX_DIGITS, TRANSACTION_ID_HEX_LEN,
    TRANSACTION_ID_PREFIX,
};
use crate::errors::{AppError, AppResult};

/// Upper bound on stored transaction identifiers
const MAX_TRANSACTION_ID_LENGTH: usize = 50;

choice_enum! {
    /// Kind of credit movement
    TransactionType("transaction type") {
        Buy => ("buy", "Buy Credits"),
        Sell => ("sell", "Sell Credits"),
        Transfer => ("transfer", "Transfer Credits"),
        Retire => ("retire", "Retire Credits"),
    }
}

choice_enum! {
    /// Settlement status of a transaction
    TransactionStatus("transaction status") {
        Pending => ("pending", "Pending"),
        Completed => ("completed", "Completed"),
        Failed => ("failed", "Failed"),
        Cancelled => ("cancelled", "Cancelled"),
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(self, TransactionStatus::Pending) && next.is_terminal()
    }
}

/// Public transaction identifier, e.g. `TXN-A1B2C3D4`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generate `TXN-` followed by eight uppercase hex characters.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}{}",
            TRANSACTION_ID_PREFIX,
            hex[..TRANSACTION_ID_HEX_LEN].to_uppercase()
        ))
    }

    /// Accept a caller supplied identifier.
    pub fn parse(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Transaction id cannot be empty"));
        }
        if trimmed.len() > MAX_TRANSACTION_ID_LENGTH {
            return Err(AppError::validation(format!(
                "Transaction id cannot exceed {} characters",
                MAX_TRANSACTION_ID_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wrap an identifier read back from storage.
    pub(crate) fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// True for identifiers shaped like generated ones.
    pub fn is_generated_format(value: &str) -> bool {
        value
            .strip_prefix(TRANSACTION_ID_PREFIX)
            .map(|hex| {
                hex.len() == TRANSACTION_ID_HEX_LEN
                    && hex.chars().all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            })
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller supplied transaction fields; id and total are optional.
#[derive(Debug, Clone)]
pub struct TransactionDraft {
    pub transaction_id: Option<String>,
    pub transaction_type: TransactionType,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    pub price_per_credit: Decimal,
    pub total_amount: Option<Decimal>,
    pub notes: String,
    pub blockchain_tx_hash: Option<String>,
}

/// Transaction ready for insertion, with id and total resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_id: TransactionId,
    pub transaction_type: TransactionType,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    pub price_per_credit: Decimal,
    pub total_amount: Decimal,
    pub notes: String,
    pub blockchain_tx_hash: Option<String>,
    id_generated: bool,
}

impl NewTransaction {
    /// Resolve a draft.
    ///
    /// A missing id is generated; a missing (or zero) total becomes
    /// `credit_amount * price_per_credit`. Both happen here, once.
    pub fn new(draft: TransactionDraft) -> AppResult<Self> {
        if draft.credit_amount < MIN_CREDIT_AMOUNT as i64 {
            return Err(AppError::validation(format!(
                "Credit amount must be at least {}",
                MIN_CREDIT_AMOUNT
            )));
        }
        ensure_money("Price per credit", draft.price_per_credit, PRICE_MAX_DIGITS)?;

        let (transaction_id, id_generated) = match draft.transaction_id {
            Some(id) if !id.trim().is_empty() => (TransactionId::parse(id)?, false),
            _ => (TransactionId::generate(), true),
        };

        let total_amount = match draft.total_amount {
            Some(total) if !total.is_zero() => total,
            _ => Decimal::from(draft.credit_amount)
                .checked_mul(draft.price_per_credit)
                .ok_or_else(|| AppError::validation("Total amount is too large"))?,
        };
        ensure_money("Total amount", total_amount, AMOUNT_MAX_DIGITS)?;

        Ok(Self {
            transaction_id,
            transaction_type: draft.transaction_type,
            buyer_id: draft.buyer_id,
            seller_id: draft.seller_id,
            project_id: draft.project_id,
            credit_amount: draft.credit_amount,
            price_per_credit: draft.price_per_credit,
            total_amount,
            notes: draft.notes,
            blockchain_tx_hash: draft.blockchain_tx_hash,
            id_generated,
        })
    }

    pub fn has_generated_id(&self) -> bool {
        self.id_generated
    }

    /// Draw a fresh id after a collision. Caller supplied ids are kept.
    pub fn regenerate_id(&mut self) -> bool {
        if self.id_generated {
            self.transaction_id = TransactionId::generate();
        }
        self.id_generated
    }
}

/// Recorded credit movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub transaction_id: TransactionId,
    pub transaction_type: TransactionType,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    pub credit_amount: i64,
    pub price_per_credit: Decimal,
    pub total_amount: Decimal,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub blockchain_tx_hash: Option<String>,
}

impl Transaction {
    /// e.g. `TXN-A1B2C3D4 - buy 10 credits`
    pub fn summary(&self) -> String {
        format!(
            "{} - {} {} credits",
            self.transaction_id, self.transaction_type, self.credit_amount
        )
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.buyer_id == user_id || self.seller_id == user_id
    }

    /// Settle a pending transaction. Completion stamps `completed_at`.
    pub fn transition_to(&mut self, next: TransactionStatus, now: DateTime<Utc>) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_transition("transaction", self.status, next));
        }
        if next == TransactionStatus::Completed {
            self.completed_at = Some(now);
        }
        self.status = next;
        Ok(())
    }
}

/// Transaction response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    #[schema(example = "TXN-A1B2C3D4")]
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    #[schema(example = 10)]
    pub credit_amount: i64,
    #[schema(value_type = String, example = "5.00")]
    pub price_per_credit: Decimal,
    #[schema(value_type = String, example = "50.00")]
    pub total_amount: Decimal,
    pub status: TransactionStatus,
    pub transaction_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub blockchain_tx_hash: Option<String>,
}

impl From<Transaction> for TransactionResponse {
    fn from(txn: Transaction) -> Self {
        Self {
            id: txn.id,
            transaction_id: txn.transaction_id.into_string(),
            transaction_type: txn.transaction_type,
            buyer_id: txn.buyer_id,
            seller_id: txn.seller_id,
            project_id: txn.project_id,
            credit_amount: txn.credit_amount,
            price_per_credit: txn.price_per_credit,
            total_amount: txn.total_amount,
            status: txn.status,
            transaction_date: txn.transaction_date,
            completed_at: txn.completed_at,
            notes: txn.notes,
            blockchain_tx_hash: txn.blockchain_tx_hash,
        }
    }
}
