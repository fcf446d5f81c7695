//! Fixtures for running repositories against SeaORM's mock connection.
//!
//! Results are served first in, first out. Every statement lands in the
//! transaction log, which tests read back through [`sql_log`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sqlx::error::{DatabaseError, ErrorKind};
use sea_orm::{
    sqlx, DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, RuntimeErr,
};
use std::borrow::Cow;
use std::error::Error as StdError;
use uuid::Uuid;

use super::repositories::entities::{
    credit_holding, credit_wallet, evidence, evidence_revision, project, project_image,
    transaction,
};

pub fn postgres() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

pub fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Logged statements, one entry per transaction (or per statement outside one).
pub fn sql_log(db: DatabaseConnection) -> Vec<String> {
    db.into_transaction_log()
        .iter()
        .map(|txn| format!("{:?}", txn).replace("\\\"", "\""))
        .collect()
}

#[derive(Debug, thiserror::Error)]
#[error("duplicate key value violates unique constraint \"{constraint}\"")]
struct UniqueViolation {
    constraint: &'static str,
}

impl DatabaseError for UniqueViolation {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint"
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some(self.constraint)
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

/// Error Postgres reports when an insert hits a unique index
pub fn unique_violation(constraint: &'static str) -> DbErr {
    DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
        UniqueViolation { constraint },
    ))))
}

pub fn wallet_model(user_id: Uuid, available: i64, invested: Decimal) -> credit_wallet::Model {
    let now = Utc::now();
    credit_wallet::Model {
        id: Uuid::new_v4(),
        user_id,
        total_credits: available,
        available_credits: available,
        retired_credits: 0,
        total_invested: invested,
        total_earned: Decimal::ZERO,
        created_at: now,
        updated_at: now,
    }
}

pub fn holding_model(
    wallet_id: Uuid,
    project_id: Uuid,
    credit_amount: i64,
    purchase_price: Decimal,
) -> credit_holding::Model {
    credit_holding::Model {
        id: Uuid::new_v4(),
        wallet_id,
        project_id,
        credit_amount,
        purchase_price,
        purchase_date: Utc::now(),
    }
}

pub fn project_model(id: Uuid) -> project::Model {
    let now = Utc::now();
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    project::Model {
        id,
        title: "Mangrove restoration".into(),
        description: String::new(),
        category: "reforestation".into(),
        proponent_id: Uuid::new_v4(),
        location: "Sundarbans".into(),
        latitude: None,
        longitude: None,
        estimated_credits: 1000,
        current_credits: 100,
        start_date: start,
        end_date: start,
        status: "active".into(),
        total_cost: Decimal::ZERO,
        funding_received: Decimal::ZERO,
        verifier_id: None,
        verification_date: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn image_model(project_id: Uuid, is_primary: bool) -> project_image::Model {
    project_image::Model {
        id: Uuid::new_v4(),
        project_id,
        image: "project_images/site.png".into(),
        caption: String::new(),
        is_primary,
        uploaded_at: Utc::now(),
    }
}

/// Image evidence with a file attached, sent back for revision
pub fn evidence_model(id: Uuid, submitted_by: Uuid) -> evidence::Model {
    let now = Utc::now();
    evidence::Model {
        id,
        title: "Canopy survey".into(),
        description: String::new(),
        evidence_type: "image".into(),
        status: "requires_revision".into(),
        project_id: Uuid::new_v4(),
        submitted_by,
        reviewed_by: None,
        document_file: None,
        image_file: Some("evidence_images/survey.png".into()),
        video_file: None,
        file_size: Some(3),
        mime_type: "image/png".into(),
        latitude: None,
        longitude: None,
        location_accuracy: None,
        review_notes: String::new(),
        reviewed_at: None,
        submitted_at: now,
        updated_at: now,
    }
}

pub fn revision_model(evidence_id: Uuid, revision_number: i32) -> evidence_revision::Model {
    evidence_revision::Model {
        id: Uuid::new_v4(),
        evidence_id,
        revision_number,
        changes_description: "Sharper photo".into(),
        old_file: Some("evidence_images/survey.png".into()),
        new_file: "evidence_revisions/survey.png".into(),
        requested_by: Uuid::new_v4(),
        created_at: Utc::now(),
    }
}

pub fn transaction_model(transaction_id: &str) -> transaction::Model {
    transaction::Model {
        id: Uuid::new_v4(),
        transaction_id: transaction_id.to_string(),
        transaction_type: "buy".into(),
        buyer_id: Uuid::new_v4(),
        seller_id: Uuid::new_v4(),
        project_id: Uuid::new_v4(),
        credit_amount: 10,
        price_per_credit: Decimal::new(500, 2),
        total_amount: Decimal::new(5000, 2),
        status: "pending".into(),
        transaction_date: Utc::now(),
        completed_at: None,
        notes: String::new(),
        blockchain_tx_hash: None,
    }
}
