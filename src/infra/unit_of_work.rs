//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and runs multi-row writes inside one
//! database transaction: holding + wallet updates, revision numbering and
//! primary-image switching.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::{
    self, AccountRepository, AccountStore, AdminRepository, AdminStore, EvidenceRepository,
    EvidenceStore, ProjectRepository, ProjectStore, TransactionRepository, TransactionStore,
    WalletRepository, WalletStore,
};
use crate::domain::{
    CreditHolding, CreditWallet, Evidence, EvidenceRevision, NewRevision, Project, ProjectImage,
};
use crate::errors::{AppError, AppResult};

/// Boxed future returned by transactional closures
pub type TxFuture<'a, T> =
    std::pin::Pin<Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>>;

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic transaction methods; tests
/// implement it by hand around mocked repositories.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn accounts(&self) -> Arc<dyn AccountRepository>;

    fn projects(&self) -> Arc<dyn ProjectRepository>;

    fn evidence(&self) -> Arc<dyn EvidenceRepository>;

    fn transactions(&self) -> Arc<dyn TransactionRepository>;

    fn wallets(&self) -> Arc<dyn WalletRepository>;

    /// Raw listing queries for the admin views
    fn admin(&self) -> Arc<dyn AdminRepository>;

    /// Execute a closure within a ReadCommitted transaction.
    ///
    /// Committed on success, rolled back on error.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;

    /// Execute a closure within a Serializable transaction.
    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send;
}

/// Repository access bound to one open database transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn projects(&self) -> TxProjectRepository<'_> {
        TxProjectRepository { txn: self.txn }
    }

    pub fn evidence(&self) -> TxEvidenceRepository<'_> {
        TxEvidenceRepository { txn: self.txn }
    }

    pub fn wallets(&self) -> TxWalletRepository<'_> {
        TxWalletRepository { txn: self.txn }
    }
}

/// SeaORM-backed UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    account_repo: Arc<AccountStore>,
    project_repo: Arc<ProjectStore>,
    evidence_repo: Arc<EvidenceStore>,
    transaction_repo: Arc<TransactionStore>,
    wallet_repo: Arc<WalletStore>,
    admin_repo: Arc<AdminStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            account_repo: Arc::new(AccountStore::new(db.clone())),
            project_repo: Arc::new(ProjectStore::new(db.clone())),
            evidence_repo: Arc::new(EvidenceStore::new(db.clone())),
            transaction_repo: Arc::new(TransactionStore::new(db.clone())),
            wallet_repo: Arc::new(WalletStore::new(db.clone())),
            admin_repo: Arc::new(AdminStore::new(db.clone())),
            db,
        }
    }

    async fn execute_transaction<F, T>(&self, isolation: IsolationLevel, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
            .await
            .map_err(AppError::from)?;

        let ctx = TransactionContext::new(&txn);

        match f(ctx).await {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn accounts(&self) -> Arc<dyn AccountRepository> {
        self.account_repo.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectRepository> {
        self.project_repo.clone()
    }

    fn evidence(&self) -> Arc<dyn EvidenceRepository> {
        self.evidence_repo.clone()
    }

    fn transactions(&self) -> Arc<dyn TransactionRepository> {
        self.transaction_repo.clone()
    }

    fn wallets(&self) -> Arc<dyn WalletRepository> {
        self.wallet_repo.clone()
    }

    fn admin(&self) -> Arc<dyn AdminRepository> {
        self.admin_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::ReadCommitted, f).await
    }

    async fn transaction_serializable<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        self.execute_transaction(IsolationLevel::Serializable, f).await
    }
}

/// Transaction-aware project repository
pub struct TxProjectRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxProjectRepository<'a> {
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        repositories::find_project(self.txn, id).await
    }

    pub async fn save(&self, project: Project) -> AppResult<Project> {
        repositories::save_project(self.txn, project).await
    }

    /// Insert an image. A primary image first clears the flag on its siblings.
    pub async fn add_image(&self, image: ProjectImage) -> AppResult<ProjectImage> {
        if image.is_primary {
            let cleared = repositories::clear_primary_images(self.txn, image.project_id).await?;
            tracing::debug!(project_id = %image.project_id, cleared, "Cleared primary images");
        }
        repositories::insert_image(self.txn, image).await
    }
}

/// Transaction-aware evidence repository
pub struct TxEvidenceRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxEvidenceRepository<'a> {
    /// Load evidence and lock its row until the transaction ends.
    pub async fn find_for_update(&self, id: Uuid) -> AppResult<Option<Evidence>> {
        repositories::find_evidence(self.txn, id, true).await
    }

    pub async fn save(&self, evidence: Evidence) -> AppResult<Evidence> {
        repositories::save_evidence(self.txn, evidence).await
    }

    pub async fn latest_revision_number(&self, evidence_id: Uuid) -> AppResult<Option<i32>> {
        repositories::latest_revision_number(self.txn, evidence_id).await
    }

    pub async fn add_revision(&self, revision: NewRevision) -> AppResult<EvidenceRevision> {
        repositories::insert_revision(self.txn, revision).await
    }
}

/// Transaction-aware wallet repository
pub struct TxWalletRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxWalletRepository<'a> {
    /// Lock the user's wallet, creating an empty one on first use.
    ///
    /// Two first accesses may race to create the wallet. The losing insert
    /// is a no-op and both callers then lock the same row.
    pub async fn get_or_create_for_update(&self, user_id: Uuid) -> AppResult<CreditWallet> {
        if let Some(wallet) = repositories::find_wallet(self.txn, user_id, true).await? {
            return Ok(wallet);
        }
        if repositories::insert_wallet_if_missing(self.txn, CreditWallet::new(user_id)).await? {
            tracing::info!(%user_id, "Created credit wallet");
        }
        repositories::find_wallet(self.txn, user_id, true)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!("Wallet for {} vanished after insert", user_id))
            })
    }

    pub async fn save(&self, wallet: CreditWallet) -> AppResult<CreditWallet> {
        repositories::save_wallet(self.txn, wallet).await
    }

    pub async fn add_holding(&self, holding: CreditHolding) -> AppResult<CreditHolding> {
        repositories::insert_holding(self.txn, holding).await
    }
}

/// Simpler API for executing transactional operations.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{next_revision_number, StoredFile};
    use crate::infra::repositories::entities::credit_wallet;
    use crate::infra::testing::{
        exec, image_model, postgres, revision_model, sql_log, unique_violation, wallet_model,
    };
    use crate::with_transaction;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::Value;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_wallet_created_on_first_access() {
        let user_id = Uuid::new_v4();
        let created = wallet_model(user_id, 0, Decimal::ZERO);
        let db = postgres()
            .append_query_results([Vec::<credit_wallet::Model>::new()])
            .append_exec_results([exec(1)])
            .append_query_results([[created.clone()]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let wallet = with_transaction!(uow, |ctx| ctx
            .wallets()
            .get_or_create_for_update(user_id)
            .await)
        .unwrap();
        assert_eq!(wallet.id, created.id);

        let log = sql_log(db);
        assert_eq!(log.len(), 1);
        assert!(log[0].contains(r#"ON CONFLICT ("user_id") DO NOTHING"#));
        assert!(log[0].contains("FOR UPDATE"));
        assert!(log[0].contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_wallet_created_concurrently_is_reused() {
        let user_id = Uuid::new_v4();
        // Another request committed its wallet between our lookup and insert
        let winner = wallet_model(user_id, 0, Decimal::ZERO);
        let db = postgres()
            .append_query_results([Vec::<credit_wallet::Model>::new()])
            .append_exec_results([exec(0)])
            .append_query_results([[winner.clone()]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let wallet = with_transaction!(uow, |ctx| ctx
            .wallets()
            .get_or_create_for_update(user_id)
            .await)
        .unwrap();

        assert_eq!(wallet.id, winner.id);
        assert!(sql_log(db)[0].contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_failed_closure_rolls_back() {
        let user_id = Uuid::new_v4();
        let db = postgres()
            .append_query_results([[wallet_model(user_id, 5, Decimal::ZERO)]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let result: AppResult<CreditWallet> = with_transaction!(uow, |ctx| {
            let mut wallet = ctx.wallets().get_or_create_for_update(user_id).await?;
            wallet.retire(10)?;
            Ok::<_, AppError>(wallet)
        });

        assert!(matches!(result, Err(AppError::Validation(_))));
        let log = sql_log(db);
        assert!(log[0].contains("ROLLBACK"));
        assert!(!log[0].contains("COMMIT"));
    }

    fn image(project_id: Uuid, is_primary: bool) -> ProjectImage {
        ProjectImage {
            id: Uuid::new_v4(),
            project_id,
            image: StoredFile::new("project_images/site.png"),
            caption: String::new(),
            is_primary,
            uploaded_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_primary_image_clears_siblings_first() {
        let project_id = Uuid::new_v4();
        let db = postgres()
            .append_exec_results([exec(1)])
            .append_query_results([[image_model(project_id, true)]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let saved = with_transaction!(uow, |ctx| ctx
            .projects()
            .add_image(image(project_id, true))
            .await)
        .unwrap();
        assert!(saved.is_primary);

        let log = sql_log(db);
        let cleared = log[0].find(r#"UPDATE "project_images""#).unwrap();
        let inserted = log[0].find(r#"INSERT INTO "project_images""#).unwrap();
        assert!(cleared < inserted);
        assert!(log[0].contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_secondary_image_leaves_siblings() {
        let project_id = Uuid::new_v4();
        let db = postgres()
            .append_query_results([[image_model(project_id, false)]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        with_transaction!(uow, |ctx| ctx
            .projects()
            .add_image(image(project_id, false))
            .await)
        .unwrap();

        assert!(!sql_log(db)[0].contains(r#"UPDATE "project_images""#));
    }

    fn revision(evidence_id: Uuid, revision_number: i32) -> NewRevision {
        NewRevision {
            evidence_id,
            revision_number,
            changes_description: "Sharper photo".into(),
            old_file: None,
            new_file: StoredFile::new("evidence_revisions/survey.png"),
            requested_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_revision_numbered_after_latest() {
        let evidence_id = Uuid::new_v4();
        let latest = BTreeMap::from([("latest", Value::Int(Some(3)))]);
        let db = postgres()
            .append_query_results([[latest]])
            .append_query_results([[revision_model(evidence_id, 4)]])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let saved = with_transaction!(uow, |ctx| {
            let repo = ctx.evidence();
            let number = next_revision_number(repo.latest_revision_number(evidence_id).await?);
            repo.add_revision(revision(evidence_id, number)).await
        })
        .unwrap();
        assert_eq!(saved.revision_number, 4);

        let log = sql_log(db);
        assert!(log[0].contains("MAX("));
        assert!(log[0].contains("Int(Some(4))"));
    }

    #[tokio::test]
    async fn test_duplicate_revision_number_is_conflict() {
        let evidence_id = Uuid::new_v4();
        let db = postgres()
            .append_query_errors([unique_violation("uq_evidence_revision_number")])
            .into_connection();
        let uow = Persistence::new(db.clone());

        let result = with_transaction!(uow, |ctx| ctx
            .evidence()
            .add_revision(revision(evidence_id, 2))
            .await);

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert!(sql_log(db)[0].contains("ROLLBACK"));
    }
}
