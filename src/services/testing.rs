//! Test doubles shared by the service unit tests.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{Password, User, UserRole};
use crate::errors::{AppError, AppResult};
use crate::infra::repositories::{
    AccountRepository, AdminRepository, EvidenceRepository, MockAccountRepository,
    MockAdminRepository, MockEvidenceRepository, MockProjectRepository,
    MockTransactionRepository, MockWalletRepository, ProjectRepository, TransactionRepository,
    WalletRepository,
};
use crate::infra::{TransactionContext, TxFuture, UnitOfWork};

use super::Actor;

/// Unit of work over mocked repositories.
///
/// Repositories that a test does not replace have no expectations, so any
/// call to them fails the test. Database transactions cannot be opened.
pub(crate) struct TestUnitOfWork {
    accounts: Arc<MockAccountRepository>,
    projects: Arc<MockProjectRepository>,
    evidence: Arc<MockEvidenceRepository>,
    transactions: Arc<MockTransactionRepository>,
    wallets: Arc<MockWalletRepository>,
    admin: Arc<MockAdminRepository>,
}

impl Default for TestUnitOfWork {
    fn default() -> Self {
        Self {
            accounts: Arc::new(MockAccountRepository::new()),
            projects: Arc::new(MockProjectRepository::new()),
            evidence: Arc::new(MockEvidenceRepository::new()),
            transactions: Arc::new(MockTransactionRepository::new()),
            wallets: Arc::new(MockWalletRepository::new()),
            admin: Arc::new(MockAdminRepository::new()),
        }
    }
}

impl TestUnitOfWork {
    pub(crate) fn with_accounts(mut self, repo: MockAccountRepository) -> Self {
        self.accounts = Arc::new(repo);
        self
    }

    pub(crate) fn with_projects(mut self, repo: MockProjectRepository) -> Self {
        self.projects = Arc::new(repo);
        self
    }

    pub(crate) fn with_evidence(mut self, repo: MockEvidenceRepository) -> Self {
        self.evidence = Arc::new(repo);
        self
    }

    pub(crate) fn with_transactions(mut self, repo: MockTransactionRepository) -> Self {
        self.transactions = Arc::new(repo);
        self
    }

    pub(crate) fn with_wallets(mut self, repo: MockWalletRepository) -> Self {
        self.wallets = Arc::new(repo);
        self
    }

    pub(crate) fn with_admin(mut self, repo: MockAdminRepository) -> Self {
        self.admin = Arc::new(repo);
        self
    }
}

#[async_trait]
impl UnitOfWork for TestUnitOfWork {
    fn accounts(&self) -> Arc<dyn AccountRepository> {
        self.accounts.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectRepository> {
        self.projects.clone()
    }

    fn evidence(&self) -> Arc<dyn EvidenceRepository> {
        self.evidence.clone()
    }

    fn transactions(&self) -> Arc<dyn TransactionRepository> {
        self.transactions.clone()
    }

    fn wallets(&self) -> Arc<dyn WalletRepository> {
        self.wallets.clone()
    }

    fn admin(&self) -> Arc<dyn AdminRepository> {
        self.admin.clone()
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        Err(AppError::internal("Transactions are not available in unit tests"))
    }

    async fn transaction_serializable<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> TxFuture<'a, T> + Send,
        T: Send,
    {
        Err(AppError::internal("Transactions are not available in unit tests"))
    }
}

pub(crate) fn test_config() -> Config {
    Config::new(
        "postgres://localhost/carbon_market_test",
        "test-secret-key-for-unit-tests-only-32",
    )
}

pub(crate) fn user_with_password(username: &str, password: &str) -> User {
    let hash = Password::new(password).expect("hashable").into_string();
    User::new(
        Uuid::new_v4(),
        username.to_string(),
        format!("{}@example.com", username),
        hash,
    )
}

pub(crate) fn sample_user(role: UserRole) -> User {
    let mut user = User::new(
        Uuid::new_v4(),
        format!("{}-user", role.as_str()),
        "user@example.com".to_string(),
        "hash".to_string(),
    );
    user.role = role;
    user
}

pub(crate) fn actor(role: UserRole) -> Actor {
    Actor::new(Uuid::new_v4(), role)
}
