//! Service Container - Centralized service access.
//!
//! Handlers depend on the [`ServiceContainer`] trait, so router tests can
//! swap in hand-written or mocked services.

use std::sync::Arc;

use super::{
    AccountManager, AccountService, AdminManager, AdminService, AuthService, Authenticator,
    EvidenceManager, EvidenceService, ProjectManager, ProjectService, TransactionManager,
    TransactionService, WalletManager, WalletService,
};
use crate::config::Config;
use crate::infra::{MediaStorage, Persistence};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn accounts(&self) -> Arc<dyn AccountService>;

    fn projects(&self) -> Arc<dyn ProjectService>;

    fn evidence(&self) -> Arc<dyn EvidenceService>;

    fn transactions(&self) -> Arc<dyn TransactionService>;

    fn wallets(&self) -> Arc<dyn WalletService>;

    fn admin(&self) -> Arc<dyn AdminService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn AuthService>,
    pub accounts: Arc<dyn AccountService>,
    pub projects: Arc<dyn ProjectService>,
    pub evidence: Arc<dyn EvidenceService>,
    pub transactions: Arc<dyn TransactionService>,
    pub wallets: Arc<dyn WalletService>,
    pub admin: Arc<dyn AdminService>,
}

impl Services {
    /// Wire every service over one SeaORM connection and the configured media store
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let storage = MediaStorage::from_config(&config);

        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), config)),
            accounts: Arc::new(AccountManager::new(uow.clone())),
            projects: Arc::new(ProjectManager::new(uow.clone(), storage.clone())),
            evidence: Arc::new(EvidenceManager::new(uow.clone(), storage)),
            transactions: Arc::new(TransactionManager::new(uow.clone())),
            wallets: Arc::new(WalletManager::new(uow.clone())),
            admin: Arc::new(AdminManager::new(uow)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn accounts(&self) -> Arc<dyn AccountService> {
        self.accounts.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectService> {
        self.projects.clone()
    }

    fn evidence(&self) -> Arc<dyn EvidenceService> {
        self.evidence.clone()
    }

    fn transactions(&self) -> Arc<dyn TransactionService> {
        self.transactions.clone()
    }

    fn wallets(&self) -> Arc<dyn WalletService> {
        self.wallets.clone()
    }

    fn admin(&self) -> Arc<dyn AdminService> {
        self.admin.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MockAdminService, MockAuthService};

    #[test]
    fn test_container_mock_hands_out_services() {
        let mut container = MockServiceContainer::new();
        container
            .expect_admin()
            .returning(|| Arc::new(MockAdminService::new()));
        container
            .expect_auth()
            .times(1)
            .returning(|| Arc::new(MockAuthService::new()));

        let _ = container.auth();
        let _ = container.admin();
    }
}
