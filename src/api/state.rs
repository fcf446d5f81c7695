//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{
    AccountService, AdminService, AuthService, EvidenceService, ProjectService, ServiceContainer,
    Services, TransactionService, WalletService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub account_service: Arc<dyn AccountService>,
    pub project_service: Arc<dyn ProjectService>,
    pub evidence_service: Arc<dyn EvidenceService>,
    pub transaction_service: Arc<dyn TransactionService>,
    pub wallet_service: Arc<dyn WalletService>,
    pub admin_service: Arc<dyn AdminService>,
    /// Database connection (health checks)
    pub database: Arc<Database>,
    /// Directory served under `/media`
    pub media_root: PathBuf,
    /// Public prefix of stored media files
    pub media_url: String,
}

impl AppState {
    /// Wire the SeaORM-backed services over `database`.
    pub fn from_config(database: Arc<Database>, config: Config) -> Self {
        let media_root = PathBuf::from(&config.media_root);
        let media_url = config.media_url.clone();
        let services = Services::from_connection(database.get_connection(), config);
        Self::new(&services, database, media_root, media_url)
    }

    /// Build state from any service container (router tests pass mocks).
    pub fn new(
        services: &dyn ServiceContainer,
        database: Arc<Database>,
        media_root: impl Into<PathBuf>,
        media_url: impl Into<String>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            account_service: services.accounts(),
            project_service: services.projects(),
            evidence_service: services.evidence(),
            transaction_service: services.transactions(),
            wallet_service: services.wallets(),
            admin_service: services.admin(),
            database,
            media_root: media_root.into(),
            media_url: media_url.into(),
        }
    }
}
