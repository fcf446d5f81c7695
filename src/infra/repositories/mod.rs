//! Repository layer - Data access abstraction
//!
//! Repositories provide an abstraction over data persistence,
//! following the Repository pattern for clean separation of concerns.
//! Multi-row writes live on the unit of work's transaction context.

mod account_repository;
mod admin_repository;
mod base;
pub(crate) mod entities;
mod evidence_repository;
mod project_repository;
mod transaction_repository;
mod wallet_repository;

pub use account_repository::{AccountRepository, AccountStore};
pub use admin_repository::{AdminRepository, AdminStore};
pub use evidence_repository::{EvidenceFilter, EvidenceRepository, EvidenceStore};
pub use project_repository::{ProjectFilter, ProjectRepository, ProjectStore};
pub use transaction_repository::{TransactionFilter, TransactionRepository, TransactionStore};
pub use wallet_repository::{WalletRepository, WalletStore};

pub(crate) use base::{fetch_page, map_page};
pub(crate) use evidence_repository::{
    find_evidence, insert_revision, latest_revision_number, save_evidence,
};
pub(crate) use project_repository::{clear_primary_images, find_project, insert_image, save_project};
pub(crate) use wallet_repository::{
    find_wallet, insert_holding, insert_wallet_if_missing, save_wallet,
};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use account_repository::MockAccountRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use admin_repository::MockAdminRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use evidence_repository::MockEvidenceRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use project_repository::MockProjectRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use transaction_repository::MockTransactionRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use wallet_repository::MockWalletRepository;
