//! Infrastructure layer - External systems integration
//!
//! - Database connection, migrations and repositories
//! - Unit of Work for transaction management
//! - Media file storage

pub mod db;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

#[cfg(test)]
pub(crate) mod testing;

pub use db::{Database, MigrationState, Migrator};
pub use repositories::{
    AccountRepository, AccountStore, AdminRepository, AdminStore, EvidenceFilter,
    EvidenceRepository, EvidenceStore, ProjectFilter, ProjectRepository, ProjectStore,
    TransactionFilter, TransactionRepository, TransactionStore, WalletRepository, WalletStore,
};
pub use storage::{MediaStorage, Upload};
pub use unit_of_work::{
    Persistence, TransactionContext, TxEvidenceRepository, TxFuture, TxProjectRepository,
    TxWalletRepository, UnitOfWork,
};
