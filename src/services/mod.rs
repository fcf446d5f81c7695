//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion, and receive the calling [`Actor`] so access rules
//! live next to the use case rather than in the handlers.
//!
//! All services use the Unit of Work for repository access and
//! transaction management.

mod account_service;
mod admin_service;
mod auth_service;
pub mod container;
mod evidence_service;
mod project_service;
mod transaction_service;
mod wallet_service;

#[cfg(test)]
pub(crate) mod testing;

use uuid::Uuid;

use crate::domain::UserRole;
use crate::errors::{AppError, AppResult};

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use account_service::{AccountManager, AccountService};
pub use admin_service::{AdminManager, AdminService};
pub use auth_service::{AuthService, Authenticator, Claims, Registration, TokenResponse};
pub use evidence_service::{EvidenceManager, EvidenceService, RevisionUpload};
pub use project_service::{
    DocumentUpload, ImageUpload, ProjectDetail, ProjectManager, ProjectService,
};
pub use transaction_service::{StatusChange, TransactionManager, TransactionService};
pub use wallet_service::{HoldingReceipt, WalletManager, WalletService};

// Mocks for router tests
#[cfg(any(test, feature = "test-utils"))]
pub use account_service::MockAccountService;
#[cfg(any(test, feature = "test-utils"))]
pub use admin_service::MockAdminService;
#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;
#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use evidence_service::MockEvidenceService;
#[cfg(any(test, feature = "test-utils"))]
pub use project_service::MockProjectService;
#[cfg(any(test, feature = "test-utils"))]
pub use transaction_service::MockTransactionService;
#[cfg(any(test, feature = "test-utils"))]
pub use wallet_service::MockWalletService;

/// The authenticated caller of a use case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_review(&self) -> bool {
        self.role.can_review()
    }

    /// Forbidden unless the actor is an administrator
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Forbidden unless the actor is a verifier or administrator
    pub fn require_reviewer(&self) -> AppResult<()> {
        if self.can_review() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Forbidden unless the actor is `owner` or an administrator
    pub fn require_owner_or_admin(&self, owner: Uuid) -> AppResult<()> {
        if self.id == owner || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_checks() {
        let owner = Uuid::new_v4();
        let dev = Actor::new(owner, UserRole::ProjectDeveloper);
        let verifier = Actor::new(Uuid::new_v4(), UserRole::Verifier);
        let admin = Actor::new(Uuid::new_v4(), UserRole::Administrator);

        assert!(dev.require_owner_or_admin(owner).is_ok());
        assert!(verifier.require_owner_or_admin(owner).is_err());
        assert!(admin.require_owner_or_admin(owner).is_ok());

        assert!(matches!(dev.require_reviewer(), Err(AppError::Forbidden)));
        assert!(verifier.require_reviewer().is_ok());
        assert!(verifier.require_admin().is_err());
        assert!(admin.require_admin().is_ok());
    }
}
