//! Domain layer - Core business entities and logic
//!
//! Accounts, projects, evidence, transactions and wallets, independent of
//! persistence and HTTP concerns.

mod choices;

pub mod account;
pub mod evidence;
pub mod media;
pub mod money;
pub mod password;
pub mod project;
pub mod transaction;
pub mod wallet;

pub use account::{
    validate_mobile, NewUser, ProfileUpdate, User, UserResponse, UserRole, MOBILE_REGEX,
};
pub use evidence::{
    next_revision_number, Evidence, EvidenceChanges, EvidenceComment, EvidenceResponse,
    EvidenceRevision, EvidenceStatus, EvidenceType, FileSlot, NewEvidence, NewRevision,
    RevisionResponse,
};
pub use media::{StoredFile, UploadDir};
pub use money::{add_money, ensure_money};
pub use password::Password;
pub use project::{
    progress_percentage, NewProject, Project, ProjectCategory, ProjectChanges, ProjectDocument,
    ProjectImage, ProjectResponse, ProjectStatus,
};
pub use transaction::{
    NewTransaction, Transaction, TransactionDraft, TransactionId, TransactionResponse,
    TransactionStatus, TransactionType,
};
pub use wallet::{CreditHolding, CreditWallet, WalletResponse};
