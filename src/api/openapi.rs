//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::admin::ModelSummary;
use crate::api::handlers::{
    account_handler, admin_handler, auth_handler, evidence_handler, project_handler,
    transaction_handler, wallet_handler,
};
use crate::domain::{
    CreditHolding, EvidenceComment, EvidenceResponse, EvidenceStatus, EvidenceType,
    ProjectCategory, ProjectResponse, ProjectStatus, RevisionResponse, StoredFile,
    TransactionResponse, TransactionStatus, TransactionType, UserResponse, UserRole,
    WalletResponse,
};
use crate::services::TokenResponse;
use crate::types::{
    PaginatedEvidence, PaginatedProjects, PaginatedTransactions, PaginatedUsers, PaginationMeta,
};

/// OpenAPI documentation for the carbon credit marketplace
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Carbon Market API",
        version = "0.1.0",
        description = "Carbon credit projects, verification evidence, credit trading and wallets",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Authentication
        auth_handler::register,
        auth_handler::login,
        // Accounts
        account_handler::get_current_account,
        account_handler::update_current_account,
        account_handler::list_accounts,
        account_handler::get_account,
        account_handler::update_account,
        account_handler::deactivate_account,
        account_handler::activate_account,
        // Projects
        project_handler::list_projects,
        project_handler::create_project,
        project_handler::get_project,
        project_handler::update_project,
        project_handler::delete_project,
        project_handler::change_project_status,
        project_handler::issue_credits,
        project_handler::upload_image,
        project_handler::upload_document,
        // Evidence
        evidence_handler::list_evidence,
        evidence_handler::submit_evidence,
        evidence_handler::get_evidence,
        evidence_handler::update_evidence,
        evidence_handler::delete_evidence,
        evidence_handler::upload_evidence_file,
        evidence_handler::review_evidence,
        evidence_handler::list_comments,
        evidence_handler::add_comment,
        evidence_handler::list_revisions,
        evidence_handler::add_revision,
        // Transactions
        transaction_handler::list_transactions,
        transaction_handler::create_transaction,
        transaction_handler::get_transaction,
        transaction_handler::update_transaction_status,
        // Wallets
        wallet_handler::get_my_wallet,
        wallet_handler::get_my_holdings,
        wallet_handler::retire_my_credits,
        wallet_handler::get_wallet,
        wallet_handler::get_holdings,
        wallet_handler::record_holding,
        wallet_handler::record_sale,
        // Admin
        admin_handler::list_models,
        admin_handler::list_rows,
    ),
    components(
        schemas(
            // Choices
            UserRole,
            ProjectCategory,
            ProjectStatus,
            EvidenceType,
            EvidenceStatus,
            TransactionType,
            TransactionStatus,
            // Responses
            UserResponse,
            ProjectResponse,
            EvidenceResponse,
            EvidenceComment,
            RevisionResponse,
            TransactionResponse,
            WalletResponse,
            CreditHolding,
            StoredFile,
            ModelSummary,
            TokenResponse,
            PaginationMeta,
            PaginatedUsers,
            PaginatedProjects,
            PaginatedEvidence,
            PaginatedTransactions,
            // Requests
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            account_handler::UpdateAccountRequest,
            project_handler::CreateProjectRequest,
            project_handler::UpdateProjectRequest,
            project_handler::ProjectStatusRequest,
            project_handler::IssueCreditsRequest,
            project_handler::ImageUploadForm,
            project_handler::DocumentUploadForm,
            project_handler::ImageResponse,
            project_handler::DocumentResponse,
            project_handler::ProjectDetailResponse,
            evidence_handler::SubmitEvidenceRequest,
            evidence_handler::UpdateEvidenceRequest,
            evidence_handler::ReviewRequest,
            evidence_handler::CommentRequest,
            evidence_handler::EvidenceFileForm,
            evidence_handler::RevisionForm,
            transaction_handler::CreateTransactionRequest,
            transaction_handler::TransactionStatusRequest,
            wallet_handler::RetireRequest,
            wallet_handler::RecordHoldingRequest,
            wallet_handler::RecordSaleRequest,
            wallet_handler::HoldingReceiptResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Accounts", description = "Profiles and account administration"),
        (name = "Projects", description = "Carbon projects, media and credit issuance"),
        (name = "Evidence", description = "Verification evidence and review"),
        (name = "Transactions", description = "Credit purchases, sales and retirements"),
        (name = "Wallets", description = "Credit balances and holdings"),
        (name = "Admin", description = "Table listings for administrators")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_protected_paths() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/auth/login"));
        assert!(doc.paths.paths.contains_key("/projects/{id}/credits"));
        assert!(doc.paths.paths.contains_key("/evidence/{id}/review"));
        assert!(doc.paths.paths.contains_key("/wallet/retire"));
        assert!(doc.paths.paths.contains_key("/admin/{model}"));
    }

    #[test]
    fn test_openapi_registers_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");

        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("PaginatedProjects"));
    }
}
