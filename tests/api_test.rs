//! Router tests.
//!
//! Requests go through the full axum router with mocked services, so
//! routing, authentication, extraction and error mapping are exercised
//! without a database.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use mockall::predicate::eq;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use carbon_market::api::{create_router, AppState};
use carbon_market::domain::{CreditWallet, User, UserRole};
use carbon_market::errors::AppError;
use carbon_market::infra::Database;
use carbon_market::services::{
    Actor, AccountService, AdminService, AuthService, Claims, EvidenceService, MockAccountService,
    MockAdminService, MockAuthService, MockEvidenceService, MockProjectService,
    MockServiceContainer, MockTransactionService, MockWalletService, ProjectService,
    TokenResponse, TransactionService, WalletService,
};
use carbon_market::types::Paginated;

const ADMIN_TOKEN: &str = "admin-token";
const BUYER_TOKEN: &str = "buyer-token";

fn admin_id() -> Uuid {
    Uuid::from_u128(1)
}

fn buyer_id() -> Uuid {
    Uuid::from_u128(2)
}

/// One mock per service; tests set expectations before building the router
#[derive(Default)]
struct Mocks {
    auth: MockAuthService,
    accounts: MockAccountService,
    projects: MockProjectService,
    evidence: MockEvidenceService,
    transactions: MockTransactionService,
    wallets: MockWalletService,
    admin: MockAdminService,
}

impl Mocks {
    /// Mocks whose auth service accepts the two test tokens
    fn authenticated() -> Self {
        let mut mocks = Self::default();
        mocks.auth.expect_verify_token().returning(|token| {
            let (sub, username, role) = match token {
                ADMIN_TOKEN => (admin_id(), "admin", UserRole::Administrator),
                BUYER_TOKEN => (buyer_id(), "buyer", UserRole::CreditBuyer),
                _ => return Err(AppError::Unauthorized),
            };
            let now = Utc::now().timestamp();
            Ok(Claims {
                sub,
                username: username.to_string(),
                role,
                exp: now + 3600,
                iat: now,
            })
        });
        mocks
    }

    fn into_router(self) -> Router {
        let auth: Arc<dyn AuthService> = Arc::new(self.auth);
        let accounts: Arc<dyn AccountService> = Arc::new(self.accounts);
        let projects: Arc<dyn ProjectService> = Arc::new(self.projects);
        let evidence: Arc<dyn EvidenceService> = Arc::new(self.evidence);
        let transactions: Arc<dyn TransactionService> = Arc::new(self.transactions);
        let wallets: Arc<dyn WalletService> = Arc::new(self.wallets);
        let admin: Arc<dyn AdminService> = Arc::new(self.admin);

        let mut container = MockServiceContainer::new();
        container.expect_auth().return_const(auth);
        container.expect_accounts().return_const(accounts);
        container.expect_projects().return_const(projects);
        container.expect_evidence().return_const(evidence);
        container.expect_transactions().return_const(transactions);
        container.expect_wallets().return_const(wallets);
        container.expect_admin().return_const(admin);

        let database = Arc::new(Database::from_connection(DatabaseConnection::Disconnected));
        create_router(AppState::new(&container, database, "media", "/media/"))
    }
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn test_user(id: Uuid, username: &str) -> User {
    User::new(
        id,
        username.to_string(),
        format!("{}@example.com", username),
        "hashed".to_string(),
    )
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_health_reports_unavailable_database() {
    let app = Mocks::default().into_router();

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["database"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_register_returns_created_account() {
    let mut mocks = Mocks::default();
    mocks
        .auth
        .expect_register()
        .withf(|r| r.username == "greenfields" && r.role == Some(UserRole::CreditBuyer))
        .returning(|r| {
            let mut user = test_user(Uuid::new_v4(), &r.username);
            user.role = UserRole::CreditBuyer;
            Ok(user)
        });
    let app = mocks.into_router();

    let response = app
        .oneshot(post_json(
            "/auth/register",
            None,
            json!({
                "username": "  greenfields ",
                "email": "greenfields@example.com",
                "password": "long-enough-password",
                "first_name": "Green",
                "role": "credit_buyer"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["username"], "greenfields");
    assert_eq!(body["role"], "credit_buyer");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_register_rejects_short_password_before_service() {
    // No register expectation: reaching the service would panic
    let app = Mocks::default().into_router();

    let response = app
        .oneshot(post_json(
            "/auth/register",
            None,
            json!({
                "username": "greenfields",
                "email": "greenfields@example.com",
                "password": "short"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_returns_token() {
    let mut mocks = Mocks::default();
    mocks
        .auth
        .expect_login()
        .with(eq("greenfields".to_string()), eq("secret-password".to_string()))
        .returning(|_, _| {
            Ok(TokenResponse {
                access_token: "jwt".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: 86400,
            })
        });
    let app = mocks.into_router();

    let response = app
        .oneshot(post_json(
            "/auth/login",
            None,
            json!({"username": "greenfields", "password": "secret-password"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["access_token"], "jwt");
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn test_login_with_bad_credentials_is_unauthorized() {
    let mut mocks = Mocks::default();
    mocks
        .auth
        .expect_login()
        .returning(|_, _| Err(AppError::InvalidCredentials));
    let app = mocks.into_router();

    let response = app
        .oneshot(post_json(
            "/auth/login",
            None,
            json!({"username": "greenfields", "password": "wrong"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    for uri in ["/accounts/me", "/projects", "/wallet", "/admin", "/transactions"] {
        let app = Mocks::default().into_router();
        let response = app.oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let app = Mocks::authenticated().into_router();

    let response = app
        .oneshot(get("/accounts/me", Some("forged")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_current_account_uses_token_subject() {
    let mut mocks = Mocks::authenticated();
    mocks
        .accounts
        .expect_get()
        .with(eq(Actor::new(buyer_id(), UserRole::CreditBuyer)), eq(buyer_id()))
        .returning(|_, id| Ok(test_user(id, "buyer")));
    let app = mocks.into_router();

    let response = app
        .oneshot(get("/accounts/me", Some(BUYER_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], buyer_id().to_string());
    assert_eq!(body["username"], "buyer");
}

// =============================================================================
// Wallets
// =============================================================================

#[tokio::test]
async fn test_own_wallet_includes_net_worth() {
    let mut mocks = Mocks::authenticated();
    mocks
        .wallets
        .expect_wallet()
        .withf(|actor, user_id| actor.id == buyer_id() && *user_id == buyer_id())
        .returning(|_, user_id| Ok(CreditWallet::new(user_id)));
    let app = mocks.into_router();

    let response = app.oneshot(get("/wallet", Some(BUYER_TOKEN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user_id"], buyer_id().to_string());
    assert_eq!(body["total_credits"], 0);
    assert!(body.get("net_worth").is_some());
}

#[tokio::test]
async fn test_retire_rejects_zero_credits() {
    let app = Mocks::authenticated().into_router();

    let response = app
        .oneshot(post_json(
            "/wallet/retire",
            Some(BUYER_TOKEN),
            json!({"credit_amount": 0}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_retire_surfaces_insufficient_balance() {
    let mut mocks = Mocks::authenticated();
    mocks
        .wallets
        .expect_retire()
        .withf(|_, user_id, amount| *user_id == buyer_id() && *amount == 50)
        .returning(|_, _, _| Err(AppError::validation("Not enough available credits")));
    let app = mocks.into_router();

    let response = app
        .oneshot(post_json(
            "/wallet/retire",
            Some(BUYER_TOKEN),
            json!({"credit_amount": 50}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["message"], "Not enough available credits");
}

#[tokio::test]
async fn test_holding_price_beyond_column_is_rejected_before_service() {
    // No wallet expectations: reaching the service would panic the mock
    let app = Mocks::authenticated().into_router();

    let response = app
        .oneshot(post_json(
            &format!("/wallets/{}/holdings", buyer_id()),
            Some(ADMIN_TOKEN),
            json!({
                "project_id": Uuid::new_v4(),
                "credit_amount": 1000000000,
                "purchase_price": "10000000000000000000000"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"]["message"],
        "Price allows at most 8 digits before the decimal point"
    );
}

#[tokio::test]
async fn test_sale_proceeds_with_fractional_cents_are_rejected() {
    let app = Mocks::authenticated().into_router();

    let response = app
        .oneshot(post_json(
            &format!("/wallets/{}/sales", buyer_id()),
            Some(ADMIN_TOKEN),
            json!({"credit_amount": 1, "proceeds": "10.005"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Admin listings
// =============================================================================

#[tokio::test]
async fn test_admin_listing_forwards_query() {
    let mut mocks = Mocks::authenticated();
    mocks
        .admin
        .expect_list()
        .withf(|actor, model, query| {
            actor.is_admin()
                && model == "projects"
                && query.search.as_deref() == Some("mangrove")
                && query.filters.get("status").map(String::as_str) == Some("active")
                && query.pagination.page == 2
        })
        .returning(|_, _, query| {
            Ok(Paginated::from_page(
                vec![json!({"id": Uuid::nil(), "title": "Mangrove restoration"})],
                21,
                &query.pagination,
            ))
        });
    let app = mocks.into_router();

    let response = app
        .oneshot(get(
            "/admin/projects?q=mangrove&status=active&page=2",
            Some(ADMIN_TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["title"], "Mangrove restoration");
    assert_eq!(body["meta"]["total"], 21);
}

#[tokio::test]
async fn test_admin_listing_rejects_malformed_page() {
    let app = Mocks::authenticated().into_router();

    let response = app
        .oneshot(get("/admin/projects?page=two", Some(ADMIN_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_models_forbidden_for_buyers() {
    let mut mocks = Mocks::authenticated();
    mocks
        .admin
        .expect_models()
        .returning(|_| Err(AppError::Forbidden));
    let app = mocks.into_router();

    let response = app.oneshot(get("/admin", Some(BUYER_TOKEN))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
