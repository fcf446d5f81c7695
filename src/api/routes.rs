//! Application route configuration.

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    account_routes, admin_routes, auth_routes, evidence_routes, project_routes,
    transaction_routes, wallet_admin_routes, wallet_routes,
};
use super::middleware::auth_middleware;
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::MAX_UPLOAD_BYTES;

/// Multipart framing on top of the largest accepted file
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let protected = |routes: Router<AppState>| {
        routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public authentication routes
        .nest("/auth", auth_routes())
        // Protected routes (require JWT)
        .nest("/accounts", protected(account_routes()))
        .nest("/projects", protected(project_routes()))
        .nest("/evidence", protected(evidence_routes()))
        .nest("/transactions", protected(transaction_routes()))
        .nest("/wallet", protected(wallet_routes()))
        .nest("/wallets", protected(wallet_admin_routes()))
        .nest("/admin", protected(admin_routes()))
        // Uploaded files
        .nest_service("/media", ServeDir::new(&state.media_root))
        // Global middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + BODY_LIMIT_SLACK))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Carbon Market API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    services: ServiceHealth,
}

/// Individual service health status
#[derive(Serialize)]
struct ServiceHealth {
    database: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, status_code) = match state.database.ping().await {
        Ok(_) => (
            ServiceStatus {
                status: "healthy",
                error: None,
            },
            StatusCode::OK,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            (
                ServiceStatus {
                    status: "unhealthy",
                    error: Some(e.to_string()),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK {
            "healthy"
        } else {
            "degraded"
        },
        services: ServiceHealth { database },
    };

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::infra::Database;
    use crate::services::{
        MockAccountService, MockAdminService, MockAuthService, MockEvidenceService,
        MockProjectService, MockServiceContainer, MockTransactionService, MockWalletService,
    };

    fn app() -> Router {
        let mut services = MockServiceContainer::new();
        services
            .expect_auth()
            .returning(|| Arc::new(MockAuthService::new()));
        services
            .expect_accounts()
            .returning(|| Arc::new(MockAccountService::new()));
        services
            .expect_projects()
            .returning(|| Arc::new(MockProjectService::new()));
        services
            .expect_evidence()
            .returning(|| Arc::new(MockEvidenceService::new()));
        services
            .expect_transactions()
            .returning(|| Arc::new(MockTransactionService::new()));
        services
            .expect_wallets()
            .returning(|| Arc::new(MockWalletService::new()));
        services
            .expect_admin()
            .returning(|| Arc::new(MockAdminService::new()));

        let database = Arc::new(Database::from_connection(DatabaseConnection::Disconnected));
        create_router(AppState::new(&services, database, "media", "/media/"))
    }

    #[tokio::test]
    async fn test_root() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Carbon Market API");
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_missing_bearer_token() {
        let response = app()
            .oneshot(
                Request::get("/projects")
                    .header("authorization", "Basic abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::get("/nowhere").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
