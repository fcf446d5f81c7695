//! Account handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{ProfileUpdate, UserResponse, UserRole};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginatedUsers, PaginationParams};

/// Profile update request. An empty string clears an optional field.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(example = "+919876543210")]
    pub mobile: Option<String>,
    /// Know-your-business document link
    #[schema(example = "https://example.com/kyb/greenfields")]
    pub kyb_link: Option<String>,
    #[validate(length(max = 128, message = "Firebase UID is too long"))]
    pub firebase_uid: Option<String>,
    pub is_project_proponent: Option<bool>,
    /// Admin only
    pub has_completed_kyc: Option<bool>,
    /// Admin only
    pub role: Option<UserRole>,
}

impl From<UpdateAccountRequest> for ProfileUpdate {
    fn from(req: UpdateAccountRequest) -> Self {
        Self {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            mobile: req.mobile,
            kyb_link: req.kyb_link,
            firebase_uid: req.firebase_uid,
            is_project_proponent: req.is_project_proponent,
            has_completed_kyc: req.has_completed_kyc,
            role: req.role,
        }
    }
}

/// Create account routes
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_accounts))
        .route("/me", get(get_current_account).put(update_current_account))
        .route("/:id", get(get_account).put(update_account))
        .route("/:id/deactivate", post(deactivate_account))
        .route("/:id/activate", post(activate_account))
}

/// Get the authenticated account
#[utoipa::path(
    get,
    path = "/accounts/me",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .account_service
        .get(current_user.actor(), current_user.id)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update the authenticated account
#[utoipa::path(
    put,
    path = "/accounts/me",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Admin-only field"),
        (status = 409, description = "Firebase UID already linked")
    )
)]
pub async fn update_current_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .account_service
        .update_profile(current_user.actor(), current_user.id, payload.into())
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// List accounts (admin only)
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "Accounts, newest first", body = PaginatedUsers),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_accounts(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state
        .account_service
        .list(current_user.actor(), params)
        .await?;
    Ok(Json(page.map(UserResponse::from)))
}

/// Get an account (own, or any for verifiers and admins)
#[utoipa::path(
    get,
    path = "/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.account_service.get(current_user.actor(), id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update an account (own, or any for admins)
#[utoipa::path(
    put,
    path = "/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .account_service
        .update_profile(current_user.actor(), id, payload.into())
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Deactivate an account (admin only, not yourself)
#[utoipa::path(
    post,
    path = "/accounts/{id}/deactivate",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated", body = UserResponse),
        (status = 400, description = "Cannot deactivate your own account"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn deactivate_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .account_service
        .set_active(current_user.actor(), id, false)
        .await?;
    Ok(Json(UserResponse::from(user)))
}

/// Reactivate an account (admin only)
#[utoipa::path(
    post,
    path = "/accounts/{id}/activate",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account activated", body = UserResponse),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn activate_account(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .account_service
        .set_active(current_user.actor(), id, true)
        .await?;
    Ok(Json(UserResponse::from(user)))
}
