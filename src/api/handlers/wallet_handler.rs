//! Wallet handlers.
//!
//! `/wallet` is the caller's own wallet. `/wallets/{user_id}` lets admins
//! inspect any wallet and book purchases and sales against it.

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::validators;
use crate::api::AppState;
use crate::domain::{CreditHolding, WalletResponse};
use crate::errors::AppResult;
use crate::services::HoldingReceipt;
use crate::types::Created;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RetireRequest {
    #[validate(range(min = 1, message = "Credit amount must be at least 1"))]
    #[schema(example = 25)]
    pub credit_amount: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordHoldingRequest {
    pub project_id: Uuid,
    #[validate(range(min = 1, message = "Credit amount must be at least 1"))]
    pub credit_amount: i64,
    /// Price per credit
    #[validate(custom(function = "validators::price"))]
    #[schema(example = "5.00")]
    pub purchase_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RecordSaleRequest {
    #[validate(range(min = 1, message = "Credit amount must be at least 1"))]
    pub credit_amount: i64,
    #[validate(custom(function = "validators::wallet_amount"))]
    #[schema(example = "120.00")]
    pub proceeds: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HoldingReceiptResponse {
    pub wallet: WalletResponse,
    pub holding: CreditHolding,
}

impl From<HoldingReceipt> for HoldingReceiptResponse {
    fn from(receipt: HoldingReceipt) -> Self {
        Self {
            wallet: WalletResponse::from(receipt.wallet),
            holding: receipt.holding,
        }
    }
}

/// The caller's own wallet
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_my_wallet))
        .route("/holdings", get(get_my_holdings))
        .route("/retire", post(retire_my_credits))
}

/// Any wallet by owner (admin bookings)
pub fn wallet_admin_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_wallet))
        .route("/:user_id/holdings", get(get_holdings).post(record_holding))
        .route("/:user_id/sales", post(record_sale))
}

/// Get the caller's wallet
#[utoipa::path(
    get,
    path = "/wallet",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Wallet, created empty on first access", body = WalletResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_my_wallet(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<WalletResponse>> {
    let wallet = state
        .wallet_service
        .wallet(current_user.actor(), current_user.id)
        .await?;
    Ok(Json(WalletResponse::from(wallet)))
}

/// List the caller's holdings
#[utoipa::path(
    get,
    path = "/wallet/holdings",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Holdings, most recent first", body = Vec<CreditHolding>)
    )
)]
pub async fn get_my_holdings(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CreditHolding>>> {
    let holdings = state
        .wallet_service
        .holdings(current_user.actor(), current_user.id)
        .await?;
    Ok(Json(holdings))
}

/// Retire credits from the caller's wallet
#[utoipa::path(
    post,
    path = "/wallet/retire",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    request_body = RetireRequest,
    responses(
        (status = 200, description = "Credits retired", body = WalletResponse),
        (status = 400, description = "Not enough available credits")
    )
)]
pub async fn retire_my_credits(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RetireRequest>,
) -> AppResult<Json<WalletResponse>> {
    let wallet = state
        .wallet_service
        .retire(current_user.actor(), current_user.id, payload.credit_amount)
        .await?;
    Ok(Json(WalletResponse::from(wallet)))
}

/// Get a user's wallet (owner or admin)
#[utoipa::path(
    get,
    path = "/wallets/{user_id}",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Wallet", body = WalletResponse),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_wallet(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<WalletResponse>> {
    let wallet = state
        .wallet_service
        .wallet(current_user.actor(), user_id)
        .await?;
    Ok(Json(WalletResponse::from(wallet)))
}

/// List a user's holdings (owner or admin)
#[utoipa::path(
    get,
    path = "/wallets/{user_id}/holdings",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "Wallet owner")),
    responses(
        (status = 200, description = "Holdings", body = Vec<CreditHolding>),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_holdings(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<CreditHolding>>> {
    let holdings = state
        .wallet_service
        .holdings(current_user.actor(), user_id)
        .await?;
    Ok(Json(holdings))
}

/// Book purchased credits into a wallet (admin only)
#[utoipa::path(
    post,
    path = "/wallets/{user_id}/holdings",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "Wallet owner")),
    request_body = RecordHoldingRequest,
    responses(
        (status = 201, description = "Holding recorded", body = HoldingReceiptResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn record_holding(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RecordHoldingRequest>,
) -> AppResult<Created<HoldingReceiptResponse>> {
    let receipt = state
        .wallet_service
        .record_holding(
            current_user.actor(),
            user_id,
            payload.project_id,
            payload.credit_amount,
            payload.purchase_price,
        )
        .await?;
    Ok(Created(receipt.into()))
}

/// Book sold credits out of a wallet (admin only)
#[utoipa::path(
    post,
    path = "/wallets/{user_id}/sales",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "Wallet owner")),
    request_body = RecordSaleRequest,
    responses(
        (status = 200, description = "Sale recorded", body = WalletResponse),
        (status = 400, description = "Not enough available credits"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn record_sale(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RecordSaleRequest>,
) -> AppResult<Json<WalletResponse>> {
    let wallet = state
        .wallet_service
        .record_sale(
            current_user.actor(),
            user_id,
            payload.credit_amount,
            payload.proceeds,
        )
        .await?;
    Ok(Json(WalletResponse::from(wallet)))
}
