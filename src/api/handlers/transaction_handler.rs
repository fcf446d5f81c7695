//! Transaction handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::validators;
use crate::api::AppState;
use crate::domain::{TransactionDraft, TransactionResponse, TransactionStatus, TransactionType};
use crate::errors::AppResult;
use crate::infra::TransactionFilter;
use crate::services::StatusChange;
use crate::types::{Created, Paginated, PaginatedTransactions, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTransactionRequest {
    /// Generated as `TXN-XXXXXXXX` when omitted
    #[schema(example = "TXN-A1B2C3D4")]
    pub transaction_id: Option<String>,
    pub transaction_type: TransactionType,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub project_id: Uuid,
    #[validate(range(min = 1, message = "Credit amount must be at least 1"))]
    #[schema(example = 10)]
    pub credit_amount: i64,
    #[validate(custom(function = "validators::price"))]
    #[schema(example = "5.00")]
    pub price_per_credit: Decimal,
    /// Computed as credit_amount x price_per_credit when omitted
    #[validate(custom(function = "validators::amount"))]
    pub total_amount: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
    #[validate(length(max = 128, message = "Blockchain hash is too long"))]
    pub blockchain_tx_hash: Option<String>,
}

impl From<CreateTransactionRequest> for TransactionDraft {
    fn from(req: CreateTransactionRequest) -> Self {
        Self {
            transaction_id: req.transaction_id,
            transaction_type: req.transaction_type,
            buyer_id: req.buyer_id,
            seller_id: req.seller_id,
            project_id: req.project_id,
            credit_amount: req.credit_amount,
            price_per_credit: req.price_per_credit,
            total_amount: req.total_amount,
            notes: req.notes,
            blockchain_tx_hash: req.blockchain_tx_hash,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransactionStatusRequest {
    pub status: TransactionStatus,
    /// Replaces the notes when present
    pub notes: Option<String>,
    #[validate(length(max = 128, message = "Blockchain hash is too long"))]
    pub blockchain_tx_hash: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TransactionListQuery {
    /// Buyer or seller (admins only; others always see their own)
    pub participant_id: Option<Uuid>,
    pub project_id: Option<Uuid>,
    pub status: Option<TransactionStatus>,
    pub transaction_type: Option<TransactionType>,
}

/// Create transaction routes
pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions).post(create_transaction))
        .route("/:id", get(get_transaction))
        .route("/:id/status", post(update_transaction_status))
}

/// List transactions
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(TransactionListQuery, PaginationParams),
    responses(
        (status = 200, description = "Transactions, most recent first", body = PaginatedTransactions)
    )
)]
pub async fn list_transactions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<TransactionResponse>>> {
    let filter = TransactionFilter {
        participant_id: query.participant_id,
        project_id: query.project_id,
        status: query.status,
        transaction_type: query.transaction_type,
    };
    let page = state
        .transaction_service
        .list(current_user.actor(), filter, params)
        .await?;
    Ok(Json(page.map(TransactionResponse::from)))
}

/// Record a transaction
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded", body = TransactionResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Caller is neither buyer nor seller"),
        (status = 409, description = "Transaction ID already exists")
    )
)]
pub async fn create_transaction(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateTransactionRequest>,
) -> AppResult<Created<TransactionResponse>> {
    let txn = state
        .transaction_service
        .create(current_user.actor(), payload.into())
        .await?;
    Ok(Created(TransactionResponse::from(txn)))
}

/// Get a transaction by ID or `TXN-` reference
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction UUID or TXN reference")),
    responses(
        (status = 200, description = "Transaction", body = TransactionResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<TransactionResponse>> {
    let txn = state
        .transaction_service
        .get(current_user.actor(), key)
        .await?;
    Ok(Json(TransactionResponse::from(txn)))
}

/// Change transaction status (admins; participants may cancel)
#[utoipa::path(
    post,
    path = "/transactions/{id}/status",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Transaction ID")),
    request_body = TransactionStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TransactionResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Invalid status transition")
    )
)]
pub async fn update_transaction_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<TransactionStatusRequest>,
) -> AppResult<Json<TransactionResponse>> {
    let change = StatusChange {
        status: payload.status,
        notes: payload.notes,
        blockchain_tx_hash: payload.blockchain_tx_hash,
    };
    let txn = state
        .transaction_service
        .update_status(current_user.actor(), id, change)
        .await?;
    Ok(Json(TransactionResponse::from(txn)))
}
