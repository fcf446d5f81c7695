//! Admin listing handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use sea_orm::JsonValue;
use std::collections::HashMap;

use crate::admin::{AdminQuery, ModelSummary};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::types::Paginated;

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_models))
        .route("/:model", get(list_rows))
}

/// Registered tables with their listing configuration (admin only)
#[utoipa::path(
    get,
    path = "/admin",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Administered tables", body = Vec<ModelSummary>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_models(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ModelSummary>>> {
    let models = state.admin_service.models(current_user.actor())?;
    Ok(Json(models))
}

/// One page of a table.
///
/// `q` searches the configured fields, `o` orders by a display field
/// (`-` for descending), `page`/`per_page` paginate, and any other
/// parameter filters on a configured filter field.
#[utoipa::path(
    get,
    path = "/admin/{model}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(
        ("model" = String, Path, description = "Table slug, e.g. credit_holdings"),
        ("q" = Option<String>, Query, description = "Search text"),
        ("o" = Option<String>, Query, description = "Ordering field")
    ),
    responses(
        (status = 200, description = "Rows keyed by display field, with pagination meta"),
        (status = 400, description = "Unknown filter or malformed value"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "Unknown table")
    )
)]
pub async fn list_rows(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(model): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Paginated<JsonValue>>> {
    let query = AdminQuery::from_params(params)?;
    let page = state
        .admin_service
        .list(current_user.actor(), model, query)
        .await?;
    Ok(Json(page))
}
