//! Query helpers shared by the SeaORM-backed stores.
//!
//! Each helper takes any `ConnectionTrait` so the same code runs against a
//! pooled connection or inside a unit-of-work transaction.

use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, Select};

use crate::errors::AppResult;
use crate::types::PaginationParams;

/// Fetch one page of a query together with the total row count.
pub(crate) async fn fetch_page<C, E>(
    conn: &C,
    query: Select<E>,
    params: &PaginationParams,
) -> AppResult<(Vec<E::Model>, u64)>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = query.paginate(conn, params.limit());
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(params.page_index()).await?;
    Ok((data, total))
}

/// Map a page of models into domain values.
pub(crate) fn map_page<M, T: From<M>>((models, total): (Vec<M>, u64)) -> (Vec<T>, u64) {
    (models.into_iter().map(T::from).collect(), total)
}
