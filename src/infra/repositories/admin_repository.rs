//! Raw listing queries for the admin views.

use async_trait::async_trait;
use sea_orm::sea_query::SelectStatement;
use sea_orm::{ConnectionTrait, DatabaseConnection, FromQueryResult, JsonValue};

use crate::errors::AppResult;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AdminRepository: Send + Sync {
    /// Run a listing: its page of rows as JSON objects and the total count
    async fn fetch(
        &self,
        rows: SelectStatement,
        count: SelectStatement,
    ) -> AppResult<(Vec<JsonValue>, u64)>;
}

pub struct AdminStore {
    db: DatabaseConnection,
}

impl AdminStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AdminRepository for AdminStore {
    async fn fetch(
        &self,
        rows: SelectStatement,
        count: SelectStatement,
    ) -> AppResult<(Vec<JsonValue>, u64)> {
        let backend = self.db.get_database_backend();

        let total = match self.db.query_one(backend.build(&count)).await? {
            Some(row) => row.try_get::<i64>("", "count")?.max(0) as u64,
            None => 0,
        };
        let data = JsonValue::find_by_statement(backend.build(&rows))
            .all(&self.db)
            .await?;

        Ok((data, total))
    }
}
