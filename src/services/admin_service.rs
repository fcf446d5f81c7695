//! Admin service - Read-only listings of every registered table.

use async_trait::async_trait;
use sea_orm::JsonValue;
use std::sync::Arc;

use super::Actor;
use crate::admin::{self, registry, AdminQuery, ModelSummary};
use crate::errors::{AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::Paginated;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AdminService: Send + Sync {
    /// Registered tables and their listing configuration
    fn models(&self, actor: Actor) -> AppResult<Vec<ModelSummary>>;

    /// One page of `model` rows (unknown model is not found)
    async fn list(
        &self,
        actor: Actor,
        model: String,
        query: AdminQuery,
    ) -> AppResult<Paginated<JsonValue>>;
}

pub struct AdminManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> AdminManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> AdminService for AdminManager<U> {
    fn models(&self, actor: Actor) -> AppResult<Vec<ModelSummary>> {
        actor.require_admin()?;
        Ok(admin::MODELS.iter().map(|m| m.summary()).collect())
    }

    async fn list(
        &self,
        actor: Actor,
        model: String,
        query: AdminQuery,
    ) -> AppResult<Paginated<JsonValue>> {
        actor.require_admin()?;
        let model = registry::find(&model).ok_or_not_found()?;
        let listing = admin::query::build(model, &query)?;

        tracing::debug!(model = model.name, search = ?query.search, "Admin listing");
        let (rows, total) = self.uow.admin().fetch(listing.rows, listing.count).await?;
        Ok(Paginated::from_page(rows, total, &query.pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use crate::errors::AppError;
    use crate::infra::repositories::MockAdminRepository;
    use crate::services::testing::{actor, TestUnitOfWork};
    use sea_orm::sea_query::PostgresQueryBuilder;
    use serde_json::json;

    #[test]
    fn test_models_are_admin_only() {
        let service = AdminManager::new(Arc::new(TestUnitOfWork::default()));
        assert!(matches!(
            service.models(actor(UserRole::Verifier)),
            Err(AppError::Forbidden)
        ));

        let models = service.models(actor(UserRole::Administrator)).unwrap();
        assert_eq!(models.len(), admin::MODELS.len());
        assert!(models.iter().any(|m| m.name == "evidence_revisions"));
    }

    #[tokio::test]
    async fn test_list_runs_built_statements() {
        let mut repo = MockAdminRepository::new();
        repo.expect_fetch()
            .withf(|rows, _| {
                rows.to_string(PostgresQueryBuilder)
                    .contains(r#"LOWER("projects"."title") LIKE '%forest%'"#)
            })
            .times(1)
            .returning(|_, _| Ok((vec![json!({"title": "Forest"})], 41)));

        let service = AdminManager::new(Arc::new(TestUnitOfWork::default().with_admin(repo)));
        let query = AdminQuery {
            search: Some("Forest".into()),
            ..Default::default()
        };
        let page = service
            .list(actor(UserRole::Administrator), "projects".into(), query)
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.total, 41);
        assert_eq!(page.meta.total_pages, 3);
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let service = AdminManager::new(Arc::new(TestUnitOfWork::default()));
        let result = service
            .list(
                actor(UserRole::Administrator),
                "sessions".into(),
                AdminQuery::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_list_is_admin_only() {
        let service = AdminManager::new(Arc::new(TestUnitOfWork::default()));
        let result = service
            .list(
                actor(UserRole::ProjectDeveloper),
                "users".into(),
                AdminQuery::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden)));
    }
}
