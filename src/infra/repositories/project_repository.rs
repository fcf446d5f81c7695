//! Project repository, including project images and documents.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, map_page};
use super::entities::{project, project_document, project_image};
use crate::domain::{
    NewProject, Project, ProjectCategory, ProjectDocument, ProjectImage, ProjectStatus,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Optional narrowing for project listings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub category: Option<ProjectCategory>,
    pub proponent_id: Option<Uuid>,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>>;

    /// Projects matching the filter, newest first
    async fn list(
        &self,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Project>, u64)>;

    async fn create(&self, project: NewProject) -> AppResult<Project>;

    async fn save(&self, project: Project) -> AppResult<Project>;

    /// Delete a project; images, documents, evidence and holdings cascade
    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Images, most recently uploaded first
    async fn images(&self, project_id: Uuid) -> AppResult<Vec<ProjectImage>>;

    /// Documents, most recently uploaded first
    async fn documents(&self, project_id: Uuid) -> AppResult<Vec<ProjectDocument>>;

    async fn add_document(&self, document: ProjectDocument) -> AppResult<ProjectDocument>;
}

pub struct ProjectStore {
    db: DatabaseConnection,
}

impl ProjectStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for ProjectStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Project>> {
        find_project(&self.db, id).await
    }

    async fn list(
        &self,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<(Vec<Project>, u64)> {
        let mut query = project::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(project::Column::Status.eq(status.as_str()));
        }
        if let Some(category) = filter.category {
            query = query.filter(project::Column::Category.eq(category.as_str()));
        }
        if let Some(proponent_id) = filter.proponent_id {
            query = query.filter(project::Column::ProponentId.eq(proponent_id));
        }
        let query = query.order_by_desc(project::Column::CreatedAt);

        Ok(map_page(fetch_page(&self.db, query, &params).await?))
    }

    async fn create(&self, new: NewProject) -> AppResult<Project> {
        let now = Utc::now();
        let active_model = project::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(new.title),
            description: Set(new.description),
            category: Set(new.category.into()),
            proponent_id: Set(new.proponent_id),
            location: Set(new.location),
            latitude: Set(new.latitude),
            longitude: Set(new.longitude),
            estimated_credits: Set(new.estimated_credits),
            current_credits: Set(0),
            start_date: Set(new.start_date),
            end_date: Set(new.end_date),
            status: Set(ProjectStatus::default().into()),
            total_cost: Set(new.total_cost),
            funding_received: Set(new.funding_received),
            verifier_id: Set(None),
            verification_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Project::from(model))
    }

    async fn save(&self, project: Project) -> AppResult<Project> {
        save_project(&self.db, project).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = project::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn images(&self, project_id: Uuid) -> AppResult<Vec<ProjectImage>> {
        let models = project_image::Entity::find()
            .filter(project_image::Column::ProjectId.eq(project_id))
            .order_by_desc(project_image::Column::UploadedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(ProjectImage::from).collect())
    }

    async fn documents(&self, project_id: Uuid) -> AppResult<Vec<ProjectDocument>> {
        let models = project_document::Entity::find()
            .filter(project_document::Column::ProjectId.eq(project_id))
            .order_by_desc(project_document::Column::UploadedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(ProjectDocument::from).collect())
    }

    async fn add_document(&self, document: ProjectDocument) -> AppResult<ProjectDocument> {
        let active_model = project_document::ActiveModel {
            id: Set(document.id),
            project_id: Set(document.project_id),
            title: Set(document.title),
            document: Set(document.document.into_string()),
            document_type: Set(document.document_type),
            uploaded_at: Set(document.uploaded_at),
        };
        let model = active_model.insert(&self.db).await?;
        Ok(ProjectDocument::from(model))
    }
}

pub(crate) async fn find_project<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<Project>> {
    let result = project::Entity::find_by_id(id).one(conn).await?;
    Ok(result.map(Project::from))
}

pub(crate) async fn save_project<C: ConnectionTrait>(
    conn: &C,
    project: Project,
) -> AppResult<Project> {
    let existing = project::Entity::find_by_id(project.id)
        .one(conn)
        .await?
        .ok_or_not_found()?;

    let mut active: project::ActiveModel = existing.into();
    active.title = Set(project.title);
    active.description = Set(project.description);
    active.category = Set(project.category.into());
    active.location = Set(project.location);
    active.latitude = Set(project.latitude);
    active.longitude = Set(project.longitude);
    active.estimated_credits = Set(project.estimated_credits);
    active.current_credits = Set(project.current_credits);
    active.start_date = Set(project.start_date);
    active.end_date = Set(project.end_date);
    active.status = Set(project.status.into());
    active.total_cost = Set(project.total_cost);
    active.funding_received = Set(project.funding_received);
    active.verifier_id = Set(project.verifier_id);
    active.verification_date = Set(project.verification_date);
    active.updated_at = Set(project.updated_at);

    let model = active.update(conn).await?;
    Ok(Project::from(model))
}

pub(crate) async fn insert_image<C: ConnectionTrait>(
    conn: &C,
    image: ProjectImage,
) -> AppResult<ProjectImage> {
    let active_model = project_image::ActiveModel {
        id: Set(image.id),
        project_id: Set(image.project_id),
        image: Set(image.image.into_string()),
        caption: Set(image.caption),
        is_primary: Set(image.is_primary),
        uploaded_at: Set(image.uploaded_at),
    };
    let model = active_model.insert(conn).await?;
    Ok(ProjectImage::from(model))
}

/// Clear the primary flag on every image of a project. Returns how many changed.
pub(crate) async fn clear_primary_images<C: ConnectionTrait>(
    conn: &C,
    project_id: Uuid,
) -> AppResult<u64> {
    use sea_orm::sea_query::Expr;

    let result = project_image::Entity::update_many()
        .col_expr(project_image::Column::IsPrimary, Expr::value(false))
        .filter(project_image::Column::ProjectId.eq(project_id))
        .filter(project_image::Column::IsPrimary.eq(true))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}
