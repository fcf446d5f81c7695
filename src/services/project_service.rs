//! Project service - Listings, status workflow, credit issuance and attachments.

use async_trait::async_trait;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use super::Actor;
use crate::domain::{
    NewProject, Project, ProjectChanges, ProjectDocument, ProjectImage, ProjectStatus, StoredFile,
    UploadDir, UserRole,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{MediaStorage, ProjectFilter, UnitOfWork, Upload};
use crate::types::{Paginated, PaginationParams};
use crate::with_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// A project with its attachments
#[derive(Debug, Clone)]
pub struct ProjectDetail {
    pub project: Project,
    pub images: Vec<ProjectImage>,
    pub documents: Vec<ProjectDocument>,
}

/// Image upload for a project gallery
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub upload: Upload,
    pub caption: String,
    pub is_primary: bool,
}

/// Supporting document upload
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub upload: Upload,
    pub title: String,
    /// Derived from the file extension when empty
    pub document_type: String,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectService: Send + Sync {
    /// Create a draft owned by the actor
    async fn create(&self, actor: Actor, project: NewProject) -> AppResult<Project>;

    async fn get(&self, id: Uuid) -> AppResult<Project>;

    /// Project with images and documents
    async fn detail(&self, id: Uuid) -> AppResult<ProjectDetail>;

    async fn list(
        &self,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Project>>;

    async fn update(&self, actor: Actor, id: Uuid, changes: ProjectChanges) -> AppResult<Project>;

    /// Delete a project, its attachments and their files
    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()>;

    /// Move along the status workflow
    async fn change_status(
        &self,
        actor: Actor,
        id: Uuid,
        next: ProjectStatus,
    ) -> AppResult<Project>;

    /// Issue verified credits (reviewers only)
    async fn issue_credits(&self, actor: Actor, id: Uuid, amount: i64) -> AppResult<Project>;

    async fn add_image(
        &self,
        actor: Actor,
        id: Uuid,
        image: ImageUpload,
    ) -> AppResult<ProjectImage>;

    async fn add_document(
        &self,
        actor: Actor,
        id: Uuid,
        document: DocumentUpload,
    ) -> AppResult<ProjectDocument>;
}

pub struct ProjectManager<U: UnitOfWork> {
    uow: Arc<U>,
    storage: MediaStorage,
}

impl<U: UnitOfWork> ProjectManager<U> {
    pub fn new(uow: Arc<U>, storage: MediaStorage) -> Self {
        Self { uow, storage }
    }

    async fn load(&self, id: Uuid) -> AppResult<Project> {
        self.uow.projects().find_by_id(id).await?.ok_or_not_found()
    }

    /// Load a project the actor owns (admins own everything)
    async fn load_owned(&self, actor: Actor, id: Uuid) -> AppResult<Project> {
        let project = self.load(id).await?;
        actor.require_owner_or_admin(project.proponent_id)?;
        Ok(project)
    }

    /// Best-effort removal of files whose rows are gone
    async fn discard_files(&self, files: impl IntoIterator<Item = StoredFile>) {
        for file in files {
            if let Err(e) = self.storage.delete(&file).await {
                tracing::warn!(path = %file.path(), error = %e, "Failed to remove media file");
            }
        }
    }
}

/// Upper-cased extension, e.g. `PDF`
fn document_type_from(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

#[async_trait]
impl<U: UnitOfWork> ProjectService for ProjectManager<U> {
    async fn create(&self, actor: Actor, mut project: NewProject) -> AppResult<Project> {
        if !matches!(actor.role, UserRole::ProjectDeveloper | UserRole::Administrator) {
            return Err(AppError::Forbidden);
        }
        project.proponent_id = actor.id;
        project.validate()?;

        let project = self.uow.projects().create(project).await?;
        tracing::info!(project_id = %project.id, proponent = %actor.id, "Project created");
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> AppResult<Project> {
        self.load(id).await
    }

    async fn detail(&self, id: Uuid) -> AppResult<ProjectDetail> {
        let projects = self.uow.projects();
        let (project, images, documents) = futures::try_join!(
            projects.find_by_id(id),
            projects.images(id),
            projects.documents(id),
        )?;

        Ok(ProjectDetail {
            project: project.ok_or_not_found()?,
            images,
            documents,
        })
    }

    async fn list(
        &self,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Project>> {
        let (projects, total) = self.uow.projects().list(filter, params.clone()).await?;
        Ok(Paginated::from_page(projects, total, &params))
    }

    async fn update(&self, actor: Actor, id: Uuid, changes: ProjectChanges) -> AppResult<Project> {
        let mut project = self.load_owned(actor, id).await?;
        if !project.status.is_editable() && !actor.is_admin() {
            return Err(AppError::validation(format!(
                "{} projects can no longer be edited",
                project.status.label()
            )));
        }

        project.apply(changes)?;
        self.uow.projects().save(project).await
    }

    async fn delete(&self, actor: Actor, id: Uuid) -> AppResult<()> {
        let project = self.load_owned(actor, id).await?;
        if !project.status.is_editable() && !actor.is_admin() {
            return Err(AppError::validation(
                "Only draft or submitted projects can be deleted",
            ));
        }

        let projects = self.uow.projects();
        let (images, documents) = futures::try_join!(projects.images(id), projects.documents(id))?;
        projects.delete(id).await?;

        tracing::info!(project_id = %id, by = %actor.id, "Project deleted");
        self.discard_files(
            images
                .into_iter()
                .map(|i| i.image)
                .chain(documents.into_iter().map(|d| d.document)),
        )
        .await;
        Ok(())
    }

    async fn change_status(
        &self,
        actor: Actor,
        id: Uuid,
        next: ProjectStatus,
    ) -> AppResult<Project> {
        let mut project = self.load(id).await?;
        if ProjectStatus::is_proponent_move(next) {
            actor.require_owner_or_admin(project.proponent_id)?;
        } else {
            actor.require_reviewer()?;
        }

        let from = project.status;
        project.transition_to(next, actor.id, Utc::now())?;
        let project = self.uow.projects().save(project).await?;

        tracing::info!(
            project_id = %id,
            %from,
            to = %next,
            by = %actor.id,
            "Project status changed"
        );
        Ok(project)
    }

    async fn issue_credits(&self, actor: Actor, id: Uuid, amount: i64) -> AppResult<Project> {
        actor.require_reviewer()?;
        let mut project = self.load(id).await?;
        project.issue_credits(amount)?;

        let project = self.uow.projects().save(project).await?;
        tracing::info!(
            project_id = %id,
            amount,
            current = project.current_credits,
            "Credits issued"
        );
        Ok(project)
    }

    async fn add_image(
        &self,
        actor: Actor,
        id: Uuid,
        image: ImageUpload,
    ) -> AppResult<ProjectImage> {
        self.load_owned(actor, id).await?;

        let file = self.storage.save(UploadDir::ProjectImages, &image.upload).await?;
        let record = ProjectImage {
            id: Uuid::new_v4(),
            project_id: id,
            image: file.clone(),
            caption: image.caption,
            is_primary: image.is_primary,
            uploaded_at: Utc::now(),
        };

        let result = with_transaction!(self.uow, |ctx| ctx.projects().add_image(record).await);
        if result.is_err() {
            self.discard_files([file]).await;
        }
        result
    }

    async fn add_document(
        &self,
        actor: Actor,
        id: Uuid,
        document: DocumentUpload,
    ) -> AppResult<ProjectDocument> {
        self.load_owned(actor, id).await?;

        let document_type = if document.document_type.trim().is_empty() {
            document_type_from(&document.upload.file_name)
        } else {
            document.document_type.trim().to_uppercase()
        };
        let file = self
            .storage
            .save(UploadDir::ProjectDocuments, &document.upload)
            .await?;
        let record = ProjectDocument {
            id: Uuid::new_v4(),
            project_id: id,
            title: document.title,
            document: file.clone(),
            document_type,
            uploaded_at: Utc::now(),
        };

        let result = self.uow.projects().add_document(record).await;
        if result.is_err() {
            self.discard_files([file]).await;
        }
        result
    }
}
