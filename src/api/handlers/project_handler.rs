//! Project handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{UploadForm, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::validators;
use crate::api::AppState;
use crate::domain::{
    NewProject, ProjectCategory, ProjectChanges, ProjectDocument, ProjectImage, ProjectResponse,
    ProjectStatus,
};
use crate::errors::AppResult;
use crate::infra::ProjectFilter;
use crate::services::{DocumentUpload, ImageUpload, ProjectDetail};
use crate::types::{Created, NoContent, Paginated, PaginatedProjects, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "Mangrove restoration, Sundarbans")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: ProjectCategory,
    #[validate(length(max = 200, message = "Location is too long"))]
    #[serde(default)]
    pub location: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    #[validate(range(min = 0, message = "Estimated credits cannot be negative"))]
    pub estimated_credits: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(custom(function = "validators::amount"))]
    #[serde(default)]
    pub total_cost: Decimal,
    #[validate(custom(function = "validators::amount"))]
    #[serde(default)]
    pub funding_received: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<ProjectCategory>,
    #[validate(length(max = 200, message = "Location is too long"))]
    pub location: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    #[validate(range(min = 0, message = "Estimated credits cannot be negative"))]
    pub estimated_credits: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[validate(custom(function = "validators::amount"))]
    pub total_cost: Option<Decimal>,
    #[validate(custom(function = "validators::amount"))]
    pub funding_received: Option<Decimal>,
}

impl From<UpdateProjectRequest> for ProjectChanges {
    fn from(req: UpdateProjectRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            category: req.category,
            location: req.location,
            latitude: req.latitude,
            longitude: req.longitude,
            estimated_credits: req.estimated_credits,
            start_date: req.start_date,
            end_date: req.end_date,
            total_cost: req.total_cost,
            funding_received: req.funding_received,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProjectStatusRequest {
    pub status: ProjectStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct IssueCreditsRequest {
    #[validate(range(min = 1, message = "Credit amount must be at least 1"))]
    #[schema(example = 500)]
    pub amount: i64,
}

/// Listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    pub category: Option<ProjectCategory>,
    pub proponent_id: Option<Uuid>,
}

/// `multipart/form-data` body for image uploads
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    caption: Option<String>,
    is_primary: Option<bool>,
}

/// `multipart/form-data` body for document uploads
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DocumentUploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    title: String,
    /// Derived from the file extension when omitted
    document_type: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImageResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "/media/project_images/canopy.jpg")]
    pub image_url: String,
    pub caption: String,
    pub is_primary: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl ImageResponse {
    fn new(image: ProjectImage, media_url: &str) -> Self {
        Self {
            image_url: image.image.url(media_url),
            id: image.id,
            project_id: image.project_id,
            caption: image.caption,
            is_primary: image.is_primary,
            uploaded_at: image.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    #[schema(example = "/media/project_documents/pdd.pdf")]
    pub document_url: String,
    #[schema(example = "PDF")]
    pub document_type: String,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentResponse {
    fn new(document: ProjectDocument, media_url: &str) -> Self {
        Self {
            document_url: document.document.url(media_url),
            id: document.id,
            project_id: document.project_id,
            title: document.title,
            document_type: document.document_type,
            uploaded_at: document.uploaded_at,
        }
    }
}

/// Project with its images and documents
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDetailResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,
    pub images: Vec<ImageResponse>,
    pub documents: Vec<DocumentResponse>,
}

impl ProjectDetailResponse {
    fn new(detail: ProjectDetail, media_url: &str) -> Self {
        Self {
            project: ProjectResponse::from(detail.project),
            images: detail
                .images
                .into_iter()
                .map(|i| ImageResponse::new(i, media_url))
                .collect(),
            documents: detail
                .documents
                .into_iter()
                .map(|d| DocumentResponse::new(d, media_url))
                .collect(),
        }
    }
}

/// Create project routes
pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/status", post(change_project_status))
        .route("/:id/credits", post(issue_credits))
        .route("/:id/images", post(upload_image))
        .route("/:id/documents", post(upload_document))
}

/// List projects
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(ProjectListQuery, PaginationParams),
    responses(
        (status = 200, description = "Projects, newest first", body = PaginatedProjects)
    )
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ProjectResponse>>> {
    let filter = ProjectFilter {
        status: query.status,
        category: query.category,
        proponent_id: query.proponent_id,
    };
    let page = state.project_service.list(filter, params).await?;
    Ok(Json(page.map(ProjectResponse::from)))
}

/// Create a draft project owned by the caller
#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    security(("bearer_auth" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Only project developers may create projects")
    )
)]
pub async fn create_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateProjectRequest>,
) -> AppResult<Created<ProjectResponse>> {
    let project = NewProject {
        title: payload.title.trim().to_string(),
        description: payload.description,
        category: payload.category,
        proponent_id: current_user.id,
        location: payload.location,
        latitude: payload.latitude,
        longitude: payload.longitude,
        estimated_credits: payload.estimated_credits,
        start_date: payload.start_date,
        end_date: payload.end_date,
        total_cost: payload.total_cost,
        funding_received: payload.funding_received,
    };
    let project = state
        .project_service
        .create(current_user.actor(), project)
        .await?;
    Ok(Created(ProjectResponse::from(project)))
}

/// Get a project with its images and documents
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project detail", body = ProjectDetailResponse),
        (status = 404, description = "Project not found")
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProjectDetailResponse>> {
    let detail = state.project_service.detail(id).await?;
    Ok(Json(ProjectDetailResponse::new(detail, &state.media_url)))
}

/// Update a project (owner while editable, or admin)
#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn update_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProjectRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .update(current_user.actor(), id, payload.into())
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// Delete a project and its attachments
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Project not found")
    )
)]
pub async fn delete_project(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .project_service
        .delete(current_user.actor(), id)
        .await?;
    Ok(NoContent)
}

/// Move a project along the status workflow
#[utoipa::path(
    post,
    path = "/projects/{id}/status",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = ProjectStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ProjectResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Invalid status transition")
    )
)]
pub async fn change_project_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProjectStatusRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .change_status(current_user.actor(), id, payload.status)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// Issue verified credits (verifiers and admins)
#[utoipa::path(
    post,
    path = "/projects/{id}/credits",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body = IssueCreditsRequest,
    responses(
        (status = 200, description = "Credits issued", body = ProjectResponse),
        (status = 400, description = "Would exceed estimated credits"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn issue_credits(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<IssueCreditsRequest>,
) -> AppResult<Json<ProjectResponse>> {
    let project = state
        .project_service
        .issue_credits(current_user.actor(), id, payload.amount)
        .await?;
    Ok(Json(ProjectResponse::from(project)))
}

/// Attach an image
#[utoipa::path(
    post,
    path = "/projects/{id}/images",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn upload_image(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut form: UploadForm,
) -> AppResult<Created<ImageResponse>> {
    let image = ImageUpload {
        upload: form.take_file()?,
        caption: form.text("caption"),
        is_primary: form.flag("is_primary"),
    };
    let image = state
        .project_service
        .add_image(current_user.actor(), id, image)
        .await?;
    Ok(Created(ImageResponse::new(image, &state.media_url)))
}

/// Attach a document
#[utoipa::path(
    post,
    path = "/projects/{id}/documents",
    tag = "Projects",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Project ID")),
    request_body(content = DocumentUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document stored", body = DocumentResponse),
        (status = 400, description = "Missing or empty file"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn upload_document(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut form: UploadForm,
) -> AppResult<Created<DocumentResponse>> {
    let document = DocumentUpload {
        upload: form.take_file()?,
        title: form.text("title"),
        document_type: form.text("document_type"),
    };
    let document = state
        .project_service
        .add_document(current_user.actor(), id, document)
        .await?;
    Ok(Created(DocumentResponse::new(document, &state.media_url)))
}
