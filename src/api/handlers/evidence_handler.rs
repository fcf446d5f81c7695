//! Evidence handlers: submission, files, review, comments and revisions.

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

use crate::api::extractors::{UploadForm, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{
    EvidenceChanges, EvidenceComment, EvidenceResponse, EvidenceStatus, EvidenceType, NewEvidence,
    RevisionResponse,
};
use crate::errors::AppResult;
use crate::infra::EvidenceFilter;
use crate::services::RevisionUpload;
use crate::types::{Created, NoContent, Paginated, PaginatedEvidence, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitEvidenceRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    #[schema(example = "Drone survey, plot 4")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub evidence_type: EvidenceType,
    pub project_id: Uuid,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    /// Meters
    pub location_accuracy: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEvidenceRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub location_accuracy: Option<Decimal>,
}

impl From<UpdateEvidenceRequest> for EvidenceChanges {
    fn from(req: UpdateEvidenceRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            latitude: req.latitude,
            longitude: req.longitude,
            location_accuracy: req.location_accuracy,
        }
    }
}

/// Verifier decision
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReviewRequest {
    /// approved, rejected or needs_revision
    pub status: EvidenceStatus,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CommentRequest {
    #[validate(length(min = 1, message = "Comment cannot be empty"))]
    pub comment: String,
    /// Hidden from proponents (verifiers and admins only)
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EvidenceListQuery {
    pub project_id: Option<Uuid>,
    pub status: Option<EvidenceStatus>,
    pub evidence_type: Option<EvidenceType>,
}

/// `multipart/form-data` body for evidence files
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct EvidenceFileForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// `multipart/form-data` body for revisions
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RevisionForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    changes_description: String,
}

/// Create evidence routes
pub fn evidence_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_evidence).post(submit_evidence))
        .route(
            "/:id",
            get(get_evidence).put(update_evidence).delete(delete_evidence),
        )
        .route("/:id/file", post(upload_evidence_file))
        .route("/:id/review", post(review_evidence))
        .route("/:id/comments", get(list_comments).post(add_comment))
        .route("/:id/revisions", get(list_revisions).post(add_revision))
}

/// List evidence visible to the caller
#[utoipa::path(
    get,
    path = "/evidence",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(EvidenceListQuery, PaginationParams),
    responses(
        (status = 200, description = "Evidence, newest first", body = PaginatedEvidence)
    )
)]
pub async fn list_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<EvidenceListQuery>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<EvidenceResponse>>> {
    let filter = EvidenceFilter {
        project_id: query.project_id,
        status: query.status,
        evidence_type: query.evidence_type,
        submitted_by: None,
    };
    let page = state
        .evidence_service
        .list(current_user.actor(), filter, params)
        .await?;
    Ok(Json(page.map(|e| EvidenceResponse::new(e, &state.media_url))))
}

/// Submit evidence for one of the caller's projects
#[utoipa::path(
    post,
    path = "/evidence",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    request_body = SubmitEvidenceRequest,
    responses(
        (status = 201, description = "Evidence submitted", body = EvidenceResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not the project proponent")
    )
)]
pub async fn submit_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SubmitEvidenceRequest>,
) -> AppResult<Created<EvidenceResponse>> {
    let evidence = NewEvidence {
        title: payload.title.trim().to_string(),
        description: payload.description,
        evidence_type: payload.evidence_type,
        project_id: payload.project_id,
        submitted_by: current_user.id,
        latitude: payload.latitude,
        longitude: payload.longitude,
        location_accuracy: payload.location_accuracy,
    };
    let evidence = state
        .evidence_service
        .submit(current_user.actor(), evidence)
        .await?;
    Ok(Created(EvidenceResponse::new(evidence, &state.media_url)))
}

/// Get one piece of evidence
#[utoipa::path(
    get,
    path = "/evidence/{id}",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    responses(
        (status = 200, description = "Evidence", body = EvidenceResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Evidence not found")
    )
)]
pub async fn get_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<EvidenceResponse>> {
    let evidence = state.evidence_service.get(current_user.actor(), id).await?;
    Ok(Json(EvidenceResponse::new(evidence, &state.media_url)))
}

/// Update evidence details
#[utoipa::path(
    put,
    path = "/evidence/{id}",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    request_body = UpdateEvidenceRequest,
    responses(
        (status = 200, description = "Evidence updated", body = EvidenceResponse),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Evidence not found")
    )
)]
pub async fn update_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateEvidenceRequest>,
) -> AppResult<Json<EvidenceResponse>> {
    let evidence = state
        .evidence_service
        .update(current_user.actor(), id, payload.into())
        .await?;
    Ok(Json(EvidenceResponse::new(evidence, &state.media_url)))
}

/// Delete evidence and its files
#[utoipa::path(
    delete,
    path = "/evidence/{id}",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    responses(
        (status = 204, description = "Evidence deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Evidence not found")
    )
)]
pub async fn delete_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .evidence_service
        .delete(current_user.actor(), id)
        .await?;
    Ok(NoContent)
}

/// Upload the file matching the evidence type
#[utoipa::path(
    post,
    path = "/evidence/{id}/file",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    request_body(content = EvidenceFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File attached", body = EvidenceResponse),
        (status = 400, description = "Missing file or evidence type takes no file"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn upload_evidence_file(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut form: UploadForm,
) -> AppResult<Json<EvidenceResponse>> {
    let evidence = state
        .evidence_service
        .upload_file(current_user.actor(), id, form.take_file()?)
        .await?;
    Ok(Json(EvidenceResponse::new(evidence, &state.media_url)))
}

/// Record a review decision (verifiers and admins)
#[utoipa::path(
    post,
    path = "/evidence/{id}/review",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review recorded", body = EvidenceResponse),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Invalid review outcome")
    )
)]
pub async fn review_evidence(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ReviewRequest>,
) -> AppResult<Json<EvidenceResponse>> {
    let evidence = state
        .evidence_service
        .review(current_user.actor(), id, payload.status, payload.notes)
        .await?;
    Ok(Json(EvidenceResponse::new(evidence, &state.media_url)))
}

/// Comment thread visible to the caller
#[utoipa::path(
    get,
    path = "/evidence/{id}/comments",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    responses(
        (status = 200, description = "Comments, oldest first", body = Vec<EvidenceComment>),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn list_comments(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<EvidenceComment>>> {
    let comments = state
        .evidence_service
        .comments(current_user.actor(), id)
        .await?;
    Ok(Json(comments))
}

/// Add a comment
#[utoipa::path(
    post,
    path = "/evidence/{id}/comments",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = EvidenceComment),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn add_comment(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CommentRequest>,
) -> AppResult<Created<EvidenceComment>> {
    let comment = state
        .evidence_service
        .add_comment(current_user.actor(), id, payload.comment, payload.is_internal)
        .await?;
    Ok(Created(comment))
}

/// Revision history
#[utoipa::path(
    get,
    path = "/evidence/{id}/revisions",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    responses(
        (status = 200, description = "Revisions, newest first", body = Vec<RevisionResponse>),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn list_revisions(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<RevisionResponse>>> {
    let revisions = state
        .evidence_service
        .revisions(current_user.actor(), id)
        .await?;
    Ok(Json(
        revisions
            .into_iter()
            .map(|r| RevisionResponse::new(r, &state.media_url))
            .collect(),
    ))
}

/// Replace the evidence file, recording a numbered revision
#[utoipa::path(
    post,
    path = "/evidence/{id}/revisions",
    tag = "Evidence",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Evidence ID")),
    request_body(content = RevisionForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Revision recorded", body = RevisionResponse),
        (status = 400, description = "Missing file"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn add_revision(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut form: UploadForm,
) -> AppResult<Created<RevisionResponse>> {
    let revision = RevisionUpload {
        upload: form.take_file()?,
        changes_description: form.text("changes_description"),
    };
    let revision = state
        .evidence_service
        .add_revision(current_user.actor(), id, revision)
        .await?;
    Ok(Created(RevisionResponse::new(revision, &state.media_url)))
}
