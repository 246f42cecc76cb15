use axum::{Json, extract::State, http::StatusCode};
use lms_core::{AppError, ErrorResponse, Paginated, PaginationParams, Status};
use lms_models::subjects::{CreateSubjectDto, Subject, SubjectFilterParams, UpdateSubjectDto};
use tracing::instrument;

use crate::middleware::auth::RequireManageSubjects;
use crate::modules::subjects::service::SubjectService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Create a subject
#[utoipa::path(
    post,
    path = "/api/subjects",
    request_body = CreateSubjectDto,
    responses(
        (status = 201, description = "Subject created", body = Subject),
        (status = 400, description = "Invalid form or title taken", body = ErrorResponse),
        (status = 403, description = "Requires ManageSubjects", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_subject(
    State(state): State<AppState>,
    _guard: RequireManageSubjects,
    ValidatedJson(dto): ValidatedJson<CreateSubjectDto>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    let subject = SubjectService::create_subject(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(subject)))
}

/// List active subjects
#[utoipa::path(
    get,
    path = "/api/subjects",
    params(PaginationParams, SubjectFilterParams),
    responses(
        (status = 200, description = "Page of subjects", body = Paginated<Subject>)
    ),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn get_subjects(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<SubjectFilterParams>,
) -> Result<Json<Paginated<Subject>>, AppError> {
    Ok(Json(SubjectService::get_subjects(&state.db, &filters, &pagination).await?))
}

/// Get an active subject by id
#[utoipa::path(
    get,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject found", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects"
)]
#[instrument(skip(state))]
pub async fn get_subject(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::get_subject(&state.db, id).await?))
}

/// Rename a subject
#[utoipa::path(
    patch,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    request_body = UpdateSubjectDto,
    responses(
        (status = 200, description = "Subject updated", body = Subject),
        (status = 400, description = "Invalid form or title taken", body = ErrorResponse),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_subject(
    State(state): State<AppState>,
    _guard: RequireManageSubjects,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<UpdateSubjectDto>,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::update_subject(&state.db, id, dto).await?))
}

/// Activate a subject
#[utoipa::path(
    put,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject activated", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_subject(
    State(state): State<AppState>,
    _guard: RequireManageSubjects,
    IdPath(id): IdPath,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::set_status(&state.db, id, Status::Active).await?))
}

/// Archive a subject
#[utoipa::path(
    delete,
    path = "/api/subjects/{id}",
    params(("id" = Uuid, Path, description = "Subject ID")),
    responses(
        (status = 200, description = "Subject archived", body = Subject),
        (status = 404, description = "Subject not found", body = ErrorResponse)
    ),
    tag = "Subjects",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn archive_subject(
    State(state): State<AppState>,
    _guard: RequireManageSubjects,
    IdPath(id): IdPath,
) -> Result<Json<Subject>, AppError> {
    Ok(Json(SubjectService::set_status(&state.db, id, Status::Archived).await?))
}
