use axum::{Json, extract::State, http::StatusCode};
use lms_core::{AppError, ErrorResponse, Paginated, PaginationParams};
use lms_models::teachers::{
    CreateDefaultTeacherDto, CreateSpecialTeacherDto, DEFAULT_TEACHER_ROLE, TeacherDto,
    TeacherFilterParams, UpdateTeacherDto,
};
use tracing::instrument;

use crate::middleware::auth::{
    RequireCreateSpecialUsers, RequireManageTeacherProfile, ensure_current_user,
};
use crate::modules::teachers::service::TeacherService;
use crate::modules::user_roles::service::UserRoleService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Create a teacher with the `default teacher` role
#[utoipa::path(
    post,
    path = "/api/teachers/default",
    request_body = CreateDefaultTeacherDto,
    responses(
        (status = 201, description = "Teacher created, plain password echoed once", body = TeacherDto),
        (status = 400, description = "Invalid form or email taken", body = ErrorResponse),
        (status = 403, description = "Requires CreateSpecialUsers", body = ErrorResponse),
        (status = 404, description = "Unknown subjects", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_default_teacher(
    State(state): State<AppState>,
    _guard: RequireCreateSpecialUsers,
    ValidatedJson(dto): ValidatedJson<CreateDefaultTeacherDto>,
) -> Result<(StatusCode, Json<TeacherDto>), AppError> {
    let role = UserRoleService::find_by_title(&state.db, DEFAULT_TEACHER_ROLE).await?;
    let (user, profile) = dto.into_parts();
    let teacher = TeacherService::create_teacher(&state.db, user, profile, &role).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

/// Create a teacher with any role of type Teacher
#[utoipa::path(
    post,
    path = "/api/teachers/special",
    request_body = CreateSpecialTeacherDto,
    responses(
        (status = 201, description = "Teacher created, plain password echoed once", body = TeacherDto),
        (status = 400, description = "Invalid form, email taken or role is not a teacher role", body = ErrorResponse),
        (status = 403, description = "Requires CreateSpecialUsers", body = ErrorResponse),
        (status = 404, description = "Role or subjects not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_special_teacher(
    State(state): State<AppState>,
    _guard: RequireCreateSpecialUsers,
    ValidatedJson(dto): ValidatedJson<CreateSpecialTeacherDto>,
) -> Result<(StatusCode, Json<TeacherDto>), AppError> {
    let (user, profile, role_title) = dto.into_parts();
    let role = UserRoleService::find_by_title(&state.db, &role_title).await?;
    let teacher = TeacherService::create_teacher(&state.db, user, profile, &role).await?;
    Ok((StatusCode::CREATED, Json(teacher)))
}

/// List active teachers
#[utoipa::path(
    get,
    path = "/api/teachers",
    params(PaginationParams, TeacherFilterParams),
    responses(
        (status = 200, description = "Page of teachers", body = Paginated<TeacherDto>)
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_teachers(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<TeacherFilterParams>,
) -> Result<Json<Paginated<TeacherDto>>, AppError> {
    Ok(Json(TeacherService::get_teachers(&state.db, &filters, &pagination).await?))
}

/// Get an active teacher by id
#[utoipa::path(
    get,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    responses(
        (status = 200, description = "Teacher found", body = TeacherDto),
        (status = 404, description = "Teacher not found", body = ErrorResponse)
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_teacher(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<TeacherDto>, AppError> {
    Ok(Json(TeacherService::get_teacher(&state.db, id).await?))
}

/// Update a teacher profile
#[utoipa::path(
    patch,
    path = "/api/teachers/{id}",
    params(("id" = Uuid, Path, description = "Teacher ID")),
    request_body = UpdateTeacherDto,
    responses(
        (status = 200, description = "Teacher updated", body = TeacherDto),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 403, description = "Not the current user or not a teacher", body = ErrorResponse),
        (status = 404, description = "Teacher or subjects not found", body = ErrorResponse)
    ),
    tag = "Teachers",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_teacher(
    State(state): State<AppState>,
    RequireManageTeacherProfile(auth_user): RequireManageTeacherProfile,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<UpdateTeacherDto>,
) -> Result<Json<TeacherDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;
    Ok(Json(TeacherService::update_teacher(&state.db, id, dto).await?))
}
