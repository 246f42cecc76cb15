use axum::{Json, extract::State, http::StatusCode};
use lms_core::{AppError, ErrorResponse, Paginated, PaginationParams};
use lms_models::students::{
    CreateDefaultStudentDto, CreateSpecialStudentDto, DEFAULT_STUDENT_ROLE, StudentDto,
    StudentFilterParams, UpdateStudentDto,
};
use tracing::instrument;

use crate::middleware::auth::{
    RequireCreateSpecialUsers, RequireManageStudentProfile, ensure_current_user,
};
use crate::modules::students::service::StudentService;
use crate::modules::user_roles::service::UserRoleService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Create a student with the `default student` role
#[utoipa::path(
    post,
    path = "/api/students/default-students",
    request_body = CreateDefaultStudentDto,
    responses(
        (status = 201, description = "Student created, plain password echoed once", body = StudentDto),
        (status = 400, description = "Invalid form or email taken", body = ErrorResponse),
        (status = 403, description = "Requires CreateSpecialUsers", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_default_student(
    State(state): State<AppState>,
    _guard: RequireCreateSpecialUsers,
    ValidatedJson(dto): ValidatedJson<CreateDefaultStudentDto>,
) -> Result<(StatusCode, Json<StudentDto>), AppError> {
    let role = UserRoleService::find_by_title(&state.db, DEFAULT_STUDENT_ROLE).await?;
    let (user, profile) = dto.into_parts();
    let student = StudentService::create_student(&state.db, user, profile, &role).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// Create a student with any role of type Student
#[utoipa::path(
    post,
    path = "/api/students/special-students",
    request_body = CreateSpecialStudentDto,
    responses(
        (status = 201, description = "Student created, plain password echoed once", body = StudentDto),
        (status = 400, description = "Invalid form, email taken or role is not a student role", body = ErrorResponse),
        (status = 403, description = "Requires CreateSpecialUsers", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_special_student(
    State(state): State<AppState>,
    _guard: RequireCreateSpecialUsers,
    ValidatedJson(dto): ValidatedJson<CreateSpecialStudentDto>,
) -> Result<(StatusCode, Json<StudentDto>), AppError> {
    let (user, profile, role_title) = dto.into_parts();
    let role = UserRoleService::find_by_title(&state.db, &role_title).await?;
    let student = StudentService::create_student(&state.db, user, profile, &role).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// List active students
#[utoipa::path(
    get,
    path = "/api/students",
    params(PaginationParams, StudentFilterParams),
    responses(
        (status = 200, description = "Page of students", body = Paginated<StudentDto>)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_students(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<StudentFilterParams>,
) -> Result<Json<Paginated<StudentDto>>, AppError> {
    Ok(Json(StudentService::get_students(&state.db, &filters, &pagination).await?))
}

/// Get an active student by id
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student found", body = StudentDto),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<StudentDto>, AppError> {
    Ok(Json(StudentService::get_student(&state.db, id).await?))
}

/// Update a student profile
#[utoipa::path(
    patch,
    path = "/api/students/{id}",
    params(("id" = Uuid, Path, description = "Student ID")),
    request_body = UpdateStudentDto,
    responses(
        (status = 200, description = "Student updated", body = StudentDto),
        (status = 400, description = "Invalid form, username or email taken", body = ErrorResponse),
        (status = 403, description = "Not the current user", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    tag = "Students",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn update_student(
    State(state): State<AppState>,
    RequireManageStudentProfile(auth_user): RequireManageStudentProfile,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<StudentDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;
    Ok(Json(StudentService::update_student(&state.db, id, dto).await?))
}
