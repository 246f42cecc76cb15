use axum::{Json, extract::State, http::StatusCode};
use lms_core::{AppError, ErrorResponse, Paginated, PaginationParams, Status};
use lms_models::roles::{CreateUserRoleDto, UpdateUserRoleDto, UserRole, UserRoleFilterParams};
use tracing::instrument;

use crate::middleware::auth::{RequireArchiveEverything, RequireManageUserRoles};
use crate::modules::user_roles::service::UserRoleService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Create a user role
#[utoipa::path(
    post,
    path = "/api/user-roles",
    request_body = CreateUserRoleDto,
    responses(
        (status = 201, description = "Role created", body = UserRole),
        (status = 400, description = "Invalid form or title taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Requires ManageUserRoles", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_role(
    State(state): State<AppState>,
    _guard: RequireManageUserRoles,
    ValidatedJson(dto): ValidatedJson<CreateUserRoleDto>,
) -> Result<(StatusCode, Json<UserRole>), AppError> {
    let role = UserRoleService::create_role(&state.db, dto).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// List user roles
#[utoipa::path(
    get,
    path = "/api/user-roles",
    params(PaginationParams, UserRoleFilterParams),
    responses(
        (status = 200, description = "Page of roles", body = Paginated<UserRole>),
        (status = 403, description = "Requires ManageUserRoles", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_roles(
    State(state): State<AppState>,
    _guard: RequireManageUserRoles,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<UserRoleFilterParams>,
) -> Result<Json<Paginated<UserRole>>, AppError> {
    let roles = UserRoleService::get_roles(&state.db, &filters, &pagination).await?;
    Ok(Json(roles))
}

/// Get a user role by id
#[utoipa::path(
    get,
    path = "/api/user-roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role found", body = UserRole),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_role(
    State(state): State<AppState>,
    _guard: RequireManageUserRoles,
    IdPath(id): IdPath,
) -> Result<Json<UserRole>, AppError> {
    Ok(Json(UserRoleService::get_role(&state.db, id).await?))
}

/// Rename a role or replace its permissions
#[utoipa::path(
    patch,
    path = "/api/user-roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateUserRoleDto,
    responses(
        (status = 200, description = "Role updated", body = UserRole),
        (status = 400, description = "Invalid form or title taken", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_role(
    State(state): State<AppState>,
    _guard: RequireManageUserRoles,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<UpdateUserRoleDto>,
) -> Result<Json<UserRole>, AppError> {
    Ok(Json(UserRoleService::update_role(&state.db, id, dto).await?))
}

/// Activate a role
#[utoipa::path(
    put,
    path = "/api/user-roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role activated", body = UserRole),
        (status = 403, description = "Requires ArchiveEverything", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_role(
    State(state): State<AppState>,
    _guard: RequireArchiveEverything,
    IdPath(id): IdPath,
) -> Result<Json<UserRole>, AppError> {
    Ok(Json(UserRoleService::set_status(&state.db, id, Status::Active).await?))
}

/// Archive a role
#[utoipa::path(
    delete,
    path = "/api/user-roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role archived", body = UserRole),
        (status = 403, description = "Requires ArchiveEverything", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "User roles",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn archive_role(
    State(state): State<AppState>,
    _guard: RequireArchiveEverything,
    IdPath(id): IdPath,
) -> Result<Json<UserRole>, AppError> {
    Ok(Json(UserRoleService::set_status(&state.db, id, Status::Archived).await?))
}
