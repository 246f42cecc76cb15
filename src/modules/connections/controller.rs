use axum::{Json, extract::State, http::StatusCode};
use lms_core::{AppError, ErrorResponse, Paginated, PaginationParams};
use lms_models::connections::{ConnectionFilterParams, CreateConnectionDto, TeacherToStudent};
use tracing::instrument;

use crate::middleware::auth::{RequireCreateConnection, RequireManageConnection};
use crate::modules::connections::service::ConnectionService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Request a connection between a teacher and a student
#[utoipa::path(
    post,
    path = "/api/connections/teacher-to-student",
    request_body = CreateConnectionDto,
    responses(
        (status = 201, description = "Connection created", body = TeacherToStudent),
        (status = 400, description = "Connection already exists", body = ErrorResponse),
        (status = 403, description = "Not the current user or a side lacks the permission", body = ErrorResponse),
        (status = 404, description = "Teacher or student not found", body = ErrorResponse)
    ),
    tag = "Connections",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn create_connection(
    State(state): State<AppState>,
    RequireCreateConnection(auth_user): RequireCreateConnection,
    ValidatedJson(dto): ValidatedJson<CreateConnectionDto>,
) -> Result<(StatusCode, Json<TeacherToStudent>), AppError> {
    let connection = ConnectionService::create_connection(&state.db, &auth_user.0, dto).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// List connections
#[utoipa::path(
    get,
    path = "/api/connections/teacher-to-student",
    params(PaginationParams, ConnectionFilterParams),
    responses(
        (status = 200, description = "Page of connections", body = Paginated<TeacherToStudent>)
    ),
    tag = "Connections"
)]
#[instrument(skip(state))]
pub async fn get_connections(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<ConnectionFilterParams>,
) -> Result<Json<Paginated<TeacherToStudent>>, AppError> {
    Ok(Json(ConnectionService::get_connections(&state.db, &filters, &pagination).await?))
}

/// Get a connection by id
#[utoipa::path(
    get,
    path = "/api/connections/teacher-to-student/{id}",
    params(("id" = Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection found", body = TeacherToStudent),
        (status = 404, description = "Connection not found", body = ErrorResponse)
    ),
    tag = "Connections"
)]
#[instrument(skip(state))]
pub async fn get_connection(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<TeacherToStudent>, AppError> {
    Ok(Json(ConnectionService::get_connection(&state.db, id).await?))
}

/// Confirm a connection waiting for the caller's side
#[utoipa::path(
    patch,
    path = "/api/connections/teacher-to-student/{id}",
    params(("id" = Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection confirmed", body = TeacherToStudent),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "No connection needs the caller's confirmation", body = ErrorResponse)
    ),
    tag = "Connections",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn confirm_connection(
    State(state): State<AppState>,
    RequireManageConnection(auth_user): RequireManageConnection,
    IdPath(id): IdPath,
) -> Result<Json<TeacherToStudent>, AppError> {
    Ok(Json(ConnectionService::confirm_connection(&state.db, &auth_user.0, id).await?))
}

/// Delete a connection on the caller's side
#[utoipa::path(
    delete,
    path = "/api/connections/teacher-to-student/{id}",
    params(("id" = Uuid, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection deleted", body = TeacherToStudent),
        (status = 403, description = "Insufficient permissions", body = ErrorResponse),
        (status = 404, description = "Connection not found", body = ErrorResponse)
    ),
    tag = "Connections",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user))]
pub async fn delete_connection(
    State(state): State<AppState>,
    RequireManageConnection(auth_user): RequireManageConnection,
    IdPath(id): IdPath,
) -> Result<Json<TeacherToStudent>, AppError> {
    Ok(Json(ConnectionService::delete_connection(&state.db, &auth_user.0, id).await?))
}
