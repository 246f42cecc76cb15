use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use lms_core::{
    AppError, ErrorResponse, Paginated, PaginationParams, Status, error_codes,
};
use lms_models::users::{
    AdminFilterParams, ChangeEmailDto, ChangePasswordDto, ChangeUsernameDto,
    CreateDefaultUserDto, CreateSpecialUserDto, UserDto, UserFilterParams,
};
use tracing::instrument;

use crate::middleware::auth::{
    RequireArchiveEverything, RequireCreateDefaultUsers, RequireCreateSpecialUsers,
    RequireManageAdmins, RequireManageProfile, ensure_current_user,
};
use crate::modules::files::FileService;
use crate::modules::user_roles::service::UserRoleService;
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::{IdPath, QueryParams, ValidatedJson};

/// Create a user with one of the built-in non-admin roles
#[utoipa::path(
    post,
    path = "/api/users/default-users",
    request_body = CreateDefaultUserDto,
    responses(
        (status = 201, description = "User created, plain password echoed once", body = UserDto),
        (status = 400, description = "Invalid form or email taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Requires CreateDefaultUsers", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_default_user(
    State(state): State<AppState>,
    _guard: RequireCreateDefaultUsers,
    ValidatedJson(dto): ValidatedJson<CreateDefaultUserDto>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let role = UserRoleService::find_by_title(&state.db, dto.role_title.as_str()).await?;
    let user = UserService::create_user(&state.db, dto.into_new_user(), &role).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Create a user with any non-admin role
#[utoipa::path(
    post,
    path = "/api/users/special-users",
    request_body = CreateSpecialUserDto,
    responses(
        (status = 201, description = "User created, plain password echoed once", body = UserDto),
        (status = 400, description = "Invalid form, email taken or admin role", body = ErrorResponse),
        (status = 403, description = "Requires CreateSpecialUsers", body = ErrorResponse),
        (status = 404, description = "Role not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_special_user(
    State(state): State<AppState>,
    _guard: RequireCreateSpecialUsers,
    ValidatedJson(dto): ValidatedJson<CreateSpecialUserDto>,
) -> Result<(StatusCode, Json<UserDto>), AppError> {
    let (user, role_title) = dto.into_new_user();
    let role = UserRoleService::find_by_title(&state.db, &role_title).await?;
    let user = UserService::create_user(&state.db, user, &role).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// List active users that are not admins
#[utoipa::path(
    get,
    path = "/api/users",
    params(PaginationParams, UserFilterParams),
    responses(
        (status = 200, description = "Page of users", body = Paginated<UserDto>)
    ),
    tag = "Users"
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<UserFilterParams>,
) -> Result<Json<Paginated<UserDto>>, AppError> {
    let users = UserService::get_active_users(&state.db, &filters, &pagination).await?;
    Ok(Json(users))
}

/// List admins
#[utoipa::path(
    get,
    path = "/api/users/admins",
    params(PaginationParams, AdminFilterParams),
    responses(
        (status = 200, description = "Page of admins", body = Paginated<UserDto>),
        (status = 403, description = "Requires ManageAdmins", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_admins(
    State(state): State<AppState>,
    _guard: RequireManageAdmins,
    QueryParams(pagination): QueryParams<PaginationParams>,
    QueryParams(filters): QueryParams<AdminFilterParams>,
) -> Result<Json<Paginated<UserDto>>, AppError> {
    let admins = UserService::get_admins(&state.db, &filters, &pagination).await?;
    Ok(Json(admins))
}

/// Change the username of a user
#[utoipa::path(
    patch,
    path = "/api/users/username/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeUsernameDto,
    responses(
        (status = 200, description = "Username changed", body = UserDto),
        (status = 400, description = "Invalid form or username taken", body = ErrorResponse),
        (status = 403, description = "Not the current user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn change_username(
    State(state): State<AppState>,
    RequireManageProfile(auth_user): RequireManageProfile,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<ChangeUsernameDto>,
) -> Result<Json<UserDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;
    let user = UserService::change_username(&state.db, id, &dto.new_username).await?;
    Ok(Json(user))
}

/// Change the email of a user
#[utoipa::path(
    patch,
    path = "/api/users/email/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeEmailDto,
    responses(
        (status = 200, description = "Email changed", body = UserDto),
        (status = 400, description = "Invalid form or email taken", body = ErrorResponse),
        (status = 403, description = "Not the current user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn change_email(
    State(state): State<AppState>,
    RequireManageProfile(auth_user): RequireManageProfile,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<ChangeEmailDto>,
) -> Result<Json<UserDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;
    let user = UserService::change_email(&state.db, id, &dto.new_email).await?;
    Ok(Json(user))
}

/// Change the password of a user
#[utoipa::path(
    patch,
    path = "/api/users/password/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed, new password echoed once", body = UserDto),
        (status = 401, description = "Old password is wrong", body = ErrorResponse),
        (status = 403, description = "Not the current user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireManageProfile(auth_user): RequireManageProfile,
    IdPath(id): IdPath,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<UserDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;
    let user = UserService::change_password(&state.db, id, dto).await?;
    Ok(Json(user))
}

/// Upload a new avatar image (multipart field `avatar`, at most 5 MiB)
#[utoipa::path(
    patch,
    path = "/api/users/avatar/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Image under the `avatar` field"),
    responses(
        (status = 200, description = "Avatar changed", body = UserDto),
        (status = 400, description = "File missing, too large or not an image", body = ErrorResponse),
        (status = 403, description = "Not the current user", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, auth_user, multipart))]
pub async fn change_avatar(
    State(state): State<AppState>,
    RequireManageProfile(auth_user): RequireManageProfile,
    IdPath(id): IdPath,
    multipart: Multipart,
) -> Result<Json<UserDto>, AppError> {
    ensure_current_user(&auth_user.0, id)?;

    let mut form = FileService::read_multipart(multipart).await?;
    let avatar = form.take_file("avatar").ok_or_else(|| {
        AppError::coded(StatusCode::BAD_REQUEST, error_codes::FILE_IS_NOT_PROVIDED, "avatar")
    })?;
    FileService::check(&avatar, state.config.storage.avatar_max_bytes)?;

    let user = UserService::change_avatar(&state.db, &state.storage, id, &avatar).await?;
    Ok(Json(user))
}

/// Activate a user
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User activated", body = UserDto),
        (status = 403, description = "Requires ArchiveEverything", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn activate_user(
    State(state): State<AppState>,
    _guard: RequireArchiveEverything,
    IdPath(id): IdPath,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(UserService::set_status(&state.db, id, Status::Active).await?))
}

/// Archive a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User archived", body = UserDto),
        (status = 403, description = "Requires ArchiveEverything", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn archive_user(
    State(state): State<AppState>,
    _guard: RequireArchiveEverything,
    IdPath(id): IdPath,
) -> Result<Json<UserDto>, AppError> {
    Ok(Json(UserService::set_status(&state.db, id, Status::Archived).await?))
}
