use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use lms_auth::{AccessDenied, Identity, Requirement, evaluate, verify_access_token};
use lms_core::{AppError, Permission, RoleType, Status, error_codes};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::metrics::track_access_denied;
use crate::state::AppState;

#[derive(Debug, FromRow)]
struct IdentityRow {
    id: Uuid,
    username: String,
    email: String,
    status: Status,
    role_id: Uuid,
    role_type: RoleType,
    permissions: Vec<Permission>,
}

/// Loads the caller's current user and role rows.
///
/// Role and permissions are never taken from the token, so edits to a role
/// apply from its holders' next request.
pub async fn load_identity(db: &PgPool, user_id: Uuid) -> Result<Identity, AppError> {
    let row = sqlx::query_as::<_, IdentityRow>(
        r#"
        SELECT u.id, u.username, u.email, u.status, u.role_id,
               r.type AS role_type, r.permissions
        FROM users u
        JOIN user_roles r ON r.id = u.role_id
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
    .map_err(AppError::database)?
    .ok_or_else(|| AppError::unauthorized(error_codes::USER_NOT_EXISTS))?;

    if row.status != Status::Active {
        return Err(AppError::unauthorized(error_codes::USER_NOT_ACTIVE));
    }

    Ok(Identity {
        id: row.id,
        username: row.username,
        email: row.email,
        role_id: row.role_id,
        role_type: row.role_type,
        permissions: row.permissions,
    })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate(token: &str, state: &AppState) -> Result<Identity, AppError> {
    let claims = verify_access_token(token, &state.config.jwt)?;
    load_identity(&state.db, claims.sub).await
}

/// Runs the evaluator and turns a denial into a 403.
pub fn authorize(identity: &Identity, requirement: &Requirement<'_>) -> Result<(), AppError> {
    evaluate(identity, requirement).map_err(|denied| {
        tracing::warn!(user_id = %identity.id, role_type = %identity.role_type, reason = %denied, "Access denied");
        track_access_denied(identity.role_type);
        denied.into_app_error()
    })
}

/// Fails with `errors.not-current-user` unless the caller is `target_id` or an admin.
pub fn ensure_current_user(identity: &Identity, target_id: Uuid) -> Result<(), AppError> {
    lms_auth::ensure_current_user(identity, target_id).map_err(AccessDenied::into_app_error)
}

/// Any authenticated, active user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::unauthorized(error_codes::NOT_AUTHORIZED))?;

        Ok(AuthUser(authenticate(token, state).await?))
    }
}

/// Authenticated when a bearer token is sent, anonymous otherwise.
/// A token that is sent but invalid is still rejected.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<Identity>);

impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => Ok(OptionalAuthUser(Some(authenticate(token, state).await?))),
            None => Ok(OptionalAuthUser(None)),
        }
    }
}

/// Declares an extractor that authenticates the caller and checks it
/// against a constant [`Requirement`].
#[macro_export]
macro_rules! require_access {
    ($name:ident, $requirement:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(pub $crate::middleware::auth::AuthUser);

        impl $name {
            pub const REQUIREMENT: lms_auth::Requirement<'static> = $requirement;
        }

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = lms_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user =
                    $crate::middleware::auth::AuthUser::from_request_parts(parts, state).await?;

                $crate::middleware::auth::authorize(&auth_user.0, &Self::REQUIREMENT)?;

                Ok($name(auth_user))
            }
        }
    };
}

// User roles
require_access!(
    RequireManageUserRoles,
    Requirement::permissions(&[Permission::ManageUserRoles])
);
require_access!(
    RequireArchiveEverything,
    Requirement::permissions(&[Permission::ArchiveEverything])
);

// Users
require_access!(
    RequireCreateDefaultUsers,
    Requirement::permissions(&[Permission::CreateDefaultUsers])
);
require_access!(
    RequireCreateSpecialUsers,
    Requirement::permissions(&[Permission::CreateSpecialUsers])
);
require_access!(
    RequireManageAdmins,
    Requirement::permissions(&[Permission::ManageAdmins])
);
require_access!(
    RequireManageProfile,
    Requirement::permissions(&[Permission::ManageMyProfile])
        .with_admin_permissions(&[Permission::ManageUsers])
);

// Students and teachers
require_access!(
    RequireManageStudentProfile,
    Requirement::permissions(&[Permission::ManageMyProfile])
        .with_admin_permissions(&[Permission::ManageUserProfiles])
);
require_access!(
    RequireManageTeacherProfile,
    Requirement::permissions(&[Permission::ManageMyProfile])
        .with_roles(&[RoleType::Admin, RoleType::Teacher])
        .with_admin_permissions(&[Permission::ManageUserProfiles])
);

// Subjects
require_access!(
    RequireManageSubjects,
    Requirement::permissions(&[Permission::ManageSubjects])
);

// Connections
require_access!(
    RequireCreateConnection,
    Requirement::permissions(&[Permission::ConnectToTeachers, Permission::ConnectToStudents])
        .any_match()
        .with_roles(&[RoleType::Admin, RoleType::Teacher, RoleType::Student])
        .with_admin_permissions(&[Permission::ManageUserProfiles])
);
require_access!(
    RequireManageConnection,
    Requirement::permissions(&[Permission::ConnectToTeachers, Permission::ConnectToStudents])
        .any_match()
        .with_roles(&[RoleType::Admin, RoleType::Teacher, RoleType::Student])
        .with_admin_permissions(&[Permission::ManageUsers])
);

// Tests
require_access!(
    RequireCreateTest,
    Requirement::permissions(&[Permission::CreateMyTests])
        .with_roles(&[RoleType::Admin, RoleType::Teacher])
        .with_admin_permissions(&[Permission::CreateTests])
);
