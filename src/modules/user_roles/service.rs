use axum::http::StatusCode;
use lms_core::{AppError, Paginated, PaginationParams, Status, error_codes};
use lms_models::roles::{CreateUserRoleDto, UpdateUserRoleDto, UserRole, UserRoleFilterParams};
use sqlx::PgPool;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::not_found;

const ROLE_COLUMNS: &str = "id, title, type, status, permissions, created_at, updated_at";

fn title_taken(e: sqlx::Error, title: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            warn!(role.title = %title, "Role title already taken");
            return AppError::coded(StatusCode::BAD_REQUEST, error_codes::FIELD_UNIQUE, "title");
        }
    }
    error!(error = %e, role.title = %title, "Database error writing user role");
    AppError::database(e)
}

pub struct UserRoleService;

impl UserRoleService {
    #[instrument(skip(db, dto), fields(role.title = %dto.title, db.operation = "INSERT", db.table = "user_roles"))]
    pub async fn create_role(db: &PgPool, dto: CreateUserRoleDto) -> Result<UserRole, AppError> {
        let role = sqlx::query_as::<_, UserRole>(&format!(
            "INSERT INTO user_roles (title, type, permissions) VALUES ($1, $2, $3) RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(&dto.title)
        .bind(dto.role_type)
        .bind(&dto.permissions)
        .fetch_one(db)
        .await
        .map_err(|e| title_taken(e, &dto.title))?;

        info!(role.id = %role.id, role.role_type = %role.role_type, "User role created");
        Ok(role)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "user_roles"))]
    pub async fn get_roles(
        db: &PgPool,
        filters: &UserRoleFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<UserRole>, AppError> {
        const WHERE: &str = r#"
            WHERE ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%')
              AND ($2::TEXT IS NULL OR type = $2)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM user_roles {}", WHERE))
            .bind(filters.query_line.as_deref())
            .bind(filters.role_type)
            .fetch_one(db)
            .await
            .map_err(AppError::database)?;

        let roles = sqlx::query_as::<_, UserRole>(&format!(
            "SELECT {} FROM user_roles {} ORDER BY created_at ASC LIMIT $3 OFFSET $4",
            ROLE_COLUMNS, WHERE
        ))
        .bind(filters.query_line.as_deref())
        .bind(filters.role_type)
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = roles.len(), "User roles fetched");
        Ok(Paginated::new(roles, total, pagination))
    }

    pub async fn get_role(db: &PgPool, role_id: Uuid) -> Result<UserRole, AppError> {
        sqlx::query_as::<_, UserRole>(&format!("SELECT {} FROM user_roles WHERE id = $1", ROLE_COLUMNS))
            .bind(role_id)
            .fetch_optional(db)
            .await
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(format!("user role with id - {}", role_id)))
    }

    /// An active role by its title.
    #[instrument(skip(db))]
    pub async fn find_by_title(db: &PgPool, title: &str) -> Result<UserRole, AppError> {
        sqlx::query_as::<_, UserRole>(&format!(
            "SELECT {} FROM user_roles WHERE title = $1 AND status = 'Active'",
            ROLE_COLUMNS
        ))
        .bind(title)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("user role {}", title)))
    }

    /// Changes the title and/or permissions. Holders see the new permissions
    /// on their next request.
    #[instrument(skip(db, dto), fields(role.id = %role_id, db.operation = "UPDATE", db.table = "user_roles"))]
    pub async fn update_role(
        db: &PgPool,
        role_id: Uuid,
        dto: UpdateUserRoleDto,
    ) -> Result<UserRole, AppError> {
        let title = dto.title.as_deref().unwrap_or_default();

        let role = sqlx::query_as::<_, UserRole>(&format!(
            r#"
            UPDATE user_roles
            SET title = COALESCE($2, title),
                permissions = COALESCE($3, permissions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ROLE_COLUMNS
        ))
        .bind(role_id)
        .bind(dto.title.as_deref())
        .bind(dto.permissions.as_deref())
        .fetch_optional(db)
        .await
        .map_err(|e| title_taken(e, title))?
        .ok_or_else(|| not_found(format!("user role with id - {}", role_id)))?;

        info!(role.id = %role.id, "User role updated");
        Ok(role)
    }

    #[instrument(skip(db), fields(db.operation = "UPDATE", db.table = "user_roles"))]
    pub async fn set_status(db: &PgPool, role_id: Uuid, status: Status) -> Result<UserRole, AppError> {
        let role = sqlx::query_as::<_, UserRole>(&format!(
            "UPDATE user_roles SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ROLE_COLUMNS
        ))
        .bind(role_id)
        .bind(status)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found("user role"))?;

        info!(role.id = %role.id, status = %status, "User role status changed");
        Ok(role)
    }
}
