use axum::http::StatusCode;
use lms_auth::{AccessDenied, Identity, ensure_current_user};
use lms_core::{AppError, Paginated, PaginationParams, Permission, RoleType, Status, error_codes};
use lms_models::connections::{
    ConfirmationStatus, ConnectionFilterParams, CreateConnectionDto, TeacherToStudent,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::modules::users::service::not_found;

const CONNECTION_COLUMNS: &str = "id, teacher_id, student_id, confirmation_status, created_at, updated_at";

/// Which connections a caller may confirm or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Any,
    Teacher(Uuid),
    Student(Uuid),
}

impl Side {
    pub fn of(identity: &Identity) -> Option<Self> {
        match identity.role_type {
            RoleType::Admin => Some(Self::Any),
            RoleType::Teacher => Some(Self::Teacher(identity.id)),
            RoleType::Student => Some(Self::Student(identity.id)),
            RoleType::Parent => None,
        }
    }

    /// `(teacher_id, student_id)` constraints as nullable binds.
    fn binds(self) -> (Option<Uuid>, Option<Uuid>) {
        match self {
            Self::Any => (None, None),
            Self::Teacher(id) => (Some(id), None),
            Self::Student(id) => (None, Some(id)),
        }
    }
}

#[derive(Debug, FromRow)]
struct PartyRow {
    status: Status,
    role_type: RoleType,
    permissions: Vec<Permission>,
}

pub struct ConnectionService;

impl ConnectionService {
    /// Checks that `user_id` is an active user of `role_type` that holds `permission`.
    async fn ensure_party(
        db: &PgPool,
        user_id: Uuid,
        role_type: RoleType,
        permission: Permission,
    ) -> Result<(), AppError> {
        let party = sqlx::query_as::<_, PartyRow>(
            r#"
            SELECT u.status, r.type AS role_type, r.permissions
            FROM users u
            JOIN user_roles r ON r.id = u.role_id
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .filter(|party| party.status == Status::Active && party.role_type == role_type)
        .ok_or_else(|| not_found(format!("user {} with id - {}", role_type, user_id)))?;

        if !party.permissions.contains(&permission) && !party.permissions.contains(&Permission::All) {
            return Err(AppError::coded(
                StatusCode::FORBIDDEN,
                error_codes::NOT_ENOUGH_PERMISSIONS,
                format!("{} for {} with id {}", permission, role_type, user_id),
            ));
        }
        Ok(())
    }

    #[instrument(skip(db, identity, dto), fields(caller.id = %identity.id, teacher.id = %dto.teacher_id, student.id = %dto.student_id, db.operation = "INSERT", db.table = "teacher_to_student"))]
    pub async fn create_connection(
        db: &PgPool,
        identity: &Identity,
        dto: CreateConnectionDto,
    ) -> Result<TeacherToStudent, AppError> {
        match identity.role_type {
            RoleType::Teacher => ensure_current_user(identity, dto.teacher_id),
            RoleType::Student => ensure_current_user(identity, dto.student_id),
            _ => Ok(()),
        }
        .map_err(AccessDenied::into_app_error)?;

        let status = ConfirmationStatus::initial(identity.role_type, dto.from_teacher.unwrap_or(false))
            .ok_or_else(|| {
                AccessDenied::RoleNotAllowed {
                    allowed: vec![RoleType::Admin, RoleType::Teacher, RoleType::Student],
                }
                .into_app_error()
            })?;

        let existing = sqlx::query_as::<_, TeacherToStudent>(&format!(
            "SELECT {} FROM teacher_to_student WHERE teacher_id = $1 AND student_id = $2",
            CONNECTION_COLUMNS
        ))
        .bind(dto.teacher_id)
        .bind(dto.student_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?;

        if let Some(existing) = existing {
            warn!(connection.id = %existing.id, "Connection already exists");
            return Err(AppError::coded(
                StatusCode::BAD_REQUEST,
                error_codes::CONNECTION_ALREADY_EXISTS,
                format!("{}, status - {}", existing.id, existing.confirmation_status),
            ));
        }

        Self::ensure_party(db, dto.teacher_id, RoleType::Teacher, Permission::ConnectToStudents).await?;
        Self::ensure_party(db, dto.student_id, RoleType::Student, Permission::ConnectToTeachers).await?;

        let connection = sqlx::query_as::<_, TeacherToStudent>(&format!(
            r#"
            INSERT INTO teacher_to_student (teacher_id, student_id, confirmation_status)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(dto.teacher_id)
        .bind(dto.student_id)
        .bind(status)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        info!(connection.id = %connection.id, status = %status, "Connection created");
        Ok(connection)
    }

    #[instrument(skip(db, filters), fields(db.operation = "SELECT", db.table = "teacher_to_student"))]
    pub async fn get_connections(
        db: &PgPool,
        filters: &ConnectionFilterParams,
        pagination: &PaginationParams,
    ) -> Result<Paginated<TeacherToStudent>, AppError> {
        const WHERE: &str = r#"
            WHERE ($1::UUID IS NULL OR teacher_id = $1)
              AND ($2::UUID IS NULL OR student_id = $2)
              AND ($3::TEXT IS NULL OR confirmation_status = $3)
        "#;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM teacher_to_student {}",
            WHERE
        ))
        .bind(filters.teacher_id)
        .bind(filters.student_id)
        .bind(filters.confirmation_status)
        .fetch_one(db)
        .await
        .map_err(AppError::database)?;

        let connections = sqlx::query_as::<_, TeacherToStudent>(&format!(
            "SELECT {} FROM teacher_to_student {} ORDER BY created_at DESC LIMIT $4 OFFSET $5",
            CONNECTION_COLUMNS, WHERE
        ))
        .bind(filters.teacher_id)
        .bind(filters.student_id)
        .bind(filters.confirmation_status)
        .bind(pagination.take())
        .bind(pagination.skip())
        .fetch_all(db)
        .await
        .map_err(AppError::database)?;

        debug!(total = total, returned = connections.len(), "Connections fetched");
        Ok(Paginated::new(connections, total, pagination))
    }

    pub async fn get_connection(db: &PgPool, connection_id: Uuid) -> Result<TeacherToStudent, AppError> {
        sqlx::query_as::<_, TeacherToStudent>(&format!(
            "SELECT {} FROM teacher_to_student WHERE id = $1",
            CONNECTION_COLUMNS
        ))
        .bind(connection_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(format!("teacher-to-student with id - {}", connection_id)))
    }

    /// Confirms a connection that waits for the caller's side.
    #[instrument(skip(db, identity), fields(caller.id = %identity.id, db.operation = "UPDATE", db.table = "teacher_to_student"))]
    pub async fn confirm_connection(
        db: &PgPool,
        identity: &Identity,
        connection_id: Uuid,
    ) -> Result<TeacherToStudent, AppError> {
        let needs_confirmation = || {
            not_found(format!(
                "teacher-to-student with id - {} that needs your confirmation",
                connection_id
            ))
        };

        let side = Side::of(identity).ok_or_else(needs_confirmation)?;
        let (teacher_id, student_id) = side.binds();
        let confirmable = ConfirmationStatus::confirmable_by(identity.role_type);

        let connection = sqlx::query_as::<_, TeacherToStudent>(&format!(
            r#"
            UPDATE teacher_to_student
            SET confirmation_status = $2, updated_at = NOW()
            WHERE id = $1
              AND confirmation_status = ANY($3)
              AND ($4::UUID IS NULL OR teacher_id = $4)
              AND ($5::UUID IS NULL OR student_id = $5)
            RETURNING {}
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(connection_id)
        .bind(ConfirmationStatus::Confirmed)
        .bind(confirmable)
        .bind(teacher_id)
        .bind(student_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(needs_confirmation)?;

        info!(connection.id = %connection_id, "Connection confirmed");
        Ok(connection)
    }

    /// Deletes a connection on the caller's side.
    #[instrument(skip(db, identity), fields(caller.id = %identity.id, db.operation = "DELETE", db.table = "teacher_to_student"))]
    pub async fn delete_connection(
        db: &PgPool,
        identity: &Identity,
        connection_id: Uuid,
    ) -> Result<TeacherToStudent, AppError> {
        let missing = || not_found(format!("teacher-to-student with id - {}", connection_id));

        let (teacher_id, student_id) = Side::of(identity).ok_or_else(missing)?.binds();

        let connection = sqlx::query_as::<_, TeacherToStudent>(&format!(
            r#"
            DELETE FROM teacher_to_student
            WHERE id = $1
              AND ($2::UUID IS NULL OR teacher_id = $2)
              AND ($3::UUID IS NULL OR student_id = $3)
            RETURNING {}
            "#,
            CONNECTION_COLUMNS
        ))
        .bind(connection_id)
        .bind(teacher_id)
        .bind(student_id)
        .fetch_optional(db)
        .await
        .map_err(AppError::database)?
        .ok_or_else(missing)?;

        info!(connection.id = %connection_id, "Connection deleted");
        Ok(connection)
    }
}
